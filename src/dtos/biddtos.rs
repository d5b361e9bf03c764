use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{FieldErrors, HttpError},
    models::{
        directorymodel::{PaymentMethod, Skill, SkillType},
        marketmodel::{priced_amounts, Bid, BidComment},
    },
};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBidDto {
    pub requirement: i64,

    #[serde(default)]
    pub description: String,

    pub hourly: Option<BigDecimal>,
    pub lump_sump: Option<BigDecimal>,
    pub per_bigha: Option<BigDecimal>,
    pub per_day: Option<BigDecimal>,
    pub per_weight: Option<BigDecimal>,

    pub date: NaiveDate,

    #[validate(range(min = 0, message = "Male labors cannot be negative"))]
    pub male_labors: Option<i32>,

    #[validate(range(min = 0, message = "Female labors cannot be negative"))]
    pub female_labors: Option<i32>,
}

impl CreateBidDto {
    pub fn amounts(&self) -> Vec<(PaymentMethod, &BigDecimal)> {
        priced_amounts(
            &self.hourly,
            &self.lump_sump,
            &self.per_bigha,
            &self.per_day,
            &self.per_weight,
        )
    }

    /// Checks the offer against the requirement's skill: exactly one positive
    /// amount in a supported method, and no headcount on tractor work.
    pub fn check_against(&self, skill: &Skill) -> Result<PaymentMethod, HttpError> {
        let mut fields = FieldErrors::new();
        let amounts = self.amounts();

        let method = match amounts.as_slice() {
            [(method, amount)] => {
                if *amount <= &BigDecimal::from(0) {
                    fields
                        .entry(method.to_str().to_string())
                        .or_default()
                        .push("Amount must be greater than zero.".to_string());
                }
                if !skill.supports(*method) {
                    fields
                        .entry(method.to_str().to_string())
                        .or_default()
                        .push(format!(
                            "{} does not accept {} payment.",
                            skill.skill_name,
                            method.to_str()
                        ));
                }
                Some(*method)
            }
            [] => {
                fields.insert(
                    "amount".to_string(),
                    vec!["Exactly one payment amount is required.".to_string()],
                );
                None
            }
            _ => {
                fields.insert(
                    "amount".to_string(),
                    vec!["Only one payment amount may be set.".to_string()],
                );
                None
            }
        };

        if skill.skill_type == SkillType::Tractor {
            if self.male_labors.is_some() {
                fields.insert(
                    "male_labors".to_string(),
                    vec!["Not allowed on tractor bids.".to_string()],
                );
            }
            if self.female_labors.is_some() {
                fields.insert(
                    "female_labors".to_string(),
                    vec!["Not allowed on tractor bids.".to_string()],
                );
            }
        }

        match method {
            Some(method) if fields.is_empty() => Ok(method),
            _ => Err(HttpError::fields(fields)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptanceDto {
    pub accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCommentDto {
    #[validate(length(min = 1, max = 2000, message = "Comment must be between 1 and 2000 characters"))]
    pub comment: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BidResponseDto {
    pub id: i64,
    pub requirement: i64,
    pub labor: Option<i64>,
    pub tractor: Option<i64>,
    pub description: String,
    pub hourly: Option<BigDecimal>,
    pub lump_sump: Option<BigDecimal>,
    pub per_bigha: Option<BigDecimal>,
    pub per_day: Option<BigDecimal>,
    pub per_weight: Option<BigDecimal>,
    pub date: NaiveDate,
    pub male_labors: Option<i32>,
    pub female_labors: Option<i32>,
    pub is_accepted_by_farmer: bool,
    pub is_accepted_by_labor: bool,
}

impl BidResponseDto {
    pub fn from_bid(bid: &Bid) -> Self {
        BidResponseDto {
            id: bid.id,
            requirement: bid.requirement_id,
            labor: bid.labor_id,
            tractor: bid.tractor_id,
            description: bid.description.to_owned(),
            hourly: bid.hourly.clone(),
            lump_sump: bid.lump_sump.clone(),
            per_bigha: bid.per_bigha.clone(),
            per_day: bid.per_day.clone(),
            per_weight: bid.per_weight.clone(),
            date: bid.date,
            male_labors: bid.male_labors,
            female_labors: bid.female_labors,
            is_accepted_by_farmer: bid.is_accepted_by_farmer,
            is_accepted_by_labor: bid.is_accepted_by_labor,
        }
    }

    pub fn from_bids(bids: &[Bid]) -> Vec<Self> {
        bids.iter().map(BidResponseDto::from_bid).collect()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CommentResponseDto {
    pub id: i64,
    pub bid: i64,
    pub comment: String,
    pub posted_by: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}

impl CommentResponseDto {
    pub fn from_comment(comment: &BidComment) -> Self {
        CommentResponseDto {
            id: comment.id,
            bid: comment.bid_id,
            comment: comment.comment.to_owned(),
            posted_by: comment.posted_by,
            created_at: comment.created_at,
        }
    }
}

/// Comments are stored as typed, minus surrounding whitespace. Escaping is
/// left to whoever renders them.
pub fn normalize_comment(raw: &str) -> String {
    raw.trim().to_string()
}
