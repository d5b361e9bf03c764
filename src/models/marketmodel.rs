use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

use crate::models::directorymodel::{PaymentMethod, SkillType};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "requirement_shift", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Anytime,
    Morning,
    Evening,
    Night,
    Fullday,
}

impl Shift {
    pub fn to_str(&self) -> &str {
        match self {
            Shift::Anytime => "anytime",
            Shift::Morning => "morning",
            Shift::Evening => "evening",
            Shift::Night => "night",
            Shift::Fullday => "fullday",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Requirement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub area_id: i64,
    pub skill_id: i64,
    pub farmer_id: i64,
    pub land_size: BigDecimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub shift: Shift,
    pub number_of_labors: Option<i32>,
    pub has_pickup: bool,
    pub snacks_facility: bool,
    pub is_open: bool,
    pub hire_labor_id: Option<i64>,
    pub hire_tractor_id: Option<i64>,
    pub farmer_rating: Option<BigDecimal>,
}

/// A requirement joined with the lookups its listing needs.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct RequirementRow {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub area_id: i64,
    pub skill_id: i64,
    pub farmer_id: i64,
    pub land_size: BigDecimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub shift: Shift,
    pub number_of_labors: Option<i32>,
    pub has_pickup: bool,
    pub snacks_facility: bool,
    pub is_open: bool,
    pub hire_labor_id: Option<i64>,
    pub hire_tractor_id: Option<i64>,
    pub farmer_rating: Option<BigDecimal>,
    pub area_name: Option<String>,
    pub village_id: Option<i64>,
    pub skill_name: Option<String>,
    pub skill_type: Option<SkillType>,
    pub hired_labor_first_name: Option<String>,
    pub hired_labor_last_name: Option<String>,
    pub hired_tractor_first_name: Option<String>,
    pub hired_tractor_last_name: Option<String>,
    pub bid_count: i64,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Bid {
    pub id: i64,
    pub requirement_id: i64,
    pub labor_id: Option<i64>,
    pub tractor_id: Option<i64>,
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

/// The priced amounts of a bid, as (method, amount) pairs in column order.
pub fn priced_amounts<'a>(
    hourly: &'a Option<BigDecimal>,
    lump_sump: &'a Option<BigDecimal>,
    per_bigha: &'a Option<BigDecimal>,
    per_day: &'a Option<BigDecimal>,
    per_weight: &'a Option<BigDecimal>,
) -> Vec<(PaymentMethod, &'a BigDecimal)> {
    [
        (PaymentMethod::Hourly, hourly),
        (PaymentMethod::LumpSump, lump_sump),
        (PaymentMethod::PerBigha, per_bigha),
        (PaymentMethod::PerDay, per_day),
        (PaymentMethod::PerWeight, per_weight),
    ]
    .into_iter()
    .filter_map(|(method, amount)| amount.as_ref().map(|value| (method, value)))
    .collect()
}

impl Bid {
    pub fn payment(&self) -> Vec<(PaymentMethod, &BigDecimal)> {
        priced_amounts(
            &self.hourly,
            &self.lump_sump,
            &self.per_bigha,
            &self.per_day,
            &self.per_weight,
        )
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct BidComment {
    pub id: i64,
    pub bid_id: i64,
    pub comment: String,
    pub posted_by: Uuid,
    pub created_at: Option<DateTime<Utc>>,
}
