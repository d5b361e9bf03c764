use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use validator::Validate;

use crate::{
    error::HttpError,
    models::{
        directorymodel::SkillType,
        marketmodel::{RequirementRow, Shift},
        usermodel::display_name,
    },
    service::ratings::FarmerRatings,
};

/// Raw listing query string; see `RequirementFilter` for the parsed form.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RequirementQueryDto {
    pub skill_ids: Option<String>,
    pub area_ids: Option<String>,
    pub payment_types: Option<String>,
    pub shifts: Option<String>,
    pub has_pickup: Option<String>,
    pub snacks_facility: Option<String>,
    pub min_rating: Option<String>,
    pub date: Option<String>,
}

pub const TYPE_REQUIRED: &str = "This field is required and must be 'labor' or 'tractor'.";

/// Reads the `type` discriminator every requirement write must carry.
pub fn requirement_type(value: &Option<String>) -> Result<SkillType, HttpError> {
    value
        .as_deref()
        .and_then(SkillType::parse)
        .ok_or_else(|| HttpError::field("type", TYPE_REQUIRED))
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRequirementDto {
    #[serde(rename = "type")]
    pub requirement_type: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    pub area: i64,
    pub skill: i64,
    pub land_size: BigDecimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub shift: Shift,

    #[validate(range(min = 0, message = "Number of labors cannot be negative"))]
    pub number_of_labors: Option<i32>,

    pub has_pickup: Option<bool>,
    pub snacks_facility: Option<bool>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateRequirementDto {
    #[serde(rename = "type")]
    pub requirement_type: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,

    pub area: Option<i64>,
    pub skill: Option<i64>,
    pub land_size: Option<BigDecimal>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub shift: Option<Shift>,

    #[validate(range(min = 0, message = "Number of labors cannot be negative"))]
    pub number_of_labors: Option<i32>,

    pub has_pickup: Option<bool>,
    pub snacks_facility: Option<bool>,
    pub is_open: Option<bool>,
}

impl From<CreateRequirementDto> for UpdateRequirementDto {
    fn from(body: CreateRequirementDto) -> Self {
        UpdateRequirementDto {
            requirement_type: body.requirement_type,
            title: Some(body.title),
            description: Some(body.description),
            area: Some(body.area),
            skill: Some(body.skill),
            land_size: Some(body.land_size),
            from_date: Some(body.from_date),
            to_date: Some(body.to_date),
            shift: Some(body.shift),
            number_of_labors: body.number_of_labors,
            has_pickup: body.has_pickup,
            snacks_facility: body.snacks_facility,
            is_open: body.is_open,
        }
    }
}

impl UpdateRequirementDto {
    /// Tractor postings do not carry crew or facility details.
    pub fn for_type(mut self, kind: SkillType) -> Self {
        if kind == SkillType::Tractor {
            self.number_of_labors = None;
            self.has_pickup = None;
            self.snacks_facility = None;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HireDto {
    pub bid_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateFarmerDto {
    pub farmer_rating: BigDecimal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RequirementResponseDto {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub area: i64,
    pub skill: i64,
    pub area_name: Option<String>,
    pub skill_name: Option<String>,
    pub land_size: BigDecimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub shift: Shift,
    pub number_of_labors: Option<i32>,
    pub has_pickup: bool,
    pub snacks_facility: bool,
    pub is_open: bool,
    pub requirement_type: String,
    pub can_update: bool,
    pub hired_labor_id: Option<i64>,
    pub hired_labor_name: Option<String>,
    pub hired_tractor_id: Option<i64>,
    pub hired_tractor_name: Option<String>,
    /// Average across the farmer's requirements of the same kind.
    pub farmer_rating: Option<BigDecimal>,
}

fn hired_name(first_name: &Option<String>, last_name: &Option<String>) -> Option<String> {
    first_name
        .as_deref()
        .map(|first| display_name(first, last_name.as_deref().unwrap_or_default()))
}

pub fn can_update(row: &RequirementRow) -> bool {
    row.is_open && row.bid_count == 0
}

impl RequirementResponseDto {
    pub fn from_row(row: &RequirementRow, ratings: &FarmerRatings) -> Self {
        RequirementResponseDto {
            id: row.id,
            title: row.title.to_owned(),
            description: row.description.to_owned(),
            area: row.area_id,
            skill: row.skill_id,
            area_name: row.area_name.clone(),
            skill_name: row.skill_name.clone(),
            land_size: row.land_size.clone(),
            from_date: row.from_date,
            to_date: row.to_date,
            shift: row.shift,
            number_of_labors: row.number_of_labors,
            has_pickup: row.has_pickup,
            snacks_facility: row.snacks_facility,
            is_open: row.is_open,
            requirement_type: row
                .skill_type
                .map(|kind| kind.to_str().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            can_update: can_update(row),
            hired_labor_id: row.hire_labor_id,
            hired_labor_name: hired_name(&row.hired_labor_first_name, &row.hired_labor_last_name),
            hired_tractor_id: row.hire_tractor_id,
            hired_tractor_name: hired_name(&row.hired_tractor_first_name, &row.hired_tractor_last_name),
            farmer_rating: ratings.average(row.farmer_id, row.skill_type),
        }
    }

    pub fn from_rows(rows: &[RequirementRow], ratings: &FarmerRatings) -> Vec<Self> {
        rows.iter().map(|row| Self::from_row(row, ratings)).collect()
    }
}
