use chrono::NaiveDate;
use thiserror::Error;

use crate::dtos::requirementdtos::RequirementQueryDto;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("{field} must be a comma-separated list of integers, got {value:?}")]
    InvalidIdList { field: &'static str, value: String },
}

impl FilterError {
    pub fn field(&self) -> &'static str {
        match self {
            FilterError::InvalidIdList { field, .. } => field,
        }
    }
}

/// Client filters for the requirement listing, after parsing.
///
/// `None` means the parameter was absent and places no constraint.
/// An empty list is a constraint that matches nothing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RequirementFilter {
    pub skill_ids: Option<Vec<i64>>,
    pub area_ids: Option<Vec<i64>>,
    /// Parsed but never applied: requirements carry no payment column.
    pub payment_types: Option<Vec<String>>,
    pub shifts: Option<Vec<String>>,
    pub has_pickup: Option<bool>,
    pub snacks_facility: Option<bool>,
    pub min_rating: Option<f64>,
    pub date: Option<NaiveDate>,
}

pub fn parse_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .collect()
}

fn parse_ids(field: &'static str, value: &str) -> Result<Vec<i64>, FilterError> {
    parse_csv(value)
        .into_iter()
        .map(|v| {
            v.parse::<i64>().map_err(|_| FilterError::InvalidIdList {
                field,
                value: v.clone(),
            })
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Any present value other than a case-insensitive `true` means `false`.
fn parse_flag(value: &Option<String>) -> Option<bool> {
    value.as_deref().map(|v| v.to_lowercase() == "true")
}

impl RequirementFilter {
    /// Id lists fail hard on a bad entry; rating and date quietly drop.
    pub fn from_query(query: &RequirementQueryDto) -> Result<Self, FilterError> {
        let skill_ids = non_empty(&query.skill_ids)
            .map(|v| parse_ids("skill_ids", v))
            .transpose()?;
        let area_ids = non_empty(&query.area_ids)
            .map(|v| parse_ids("area_ids", v))
            .transpose()?;

        let min_rating = non_empty(&query.min_rating)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| *v > 0.0);

        let date = non_empty(&query.date)
            .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok());

        Ok(RequirementFilter {
            skill_ids,
            area_ids,
            payment_types: non_empty(&query.payment_types).map(parse_csv),
            shifts: non_empty(&query.shifts).map(parse_csv),
            has_pickup: parse_flag(&query.has_pickup),
            snacks_facility: parse_flag(&query.snacks_facility),
            min_rating,
            date,
        })
    }
}
