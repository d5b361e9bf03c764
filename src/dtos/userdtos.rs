use std::{borrow::Cow, sync::OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::{
    directorymodel::AreaWithVillage,
    profilemodel::{Actor, Gender},
    usermodel::{User, UserRole},
};

pub const FIELD_REQUIRED: &str = "This field is required.";

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^\+?[0-9]{10,15}$").expect("phone pattern is valid"))
}

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if phone_regex().is_match(phone) {
        return Ok(());
    }
    let mut error = ValidationError::new("phone_number");
    error.message = Some(Cow::from("Enter a valid phone number of 10 to 15 digits."));
    Err(error)
}

fn required(code: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(FIELD_REQUIRED));
    error
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDto {
    #[validate(length(min = 1, max = 300, message = "Full name is required"))]
    pub full_name: String,

    #[validate(custom = "validate_phone")]
    pub phone_number: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: String,

    pub role: UserRole,

    #[serde(default)]
    pub email: Option<String>,

    // farmer and tractor
    pub village_ids: Option<Vec<i64>>,
    pub area_ids: Option<Vec<i64>>,

    // labor
    pub village_id: Option<i64>,
    pub area_id: Option<i64>,
    pub gender: Option<Gender>,
    pub hourly_rate: Option<BigDecimal>,

    // tractor
    pub skill_ids: Option<Vec<i64>>,
}

fn is_empty(ids: &Option<Vec<i64>>) -> bool {
    ids.as_ref().map_or(true, |ids| ids.is_empty())
}

impl RegisterDto {
    /// Field presence rules that depend on the chosen role.
    pub fn validate_role_fields(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        match self.role {
            UserRole::Labor => {
                if self.village_id.is_none() {
                    errors.add("village_id", required("required"));
                }
                if self.area_id.is_none() {
                    errors.add("area_id", required("required"));
                }
                if self.gender.is_none() {
                    errors.add("gender", required("required"));
                }
                match &self.hourly_rate {
                    None => errors.add("hourly_rate", required("required")),
                    Some(rate) if rate <= &BigDecimal::from(0) => {
                        let mut error = ValidationError::new("range");
                        error.message = Some(Cow::from("Hourly rate must be greater than zero."));
                        errors.add("hourly_rate", error);
                    }
                    Some(_) => {}
                }
            }
            UserRole::Farmer => {
                if is_empty(&self.village_ids) {
                    errors.add("village_ids", required("required"));
                }
            }
            UserRole::Tractor => {
                if is_empty(&self.village_ids) {
                    errors.add("village_ids", required("required"));
                }
                if is_empty(&self.skill_ids) {
                    errors.add("skill_ids", required("required"));
                }
            }
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginDto {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct RefreshDto {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AreaOptionDto {
    pub value: i64,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VillageAreasDto {
    pub village_id: i64,
    pub label: String,
    pub options: Vec<AreaOptionDto>,
}

/// Groups a farmer's areas under their villages, villages in first-seen order.
pub fn group_areas(areas: &[AreaWithVillage]) -> Vec<VillageAreasDto> {
    let mut grouped: Vec<VillageAreasDto> = Vec::new();
    for area in areas {
        let option = AreaOptionDto {
            value: area.area_id,
            label: area.area_name.to_owned(),
        };
        match grouped.iter_mut().find(|v| v.village_id == area.village_id) {
            Some(village) => village.options.push(option),
            None => grouped.push(VillageAreasDto {
                village_id: area.village_id,
                label: area.village_name.to_owned(),
                options: vec![option],
            }),
        }
    }
    grouped
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfileDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub village_ids: Vec<i64>,
    pub areas_with_villages: Vec<VillageAreasDto>,
    pub average_rating: Option<BigDecimal>,
}

impl UserProfileDto {
    pub fn build(
        user: &User,
        actor: &Actor,
        areas: &[AreaWithVillage],
        average_rating: Option<BigDecimal>,
    ) -> Self {
        let is_farmer = actor.as_farmer().is_some();
        UserProfileDto {
            id: user.id.to_string(),
            first_name: user.first_name.to_owned(),
            last_name: user.last_name.to_owned(),
            username: user.username.to_owned(),
            email: user.email.to_owned(),
            role: actor.role_name().to_string(),
            village_ids: actor.village_ids(),
            areas_with_villages: if is_farmer { group_areas(areas) } else { Vec::new() },
            average_rating: if is_farmer { average_rating } else { None },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponseDto {
    pub status: String,
    pub access: String,
    pub refresh: String,
    #[serde(flatten)]
    pub user: UserProfileDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessTokenDto {
    pub status: String,
    pub access: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::profilemodel::FarmerProfile;
    use std::str::FromStr;
    use uuid::Uuid;

    fn register(role: UserRole) -> RegisterDto {
        RegisterDto {
            full_name: "Ramesh Bhalodiya".to_string(),
            phone_number: "9510777630".to_string(),
            password: "secret123".to_string(),
            role,
            email: None,
            village_ids: None,
            area_ids: None,
            village_id: None,
            area_id: None,
            gender: None,
            hourly_rate: None,
            skill_ids: None,
        }
    }

    #[test]
    fn phone_and_password_are_validated() {
        let mut body = register(UserRole::Farmer);
        assert!(body.validate().is_ok());

        body.phone_number = "95107-776".to_string();
        body.password = "abc".to_string();
        let errors = body.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone_number"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn labor_requires_all_profile_fields() {
        let body = register(UserRole::Labor);
        let errors = body.validate_role_fields().unwrap_err();
        let fields = errors.field_errors();
        for field in ["village_id", "area_id", "gender", "hourly_rate"] {
            assert!(fields.contains_key(field), "missing {}", field);
        }

        let mut body = register(UserRole::Labor);
        body.village_id = Some(1);
        body.area_id = Some(1);
        body.gender = Some(Gender::Female);
        body.hourly_rate = Some(BigDecimal::from_str("250.00").unwrap());
        assert!(body.validate_role_fields().is_ok());

        body.hourly_rate = Some(BigDecimal::from(0));
        assert!(body.validate_role_fields().unwrap_err().field_errors().contains_key("hourly_rate"));
    }

    #[test]
    fn farmer_requires_villages() {
        let mut body = register(UserRole::Farmer);
        body.village_ids = Some(vec![]);
        let errors = body.validate_role_fields().unwrap_err();
        let fields = errors.field_errors();
        assert_eq!(
            fields["village_ids"][0].message.as_deref(),
            Some(FIELD_REQUIRED)
        );

        body.village_ids = Some(vec![1]);
        assert!(body.validate_role_fields().is_ok());
    }

    #[test]
    fn tractor_requires_villages_and_skills() {
        let mut body = register(UserRole::Tractor);
        body.village_ids = Some(vec![1, 2]);
        let errors = body.validate_role_fields().unwrap_err();
        assert!(errors.field_errors().contains_key("skill_ids"));
        assert!(!errors.field_errors().contains_key("village_ids"));

        body.skill_ids = Some(vec![6]);
        assert!(body.validate_role_fields().is_ok());
    }

    fn area(area_id: i64, area_name: &str, village_id: i64, village_name: &str) -> AreaWithVillage {
        AreaWithVillage {
            area_id,
            area_name: area_name.to_string(),
            village_id,
            village_name: village_name.to_string(),
        }
    }

    #[test]
    fn areas_group_under_villages_in_first_seen_order() {
        let grouped = group_areas(&[
            area(4, "Jagbid", 2, "Jivapar"),
            area(1, "Kharu", 1, "Moti Vavdi"),
            area(5, "Nadi kanthe", 2, "Jivapar"),
        ]);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].village_id, 2);
        assert_eq!(grouped[0].label, "Jivapar");
        assert_eq!(
            grouped[0].options,
            vec![
                AreaOptionDto { value: 4, label: "Jagbid".to_string() },
                AreaOptionDto { value: 5, label: "Nadi kanthe".to_string() },
            ]
        );
        assert_eq!(grouped[1].options.len(), 1);
    }

    #[test]
    fn profile_exposes_farmer_only_fields_for_farmers() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Ramesh".to_string(),
            last_name: "Bhalodiya".to_string(),
            username: "9510777630".to_string(),
            email: String::new(),
            password: "hash".to_string(),
            role: UserRole::Farmer,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let areas = [area(1, "Kharu", 1, "Moti Vavdi")];
        let farmer = Actor::Farmer(FarmerProfile {
            id: 1,
            user_id: user.id,
            contact_number: user.username.clone(),
            village_ids: vec![1],
            area_ids: vec![1],
        });

        let profile = UserProfileDto::build(&user, &farmer, &areas, Some(BigDecimal::from(4)));
        assert_eq!(profile.role, "farmer");
        assert_eq!(profile.village_ids, vec![1]);
        assert_eq!(profile.areas_with_villages.len(), 1);
        assert!(profile.average_rating.is_some());

        let unknown = UserProfileDto::build(&user, &Actor::Unknown, &areas, Some(BigDecimal::from(4)));
        assert_eq!(unknown.role, "unknown");
        assert!(unknown.village_ids.is_empty());
        assert!(unknown.areas_with_villages.is_empty());
        assert!(unknown.average_rating.is_none());

        let json = serde_json::to_value(TokenResponseDto {
            status: "success".to_string(),
            access: "a".to_string(),
            refresh: "r".to_string(),
            user: profile,
        })
        .unwrap();
        assert_eq!(json["first_name"], "Ramesh");
        assert_eq!(json["access"], "a");
    }
}
