use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct FarmerProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub contact_number: String,
    pub village_ids: Vec<i64>,
    pub area_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct LaborProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub village_id: i64,
    pub area_id: i64,
    pub contact_number: String,
    pub hourly_rate: BigDecimal,
    pub gender: Gender,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TractorProfile {
    pub id: i64,
    pub user_id: Uuid,
    pub contact_number: String,
    pub village_ids: Vec<i64>,
    pub skill_ids: Vec<i64>,
}

/// The authenticated party together with its role profile.
///
/// A user whose role has no matching profile row resolves to `Unknown`
/// and sees nothing.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "role", content = "profile", rename_all = "snake_case")]
pub enum Actor {
    Farmer(FarmerProfile),
    Labor(LaborProfile),
    Tractor(TractorProfile),
    Unknown,
}

impl Actor {
    pub fn role_name(&self) -> &str {
        match self {
            Actor::Farmer(_) => "farmer",
            Actor::Labor(_) => "labor",
            Actor::Tractor(_) => "tractor",
            Actor::Unknown => "unknown",
        }
    }

    pub fn village_ids(&self) -> Vec<i64> {
        match self {
            Actor::Farmer(farmer) => farmer.village_ids.clone(),
            Actor::Labor(labor) => vec![labor.village_id],
            Actor::Tractor(tractor) => tractor.village_ids.clone(),
            Actor::Unknown => Vec::new(),
        }
    }

    pub fn as_farmer(&self) -> Option<&FarmerProfile> {
        match self {
            Actor::Farmer(farmer) => Some(farmer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn village_ids_follow_profile_scope() {
        let labor = Actor::Labor(LaborProfile {
            id: 1,
            user_id: Uuid::nil(),
            village_id: 7,
            area_id: 2,
            contact_number: "9784123569".to_string(),
            hourly_rate: BigDecimal::from(300),
            gender: Gender::Male,
        });
        assert_eq!(labor.village_ids(), vec![7]);
        assert_eq!(labor.role_name(), "labor");

        let tractor = Actor::Tractor(TractorProfile {
            id: 1,
            user_id: Uuid::nil(),
            contact_number: "9428123456".to_string(),
            village_ids: vec![1, 2],
            skill_ids: vec![6],
        });
        assert_eq!(tractor.village_ids(), vec![1, 2]);
        assert!(tractor.as_farmer().is_none());

        assert!(Actor::Unknown.village_ids().is_empty());
        assert_eq!(Actor::Unknown.role_name(), "unknown");
    }
}
