use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "area_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AreaType {
    Inside,
    Outside,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "skill_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SkillType {
    Labor,
    Tractor,
}

impl SkillType {
    pub fn to_str(&self) -> &str {
        match self {
            SkillType::Labor => "labor",
            SkillType::Tractor => "tractor",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "labor" => Some(SkillType::Labor),
            "tractor" => Some(SkillType::Tractor),
            _ => None,
        }
    }
}

/// Ways a bid can be priced. Column names follow the stored schema.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Hourly,
    LumpSump,
    PerBigha,
    PerDay,
    PerWeight,
}

impl PaymentMethod {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentMethod::Hourly => "hourly",
            PaymentMethod::LumpSump => "lump_sump",
            PaymentMethod::PerBigha => "per_bigha",
            PaymentMethod::PerDay => "per_day",
            PaymentMethod::PerWeight => "per_weight",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Village {
    pub id: i64,
    pub village_name: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Area {
    pub id: i64,
    pub area_name: String,
    pub area_type: AreaType,
    #[serde(rename = "village")]
    pub village_id: i64,
}

/// An area joined with its village, as served to a farmer.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct AreaWithVillage {
    pub area_id: i64,
    pub area_name: String,
    pub village_id: i64,
    pub village_name: String,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Skill {
    pub id: i64,
    pub skill_name: String,
    pub skill_type: SkillType,
    pub hourly: bool,
    pub lump_sump: bool,
    pub per_bigha: bool,
    pub per_day: bool,
    pub per_weight: bool,
}

impl Skill {
    pub fn supports(&self, method: PaymentMethod) -> bool {
        match method {
            PaymentMethod::Hourly => self.hourly,
            PaymentMethod::LumpSump => self.lump_sump,
            PaymentMethod::PerBigha => self.per_bigha,
            PaymentMethod::PerDay => self.per_day,
            PaymentMethod::PerWeight => self.per_weight,
        }
    }
}
