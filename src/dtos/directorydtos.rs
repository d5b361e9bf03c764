use serde::{Deserialize, Serialize};

use crate::models::directorymodel::SkillType;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AreaQueryDto {
    pub village_id: Option<String>,
}

impl AreaQueryDto {
    /// `Ok(None)` when no village was asked for; areas are only listed per village.
    pub fn village_id(&self) -> Result<Option<i64>, String> {
        match self.village_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<i64>()
                .map(Some)
                .map_err(|_| format!("village_id must be an integer, got {:?}", value)),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SkillQueryDto {
    pub skill_type: Option<String>,
}

impl SkillQueryDto {
    /// Unrecognised kinds are ignored rather than rejected.
    pub fn skill_type(&self) -> Option<SkillType> {
        self.skill_type.as_deref().and_then(SkillType::parse)
    }
}
