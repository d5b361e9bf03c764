use std::{collections::BTreeSet, sync::Arc};

use crate::{
    db::{
        directorydb::DirectoryExt,
        profiledb::{NewProfile, NewUser, ProfileExt},
        DBClient, UserExt,
    },
    dtos::userdtos::{RegisterDto, FIELD_REQUIRED},
    error::{field_errors, ErrorMessage},
    models::{
        directorymodel::{Area, Skill, SkillType},
        usermodel::{split_full_name, User, UserRole},
    },
    service::error::ServiceError,
    utils::password,
};

pub const NON_TRACTOR_SKILLS: &str = "Contains non-tractor skills.";

/// Requested ids with no matching row, in ascending order.
pub fn missing_ids(requested: &[i64], found: impl IntoIterator<Item = i64>) -> Vec<i64> {
    let found: BTreeSet<i64> = found.into_iter().collect();
    requested
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|id| !found.contains(id))
        .collect()
}

fn unknown_ids(field: &str, ids: &[i64]) -> ServiceError {
    let listed: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    ServiceError::field(field, format!("Invalid id(s): {}.", listed.join(", ")))
}

pub fn check_tractor_skills(skills: &[Skill]) -> Result<(), ServiceError> {
    if skills.iter().any(|skill| skill.skill_type != SkillType::Tractor) {
        return Err(ServiceError::field("skill_ids", NON_TRACTOR_SKILLS));
    }
    Ok(())
}

pub fn check_labor_area(area: &Area, village_id: i64) -> Result<(), ServiceError> {
    if area.village_id != village_id {
        return Err(ServiceError::field(
            "area_id",
            "Area does not belong to the selected village.",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RegistrationService {
    db_client: Arc<DBClient>,
}

impl RegistrationService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    async fn check_villages(&self, field: &str, village_ids: &[i64]) -> Result<(), ServiceError> {
        let found = self.db_client.get_villages_by_ids(village_ids).await?;
        let missing = missing_ids(village_ids, found.iter().map(|v| v.id));
        if !missing.is_empty() {
            return Err(unknown_ids(field, &missing));
        }
        Ok(())
    }

    async fn check_areas(&self, area_ids: &[i64]) -> Result<(), ServiceError> {
        let found = self.db_client.get_areas_by_ids(area_ids).await?;
        let missing = missing_ids(area_ids, found.iter().map(|a| a.id));
        if !missing.is_empty() {
            return Err(unknown_ids("area_ids", &missing));
        }
        Ok(())
    }

    async fn profile_for(&self, body: &RegisterDto) -> Result<NewProfile, ServiceError> {
        let required = |field: &str| ServiceError::field(field, FIELD_REQUIRED);

        match body.role {
            UserRole::Farmer => {
                let village_ids = body.village_ids.clone().unwrap_or_default();
                let area_ids = body.area_ids.clone().unwrap_or_default();
                self.check_villages("village_ids", &village_ids).await?;
                self.check_areas(&area_ids).await?;
                Ok(NewProfile::Farmer { village_ids, area_ids })
            }
            UserRole::Labor => {
                let village_id = body.village_id.ok_or_else(|| required("village_id"))?;
                let area_id = body.area_id.ok_or_else(|| required("area_id"))?;
                let gender = body.gender.ok_or_else(|| required("gender"))?;
                let hourly_rate = body.hourly_rate.clone().ok_or_else(|| required("hourly_rate"))?;

                self.check_villages("village_id", &[village_id]).await?;
                let area = self
                    .db_client
                    .get_area(area_id)
                    .await?
                    .ok_or_else(|| unknown_ids("area_id", &[area_id]))?;
                check_labor_area(&area, village_id)?;

                Ok(NewProfile::Labor {
                    village_id,
                    area_id,
                    gender,
                    hourly_rate,
                })
            }
            UserRole::Tractor => {
                let village_ids = body.village_ids.clone().unwrap_or_default();
                let skill_ids = body.skill_ids.clone().unwrap_or_default();
                self.check_villages("village_ids", &village_ids).await?;

                let skills = self.db_client.get_skills_by_ids(&skill_ids).await?;
                let missing = missing_ids(&skill_ids, skills.iter().map(|s| s.id));
                if !missing.is_empty() {
                    return Err(unknown_ids("skill_ids", &missing));
                }
                check_tractor_skills(&skills)?;

                Ok(NewProfile::Tractor { village_ids, skill_ids })
            }
        }
    }

    /// Creates the account and its role profile together.
    pub async fn register(&self, body: RegisterDto) -> Result<User, ServiceError> {
        body.validate_role_fields()
            .map_err(|errors| ServiceError::Fields(field_errors(&errors)))?;

        if self.db_client.username_exists(&body.phone_number).await? {
            return Err(ServiceError::field(
                "phone_number",
                ErrorMessage::PhoneNumberExist.to_string(),
            ));
        }

        let profile = self.profile_for(&body).await?;

        let password_hash = password::hash(&body.password)
            .map_err(|e| ServiceError::field("password", e.to_string()))?;
        let (first_name, last_name) = split_full_name(body.full_name.trim());

        let new_user = NewUser {
            first_name,
            last_name,
            username: body.phone_number.clone(),
            email: body.email.clone().unwrap_or_default(),
            password_hash,
        };

        let user = match self.db_client.register_user(new_user, profile).await {
            Ok(user) => user,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(ServiceError::field(
                    "phone_number",
                    ErrorMessage::PhoneNumberExist.to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(user_id = %user.id, role = user.role.to_str(), "user registered");
        Ok(user)
    }
}
