use std::{collections::BTreeSet, sync::Arc};

use chrono::NaiveDate;
use sqlx::{types::BigDecimal, PgConnection};

use crate::{
    db::{
        biddb::BidExt,
        directorydb,
        requirementdb::{self, NewRequirement, RequirementExt},
        DBClient,
    },
    dtos::{
        biddtos::BidResponseDto,
        requirementdtos::{
            requirement_type, CreateRequirementDto, RequirementQueryDto, RequirementResponseDto,
            UpdateRequirementDto,
        },
        userdtos::FIELD_REQUIRED,
    },
    error::{ErrorMessage, FieldErrors},
    models::{
        directorymodel::{Area, Skill, SkillType},
        marketmodel::{Requirement, RequirementRow},
        profilemodel::{Actor, FarmerProfile},
    },
    service::{
        error::ServiceError,
        filters::RequirementFilter,
        ratings::FarmerRatings,
        visibility::Bidder,
    },
    utils::decimal::BigDecimalHelpers,
};

pub fn require_farmer(actor: &Actor) -> Result<&FarmerProfile, ServiceError> {
    actor
        .as_farmer()
        .ok_or_else(|| ServiceError::Forbidden(ErrorMessage::PermissionDenied.to_string()))
}

/// A requirement the farmer owns; anything else reads as missing.
pub fn owned_by(
    farmer: &FarmerProfile,
    requirement_id: i64,
    requirement: Option<Requirement>,
) -> Result<Requirement, ServiceError> {
    requirement
        .filter(|r| r.farmer_id == farmer.id)
        .ok_or(ServiceError::RequirementNotFound(requirement_id))
}

/// Update guard: closed first, then any bid.
pub fn ensure_updatable(requirement: &Requirement, bid_count: i64) -> Result<(), ServiceError> {
    if !requirement.is_open {
        return Err(ServiceError::RequirementClosed);
    }
    if bid_count > 0 {
        return Err(ServiceError::RequirementHasBids);
    }
    Ok(())
}

pub fn check_skill_kind(skill: &Skill, kind: SkillType) -> Result<(), ServiceError> {
    if skill.skill_type != kind {
        return Err(ServiceError::field(
            "skill",
            format!("Skill must be of type '{}'.", kind.to_str()),
        ));
    }
    Ok(())
}

pub fn check_area_scope(area: &Area, farmer: &FarmerProfile) -> Result<(), ServiceError> {
    if !farmer.village_ids.contains(&area.village_id) {
        return Err(ServiceError::field(
            "area",
            "Area must be in one of your villages.",
        ));
    }
    Ok(())
}

pub fn check_dates(from_date: NaiveDate, to_date: NaiveDate) -> Result<(), ServiceError> {
    if from_date > to_date {
        return Err(ServiceError::field(
            "to_date",
            "End date cannot be before the start date.",
        ));
    }
    Ok(())
}

/// Fields a full (PUT) update must carry.
pub fn missing_for_replace(body: &UpdateRequirementDto) -> FieldErrors {
    let present = [
        ("title", body.title.is_some()),
        ("description", body.description.is_some()),
        ("area", body.area.is_some()),
        ("skill", body.skill.is_some()),
        ("land_size", body.land_size.is_some()),
        ("from_date", body.from_date.is_some()),
        ("to_date", body.to_date.is_some()),
        ("shift", body.shift.is_some()),
    ];

    present
        .iter()
        .filter(|(_, is_present)| !is_present)
        .map(|(field, _)| (field.to_string(), vec![FIELD_REQUIRED.to_string()]))
        .collect()
}

/// Ratings are on a 0 to 5 scale, stored to two places.
pub fn validate_rating(rating: &BigDecimal) -> Result<BigDecimal, ServiceError> {
    if rating < &BigDecimal::from(0) || rating > &BigDecimal::from(5) {
        return Err(ServiceError::field(
            "farmer_rating",
            "Rating must be between 0 and 5.",
        ));
    }
    Ok(rating.round_2dp())
}

/// Skill kind and area scope of a create or update, read on `conn` so an
/// update can run them under its row lock.
async fn check_references(
    conn: &mut PgConnection,
    farmer: &FarmerProfile,
    kind: SkillType,
    area_id: i64,
    skill_id: i64,
) -> Result<(), ServiceError> {
    let skill = directorydb::fetch_skill(&mut *conn, skill_id)
        .await?
        .ok_or_else(|| ServiceError::field("skill", format!("Invalid pk \"{}\" - object does not exist.", skill_id)))?;
    check_skill_kind(&skill, kind)?;

    let area = directorydb::fetch_area(&mut *conn, area_id)
        .await?
        .ok_or_else(|| ServiceError::field("area", format!("Invalid pk \"{}\" - object does not exist.", area_id)))?;
    check_area_scope(&area, farmer)
}

#[derive(Debug, Clone)]
pub struct RequirementService {
    db_client: Arc<DBClient>,
}

impl RequirementService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    async fn ratings_for(&self, rows: &[RequirementRow]) -> Result<FarmerRatings, ServiceError> {
        let farmer_ids: Vec<i64> = rows
            .iter()
            .map(|row| row.farmer_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let samples = self.db_client.get_rating_samples(&farmer_ids).await?;
        Ok(FarmerRatings::from_samples(&samples))
    }

    async fn respond(&self, rows: Vec<RequirementRow>) -> Result<Vec<RequirementResponseDto>, ServiceError> {
        let ratings = self.ratings_for(&rows).await?;
        Ok(RequirementResponseDto::from_rows(&rows, &ratings))
    }

    async fn respond_one(
        &self,
        actor: &Actor,
        requirement_id: i64,
    ) -> Result<RequirementResponseDto, ServiceError> {
        let row = self
            .db_client
            .get_visible_requirement(actor, requirement_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;
        let ratings = self.ratings_for(std::slice::from_ref(&row)).await?;
        Ok(RequirementResponseDto::from_row(&row, &ratings))
    }

    pub async fn list_requirements(
        &self,
        actor: &Actor,
        query: &RequirementQueryDto,
    ) -> Result<Vec<RequirementResponseDto>, ServiceError> {
        let filter = RequirementFilter::from_query(query)?;
        tracing::debug!(role = actor.role_name(), ?filter, "listing requirements");

        let rows = self.db_client.list_requirements(actor, &filter).await?;
        self.respond(rows).await
    }

    pub async fn get_requirement(
        &self,
        actor: &Actor,
        requirement_id: i64,
    ) -> Result<RequirementResponseDto, ServiceError> {
        self.respond_one(actor, requirement_id).await
    }

    /// A farmer's own postings; other roles get an empty list.
    pub async fn my_requirements(
        &self,
        actor: &Actor,
    ) -> Result<Vec<RequirementResponseDto>, ServiceError> {
        match actor.as_farmer() {
            Some(farmer) => {
                let rows = self.db_client.get_farmer_requirements(farmer.id).await?;
                self.respond(rows).await
            }
            None => Ok(Vec::new()),
        }
    }

    pub async fn create_requirement(
        &self,
        actor: &Actor,
        body: CreateRequirementDto,
    ) -> Result<RequirementResponseDto, ServiceError> {
        let farmer = require_farmer(actor)?;
        let kind = requirement_type(&body.requirement_type)?;

        check_dates(body.from_date, body.to_date)?;
        let mut conn = self.db_client.pool.acquire().await?;
        check_references(&mut conn, farmer, kind, body.area, body.skill).await?;
        drop(conn);

        let is_tractor = kind == SkillType::Tractor;
        let requirement = NewRequirement {
            title: body.title,
            description: body.description,
            area_id: body.area,
            skill_id: body.skill,
            land_size: body.land_size,
            from_date: body.from_date,
            to_date: body.to_date,
            shift: body.shift,
            number_of_labors: if is_tractor { None } else { body.number_of_labors },
            has_pickup: !is_tractor && body.has_pickup.unwrap_or(false),
            snacks_facility: !is_tractor && body.snacks_facility.unwrap_or(false),
            is_open: body.is_open.unwrap_or(true),
        };

        let created = self.db_client.create_requirement(farmer.id, requirement).await?;
        tracing::info!(
            requirement_id = created.id,
            farmer_id = farmer.id,
            kind = kind.to_str(),
            "requirement created"
        );

        self.respond_one(actor, created.id).await
    }

    /// PUT when `replace`, PATCH otherwise. Runs under a row lock so a
    /// concurrent first bid cannot slip past the guard. Lifecycle guards
    /// are reported before body errors.
    pub async fn update_requirement(
        &self,
        actor: &Actor,
        requirement_id: i64,
        body: UpdateRequirementDto,
        replace: bool,
    ) -> Result<RequirementResponseDto, ServiceError> {
        let farmer = require_farmer(actor)?;

        let mut tx = self.db_client.pool.begin().await?;

        let current = requirementdb::lock_requirement(&mut tx, requirement_id).await?;
        let current = owned_by(farmer, requirement_id, current)?;
        let bid_count = requirementdb::count_bids(&mut tx, requirement_id).await?;
        ensure_updatable(&current, bid_count)?;

        let kind = requirement_type(&body.requirement_type)?;
        if replace {
            let missing = missing_for_replace(&body);
            if !missing.is_empty() {
                return Err(ServiceError::Fields(missing));
            }
        }
        let changes = body.for_type(kind);

        check_dates(
            changes.from_date.unwrap_or(current.from_date),
            changes.to_date.unwrap_or(current.to_date),
        )?;
        check_references(
            &mut tx,
            farmer,
            kind,
            changes.area.unwrap_or(current.area_id),
            changes.skill.unwrap_or(current.skill_id),
        )
        .await?;

        requirementdb::apply_update(&mut tx, requirement_id, &changes).await?;
        tx.commit().await?;

        tracing::info!(requirement_id, farmer_id = farmer.id, "requirement updated");
        self.respond_one(actor, requirement_id).await
    }

    pub async fn delete_requirement(&self, actor: &Actor, requirement_id: i64) -> Result<(), ServiceError> {
        let farmer = require_farmer(actor)?;
        if !self.db_client.delete_requirement(farmer.id, requirement_id).await? {
            return Err(ServiceError::RequirementNotFound(requirement_id));
        }
        tracing::info!(requirement_id, farmer_id = farmer.id, "requirement deleted");
        Ok(())
    }

    pub async fn close_requirement(
        &self,
        actor: &Actor,
        requirement_id: i64,
    ) -> Result<RequirementResponseDto, ServiceError> {
        let farmer = require_farmer(actor)?;
        self.db_client
            .close_requirement(farmer.id, requirement_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;

        tracing::info!(requirement_id, farmer_id = farmer.id, "requirement closed");
        self.respond_one(actor, requirement_id).await
    }

    /// Records the bidder of `bid_id` as hired. The requirement stays open
    /// until the farmer closes it.
    pub async fn hire(
        &self,
        actor: &Actor,
        requirement_id: i64,
        bid_id: i64,
    ) -> Result<RequirementResponseDto, ServiceError> {
        let farmer = require_farmer(actor)?;
        let requirement = self.db_client.get_requirement(requirement_id).await?;
        owned_by(farmer, requirement_id, requirement)?;

        let bid = self
            .db_client
            .get_bid(bid_id)
            .await?
            .filter(|bid| bid.requirement_id == requirement_id)
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        let bidder = match (bid.labor_id, bid.tractor_id) {
            (Some(labor_id), _) => Bidder::Labor(labor_id),
            (None, Some(tractor_id)) => Bidder::Tractor(tractor_id),
            (None, None) => {
                return Err(ServiceError::Validation(
                    "The bidder on this bid no longer exists.".to_string(),
                ))
            }
        };

        self.db_client.hire_bidder(requirement_id, bidder).await?;
        tracing::info!(requirement_id, bid_id, ?bidder, "bidder hired");

        self.respond_one(actor, requirement_id).await
    }

    pub async fn requirement_bids(
        &self,
        actor: &Actor,
        requirement_id: i64,
    ) -> Result<Vec<BidResponseDto>, ServiceError> {
        let farmer = require_farmer(actor)?;
        let requirement = self.db_client.get_requirement(requirement_id).await?;
        owned_by(farmer, requirement_id, requirement)?;

        let bids = self.db_client.get_requirement_bids(requirement_id).await?;
        Ok(BidResponseDto::from_bids(&bids))
    }

    /// The hired laborer or operator rates the farmer on this requirement.
    pub async fn rate_farmer(
        &self,
        actor: &Actor,
        requirement_id: i64,
        rating: &BigDecimal,
    ) -> Result<RequirementResponseDto, ServiceError> {
        let bidder = Bidder::from_actor(actor)
            .ok_or_else(|| ServiceError::Forbidden(ErrorMessage::PermissionDenied.to_string()))?;
        let rating = validate_rating(rating)?;

        let requirement = self
            .db_client
            .get_requirement(requirement_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;

        let hired = match bidder {
            Bidder::Labor(id) => requirement.hire_labor_id == Some(id),
            Bidder::Tractor(id) => requirement.hire_tractor_id == Some(id),
        };
        if !hired {
            return Err(ServiceError::Forbidden(
                "Only the hired party can rate this requirement.".to_string(),
            ));
        }

        let rated = self.db_client.rate_farmer(requirement_id, rating).await?;
        tracing::info!(requirement_id, farmer_id = rated.farmer_id, "farmer rated");

        let row = self
            .db_client
            .get_requirement_row(requirement_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;
        let ratings = self.ratings_for(std::slice::from_ref(&row)).await?;
        Ok(RequirementResponseDto::from_row(&row, &ratings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{directorymodel::AreaType, marketmodel::Shift};
    use std::str::FromStr;
    use uuid::Uuid;

    fn farmer() -> FarmerProfile {
        FarmerProfile {
            id: 1,
            user_id: Uuid::nil(),
            contact_number: "9510777630".to_string(),
            village_ids: vec![1, 2],
            area_ids: vec![1],
        }
    }

    fn requirement() -> Requirement {
        Requirement {
            id: 5,
            title: "Groundnut harvest".to_string(),
            description: "Two days".to_string(),
            area_id: 1,
            skill_id: 2,
            farmer_id: 1,
            land_size: BigDecimal::from(4),
            from_date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            to_date: NaiveDate::from_ymd_opt(2025, 10, 2).unwrap(),
            shift: Shift::Morning,
            number_of_labors: Some(6),
            has_pickup: false,
            snacks_facility: false,
            is_open: true,
            hire_labor_id: None,
            hire_tractor_id: None,
            farmer_rating: None,
        }
    }

    #[test]
    fn only_farmers_pass_the_role_gate() {
        assert!(require_farmer(&Actor::Farmer(farmer())).is_ok());
        assert!(matches!(
            require_farmer(&Actor::Unknown),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn other_farmers_requirements_read_as_missing() {
        let mut foreign = requirement();
        foreign.farmer_id = 99;
        assert!(matches!(
            owned_by(&farmer(), 5, Some(foreign)),
            Err(ServiceError::RequirementNotFound(5))
        ));
        assert!(owned_by(&farmer(), 5, None).is_err());
        assert_eq!(owned_by(&farmer(), 5, Some(requirement())).unwrap().id, 5);
    }

    #[test]
    fn update_guard_checks_closed_then_bids() {
        assert!(ensure_updatable(&requirement(), 0).is_ok());
        assert!(matches!(
            ensure_updatable(&requirement(), 1),
            Err(ServiceError::RequirementHasBids)
        ));

        let mut closed = requirement();
        closed.is_open = false;
        assert!(matches!(
            ensure_updatable(&closed, 3),
            Err(ServiceError::RequirementClosed)
        ));
    }

    #[test]
    fn skill_kind_must_match_requirement_type() {
        let skill = Skill {
            id: 6,
            skill_name: "Rotavator".to_string(),
            skill_type: SkillType::Tractor,
            hourly: true,
            lump_sump: false,
            per_bigha: true,
            per_day: false,
            per_weight: false,
        };
        assert!(check_skill_kind(&skill, SkillType::Tractor).is_ok());
        assert!(matches!(
            check_skill_kind(&skill, SkillType::Labor),
            Err(ServiceError::Fields(fields)) if fields.contains_key("skill")
        ));
    }

    #[test]
    fn area_must_be_in_farmer_villages() {
        let mut area = Area {
            id: 3,
            area_name: "Kharu".to_string(),
            area_type: AreaType::Inside,
            village_id: 2,
        };
        assert!(check_area_scope(&area, &farmer()).is_ok());
        area.village_id = 7;
        assert!(check_area_scope(&area, &farmer()).is_err());
    }

    #[test]
    fn date_range_must_not_be_inverted() {
        let day = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        assert!(check_dates(day, day).is_ok());
        assert!(check_dates(day.succ_opt().unwrap(), day).is_err());
    }

    #[test]
    fn replace_lists_missing_fields() {
        let body = UpdateRequirementDto {
            title: Some("Groundnut harvest".to_string()),
            ..Default::default()
        };
        let missing = missing_for_replace(&body);
        assert!(!missing.contains_key("title"));
        assert!(missing.contains_key("shift"));
        assert_eq!(missing.len(), 7);
    }

    #[test]
    fn ratings_are_bounded_and_rounded() {
        let rating = validate_rating(&BigDecimal::from_str("4.255").unwrap()).unwrap();
        assert_eq!(rating.to_string(), "4.26");
        assert!(validate_rating(&BigDecimal::from_str("5.01").unwrap()).is_err());
        assert!(validate_rating(&BigDecimal::from_str("-1").unwrap()).is_err());
        assert_eq!(validate_rating(&BigDecimal::from(0)).unwrap().to_string(), "0.00");
    }
}
