use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{
        biddb::{self, BidExt},
        directorydb,
        requirementdb::{self, RequirementExt},
        DBClient,
    },
    dtos::biddtos::{normalize_comment, BidResponseDto, CommentResponseDto, CreateBidDto},
    error::ErrorMessage,
    models::{
        directorymodel::{Area, Skill},
        marketmodel::Bid,
        profilemodel::Actor,
    },
    service::{error::ServiceError, requirement_service::require_farmer, visibility::Bidder},
};

pub fn require_bidder(actor: &Actor) -> Result<Bidder, ServiceError> {
    Bidder::from_actor(actor)
        .ok_or_else(|| ServiceError::Forbidden(ErrorMessage::PermissionDenied.to_string()))
}

/// A bidder may only reach requirements of its own skill kind inside its villages.
pub fn check_reachable(
    bidder: Bidder,
    village_ids: &[i64],
    requirement_id: i64,
    skill: &Skill,
    area: &Area,
) -> Result<(), ServiceError> {
    if skill.skill_type != bidder.skill_type() || !village_ids.contains(&area.village_id) {
        return Err(ServiceError::RequirementNotFound(requirement_id));
    }
    Ok(())
}

pub fn authored_by(bid: &Bid, bidder: Bidder) -> bool {
    match bidder {
        Bidder::Labor(id) => bid.labor_id == Some(id),
        Bidder::Tractor(id) => bid.tractor_id == Some(id),
    }
}

#[derive(Debug, Clone)]
pub struct BidService {
    db_client: Arc<DBClient>,
}

impl BidService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn list_bids(&self, actor: &Actor) -> Result<Vec<BidResponseDto>, ServiceError> {
        let bids = self.db_client.list_bids(actor, None).await?;
        Ok(BidResponseDto::from_bids(&bids))
    }

    pub async fn get_bid(&self, actor: &Actor, bid_id: i64) -> Result<BidResponseDto, ServiceError> {
        let bids = self.db_client.list_bids(actor, Some(bid_id)).await?;
        bids.first()
            .map(BidResponseDto::from_bid)
            .ok_or(ServiceError::BidNotFound(bid_id))
    }

    /// Places a bid under a lock on the requirement row, so the
    /// requirement's update guard and this insert never interleave.
    pub async fn create_bid(
        &self,
        actor: &Actor,
        body: CreateBidDto,
    ) -> Result<BidResponseDto, ServiceError> {
        let bidder = require_bidder(actor)?;
        let requirement_id = body.requirement;

        let mut tx = self.db_client.pool.begin().await?;

        let requirement = requirementdb::lock_requirement(&mut tx, requirement_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;

        let skill = directorydb::fetch_skill(&mut tx, requirement.skill_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;
        let area = directorydb::fetch_area(&mut tx, requirement.area_id)
            .await?
            .ok_or(ServiceError::RequirementNotFound(requirement_id))?;
        check_reachable(bidder, &actor.village_ids(), requirement_id, &skill, &area)?;

        if !requirement.is_open {
            return Err(ServiceError::BiddingClosed(requirement_id));
        }
        if biddb::has_bid(&mut tx, requirement_id, bidder).await? {
            return Err(ServiceError::DuplicateBid(requirement_id));
        }

        let method = body.check_against(&skill)?;
        let bid = biddb::insert_bid(&mut tx, bidder, &body).await?;
        tx.commit().await?;

        tracing::info!(
            bid_id = bid.id,
            requirement_id,
            ?bidder,
            method = method.to_str(),
            "bid placed"
        );

        Ok(BidResponseDto::from_bid(&bid))
    }

    async fn farmer_bid(&self, actor: &Actor, bid_id: i64) -> Result<Bid, ServiceError> {
        let farmer = require_farmer(actor)?;
        let bid = self
            .db_client
            .get_bid(bid_id)
            .await?
            .ok_or(ServiceError::BidNotFound(bid_id))?;

        let requirement = self.db_client.get_requirement(bid.requirement_id).await?;
        match requirement {
            Some(requirement) if requirement.farmer_id == farmer.id => Ok(bid),
            _ => Err(ServiceError::BidNotFound(bid_id)),
        }
    }

    async fn own_bid(&self, actor: &Actor, bid_id: i64) -> Result<Bid, ServiceError> {
        let bidder = require_bidder(actor)?;
        self.db_client
            .get_bid(bid_id)
            .await?
            .filter(|bid| authored_by(bid, bidder))
            .ok_or(ServiceError::BidNotFound(bid_id))
    }

    pub async fn set_farmer_acceptance(
        &self,
        actor: &Actor,
        bid_id: i64,
        accepted: bool,
    ) -> Result<BidResponseDto, ServiceError> {
        self.farmer_bid(actor, bid_id).await?;
        let bid = self.db_client.set_farmer_acceptance(bid_id, accepted).await?;
        tracing::info!(bid_id, accepted, "farmer acceptance recorded");
        Ok(BidResponseDto::from_bid(&bid))
    }

    pub async fn set_bidder_acceptance(
        &self,
        actor: &Actor,
        bid_id: i64,
        accepted: bool,
    ) -> Result<BidResponseDto, ServiceError> {
        self.own_bid(actor, bid_id).await?;
        let bid = self.db_client.set_bidder_acceptance(bid_id, accepted).await?;
        tracing::info!(bid_id, accepted, "bidder acceptance recorded");
        Ok(BidResponseDto::from_bid(&bid))
    }

    /// The bid's author and the requirement's farmer share the thread.
    async fn comment_access(&self, actor: &Actor, bid_id: i64) -> Result<(), ServiceError> {
        match actor {
            Actor::Farmer(_) => self.farmer_bid(actor, bid_id).await.map(|_| ()),
            Actor::Labor(_) | Actor::Tractor(_) => self.own_bid(actor, bid_id).await.map(|_| ()),
            Actor::Unknown => Err(ServiceError::Forbidden(ErrorMessage::PermissionDenied.to_string())),
        }
    }

    pub async fn list_comments(
        &self,
        actor: &Actor,
        bid_id: i64,
    ) -> Result<Vec<CommentResponseDto>, ServiceError> {
        self.comment_access(actor, bid_id).await?;
        let comments = self.db_client.get_bid_comments(bid_id).await?;
        Ok(comments.iter().map(CommentResponseDto::from_comment).collect())
    }

    pub async fn add_comment(
        &self,
        actor: &Actor,
        user_id: Uuid,
        bid_id: i64,
        comment: &str,
    ) -> Result<CommentResponseDto, ServiceError> {
        self.comment_access(actor, bid_id).await?;

        let comment = normalize_comment(comment);
        if comment.is_empty() {
            return Err(ServiceError::field("comment", "Comment cannot be empty."));
        }

        let saved = self.db_client.add_bid_comment(bid_id, user_id, comment).await?;
        Ok(CommentResponseDto::from_comment(&saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        directorymodel::{AreaType, SkillType},
        profilemodel::{FarmerProfile, Gender, LaborProfile},
    };
    use chrono::NaiveDate;
    use sqlx::types::BigDecimal;

    fn skill(skill_type: SkillType) -> Skill {
        Skill {
            id: 2,
            skill_name: "Weeding".to_string(),
            skill_type,
            hourly: true,
            lump_sump: false,
            per_bigha: false,
            per_day: true,
            per_weight: false,
        }
    }

    fn area(village_id: i64) -> Area {
        Area {
            id: 1,
            area_name: "Jagbid".to_string(),
            area_type: AreaType::Outside,
            village_id,
        }
    }

    fn bid(labor_id: Option<i64>, tractor_id: Option<i64>) -> Bid {
        Bid {
            id: 3,
            requirement_id: 5,
            labor_id,
            tractor_id,
            description: String::new(),
            hourly: Some(BigDecimal::from(60)),
            lump_sump: None,
            per_bigha: None,
            per_day: None,
            per_weight: None,
            date: NaiveDate::from_ymd_opt(2025, 10, 1).unwrap(),
            male_labors: None,
            female_labors: None,
            is_accepted_by_farmer: false,
            is_accepted_by_labor: false,
        }
    }

    #[test]
    fn reachability_needs_matching_kind_and_village() {
        let labor = Bidder::Labor(21);
        assert!(check_reachable(labor, &[1], 5, &skill(SkillType::Labor), &area(1)).is_ok());
        assert!(matches!(
            check_reachable(labor, &[1], 5, &skill(SkillType::Tractor), &area(1)),
            Err(ServiceError::RequirementNotFound(5))
        ));
        assert!(check_reachable(labor, &[1], 5, &skill(SkillType::Labor), &area(2)).is_err());

        let tractor = Bidder::Tractor(31);
        assert!(check_reachable(tractor, &[1, 2], 5, &skill(SkillType::Tractor), &area(2)).is_ok());
    }

    #[test]
    fn authorship_follows_bidder_column() {
        assert!(authored_by(&bid(Some(21), None), Bidder::Labor(21)));
        assert!(!authored_by(&bid(Some(21), None), Bidder::Labor(22)));
        assert!(!authored_by(&bid(Some(21), None), Bidder::Tractor(21)));
        assert!(authored_by(&bid(None, Some(31)), Bidder::Tractor(31)));
    }

    #[test]
    fn only_laborers_and_operators_can_bid() {
        let labor = Actor::Labor(LaborProfile {
            id: 21,
            user_id: Uuid::nil(),
            village_id: 1,
            area_id: 1,
            contact_number: "9784123569".to_string(),
            hourly_rate: BigDecimal::from(300),
            gender: Gender::Female,
        });
        assert_eq!(require_bidder(&labor).unwrap(), Bidder::Labor(21));

        let farmer = Actor::Farmer(FarmerProfile {
            id: 1,
            user_id: Uuid::nil(),
            contact_number: "9510777630".to_string(),
            village_ids: vec![1],
            area_ids: vec![],
        });
        assert!(matches!(require_bidder(&farmer), Err(ServiceError::Forbidden(_))));
    }
}

#[cfg(test)]
mod store_tests {
    use std::sync::Arc;

    use sqlx::PgPool;

    use super::*;
    use crate::{
        db::{fixtures, UserExt},
        dtos::requirementdtos::RequirementQueryDto,
        service::requirement_service::RequirementService,
    };

    fn services(pool: PgPool) -> (Arc<DBClient>, RequirementService, BidService) {
        let db = Arc::new(DBClient::new(pool));
        (db.clone(), RequirementService::new(db.clone()), BidService::new(db))
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn requirement_leaves_the_bidders_view_once_bid_on(pool: PgPool) {
        fixtures::seed(&pool).await;
        let (db, requirements, bids) = services(pool);
        let labor = fixtures::actor(&db, fixtures::LABOR).await;
        let query = RequirementQueryDto::default();

        let before: Vec<i64> = requirements
            .list_requirements(&labor, &query)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(before, vec![101, 106]);

        let bid = bids.create_bid(&labor, fixtures::labor_bid(106)).await.unwrap();
        assert_eq!(bid.labor, Some(1));

        let after: Vec<i64> = requirements
            .list_requirements(&labor, &query)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(after, vec![101]);
        assert!(matches!(
            requirements.get_requirement(&labor, 106).await,
            Err(ServiceError::RequirementNotFound(106))
        ));

        let mine: Vec<i64> = bids.list_bids(&labor).await.unwrap().iter().map(|b| b.id).collect();
        assert_eq!(mine, vec![bid.id]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn bids_on_unreachable_closed_or_repeated_requirements_fail(pool: PgPool) {
        fixtures::seed(&pool).await;
        let (db, _, bids) = services(pool);
        let labor = fixtures::actor(&db, fixtures::LABOR).await;
        let tractor = fixtures::actor(&db, fixtures::TRACTOR).await;

        assert!(matches!(
            bids.create_bid(&labor, fixtures::labor_bid(105)).await,
            Err(ServiceError::RequirementNotFound(105))
        ));
        assert!(matches!(
            bids.create_bid(&tractor, fixtures::labor_bid(101)).await,
            Err(ServiceError::RequirementNotFound(101))
        ));
        assert!(matches!(
            bids.create_bid(&labor, fixtures::labor_bid(104)).await,
            Err(ServiceError::BiddingClosed(104))
        ));

        bids.create_bid(&labor, fixtures::labor_bid(101)).await.unwrap();
        assert!(matches!(
            bids.create_bid(&labor, fixtures::labor_bid(101)).await,
            Err(ServiceError::DuplicateBid(101))
        ));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn comments_are_stored_as_typed(pool: PgPool) {
        fixtures::seed(&pool).await;
        let (db, _, bids) = services(pool);
        let labor = fixtures::actor(&db, fixtures::LABOR).await;
        let farmer = fixtures::actor(&db, fixtures::FARMER).await;
        let farmer_user = db.get_user(None, Some(fixtures::FARMER)).await.unwrap().unwrap();

        let bid = bids.create_bid(&labor, fixtures::labor_bid(101)).await.unwrap();
        let text = "Rate 500 & snacks, 5 < 6 \"ok\"";
        let saved = bids
            .add_comment(&farmer, farmer_user.id, bid.id, &format!("  {}  ", text))
            .await
            .unwrap();
        assert_eq!(saved.comment, text);

        let thread = bids.list_comments(&labor, bid.id).await.unwrap();
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].comment, text);
    }
}
