use sqlx::{Postgres, QueryBuilder};

use crate::{
    models::{directorymodel::SkillType, profilemodel::Actor},
    service::filters::RequirementFilter,
};

pub const REQUIREMENT_SELECT: &str = r#"
    SELECT
        r.id, r.title, r.description, r.area_id, r.skill_id, r.farmer_id,
        r.land_size, r.from_date, r.to_date, r.shift, r.number_of_labors,
        r.has_pickup, r.snacks_facility, r.is_open,
        r.hire_labor_id, r.hire_tractor_id, r.farmer_rating,
        a.area_name, a.village_id,
        s.skill_name, s.skill_type,
        hlu.first_name AS hired_labor_first_name,
        hlu.last_name AS hired_labor_last_name,
        htu.first_name AS hired_tractor_first_name,
        htu.last_name AS hired_tractor_last_name,
        (SELECT COUNT(*) FROM bid cb WHERE cb.requirement_id = r.id) AS bid_count
    FROM requirement r
    LEFT JOIN area a ON a.id = r.area_id
    LEFT JOIN skill s ON s.id = r.skill_id
    LEFT JOIN labor hl ON hl.id = r.hire_labor_id
    LEFT JOIN users hlu ON hlu.id = hl.user_id
    LEFT JOIN tractor ht ON ht.id = r.hire_tractor_id
    LEFT JOIN users htu ON htu.id = ht.user_id
    WHERE TRUE"#;

pub const BID_SELECT: &str = r#"
    SELECT
        b.id, b.requirement_id, b.labor_id, b.tractor_id, b.description,
        b.hourly, b.lump_sump, b.per_bigha, b.per_day, b.per_weight,
        b.date, b.male_labors, b.female_labors,
        b.is_accepted_by_farmer, b.is_accepted_by_labor
    FROM bid b
    WHERE TRUE"#;

/// The party a bid is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bidder {
    Labor(i64),
    Tractor(i64),
}

impl Bidder {
    pub fn from_actor(actor: &Actor) -> Option<Self> {
        match actor {
            Actor::Labor(labor) => Some(Bidder::Labor(labor.id)),
            Actor::Tractor(tractor) => Some(Bidder::Tractor(tractor.id)),
            _ => None,
        }
    }

    pub fn skill_type(&self) -> SkillType {
        match self {
            Bidder::Labor(_) => SkillType::Labor,
            Bidder::Tractor(_) => SkillType::Tractor,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Bidder::Labor(_) => "labor_id",
            Bidder::Tractor(_) => "tractor_id",
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Bidder::Labor(id) | Bidder::Tractor(id) => *id,
        }
    }
}

/// Which requirements an actor may see.
#[derive(Debug, Clone, PartialEq)]
pub enum RequirementScope {
    /// A farmer's own postings, open or closed.
    Owner { farmer_id: i64 },
    /// Open postings of one skill kind inside the bidder's villages that
    /// the bidder has not bid on yet.
    Biddable { bidder: Bidder, village_ids: Vec<i64> },
    Nothing,
}

impl RequirementScope {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor {
            Actor::Farmer(farmer) => RequirementScope::Owner { farmer_id: farmer.id },
            Actor::Labor(labor) => RequirementScope::Biddable {
                bidder: Bidder::Labor(labor.id),
                village_ids: vec![labor.village_id],
            },
            Actor::Tractor(tractor) => RequirementScope::Biddable {
                bidder: Bidder::Tractor(tractor.id),
                village_ids: tractor.village_ids.clone(),
            },
            Actor::Unknown => RequirementScope::Nothing,
        }
    }

    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            RequirementScope::Owner { farmer_id } => {
                qb.push(" AND r.farmer_id = ").push_bind(*farmer_id);
            }
            RequirementScope::Biddable { bidder, village_ids } => {
                qb.push(" AND r.is_open");
                qb.push(" AND a.village_id = ANY(").push_bind(village_ids.clone()).push(")");
                qb.push(" AND s.skill_type = ").push_bind(bidder.skill_type());
                qb.push(" AND NOT EXISTS (SELECT 1 FROM bid ob WHERE ob.requirement_id = r.id AND ob.")
                    .push(bidder.column())
                    .push(" = ")
                    .push_bind(bidder.id())
                    .push(")");
            }
            RequirementScope::Nothing => {
                qb.push(" AND FALSE");
            }
        }
    }
}

pub fn push_requirement_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &RequirementFilter) {
    if let Some(skill_ids) = &filter.skill_ids {
        qb.push(" AND r.skill_id = ANY(").push_bind(skill_ids.clone()).push(")");
    }
    if let Some(area_ids) = &filter.area_ids {
        qb.push(" AND r.area_id = ANY(").push_bind(area_ids.clone()).push(")");
    }
    if let Some(payment_types) = &filter.payment_types {
        tracing::debug!(?payment_types, "payment_types filter has no backing column, ignoring");
    }
    if let Some(shifts) = &filter.shifts {
        qb.push(" AND r.shift::text = ANY(").push_bind(shifts.clone()).push(")");
    }
    if let Some(has_pickup) = filter.has_pickup {
        qb.push(" AND r.has_pickup = ").push_bind(has_pickup);
    }
    if let Some(snacks_facility) = filter.snacks_facility {
        qb.push(" AND r.snacks_facility = ").push_bind(snacks_facility);
    }
    if let Some(min_rating) = filter.min_rating {
        qb.push(" AND r.farmer_rating::float8 >= ").push_bind(min_rating);
    }
    if let Some(date) = filter.date {
        qb.push(" AND r.from_date <= ").push_bind(date);
        qb.push(" AND r.to_date >= ").push_bind(date);
    }
}

/// Listing query: filters first, then the actor's scope, ascending id.
pub fn requirement_listing<'a>(
    actor: &Actor,
    filter: &RequirementFilter,
) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(REQUIREMENT_SELECT);
    push_requirement_filters(&mut qb, filter);
    RequirementScope::for_actor(actor).push_sql(&mut qb);
    qb.push(" ORDER BY r.id");
    qb
}

/// Single requirement, visible only when the listing would include it.
pub fn requirement_detail<'a>(actor: &Actor, requirement_id: i64) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(REQUIREMENT_SELECT);
    qb.push(" AND r.id = ").push_bind(requirement_id);
    RequirementScope::for_actor(actor).push_sql(&mut qb);
    qb
}

/// Single requirement with its derived columns, no actor scope.
pub fn requirement_row<'a>(requirement_id: i64) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(REQUIREMENT_SELECT);
    qb.push(" AND r.id = ").push_bind(requirement_id);
    qb
}

/// A farmer's own requirements, unfiltered.
pub fn farmer_requirements<'a>(farmer_id: i64) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(REQUIREMENT_SELECT);
    RequirementScope::Owner { farmer_id }.push_sql(&mut qb);
    qb.push(" ORDER BY r.id");
    qb
}

/// Bids authored by the actor; farmers and unknown roles get none.
pub fn bid_listing<'a>(actor: &Actor, bid_id: Option<i64>) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(BID_SELECT);
    if let Some(bid_id) = bid_id {
        qb.push(" AND b.id = ").push_bind(bid_id);
    }
    match Bidder::from_actor(actor) {
        Some(bidder) => {
            qb.push(" AND b.")
                .push(bidder.column())
                .push(" = ")
                .push_bind(bidder.id());
        }
        None => {
            qb.push(" AND FALSE");
        }
    }
    qb.push(" ORDER BY b.id");
    qb
}
