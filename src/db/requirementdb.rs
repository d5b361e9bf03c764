use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{types::BigDecimal, Error, PgConnection, Postgres, QueryBuilder};

use super::DBClient;
use crate::{
    dtos::requirementdtos::UpdateRequirementDto,
    models::{
        marketmodel::{Requirement, RequirementRow, Shift},
        profilemodel::Actor,
    },
    service::{
        filters::RequirementFilter,
        ratings::RatingSample,
        visibility::{self, Bidder},
    },
};

pub(crate) const REQUIREMENT_COLUMNS: &str = r#"
    id, title, description, area_id, skill_id, farmer_id, land_size,
    from_date, to_date, shift, number_of_labors, has_pickup, snacks_facility,
    is_open, hire_labor_id, hire_tractor_id, farmer_rating"#;

#[derive(Debug, Clone)]
pub struct NewRequirement {
    pub title: String,
    pub description: String,
    pub area_id: i64,
    pub skill_id: i64,
    pub land_size: BigDecimal,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub shift: Shift,
    pub number_of_labors: Option<i32>,
    pub has_pickup: bool,
    pub snacks_facility: bool,
    pub is_open: bool,
}

#[async_trait]
pub trait RequirementExt {
    async fn list_requirements(
        &self,
        actor: &Actor,
        filter: &RequirementFilter,
    ) -> Result<Vec<RequirementRow>, Error>;

    async fn get_visible_requirement(
        &self,
        actor: &Actor,
        requirement_id: i64,
    ) -> Result<Option<RequirementRow>, Error>;

    async fn get_farmer_requirements(&self, farmer_id: i64) -> Result<Vec<RequirementRow>, Error>;

    async fn get_requirement_row(&self, requirement_id: i64) -> Result<Option<RequirementRow>, Error>;

    async fn get_rating_samples(&self, farmer_ids: &[i64]) -> Result<Vec<RatingSample>, Error>;

    async fn get_requirement(&self, requirement_id: i64) -> Result<Option<Requirement>, Error>;

    async fn create_requirement(
        &self,
        farmer_id: i64,
        requirement: NewRequirement,
    ) -> Result<Requirement, Error>;

    async fn delete_requirement(&self, farmer_id: i64, requirement_id: i64) -> Result<bool, Error>;

    async fn close_requirement(
        &self,
        farmer_id: i64,
        requirement_id: i64,
    ) -> Result<Option<Requirement>, Error>;

    async fn hire_bidder(&self, requirement_id: i64, bidder: Bidder) -> Result<Requirement, Error>;

    async fn rate_farmer(
        &self,
        requirement_id: i64,
        farmer_rating: BigDecimal,
    ) -> Result<Requirement, Error>;
}

#[async_trait]
impl RequirementExt for DBClient {
    async fn list_requirements(
        &self,
        actor: &Actor,
        filter: &RequirementFilter,
    ) -> Result<Vec<RequirementRow>, Error> {
        let mut qb = visibility::requirement_listing(actor, filter);
        qb.build_query_as::<RequirementRow>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_visible_requirement(
        &self,
        actor: &Actor,
        requirement_id: i64,
    ) -> Result<Option<RequirementRow>, Error> {
        let mut qb = visibility::requirement_detail(actor, requirement_id);
        qb.build_query_as::<RequirementRow>()
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_farmer_requirements(&self, farmer_id: i64) -> Result<Vec<RequirementRow>, Error> {
        let mut qb = visibility::farmer_requirements(farmer_id);
        qb.build_query_as::<RequirementRow>()
            .fetch_all(&self.pool)
            .await
    }

    async fn get_requirement_row(&self, requirement_id: i64) -> Result<Option<RequirementRow>, Error> {
        let mut qb = visibility::requirement_row(requirement_id);
        qb.build_query_as::<RequirementRow>()
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_rating_samples(&self, farmer_ids: &[i64]) -> Result<Vec<RatingSample>, Error> {
        if farmer_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, RatingSample>(
            r#"
            SELECT r.farmer_id, s.skill_type, r.farmer_rating
            FROM requirement r
            JOIN skill s ON s.id = r.skill_id
            WHERE r.farmer_id = ANY($1) AND r.farmer_rating IS NOT NULL
            "#,
        )
        .bind(farmer_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_requirement(&self, requirement_id: i64) -> Result<Option<Requirement>, Error> {
        sqlx::query_as::<_, Requirement>(&format!(
            "SELECT {} FROM requirement WHERE id = $1",
            REQUIREMENT_COLUMNS
        ))
        .bind(requirement_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn create_requirement(
        &self,
        farmer_id: i64,
        requirement: NewRequirement,
    ) -> Result<Requirement, Error> {
        sqlx::query_as::<_, Requirement>(&format!(
            r#"
            INSERT INTO requirement
            (title, description, area_id, skill_id, farmer_id, land_size, from_date, to_date,
             shift, number_of_labors, has_pickup, snacks_facility, is_open)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            REQUIREMENT_COLUMNS
        ))
        .bind(requirement.title)
        .bind(requirement.description)
        .bind(requirement.area_id)
        .bind(requirement.skill_id)
        .bind(farmer_id)
        .bind(requirement.land_size)
        .bind(requirement.from_date)
        .bind(requirement.to_date)
        .bind(requirement.shift)
        .bind(requirement.number_of_labors)
        .bind(requirement.has_pickup)
        .bind(requirement.snacks_facility)
        .bind(requirement.is_open)
        .fetch_one(&self.pool)
        .await
    }

    async fn delete_requirement(&self, farmer_id: i64, requirement_id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM requirement WHERE id = $1 AND farmer_id = $2")
            .bind(requirement_id)
            .bind(farmer_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn close_requirement(
        &self,
        farmer_id: i64,
        requirement_id: i64,
    ) -> Result<Option<Requirement>, Error> {
        sqlx::query_as::<_, Requirement>(&format!(
            r#"
            UPDATE requirement SET is_open = FALSE
            WHERE id = $1 AND farmer_id = $2
            RETURNING {}
            "#,
            REQUIREMENT_COLUMNS
        ))
        .bind(requirement_id)
        .bind(farmer_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn hire_bidder(&self, requirement_id: i64, bidder: Bidder) -> Result<Requirement, Error> {
        let (labor_id, tractor_id) = match bidder {
            Bidder::Labor(id) => (Some(id), None),
            Bidder::Tractor(id) => (None, Some(id)),
        };

        sqlx::query_as::<_, Requirement>(&format!(
            r#"
            UPDATE requirement SET hire_labor_id = $2, hire_tractor_id = $3
            WHERE id = $1
            RETURNING {}
            "#,
            REQUIREMENT_COLUMNS
        ))
        .bind(requirement_id)
        .bind(labor_id)
        .bind(tractor_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn rate_farmer(
        &self,
        requirement_id: i64,
        farmer_rating: BigDecimal,
    ) -> Result<Requirement, Error> {
        sqlx::query_as::<_, Requirement>(&format!(
            "UPDATE requirement SET farmer_rating = $2 WHERE id = $1 RETURNING {}",
            REQUIREMENT_COLUMNS
        ))
        .bind(requirement_id)
        .bind(farmer_rating)
        .fetch_one(&self.pool)
        .await
    }
}

/// Loads and row-locks a requirement inside an open transaction.
pub async fn lock_requirement(
    conn: &mut PgConnection,
    requirement_id: i64,
) -> Result<Option<Requirement>, Error> {
    sqlx::query_as::<_, Requirement>(&format!(
        "SELECT {} FROM requirement WHERE id = $1 FOR UPDATE",
        REQUIREMENT_COLUMNS
    ))
    .bind(requirement_id)
    .fetch_optional(conn)
    .await
}

pub async fn count_bids(conn: &mut PgConnection, requirement_id: i64) -> Result<i64, Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM bid WHERE requirement_id = $1")
        .bind(requirement_id)
        .fetch_one(conn)
        .await
}

/// `UPDATE requirement SET ...` for the fields present in `changes`.
/// Returns `None` when nothing would change.
pub fn update_query<'a>(
    requirement_id: i64,
    changes: &UpdateRequirementDto,
) -> Option<QueryBuilder<'a, Postgres>> {
    let mut qb = QueryBuilder::new("UPDATE requirement SET ");
    let mut any = false;

    {
        let mut set = qb.separated(", ");
        macro_rules! set_column {
            ($column:literal, $value:expr) => {
                if let Some(value) = $value.clone() {
                    set.push(concat!($column, " = ")).push_bind_unseparated(value);
                    any = true;
                }
            };
        }

        set_column!("title", changes.title);
        set_column!("description", changes.description);
        set_column!("area_id", changes.area);
        set_column!("skill_id", changes.skill);
        set_column!("land_size", changes.land_size);
        set_column!("from_date", changes.from_date);
        set_column!("to_date", changes.to_date);
        set_column!("shift", changes.shift);
        set_column!("number_of_labors", changes.number_of_labors);
        set_column!("has_pickup", changes.has_pickup);
        set_column!("snacks_facility", changes.snacks_facility);
        set_column!("is_open", changes.is_open);
    }

    if !any {
        return None;
    }

    qb.push(" WHERE id = ").push_bind(requirement_id);
    qb.push(" RETURNING ").push(REQUIREMENT_COLUMNS);
    Some(qb)
}

pub async fn apply_update(
    conn: &mut PgConnection,
    requirement_id: i64,
    changes: &UpdateRequirementDto,
) -> Result<Option<Requirement>, Error> {
    match update_query(requirement_id, changes) {
        Some(mut qb) => qb
            .build_query_as::<Requirement>()
            .fetch_one(conn)
            .await
            .map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sets_only_present_fields() {
        let changes = UpdateRequirementDto {
            title: Some("Wheat harvest".to_string()),
            has_pickup: Some(false),
            ..Default::default()
        };
        let qb = update_query(7, &changes).unwrap();
        let sql = qb.sql();
        assert!(sql.starts_with("UPDATE requirement SET title = $1, has_pickup = $2"));
        assert!(sql.contains("WHERE id = $3"));
        assert!(sql.contains("RETURNING"));
        assert!(!sql.contains("description ="));
    }

    #[test]
    fn empty_update_builds_nothing() {
        assert!(update_query(7, &UpdateRequirementDto::default()).is_none());

        let type_only = UpdateRequirementDto {
            requirement_type: Some("labor".to_string()),
            ..Default::default()
        };
        assert!(update_query(7, &type_only).is_none());
    }
}
