use async_trait::async_trait;
use sqlx::{Error, PgConnection};

use super::DBClient;
use crate::models::directorymodel::{Area, AreaWithVillage, Skill, SkillType, Village};

const SKILL_COLUMNS: &str =
    "id, skill_name, skill_type, hourly, lump_sump, per_bigha, per_day, per_weight";

#[async_trait]
pub trait DirectoryExt {
    async fn get_villages(&self) -> Result<Vec<Village>, Error>;

    async fn get_village(&self, village_id: i64) -> Result<Option<Village>, Error>;

    async fn get_villages_by_ids(&self, village_ids: &[i64]) -> Result<Vec<Village>, Error>;

    async fn get_areas_in_village(&self, village_id: i64) -> Result<Vec<Area>, Error>;

    async fn get_area(&self, area_id: i64) -> Result<Option<Area>, Error>;

    async fn get_areas_by_ids(&self, area_ids: &[i64]) -> Result<Vec<Area>, Error>;

    async fn get_skills(&self, skill_type: Option<SkillType>) -> Result<Vec<Skill>, Error>;

    async fn get_skill(&self, skill_id: i64) -> Result<Option<Skill>, Error>;

    async fn get_skills_by_ids(&self, skill_ids: &[i64]) -> Result<Vec<Skill>, Error>;

    async fn get_farmer_areas(&self, farmer_id: i64) -> Result<Vec<AreaWithVillage>, Error>;
}

#[async_trait]
impl DirectoryExt for DBClient {
    async fn get_villages(&self) -> Result<Vec<Village>, Error> {
        sqlx::query_as::<_, Village>("SELECT id, village_name FROM village ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }

    async fn get_village(&self, village_id: i64) -> Result<Option<Village>, Error> {
        sqlx::query_as::<_, Village>("SELECT id, village_name FROM village WHERE id = $1")
            .bind(village_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_villages_by_ids(&self, village_ids: &[i64]) -> Result<Vec<Village>, Error> {
        sqlx::query_as::<_, Village>(
            "SELECT id, village_name FROM village WHERE id = ANY($1) ORDER BY id",
        )
        .bind(village_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_areas_in_village(&self, village_id: i64) -> Result<Vec<Area>, Error> {
        sqlx::query_as::<_, Area>(
            r#"
            SELECT id, area_name, area_type, village_id
            FROM area
            WHERE village_id = $1
            ORDER BY id
            "#,
        )
        .bind(village_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_area(&self, area_id: i64) -> Result<Option<Area>, Error> {
        sqlx::query_as::<_, Area>(
            "SELECT id, area_name, area_type, village_id FROM area WHERE id = $1",
        )
        .bind(area_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_areas_by_ids(&self, area_ids: &[i64]) -> Result<Vec<Area>, Error> {
        sqlx::query_as::<_, Area>(
            "SELECT id, area_name, area_type, village_id FROM area WHERE id = ANY($1) ORDER BY id",
        )
        .bind(area_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_skills(&self, skill_type: Option<SkillType>) -> Result<Vec<Skill>, Error> {
        match skill_type {
            Some(skill_type) => {
                sqlx::query_as::<_, Skill>(&format!(
                    "SELECT {} FROM skill WHERE skill_type = $1 ORDER BY id",
                    SKILL_COLUMNS
                ))
                .bind(skill_type)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Skill>(&format!("SELECT {} FROM skill ORDER BY id", SKILL_COLUMNS))
                    .fetch_all(&self.pool)
                    .await
            }
        }
    }

    async fn get_skill(&self, skill_id: i64) -> Result<Option<Skill>, Error> {
        sqlx::query_as::<_, Skill>(&format!("SELECT {} FROM skill WHERE id = $1", SKILL_COLUMNS))
            .bind(skill_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_skills_by_ids(&self, skill_ids: &[i64]) -> Result<Vec<Skill>, Error> {
        sqlx::query_as::<_, Skill>(&format!(
            "SELECT {} FROM skill WHERE id = ANY($1) ORDER BY id",
            SKILL_COLUMNS
        ))
        .bind(skill_ids)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_farmer_areas(&self, farmer_id: i64) -> Result<Vec<AreaWithVillage>, Error> {
        sqlx::query_as::<_, AreaWithVillage>(
            r#"
            SELECT a.id AS area_id, a.area_name, v.id AS village_id, v.village_name
            FROM farmer_areas fa
            JOIN area a ON a.id = fa.area_id
            JOIN village v ON v.id = a.village_id
            WHERE fa.farmer_id = $1
            ORDER BY a.id
            "#,
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await
    }
}

/// Skill lookup on a connection that is already checked out, e.g. inside
/// a transaction holding a requirement lock.
pub async fn fetch_skill(conn: &mut PgConnection, skill_id: i64) -> Result<Option<Skill>, Error> {
    sqlx::query_as::<_, Skill>(&format!("SELECT {} FROM skill WHERE id = $1", SKILL_COLUMNS))
        .bind(skill_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_area(conn: &mut PgConnection, area_id: i64) -> Result<Option<Area>, Error> {
    sqlx::query_as::<_, Area>(
        "SELECT id, area_name, area_type, village_id FROM area WHERE id = $1",
    )
    .bind(area_id)
    .fetch_optional(conn)
    .await
}
