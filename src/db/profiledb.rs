use async_trait::async_trait;
use sqlx::{types::BigDecimal, Error};
use uuid::Uuid;

use super::{DBClient, USER_COLUMNS};
use crate::models::{
    profilemodel::{Actor, FarmerProfile, Gender, LaborProfile, TractorProfile},
    usermodel::{User, UserRole},
};

/// Account fields written once at registration.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Role profile written alongside a new account.
#[derive(Debug, Clone)]
pub enum NewProfile {
    Farmer {
        village_ids: Vec<i64>,
        area_ids: Vec<i64>,
    },
    Labor {
        village_id: i64,
        area_id: i64,
        gender: Gender,
        hourly_rate: BigDecimal,
    },
    Tractor {
        village_ids: Vec<i64>,
        skill_ids: Vec<i64>,
    },
}

impl NewProfile {
    pub fn role(&self) -> UserRole {
        match self {
            NewProfile::Farmer { .. } => UserRole::Farmer,
            NewProfile::Labor { .. } => UserRole::Labor,
            NewProfile::Tractor { .. } => UserRole::Tractor,
        }
    }
}

#[async_trait]
pub trait ProfileExt {
    /// Resolves the role profile for `user`; `Actor::Unknown` when none exists.
    async fn get_actor(&self, user: &User) -> Result<Actor, Error>;

    async fn register_user(&self, user: NewUser, profile: NewProfile) -> Result<User, Error>;

    async fn get_farmer_ratings(&self, farmer_id: i64) -> Result<Vec<BigDecimal>, Error>;
}

#[async_trait]
impl ProfileExt for DBClient {
    async fn get_actor(&self, user: &User) -> Result<Actor, Error> {
        let actor = match user.role {
            UserRole::Farmer => sqlx::query_as::<_, FarmerProfile>(
                r#"
                SELECT f.id, f.user_id, f.contact_number,
                    COALESCE(
                        (SELECT array_agg(fv.village_id ORDER BY fv.village_id)
                         FROM farmer_villages fv WHERE fv.farmer_id = f.id),
                        '{}'::BIGINT[]
                    ) AS village_ids,
                    COALESCE(
                        (SELECT array_agg(fa.area_id ORDER BY fa.area_id)
                         FROM farmer_areas fa WHERE fa.farmer_id = f.id),
                        '{}'::BIGINT[]
                    ) AS area_ids
                FROM farmer f
                WHERE f.user_id = $1
                "#,
            )
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .map(Actor::Farmer),

            UserRole::Labor => sqlx::query_as::<_, LaborProfile>(
                r#"
                SELECT id, user_id, village_id, area_id, contact_number, hourly_rate, gender
                FROM labor
                WHERE user_id = $1
                "#,
            )
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .map(Actor::Labor),

            UserRole::Tractor => sqlx::query_as::<_, TractorProfile>(
                r#"
                SELECT t.id, t.user_id, t.contact_number,
                    COALESCE(
                        (SELECT array_agg(tv.village_id ORDER BY tv.village_id)
                         FROM tractor_villages tv WHERE tv.tractor_id = t.id),
                        '{}'::BIGINT[]
                    ) AS village_ids,
                    COALESCE(
                        (SELECT array_agg(ts.skill_id ORDER BY ts.skill_id)
                         FROM tractor_skill ts WHERE ts.tractor_id = t.id),
                        '{}'::BIGINT[]
                    ) AS skill_ids
                FROM tractor t
                WHERE t.user_id = $1
                "#,
            )
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?
            .map(Actor::Tractor),
        };

        Ok(actor.unwrap_or(Actor::Unknown))
    }

    async fn register_user(&self, user: NewUser, profile: NewProfile) -> Result<User, Error> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, username, email, password, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(profile.role())
        .fetch_one(&mut *tx)
        .await?;

        let contact_number = &user.username;

        match &profile {
            NewProfile::Farmer { village_ids, area_ids } => {
                let farmer_id = insert_contact(&mut tx, "farmer", created.id, contact_number).await?;

                sqlx::query(
                    r#"
                    INSERT INTO farmer_villages (farmer_id, village_id)
                    SELECT $1, UNNEST($2::BIGINT[])
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(farmer_id)
                .bind(village_ids)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO farmer_areas (farmer_id, area_id)
                    SELECT $1, UNNEST($2::BIGINT[])
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(farmer_id)
                .bind(area_ids)
                .execute(&mut *tx)
                .await?;
            }
            NewProfile::Labor {
                village_id,
                area_id,
                gender,
                hourly_rate,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO labor (user_id, village_id, area_id, contact_number, hourly_rate, gender)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(created.id)
                .bind(village_id)
                .bind(area_id)
                .bind(contact_number)
                .bind(hourly_rate)
                .bind(gender)
                .execute(&mut *tx)
                .await?;
            }
            NewProfile::Tractor { village_ids, skill_ids } => {
                let tractor_id = insert_contact(&mut tx, "tractor", created.id, contact_number).await?;

                sqlx::query(
                    r#"
                    INSERT INTO tractor_villages (tractor_id, village_id)
                    SELECT $1, UNNEST($2::BIGINT[])
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(tractor_id)
                .bind(village_ids)
                .execute(&mut *tx)
                .await?;

                sqlx::query(
                    r#"
                    INSERT INTO tractor_skill (tractor_id, skill_id)
                    SELECT $1, UNNEST($2::BIGINT[])
                    ON CONFLICT DO NOTHING
                    "#,
                )
                .bind(tractor_id)
                .bind(skill_ids)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn get_farmer_ratings(&self, farmer_id: i64) -> Result<Vec<BigDecimal>, Error> {
        sqlx::query_scalar::<_, BigDecimal>(
            r#"
            SELECT farmer_rating
            FROM requirement
            WHERE farmer_id = $1 AND farmer_rating IS NOT NULL
            "#,
        )
        .bind(farmer_id)
        .fetch_all(&self.pool)
        .await
    }
}

/// Inserts a farmer or tractor row, which carry only a contact number.
async fn insert_contact(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    table: &'static str,
    user_id: Uuid,
    contact_number: &str,
) -> Result<i64, Error> {
    sqlx::query_scalar::<_, i64>(&format!(
        "INSERT INTO {} (user_id, contact_number) VALUES ($1, $2) RETURNING id",
        table
    ))
    .bind(user_id)
    .bind(contact_number)
    .fetch_one(&mut **tx)
    .await
}
