//! Seed data for database-backed tests.
//!
//! Villages 1 and 2 belong to farmer `FARMER`, village 3 to `OTHER_FARMER`.
//! `LABOR` lives in village 1, `FAR_LABOR` in village 3, and `TRACTOR` serves
//! villages 1 and 2. `GHOST` has the labor role but no profile row.
//!
//! Requirements of `FARMER`:
//! - 101: labor, village 1, open, rated 4.0
//! - 102: labor, village 2, open, rated 4.2
//! - 103: tractor, village 1, open, rated 3.0
//! - 104: labor, village 1, closed
//! - 106: labor, village 1, open, unrated
//!
//! Requirement 105 is an open labor posting of `OTHER_FARMER` in village 3.

use std::str::FromStr;

use chrono::NaiveDate;
use sqlx::{types::BigDecimal, PgPool};

use crate::{
    db::{profiledb::ProfileExt, DBClient, UserExt},
    dtos::biddtos::CreateBidDto,
    models::profilemodel::Actor,
};

pub const FARMER: &str = "9000000001";
pub const OTHER_FARMER: &str = "9000000002";
pub const LABOR: &str = "9000000011";
pub const FAR_LABOR: &str = "9000000012";
pub const TRACTOR: &str = "9000000021";
pub const GHOST: &str = "9000000031";

const SEED: &str = r#"
INSERT INTO users (id, first_name, last_name, username, password, role) VALUES
    ('00000000-0000-0000-0000-000000000001', 'Ramesh', 'Bhalodiya', '9000000001', 'x', 'farmer'),
    ('00000000-0000-0000-0000-000000000002', 'Kanji', 'Vala', '9000000002', 'x', 'farmer'),
    ('00000000-0000-0000-0000-000000000011', 'Suresh', 'Patel', '9000000011', 'x', 'labor'),
    ('00000000-0000-0000-0000-000000000012', 'Mina', 'Rathod', '9000000012', 'x', 'labor'),
    ('00000000-0000-0000-0000-000000000021', 'Vikram', 'Singh', '9000000021', 'x', 'tractor'),
    ('00000000-0000-0000-0000-000000000031', 'Nobody', '', '9000000031', 'x', 'labor');

INSERT INTO village (id, village_name) VALUES (1, 'Rampur'), (2, 'Sonpur'), (3, 'Dungri');

INSERT INTO area (id, village_id, area_name, area_type) VALUES
    (11, 1, 'Rampur North', 'inside'),
    (12, 1, 'Rampur Canal', 'outside'),
    (21, 2, 'Sonpur East', 'inside'),
    (31, 3, 'Dungri Hill', 'inside');

INSERT INTO skill (id, skill_name, skill_type, hourly, per_day) VALUES
    (1, 'Harvesting', 'labor', TRUE, TRUE);
INSERT INTO skill (id, skill_name, skill_type, per_bigha, lump_sump) VALUES
    (2, 'Ploughing', 'tractor', TRUE, TRUE);

INSERT INTO farmer (id, user_id, contact_number) VALUES
    (1, '00000000-0000-0000-0000-000000000001', '9000000001'),
    (2, '00000000-0000-0000-0000-000000000002', '9000000002');
INSERT INTO farmer_villages (farmer_id, village_id) VALUES (1, 1), (1, 2), (2, 3);
INSERT INTO farmer_areas (farmer_id, area_id) VALUES (1, 11), (1, 12), (1, 21), (2, 31);

INSERT INTO labor (id, user_id, village_id, area_id, contact_number, hourly_rate, gender) VALUES
    (1, '00000000-0000-0000-0000-000000000011', 1, 11, '9000000011', 300, 'male'),
    (2, '00000000-0000-0000-0000-000000000012', 3, 31, '9000000012', 250, 'female');

INSERT INTO tractor (id, user_id, contact_number) VALUES
    (1, '00000000-0000-0000-0000-000000000021', '9000000021');
INSERT INTO tractor_villages (tractor_id, village_id) VALUES (1, 1), (1, 2);
INSERT INTO tractor_skill (tractor_id, skill_id) VALUES (1, 2);

INSERT INTO requirement
    (id, title, description, area_id, skill_id, farmer_id, land_size, from_date, to_date, shift, is_open, farmer_rating)
VALUES
    (101, 'Wheat harvest', 'North field', 11, 1, 1, 4, '2025-03-01', '2025-03-05', 'morning', TRUE, 4.0),
    (102, 'Cotton picking', 'East field', 21, 1, 1, 2, '2025-03-10', '2025-03-12', 'fullday', TRUE, 4.2),
    (103, 'Ploughing', 'Canal plot', 12, 2, 1, 6, '2025-04-01', '2025-04-02', 'anytime', TRUE, 3.0),
    (104, 'Weeding', 'Old plot', 11, 1, 1, 1, '2025-01-01', '2025-01-02', 'evening', FALSE, NULL),
    (105, 'Groundnut harvest', 'Hill plot', 31, 1, 2, 3, '2025-03-01', '2025-03-03', 'morning', TRUE, NULL),
    (106, 'Sowing', 'North field', 11, 1, 1, 4, '2025-05-01', '2025-05-03', 'morning', TRUE, NULL);

SELECT setval('requirement_id_seq', 1000);
SELECT setval('bid_id_seq', 1000);
"#;

pub async fn seed(pool: &PgPool) {
    sqlx::raw_sql(SEED).execute(pool).await.unwrap();
}

pub async fn actor(db: &DBClient, username: &str) -> Actor {
    let user = db.get_user(None, Some(username)).await.unwrap().unwrap();
    db.get_actor(&user).await.unwrap()
}

/// A per-day labor bid, valid against the `Harvesting` skill.
pub fn labor_bid(requirement: i64) -> CreateBidDto {
    CreateBidDto {
        requirement,
        description: "Team of four".to_string(),
        hourly: None,
        lump_sump: None,
        per_bigha: None,
        per_day: Some(BigDecimal::from_str("450.00").unwrap()),
        per_weight: None,
        date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
        male_labors: Some(2),
        female_labors: Some(2),
    }
}
