use async_trait::async_trait;
use sqlx::{Error, PgConnection};
use uuid::Uuid;

use super::DBClient;
use crate::{
    dtos::biddtos::CreateBidDto,
    models::{
        marketmodel::{Bid, BidComment},
        profilemodel::Actor,
    },
    service::visibility::{self, Bidder},
};

const BID_COLUMNS: &str = r#"
    id, requirement_id, labor_id, tractor_id, description,
    hourly, lump_sump, per_bigha, per_day, per_weight,
    date, male_labors, female_labors, is_accepted_by_farmer, is_accepted_by_labor"#;

#[async_trait]
pub trait BidExt {
    async fn list_bids(&self, actor: &Actor, bid_id: Option<i64>) -> Result<Vec<Bid>, Error>;

    async fn get_bid(&self, bid_id: i64) -> Result<Option<Bid>, Error>;

    async fn get_requirement_bids(&self, requirement_id: i64) -> Result<Vec<Bid>, Error>;

    async fn set_farmer_acceptance(&self, bid_id: i64, accepted: bool) -> Result<Bid, Error>;

    async fn set_bidder_acceptance(&self, bid_id: i64, accepted: bool) -> Result<Bid, Error>;

    async fn get_bid_comments(&self, bid_id: i64) -> Result<Vec<BidComment>, Error>;

    async fn add_bid_comment(
        &self,
        bid_id: i64,
        posted_by: Uuid,
        comment: String,
    ) -> Result<BidComment, Error>;
}

#[async_trait]
impl BidExt for DBClient {
    async fn list_bids(&self, actor: &Actor, bid_id: Option<i64>) -> Result<Vec<Bid>, Error> {
        let mut qb = visibility::bid_listing(actor, bid_id);
        qb.build_query_as::<Bid>().fetch_all(&self.pool).await
    }

    async fn get_bid(&self, bid_id: i64) -> Result<Option<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!("SELECT {} FROM bid WHERE id = $1", BID_COLUMNS))
            .bind(bid_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_requirement_bids(&self, requirement_id: i64) -> Result<Vec<Bid>, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            "SELECT {} FROM bid WHERE requirement_id = $1 ORDER BY id",
            BID_COLUMNS
        ))
        .bind(requirement_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn set_farmer_acceptance(&self, bid_id: i64, accepted: bool) -> Result<Bid, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            "UPDATE bid SET is_accepted_by_farmer = $2 WHERE id = $1 RETURNING {}",
            BID_COLUMNS
        ))
        .bind(bid_id)
        .bind(accepted)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_bidder_acceptance(&self, bid_id: i64, accepted: bool) -> Result<Bid, Error> {
        sqlx::query_as::<_, Bid>(&format!(
            "UPDATE bid SET is_accepted_by_labor = $2 WHERE id = $1 RETURNING {}",
            BID_COLUMNS
        ))
        .bind(bid_id)
        .bind(accepted)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_bid_comments(&self, bid_id: i64) -> Result<Vec<BidComment>, Error> {
        sqlx::query_as::<_, BidComment>(
            r#"
            SELECT id, bid_id, comment, posted_by, created_at
            FROM bid_comment
            WHERE bid_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(bid_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn add_bid_comment(
        &self,
        bid_id: i64,
        posted_by: Uuid,
        comment: String,
    ) -> Result<BidComment, Error> {
        sqlx::query_as::<_, BidComment>(
            r#"
            INSERT INTO bid_comment (bid_id, comment, posted_by)
            VALUES ($1, $2, $3)
            RETURNING id, bid_id, comment, posted_by, created_at
            "#,
        )
        .bind(bid_id)
        .bind(comment)
        .bind(posted_by)
        .fetch_one(&self.pool)
        .await
    }
}

/// Whether `bidder` already holds a bid on the requirement.
pub async fn has_bid(
    conn: &mut PgConnection,
    requirement_id: i64,
    bidder: Bidder,
) -> Result<bool, Error> {
    sqlx::query_scalar::<_, bool>(&format!(
        "SELECT EXISTS(SELECT 1 FROM bid WHERE requirement_id = $1 AND {} = $2)",
        bidder.column()
    ))
    .bind(requirement_id)
    .bind(bidder.id())
    .fetch_one(conn)
    .await
}

/// Inserts a bid attributed to `bidder` inside an open transaction.
pub async fn insert_bid(
    conn: &mut PgConnection,
    bidder: Bidder,
    body: &CreateBidDto,
) -> Result<Bid, Error> {
    let (labor_id, tractor_id) = match bidder {
        Bidder::Labor(id) => (Some(id), None),
        Bidder::Tractor(id) => (None, Some(id)),
    };

    sqlx::query_as::<_, Bid>(&format!(
        r#"
        INSERT INTO bid
        (requirement_id, labor_id, tractor_id, description,
         hourly, lump_sump, per_bigha, per_day, per_weight,
         date, male_labors, female_labors)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {}
        "#,
        BID_COLUMNS
    ))
    .bind(body.requirement)
    .bind(labor_id)
    .bind(tractor_id)
    .bind(&body.description)
    .bind(&body.hourly)
    .bind(&body.lump_sump)
    .bind(&body.per_bigha)
    .bind(&body.per_day)
    .bind(&body.per_weight)
    .bind(body.date)
    .bind(body.male_labors)
    .bind(body.female_labors)
    .fetch_one(conn)
    .await
}
