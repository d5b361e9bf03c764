use std::sync::Arc;

use axum::{
    extract::Path,
    handler::Handler,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use validator::Validate;

use crate::{
    dtos::{
        biddtos::{AcceptanceDto, CreateBidDto, CreateCommentDto},
        ApiResponse,
    },
    error::HttpError,
    extract::JsonBody,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn bids_handler() -> Router {
    Router::new()
        .route(
            "/bids",
            get(list_bids).post(create_bid.layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Labor, UserRole::Tractor])
            }))),
        )
        .route("/bids/:bid_id", get(get_bid))
        .route(
            "/bids/:bid_id/bidder-acceptance",
            put(bidder_acceptance).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Labor, UserRole::Tractor])
            })),
        )
        .route(
            "/bids/:bid_id/farmer-acceptance",
            put(farmer_acceptance).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Farmer])
            })),
        )
        .route("/bids/:bid_id/comments", get(list_comments).post(add_comment))
}

pub async fn list_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state.bid_service.list_bids(&auth.actor).await?;

    Ok(Json(ApiResponse::success("Bids retrieved successfully", bids)))
}

pub async fn get_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state.bid_service.get_bid(&auth.actor, bid_id).await?;

    Ok(Json(ApiResponse::success("Bid retrieved successfully", bid)))
}

pub async fn create_bid(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    JsonBody(body): JsonBody<CreateBidDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let bid = app_state.bid_service.create_bid(&auth.actor, body).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Bid placed successfully", bid)),
    ))
}

pub async fn farmer_acceptance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<i64>,
    JsonBody(body): JsonBody<AcceptanceDto>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state
        .bid_service
        .set_farmer_acceptance(&auth.actor, bid_id, body.accepted)
        .await?;

    Ok(Json(ApiResponse::success("Bid updated successfully", bid)))
}

pub async fn bidder_acceptance(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<i64>,
    JsonBody(body): JsonBody<AcceptanceDto>,
) -> Result<impl IntoResponse, HttpError> {
    let bid = app_state
        .bid_service
        .set_bidder_acceptance(&auth.actor, bid_id, body.accepted)
        .await?;

    Ok(Json(ApiResponse::success("Bid updated successfully", bid)))
}

pub async fn list_comments(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let comments = app_state.bid_service.list_comments(&auth.actor, bid_id).await?;

    Ok(Json(ApiResponse::success("Comments retrieved successfully", comments)))
}

pub async fn add_comment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(bid_id): Path<i64>,
    JsonBody(body): JsonBody<CreateCommentDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let comment = app_state
        .bid_service
        .add_comment(&auth.actor, auth.user.id, bid_id, &body.comment)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Comment added successfully", comment)),
    ))
}
