use std::sync::Arc;

use axum::{
    extract::{Path, Query},
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
        requirementdtos::{
            CreateRequirementDto, HireDto, RateFarmerDto, RequirementQueryDto, UpdateRequirementDto,
        },
        ApiResponse, Response,
    },
    error::HttpError,
    extract::JsonBody,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    AppState,
};

pub fn requirements_handler() -> Router {
    Router::new()
        .route(
            "/requirements",
            get(list_requirements).post(create_requirement.layer(middleware::from_fn(
                |state, req, next| role_check(state, req, next, vec![UserRole::Farmer]),
            ))),
        )
        .route(
            "/requirements/:requirement_id",
            get(get_requirement)
                .put(replace_requirement.layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Farmer])
                })))
                .patch(patch_requirement.layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Farmer])
                })))
                .delete(delete_requirement.layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Farmer])
                }))),
        )
        .route(
            "/requirements/:requirement_id/close",
            put(close_requirement).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Farmer])
            })),
        )
        .route(
            "/requirements/:requirement_id/hire",
            put(hire_bidder).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Farmer])
            })),
        )
        .route(
            "/requirements/:requirement_id/bids",
            get(requirement_bids).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Farmer])
            })),
        )
        .route(
            "/requirements/:requirement_id/rating",
            put(rate_farmer).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Labor, UserRole::Tractor])
            })),
        )
        .route("/my-requirements", get(my_requirements))
}

pub async fn list_requirements(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Query(params): Query<RequirementQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let requirements = app_state
        .requirement_service
        .list_requirements(&auth.actor, &params)
        .await?;

    Ok(Json(ApiResponse::success(
        "Requirements retrieved successfully",
        requirements,
    )))
}

pub async fn get_requirement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let requirement = app_state
        .requirement_service
        .get_requirement(&auth.actor, requirement_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Requirement retrieved successfully",
        requirement,
    )))
}

pub async fn create_requirement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    JsonBody(body): JsonBody<CreateRequirementDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let requirement = app_state
        .requirement_service
        .create_requirement(&auth.actor, body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Requirement created successfully",
            requirement,
        )),
    ))
}

async fn update_requirement(
    app_state: Arc<AppState>,
    auth: JWTAuthMiddeware,
    requirement_id: i64,
    body: UpdateRequirementDto,
    replace: bool,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let requirement = app_state
        .requirement_service
        .update_requirement(&auth.actor, requirement_id, body, replace)
        .await?;

    Ok(Json(ApiResponse::success(
        "Requirement updated successfully",
        requirement,
    )))
}

pub async fn replace_requirement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
    JsonBody(body): JsonBody<UpdateRequirementDto>,
) -> Result<impl IntoResponse, HttpError> {
    update_requirement(app_state, auth, requirement_id, body, true).await
}

pub async fn patch_requirement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
    JsonBody(body): JsonBody<UpdateRequirementDto>,
) -> Result<impl IntoResponse, HttpError> {
    update_requirement(app_state, auth, requirement_id, body, false).await
}

pub async fn delete_requirement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    app_state
        .requirement_service
        .delete_requirement(&auth.actor, requirement_id)
        .await?;

    Ok(Json(Response {
        status: "success",
        message: "Requirement deleted successfully".to_string(),
    }))
}

pub async fn close_requirement(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let requirement = app_state
        .requirement_service
        .close_requirement(&auth.actor, requirement_id)
        .await?;

    Ok(Json(ApiResponse::success(
        "Requirement closed successfully",
        requirement,
    )))
}

pub async fn hire_bidder(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
    JsonBody(body): JsonBody<HireDto>,
) -> Result<impl IntoResponse, HttpError> {
    let requirement = app_state
        .requirement_service
        .hire(&auth.actor, requirement_id, body.bid_id)
        .await?;

    Ok(Json(ApiResponse::success("Bidder hired successfully", requirement)))
}

pub async fn requirement_bids(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let bids = app_state
        .requirement_service
        .requirement_bids(&auth.actor, requirement_id)
        .await?;

    Ok(Json(ApiResponse::success("Bids retrieved successfully", bids)))
}

pub async fn rate_farmer(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(requirement_id): Path<i64>,
    JsonBody(body): JsonBody<RateFarmerDto>,
) -> Result<impl IntoResponse, HttpError> {
    let requirement = app_state
        .requirement_service
        .rate_farmer(&auth.actor, requirement_id, &body.farmer_rating)
        .await?;

    Ok(Json(ApiResponse::success("Rating saved successfully", requirement)))
}

pub async fn my_requirements(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let requirements = app_state.requirement_service.my_requirements(&auth.actor).await?;

    Ok(Json(ApiResponse::success(
        "Requirements retrieved successfully",
        requirements,
    )))
}
