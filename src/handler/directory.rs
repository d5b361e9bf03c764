use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};

use crate::{
    db::directorydb::DirectoryExt,
    dtos::{
        directorydtos::{AreaQueryDto, SkillQueryDto},
        ApiResponse,
    },
    error::HttpError,
    models::directorymodel::Area,
    AppState,
};

pub fn directory_handler() -> Router {
    Router::new()
        .route("/villages", get(get_villages))
        .route("/villages/:village_id", get(get_village))
        .route("/areas", get(get_areas))
        .route("/areas/:area_id", get(get_area))
        .route("/skills", get(get_skills))
        .route("/skills/:skill_id", get(get_skill))
}

pub async fn get_villages(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let villages = app_state
        .db_client
        .get_villages()
        .await?;

    Ok(Json(ApiResponse::success("Villages retrieved successfully", villages)))
}

pub async fn get_village(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(village_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let village = app_state
        .db_client
        .get_village(village_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Village not found"))?;

    Ok(Json(ApiResponse::success("Village retrieved successfully", village)))
}

/// Areas are only listed for one village; without `village_id` the list is empty.
pub async fn get_areas(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<AreaQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let village_id = params
        .village_id()
        .map_err(|message| HttpError::field("village_id", message))?;

    let areas: Vec<Area> = match village_id {
        Some(village_id) => app_state
            .db_client
            .get_areas_in_village(village_id)
            .await?,
        None => Vec::new(),
    };

    Ok(Json(ApiResponse::success("Areas retrieved successfully", areas)))
}

pub async fn get_area(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(area_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let area = app_state
        .db_client
        .get_area(area_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Area not found"))?;

    Ok(Json(ApiResponse::success("Area retrieved successfully", area)))
}

pub async fn get_skills(
    Extension(app_state): Extension<Arc<AppState>>,
    Query(params): Query<SkillQueryDto>,
) -> Result<impl IntoResponse, HttpError> {
    let skills = app_state
        .db_client
        .get_skills(params.skill_type())
        .await?;

    Ok(Json(ApiResponse::success("Skills retrieved successfully", skills)))
}

pub async fn get_skill(
    Extension(app_state): Extension<Arc<AppState>>,
    Path(skill_id): Path<i64>,
) -> Result<impl IntoResponse, HttpError> {
    let skill = app_state
        .db_client
        .get_skill(skill_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Skill not found"))?;

    Ok(Json(ApiResponse::success("Skill retrieved successfully", skill)))
}
