use std::sync::Arc;

use axum::{response::IntoResponse, routing::get, Extension, Json, Router};

use crate::{
    db::{directorydb::DirectoryExt, profiledb::ProfileExt},
    dtos::{ApiResponse, UserProfileDto},
    error::HttpError,
    middleware::JWTAuthMiddeware,
    models::{profilemodel::Actor, usermodel::User},
    utils::decimal::average_2dp,
    AppState,
};

pub fn users_handler() -> Router {
    Router::new().route("/user-profile", get(get_profile))
}

/// Farmers also get their areas grouped by village and their average rating.
pub async fn build_profile(
    app_state: &AppState,
    user: &User,
    actor: &Actor,
) -> Result<UserProfileDto, HttpError> {
    let (areas, average_rating) = match actor.as_farmer() {
        Some(farmer) => {
            let areas = app_state
                .db_client
                .get_farmer_areas(farmer.id)
                .await?;
            let ratings = app_state
                .db_client
                .get_farmer_ratings(farmer.id)
                .await?;
            (areas, average_2dp(ratings.iter()))
        }
        None => (Vec::new(), None),
    };

    Ok(UserProfileDto::build(user, actor, &areas, average_rating))
}

pub async fn get_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let profile = build_profile(&app_state, &auth.user, &auth.actor).await?;

    Ok(Json(ApiResponse::success("Profile retrieved successfully", profile)))
}
