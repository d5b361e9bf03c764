use std::sync::Arc;

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use chrono::{TimeZone, Utc};
use validator::Validate;

use crate::{
    db::{profiledb::ProfileExt, UserExt},
    dtos::{AccessTokenDto, LoginDto, RefreshDto, RegisterDto, Response, TokenResponseDto},
    error::{ErrorMessage, HttpError},
    extract::JsonBody,
    handler::users::build_profile,
    service::error::ServiceError,
    utils::{
        password,
        token::{self, TokenType},
    },
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/token", post(login))
        .route("/token/refresh", post(refresh))
        .route("/logout", post(logout))
}

fn token_cookie(value: String, max_age_minutes: i64) -> Result<HeaderMap, HttpError> {
    let cookie = Cookie::build(("token", value))
        .path("/")
        .max_age(time::Duration::minutes(max_age_minutes))
        .http_only(true)
        .build();

    let mut headers = HeaderMap::new();
    headers.append(
        header::SET_COOKIE,
        cookie
            .to_string()
            .parse()
            .map_err(|_| HttpError::server_error(ErrorMessage::ServerError.to_string()))?,
    );
    Ok(headers)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<RegisterDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    app_state.registration_service.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(Response {
            status: "success",
            message: "User registered successfully.".to_string(),
        }),
    ))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<LoginDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.username))
        .await?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;
    if !password_matched {
        return Err(HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()));
    }

    let user_id = user.id.to_string();
    let secret = app_state.env.jwt_secret.as_bytes();
    let access = token::create_token(&user_id, secret, app_state.env.jwt_maxage, TokenType::Access)
        .map_err(|e| ServiceError::Other(e.to_string()))?;
    let refresh = token::create_token(
        &user_id,
        secret,
        app_state.env.jwt_refresh_maxage,
        TokenType::Refresh,
    )
    .map_err(|e| ServiceError::Other(e.to_string()))?;

    let actor = app_state
        .db_client
        .get_actor(&user)
        .await?;
    let profile = build_profile(&app_state, &user, &actor).await?;

    let headers = token_cookie(access.clone(), app_state.env.jwt_maxage)?;

    tracing::info!(user_id = %user.id, role = actor.role_name(), "user logged in");

    let mut response = Json(TokenResponseDto {
        status: "success".to_string(),
        access,
        refresh,
        user: profile,
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}

pub async fn refresh(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<RefreshDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let secret = app_state.env.jwt_secret.as_bytes();
    let claims = token::decode_token(body.refresh, secret, TokenType::Refresh)?;

    let revoked = app_state
        .db_client
        .is_token_revoked(claims.jti)
        .await?;
    if revoked {
        return Err(HttpError::unauthorized(ErrorMessage::TokenRevoked.to_string()));
    }

    let access = token::create_token(&claims.sub, secret, app_state.env.jwt_maxage, TokenType::Access)
        .map_err(|e| ServiceError::Other(e.to_string()))?;

    Ok(Json(AccessTokenDto {
        status: "success".to_string(),
        access,
    }))
}

pub async fn logout(
    Extension(app_state): Extension<Arc<AppState>>,
    JsonBody(body): JsonBody<RefreshDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate().map_err(HttpError::validation)?;

    let claims = token::decode_token(
        body.refresh,
        app_state.env.jwt_secret.as_bytes(),
        TokenType::Refresh,
    )?;
    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;
    let expires_at = Utc
        .timestamp_opt(claims.exp as i64, 0)
        .single()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    app_state
        .db_client
        .revoke_token(claims.jti, user_id, expires_at)
        .await?;

    tracing::info!(user_id = %user_id, "refresh token revoked");

    let headers = token_cookie(String::new(), -1)?;
    let mut response = Json(Response {
        status: "success",
        message: "Logged out successfully.".to_string(),
    })
    .into_response();
    response.headers_mut().extend(headers);

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_cookie_is_http_only() {
        let headers = token_cookie("abc".to_string(), 60).unwrap();
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("token=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }
}
