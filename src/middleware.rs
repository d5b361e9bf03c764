use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::{profiledb::ProfileExt, UserExt},
    error::{ErrorMessage, HttpError},
    models::{
        profilemodel::Actor,
        usermodel::{User, UserRole},
    },
    utils::token::{self, TokenType},
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddeware {
    pub user: User,
    pub actor: Actor,
}

/// Pulls the access token from the `token` cookie or a Bearer header.
pub fn extract_token(cookie_jar: &CookieJar, req: &Request) -> Option<String> {
    cookie_jar
        .get("token")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|auth_header| auth_header.to_str().ok())
                .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
                .map(|token| token.to_owned())
        })
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    let token = extract_token(&cookie_jar, &req)
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::TokenNotProvided.to_string()))?;

    let claims = token::decode_token(
        token,
        app_state.env.jwt_secret.as_bytes(),
        TokenType::Access,
    )?;

    if app_state
        .db_client
        .is_token_revoked(claims.jti)
        .await?
    {
        return Err(HttpError::unauthorized(ErrorMessage::TokenRevoked.to_string()));
    }

    let user_id = uuid::Uuid::parse_str(&claims.sub)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None)
        .await?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    let actor = app_state
        .db_client
        .get_actor(&user)
        .await?;

    if matches!(actor, Actor::Unknown) {
        tracing::warn!(user_id = %user.id, role = user.role.to_str(), "user has no role profile");
    }

    req.extensions_mut().insert(JWTAuthMiddeware { user, actor });

    Ok(next.run(req).await)
}

pub async fn role_check(
    Extension(_app_state): Extension<Arc<AppState>>,
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddeware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required_roles.contains(&user.user.role) {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn token_comes_from_cookie_before_header() {
        let jar = CookieJar::new().add(Cookie::new("token", "from-cookie"));
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&jar, &req).as_deref(), Some("from-cookie"));

        let req = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-header")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_token(&CookieJar::new(), &req).as_deref(), Some("from-header"));
    }

    #[test]
    fn non_bearer_header_is_ignored() {
        let req = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert!(extract_token(&CookieJar::new(), &req).is_none());
    }
}
