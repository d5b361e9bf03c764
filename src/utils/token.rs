use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorMessage, HttpError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: Uuid,
    pub token_type: TokenType,
}

/// Signs a token for `user_id` that expires after `expires_in_minutes`.
pub fn create_token(
    user_id: &str,
    secret: &[u8],
    expires_in_minutes: i64,
    token_type: TokenType,
) -> Result<String, jsonwebtoken::errors::Error> {
    if user_id.is_empty() {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidSubject.into());
    }

    let now = Utc::now();
    let iat = now.timestamp() as usize;
    let exp = (now + Duration::minutes(expires_in_minutes)).timestamp() as usize;
    let claims = TokenClaims {
        sub: user_id.to_string(),
        iat,
        exp,
        jti: Uuid::new_v4(),
        token_type,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}

pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &[u8],
    expected: TokenType,
) -> Result<TokenClaims, HttpError> {
    let decoded = decode::<TokenClaims>(
        &token.into(),
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    );

    match decoded {
        Ok(token) if token.claims.token_type == expected => Ok(token.claims),
        _ => Err(HttpError::unauthorized(ErrorMessage::InvalidToken.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    #[test]
    fn access_token_round_trip() {
        let user_id = Uuid::new_v4().to_string();
        let token = create_token(&user_id, SECRET, 60, TokenType::Access).unwrap();
        let claims = decode_token(token, SECRET, TokenType::Access).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let token = create_token("abc", SECRET, 60, TokenType::Refresh).unwrap();
        assert!(decode_token(token.clone(), SECRET, TokenType::Access).is_err());
        assert!(decode_token(token, SECRET, TokenType::Refresh).is_ok());
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let expired = create_token("abc", SECRET, -10, TokenType::Access).unwrap();
        assert!(decode_token(expired, SECRET, TokenType::Access).is_err());

        let foreign = create_token("abc", b"other-secret", 60, TokenType::Access).unwrap();
        assert!(decode_token(foreign, SECRET, TokenType::Access).is_err());
    }

    #[test]
    fn empty_subject_is_refused() {
        assert!(create_token("", SECRET, 60, TokenType::Access).is_err());
    }
}
