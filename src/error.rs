use std::{collections::BTreeMap, fmt};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::ValidationErrors;

pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", serde_json::to_string(&self).unwrap_or_default())
    }
}

#[derive(Debug, PartialEq)]
pub enum ErrorMessage {
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,
    InvalidToken,
    ServerError,
    WrongCredentials,
    PhoneNumberExist,
    UserNoLongerExist,
    TokenNotProvided,
    TokenRevoked,
    PermissionDenied,
    UserNotAuthenticated,
}

impl ToString for ErrorMessage {
    fn to_string(&self) -> String {
        self.to_str().to_owned()
    }
}

impl ErrorMessage {
    fn to_str(&self) -> String {
        match self {
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
            ErrorMessage::WrongCredentials => "No active account found with the given credentials".to_string(),
            ErrorMessage::PhoneNumberExist => "A user with this phone number already exists".to_string(),
            ErrorMessage::UserNoLongerExist => "User belonging to this token no longer exists".to_string(),
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => format!("Password must not be more than {} characters", max_length),
            ErrorMessage::InvalidToken => "Authentication token is invalid or expired".to_string(),
            ErrorMessage::TokenNotProvided => "You are not logged in, please provide a token".to_string(),
            ErrorMessage::TokenRevoked => "Token has been revoked. Please login again.".to_string(),
            ErrorMessage::PermissionDenied => "You do not have permission to perform this action".to_string(),
            ErrorMessage::UserNotAuthenticated => "Authentication required. Please log in.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
    pub fields: Option<FieldErrors>,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
            fields: None,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::BAD_REQUEST)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::UNAUTHORIZED)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::FORBIDDEN)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        HttpError::new(message, StatusCode::NOT_FOUND)
    }

    /// 400 carrying per-field messages.
    pub fn fields(fields: FieldErrors) -> Self {
        HttpError {
            message: "Invalid input".to_string(),
            status: StatusCode::BAD_REQUEST,
            fields: Some(fields),
        }
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        HttpError::fields(fields)
    }

    pub fn validation(errors: ValidationErrors) -> Self {
        HttpError::fields(field_errors(&errors))
    }

    pub fn into_http_response(self) -> Response {
        let status = if self.status.is_server_error() { "error" } else { "fail" };
        let json_response = Json(ErrorResponse {
            status: status.to_string(),
            message: self.message.clone(),
            errors: self.fields,
        });

        (self.status, json_response).into_response()
    }
}

/// Flattens `validator` output into `field -> [messages]`.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationError;

    #[test]
    fn field_errors_use_message_then_code() {
        let mut errors = ValidationErrors::new();
        let mut with_message = ValidationError::new("required");
        with_message.message = Some("This field is required.".into());
        errors.add("village_ids", with_message);
        errors.add("gender", ValidationError::new("required"));

        let fields = field_errors(&errors);
        assert_eq!(fields["village_ids"], vec!["This field is required.".to_string()]);
        assert_eq!(fields["gender"], vec!["required".to_string()]);
    }

    #[test]
    fn field_error_is_bad_request() {
        let err = HttpError::field("skill_ids", "Contains non-tractor skills.");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.fields.unwrap().contains_key("skill_ids"));
    }
}
