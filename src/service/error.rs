use thiserror::Error;

use crate::{
    error::{ErrorMessage, FieldErrors, HttpError},
    service::filters::FilterError,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Requirement {0} not found")]
    RequirementNotFound(i64),

    #[error("Bid {0} not found")]
    BidNotFound(i64),

    #[error("Cannot update a closed requirement.")]
    RequirementClosed,

    #[error("Cannot update a requirement that already has bids.")]
    RequirementHasBids,

    #[error("Bidding is closed for requirement {0}")]
    BiddingClosed(i64),

    #[error("You have already placed a bid on requirement {0}")]
    DuplicateBid(i64),

    #[error("{0}")]
    Forbidden(String),

    #[error("Invalid input")]
    Fields(FieldErrors),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ServiceError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), vec![message.into()]);
        ServiceError::Fields(fields)
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::RequirementNotFound(_) | ServiceError::BidNotFound(_) => {
                HttpError::not_found(error.to_string())
            }

            ServiceError::RequirementClosed
            | ServiceError::RequirementHasBids
            | ServiceError::BiddingClosed(_)
            | ServiceError::DuplicateBid(_)
            | ServiceError::Validation(_) => HttpError::bad_request(error.to_string()),

            ServiceError::Filter(filter) => HttpError::field(filter.field(), filter.to_string()),

            ServiceError::Fields(fields) => HttpError::fields(fields),

            ServiceError::Forbidden(message) => HttpError::forbidden(message),

            ServiceError::Database(ref e) => {
                tracing::error!("database error: {}", e);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }

            ServiceError::Other(ref message) => {
                tracing::error!("service error: {}", message);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

impl From<sqlx::Error> for HttpError {
    fn from(error: sqlx::Error) -> Self {
        ServiceError::Database(error).into()
    }
}

impl From<HttpError> for ServiceError {
    fn from(error: HttpError) -> Self {
        match error.fields {
            Some(fields) => ServiceError::Fields(fields),
            None if error.status.is_client_error() => ServiceError::Validation(error.message),
            None => ServiceError::Other(error.message),
        }
    }
}
