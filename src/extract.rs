use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::HttpError;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";
const SYNTAX_ERROR_PREFIX: &str = "Failed to parse the request body as JSON: ";

/// `Json<T>` whose rejections come back as our 400 error body, keyed by the
/// offending field where serde reports one.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = HttpError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_error(rejection)),
        }
    }
}

fn rejection_error(rejection: JsonRejection) -> HttpError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let text = err.body_text();
            let detail = text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(&text);
            let (field, message) = field_message(detail);
            HttpError::field(&field, message)
        }
        JsonRejection::JsonSyntaxError(err) => {
            let text = err.body_text();
            let detail = text.strip_prefix(SYNTAX_ERROR_PREFIX).unwrap_or(&text);
            HttpError::bad_request(format!("JSON parse error - {}", strip_position(detail)))
        }
        JsonRejection::MissingJsonContentType(err) => {
            HttpError::new(err.body_text(), StatusCode::UNSUPPORTED_MEDIA_TYPE)
        }
        other => HttpError::bad_request(other.body_text()),
    }
}

/// Splits `path: message` as reported by serde. Missing fields carry no path
/// of their own, so the field name is read from the message.
fn field_message(detail: &str) -> (String, String) {
    let (path, message) = match detail.split_once(": ") {
        Some((path, rest)) if is_path(path) => (Some(path), rest),
        _ => (None, detail),
    };
    let message = strip_position(message);

    if let Some(missing) = missing_field(message) {
        let field = match path {
            Some(path) => format!("{}.{}", root_field(path), missing),
            None => missing.to_string(),
        };
        return (field, "This field is required.".to_string());
    }

    let field = path.map(root_field).unwrap_or("non_field_errors");
    (field.to_string(), capitalize(message))
}

fn is_path(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}

fn root_field(path: &str) -> &str {
    path.split(['.', '[']).next().unwrap_or(path)
}

fn missing_field(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    rest.split('`').next()
}

fn strip_position(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(index) => &message[..index],
        None => message,
    }
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::{
        biddtos::CreateBidDto, requirementdtos::CreateRequirementDto, RegisterDto,
    };
    use axum::{body::Body, http::header};

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn reject<T: DeserializeOwned>(body: &str) -> HttpError {
        match JsonBody::<T>::from_request(json_request(body), &()).await {
            Ok(_) => panic!("body was accepted: {}", body),
            Err(err) => err,
        }
    }

    #[test]
    fn serde_paths_are_reduced_to_the_top_level_field() {
        assert_eq!(
            field_message("missing field `full_name` at line 1 column 42"),
            ("full_name".to_string(), "This field is required.".to_string())
        );
        assert_eq!(
            field_message("village_ids[0]: invalid type: string \"one\", expected i64 at line 1 column 20"),
            (
                "village_ids".to_string(),
                "Invalid type: string \"one\", expected i64".to_string()
            )
        );
        assert_eq!(
            field_message("expected value").0,
            "non_field_errors".to_string()
        );
    }

    #[tokio::test]
    async fn register_without_full_name_names_the_field() {
        let err = reject::<RegisterDto>(
            r#"{"phone_number":"9876543210","password":"secret1","role":"labor"}"#,
        )
        .await;
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let fields = err.fields.unwrap();
        assert_eq!(fields["full_name"], vec!["This field is required.".to_string()]);
    }

    #[tokio::test]
    async fn register_with_text_village_ids_names_the_list() {
        let err = reject::<RegisterDto>(
            r#"{"full_name":"A","phone_number":"9876543210","password":"secret1","role":"farmer","village_ids":["one"]}"#,
        )
        .await;
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.fields.unwrap().contains_key("village_ids"));
    }

    #[tokio::test]
    async fn requirement_with_bad_date_names_the_field() {
        let err = reject::<CreateRequirementDto>(
            r#"{"title":"Harvest","description":"Wheat","area":1,"skill":1,"land_size":"2.5","from_date":"soon","to_date":"2025-05-02","shift":"morning"}"#,
        )
        .await;
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.fields.unwrap().contains_key("from_date"));
    }

    #[tokio::test]
    async fn bid_without_requirement_names_the_field() {
        let err = reject::<CreateBidDto>(r#"{"hourly":"100","date":"2025-05-01"}"#).await;
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.fields.unwrap().contains_key("requirement"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let err = reject::<CreateBidDto>(r#"{"requirement":"#).await;
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("JSON parse error"));
        assert!(err.fields.is_none());
    }

    #[tokio::test]
    async fn well_formed_bid_is_extracted() {
        let JsonBody(body) = JsonBody::<CreateBidDto>::from_request(
            json_request(r#"{"requirement":3,"hourly":"100","date":"2025-05-01"}"#),
            &(),
        )
        .await
        .map_err(|e| e.message)
        .unwrap();
        assert_eq!(body.requirement, 3);
    }
}
