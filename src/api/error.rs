//! Handler error type and its HTTP mapping
//!
//! | variant      | status | body                           |
//! |--------------|--------|--------------------------------|
//! | NotFound     | 400    | `{"msg": …}`                   |
//! | Validation   | 400    | `{"errors": [FieldError, …]}`  |
//! | Unauthorized | 401    | `{"msg": …}`                   |
//! | Upstream     | 404    | `{"msg": "no reddit found"}`   |
//! | Internal     | 500    | `Server Error` (plain text)    |

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use validator::ValidationErrors;

use crate::services::FeedError;

/// One entry of a validation error list
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub location: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<JsonValue>,
}

impl FieldError {
    /// Error about the body as a whole (undecodable JSON, wrong content type)
    pub fn body(msg: impl Into<String>) -> Self {
        Self { location: "body", param: None, msg: msg.into(), value: None }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(&'static str),

    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error(transparent)]
    Upstream(#[from] FeedError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut items: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    location: "body",
                    param: Some(field.to_string()),
                    msg: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                    value: e.params.get("value").cloned(),
                })
            })
            .collect();
        items.sort_by(|a, b| a.param.cmp(&b.param));
        ApiError::Validation(items)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "errors": errors }))).into_response()
            }
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "msg": msg }))).into_response()
            }
            ApiError::Upstream(e) => {
                tracing::error!(error = %e, "Feed request failed");
                (StatusCode::NOT_FOUND, Json(json!({ "msg": "no reddit found" }))).into_response()
            }
            ApiError::Internal(e) => {
                let cause = format!("{:#}", e);
                tracing::error!(error = %cause, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error").into_response()
            }
        }
    }
}
