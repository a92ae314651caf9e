use serde::Serialize;
use thiserror::Error;

use crate::http::{HttpResponse, HttpResponseBuilder, HttpStatusCode, JSON_CONTENT_TYPE};

/// Everything the movie API can answer with instead of a success.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body is not a JSON object, or was not sent as JSON.
    #[error("{0}")]
    UnsupportedMediaType(String),

    /// The body parsed but the movie it describes is not acceptable.
    #[error("{message}")]
    Validation { message: String, details: Vec<String> },

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    /// Answered with a plain message rather than the structured body.
    #[error("method not supported")]
    MethodNotAllowed,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub error: &'a str,
    pub details: &'a [String],
}

impl ApiError {
    pub fn status(&self) -> HttpStatusCode {
        match self {
            ApiError::UnsupportedMediaType(_) => HttpStatusCode::UnsupportedMediaType,
            ApiError::Validation { .. } => HttpStatusCode::UnprocessableEntity,
            ApiError::BadRequest(_) => HttpStatusCode::BadRequest,
            ApiError::NotFound(_) => HttpStatusCode::NotFound,
            ApiError::MethodNotAllowed => HttpStatusCode::MethodNotAllowed,
            ApiError::Internal(_) => HttpStatusCode::InternalServerError,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let builder = HttpResponseBuilder::new()
            .set_status(self.status())
            .set_content_type(JSON_CONTENT_TYPE);

        if let ApiError::MethodNotAllowed = self {
            return builder.set_text_body("Method not supported").build();
        }

        let message = match &self {
            ApiError::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        };
        let details: &[String] = match &self {
            ApiError::Validation { details, .. } => details,
            _ => &[],
        };
        let body = ErrorBody {
            error: &message,
            details,
        };

        match builder.set_json_body(&body) {
            Ok(builder) => builder.build(),
            Err(_) => HttpResponseBuilder::new()
                .set_status(HttpStatusCode::InternalServerError)
                .set_content_type(JSON_CONTENT_TYPE)
                .set_text_body(&message)
                .build(),
        }
    }
}
