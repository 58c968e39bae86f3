use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Every failure a handler can report. The body for each variant is fixed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request")]
    BadRequest,
    #[error("resource not found")]
    NotFound,
    #[error("unprocessable request")]
    Unprocessable,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    ServerError(String),
}

pub type ApiResponse<T> = Result<Json<T>, ApiError>;

#[derive(Serialize, Debug, PartialEq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: &'static str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(_) | ApiError::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        let status = self.status();
        let message = match status {
            StatusCode::BAD_REQUEST => "Access Denied (Bad Request)",
            StatusCode::NOT_FOUND => "Resource not found",
            StatusCode::UNPROCESSABLE_ENTITY => "Unprocessable",
            _ => "Internal Server Error",
        };
        ErrorBody {
            success: false,
            error: status.as_u16(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Database(_) | ApiError::ServerError(_) => {
                tracing::error!(error = %self, "Request failed")
            }
            _ => tracing::debug!(error = %self, "Request rejected"),
        }
        (self.status(), Json(self.body())).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Invalid json body: {}", rejection.body_text());
        ApiError::Unprocessable
    }
}

// ids in the path are integers, anything else is an unknown resource
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("Invalid path: {}", rejection.body_text());
        ApiError::NotFound
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!("Invalid query: {}", rejection.body_text());
        ApiError::BadRequest
    }
}
