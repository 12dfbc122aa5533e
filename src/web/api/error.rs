use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::PredictError;
use crate::propagate::PropagationError;

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    NotFound(u32),
    Propagation(PropagationError),
    Predict(PredictError),
}

impl From<PropagationError> for ApiError {
    fn from(e: PropagationError) -> Self {
        ApiError::Propagation(e)
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::Propagation { source, .. } => ApiError::Propagation(source),
            PredictError::HorizonOutOfRange(_) => ApiError::Validation(e.to_string()),
            _ => ApiError::Predict(e),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Propagation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Predict(PredictError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Predict(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(msg) => ErrorResponse::with_message("validation_failed", &msg),
            ApiError::NotFound(id) => {
                ErrorResponse::with_message("satellite_not_found", &format!("NORAD {id}"))
            }
            ApiError::Propagation(e) => {
                ErrorResponse::with_message("propagation_failed", &e.to_string())
            }
            ApiError::Predict(e) => ErrorResponse::with_message("prediction_failed", &e.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
