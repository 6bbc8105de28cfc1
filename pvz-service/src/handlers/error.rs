use axum::response::{IntoResponse, Response};
use service_core::error::AppError;

/// Error returned by the pickup point, reception and product endpoints.
///
/// Lifecycle conflicts (reception already open, already closed, closed
/// reception mutated) answer 400 on HTTP. Every other kind keeps the
/// shared `AppError` mapping; gRPC goes through `IntoStatus` and is
/// unaffected.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            AppError::Conflict(err) => AppError::BadRequest(err).into_response(),
            other => other.into_response(),
        }
    }
}
