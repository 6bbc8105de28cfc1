//! gRPC interceptors for cross-cutting concerns.

use tonic::{Request, Status};

/// gRPC metadata key for request ID.
pub const REQUEST_ID_KEY: &str = "x-request-id";

/// Record the caller's request id (if any) on the current span.
#[allow(clippy::result_large_err)]
pub fn trace_context_interceptor(request: Request<()>) -> Result<Request<()>, Status> {
    if let Some(request_id) = extract_request_id(&request) {
        tracing::Span::current().record("request_id", request_id.as_str());
        tracing::debug!(request_id = %request_id, "Received gRPC call");
    }

    Ok(request)
}

/// Extract request ID from incoming gRPC request metadata.
pub fn extract_request_id<T>(request: &Request<T>) -> Option<String> {
    request
        .metadata()
        .get(REQUEST_ID_KEY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
