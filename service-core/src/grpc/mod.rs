//! gRPC utilities shared by the services.
//!
//! - Error conversion between `AppError` and `tonic::Status`
//! - Request-id interceptor for incoming calls

pub mod error;
pub mod interceptors;

pub use error::{GrpcResult, IntoStatus};
pub use interceptors::{extract_request_id, trace_context_interceptor, REQUEST_ID_KEY};

pub use tonic::{Code, Request, Response, Status};
