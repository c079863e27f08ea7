//! HTTP inspection subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (add or keep x-request-id)
//!     → registry lookup (route resolution or dry-run navigation)
//!     → JSON report
//! ```

pub mod request;
pub mod server;

pub use request::{RequestIdLayer, UuidRequestId, X_REQUEST_ID};
pub use server::{InspectorServer, NavigateRequest, NavigateResponse, RoutesResponse};
