//! # Data Retrieval Module
//!
//! Request/response side of the dashboard.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: generic JSON `ApiClient` on `reqwest` and
//!   `reqwest-middleware`, with optional exponential-backoff retries.
//! - **`gateway`**: `HttpGateway`, the `CommandGateway` used in production.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// HTTP implementation of the command gateway.
pub mod gateway;
/// Generic HTTP API client with optional retry middleware.
pub mod ky_http;

pub use gateway::HttpGateway;
pub use ky_http::{ApiClient, ApiResponse};
