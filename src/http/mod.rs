//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID set and propagated)
//!     → middleware/metrics.rs (per-route counters and latency)
//!     → handlers.rs (validate, status, stats, liveness)
//!     → response.rs / crate::error (status code and JSON body)
//! ```

pub mod handlers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id_layers, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::ValidationResponse;
pub use server::{AppState, HttpServer};
