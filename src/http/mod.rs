//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (router, middleware stack, graceful shutdown)
//!     → request.rs (request ID)
//!     → middleware/ (logging, metrics)
//!     → api handlers
//!     → error.rs (failure → envelope)
//!     → response.rs (envelope serialization)
//! ```

pub mod error;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use error::ApiError;
pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{ApiResponse, Envelope, Pagination};
pub use server::{AppState, HttpServer};
