//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (CORS preflight, security response headers)
//!     → rate_limit.rs (per-client fixed window)
//!     → limits.rs (declared body size)
//!     → validation gate
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Rejections are plain `ApiError`s, rendered by the error normalizer

pub mod headers;
pub mod limits;
pub mod rate_limit;

pub use rate_limit::RateLimiter;
