//! Request-scoped middleware that is not part of a larger subsystem.

pub mod logging;

pub use logging::log_requests;
