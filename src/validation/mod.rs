//! Input validation.
//!
//! # Data Flow
//! ```text
//! raw JSON body / query string / path value
//!     → rules.rs (normalize in place, collect field errors)
//!     → gate.rs (reject with 400 or pass canonical input on)
//!     → extract.rs (typed axum extractors built on the gate)
//!     → handler
//! ```
//!
//! # Design Decisions
//! - Rule sets are static, declared next to the endpoint that uses them
//! - A handler behind the gate never runs for invalid input
//! - All field errors are reported at once, in declaration order

pub mod extract;
pub mod gate;
pub mod rules;

pub use extract::{ValidatedJson, ValidatedQuery};
pub use gate::{accept, gate, guard, Validate};
pub use rules::{FieldRule, RuleSet, ValidationError};
