//! Catalog domain: records, their services and domain failures.
//!
//! # Data Flow
//! ```text
//! validated input (api)
//!     → UserService / ProductService
//!     → Store (atomic mutation)
//!     → record or DomainError
//! ```

pub mod error;
pub mod product;
pub mod user;

pub use error::{parse_id, DomainError};
pub use product::{NewProduct, Product, ProductChanges, ProductFilter, ProductService, SortField, SortOrder};
pub use user::{NewUser, User, UserChanges, UserService};
