//! Record storage.
//!
//! # Responsibilities
//! - Assign monotonically increasing ids
//! - Enforce per-collection uniqueness keys
//! - Make every read-check-write sequence atomic
//!
//! # Design Decisions
//! - Storage is behind the [`Store`] trait so services never see the backend
//! - Mutations take closures and run them while the collection is locked,
//!   so a uniqueness check and the write it guards cannot interleave with
//!   another request
//! - A failed mutation leaves the collection untouched

pub mod memory;

pub use memory::InMemoryStore;

use thiserror::Error;

/// A storable record.
pub trait Record: Clone + Send + Sync + 'static {
    fn id(&self) -> u64;

    /// Value that must be unique across the collection, if any.
    fn unique_key(&self) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("record {0} not found")]
    NotFound(u64),

    #[error("duplicate key '{0}'")]
    Duplicate(String),
}

/// A collection of records of one kind.
pub trait Store<T: Record>: Send + Sync {
    /// Snapshot of every record in insertion order.
    fn list(&self) -> Vec<T>;

    fn get(&self, id: u64) -> Option<T>;

    /// Build a record with the next id and insert it.
    ///
    /// `build` must stamp the id it is given. The id is consumed only when
    /// the insert succeeds.
    fn insert<'a>(&self, build: Box<dyn FnOnce(u64) -> T + 'a>) -> Result<T, StoreError>;

    /// Apply `change` to a copy of record `id` and commit it if the result
    /// still satisfies the uniqueness key.
    fn update<'a>(&self, id: u64, change: Box<dyn FnOnce(&mut T) + 'a>) -> Result<T, StoreError>;

    fn delete(&self, id: u64) -> Result<T, StoreError>;

    fn len(&self) -> usize {
        self.list().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
