//! Mutex-guarded in-memory collection.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::store::{Record, Store, StoreError};

struct Collection<T> {
    records: Vec<T>,
    next_id: u64,
}

impl<T: Record> Collection<T> {
    fn conflicts(&self, candidate: &T) -> Option<String> {
        let key = candidate.unique_key()?;
        self.records
            .iter()
            .filter(|r| r.id() != candidate.id())
            .any(|r| r.unique_key().as_deref() == Some(key.as_str()))
            .then_some(key)
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }
}

/// In-process store. All state is lost on restart.
pub struct InMemoryStore<T> {
    inner: Mutex<Collection<T>>,
}

impl<T: Record> InMemoryStore<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Start from existing records; new ids continue after the largest one.
    pub fn with_records(records: Vec<T>) -> Self {
        let next_id = records.iter().map(Record::id).max().unwrap_or(0) + 1;
        Self {
            inner: Mutex::new(Collection { records, next_id }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collection<T>> {
        // Mutations commit in a single assignment, so a poisoned guard still
        // holds a consistent collection.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Record> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Store<T> for InMemoryStore<T> {
    fn list(&self) -> Vec<T> {
        self.lock().records.clone()
    }

    fn get(&self, id: u64) -> Option<T> {
        self.lock().records.iter().find(|r| r.id() == id).cloned()
    }

    fn insert<'a>(&self, build: Box<dyn FnOnce(u64) -> T + 'a>) -> Result<T, StoreError> {
        let mut collection = self.lock();
        let record = build(collection.next_id);

        if let Some(key) = collection.conflicts(&record) {
            return Err(StoreError::Duplicate(key));
        }

        collection.next_id = collection.next_id.max(record.id()) + 1;
        collection.records.push(record.clone());
        Ok(record)
    }

    fn update<'a>(&self, id: u64, change: Box<dyn FnOnce(&mut T) + 'a>) -> Result<T, StoreError> {
        let mut collection = self.lock();
        let index = collection.position(id).ok_or(StoreError::NotFound(id))?;

        let mut candidate = collection.records[index].clone();
        change(&mut candidate);

        if let Some(key) = collection.conflicts(&candidate) {
            return Err(StoreError::Duplicate(key));
        }

        collection.records[index] = candidate.clone();
        Ok(candidate)
    }

    fn delete(&self, id: u64) -> Result<T, StoreError> {
        let mut collection = self.lock();
        let index = collection.position(id).ok_or(StoreError::NotFound(id))?;
        Ok(collection.records.remove(index))
    }

    fn len(&self) -> usize {
        self.lock().records.len()
    }
}
