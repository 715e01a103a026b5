//! User accounts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::store::{Record, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for User {
    fn id(&self) -> u64 {
        self.id
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.email.to_lowercase())
    }
}

/// Canonical input for a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Two example accounts used when sample seeding is enabled.
pub fn sample_users() -> Vec<User> {
    let now = Utc::now();
    vec![
        User {
            id: 1,
            name: "John Doe".into(),
            email: "john@example.com".into(),
            created_at: now,
            updated_at: now,
        },
        User {
            id: 2,
            name: "Jane Smith".into(),
            email: "jane@example.com".into(),
            created_at: now,
            updated_at: now,
        },
    ]
}

fn store_error(err: StoreError) -> DomainError {
    match err {
        StoreError::NotFound(_) => DomainError::NotFound("User not found".into()),
        StoreError::Duplicate(_) => DomainError::Conflict("Email already exists".into()),
    }
}

pub struct UserService {
    store: Arc<dyn Store<User>>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store<User>>) -> Self {
        Self { store }
    }

    /// All users, optionally filtered by a case-insensitive match on name or email.
    pub fn list(&self, search: Option<&str>) -> Vec<User> {
        let users = self.store.list();
        match search.map(str::to_lowercase) {
            Some(needle) => users
                .into_iter()
                .filter(|u| {
                    u.name.to_lowercase().contains(&needle) || u.email.to_lowercase().contains(&needle)
                })
                .collect(),
            None => users,
        }
    }

    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn get(&self, id: u64) -> Result<User, DomainError> {
        self.store
            .get(id)
            .ok_or_else(|| DomainError::NotFound("User not found".into()))
    }

    pub fn create(&self, input: NewUser) -> Result<User, DomainError> {
        let now = Utc::now();
        let user = self
            .store
            .insert(Box::new(move |id: u64| User {
                id,
                name: input.name,
                email: input.email,
                created_at: now,
                updated_at: now,
            }))
            .map_err(store_error)?;

        tracing::info!(user_id = user.id, "User created");
        Ok(user)
    }

    pub fn update(&self, id: u64, changes: UserChanges) -> Result<User, DomainError> {
        let user = self
            .store
            .update(
                id,
                Box::new(move |user: &mut User| {
                    if let Some(name) = changes.name {
                        user.name = name;
                    }
                    if let Some(email) = changes.email {
                        user.email = email;
                    }
                    user.updated_at = Utc::now();
                }),
            )
            .map_err(store_error)?;

        tracing::info!(user_id = user.id, "User updated");
        Ok(user)
    }

    pub fn delete(&self, id: u64) -> Result<User, DomainError> {
        let user = self.store.delete(id).map_err(store_error)?;
        tracing::info!(user_id = user.id, "User deleted");
        Ok(user)
    }
}
