//! Persistence for users and exercises.
//!
//! Handlers talk to the [`Store`] trait only. Two implementations exist:
//! [`SqliteStore`] for real deployments and [`MemoryStore`] for tests and
//! throwaway instances (`database_url = "memory"`).

mod memory;
mod sqlite;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Value of `database_url` that selects the in-memory store.
pub const MEMORY_URL: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub user_id: String,
    /// Copy of the owner's username at creation time.
    pub username: String,
    pub description: String,
    /// Minutes.
    pub duration: f64,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExercise {
    pub user_id: String,
    pub username: String,
    pub description: String,
    pub duration: f64,
    pub date: DateTime<Utc>,
}

impl NewExercise {
    /// Required-field checks applied by every store before insert.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.user_id.is_empty() {
            return Err(StoreError::Validation(String::from("userId is required")));
        }
        if self.username.is_empty() {
            return Err(StoreError::Validation(String::from("username is required")));
        }
        if self.description.is_empty() {
            return Err(StoreError::Validation(String::from(
                "description is required",
            )));
        }
        if !self.duration.is_finite() {
            return Err(StoreError::Validation(String::from(
                "duration must be a number",
            )));
        }
        Ok(())
    }

    fn into_exercise(self, id: String) -> Exercise {
        Exercise {
            id,
            user_id: self.user_id,
            username: self.username,
            description: self.description,
            duration: self.duration,
            date: self.date,
        }
    }
}

/// Selects one user's exercises, optionally bounded by date (inclusive on
/// both ends) and capped in count. Results keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExerciseFilter {
    pub user_id: String,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl ExerciseFilter {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn matches(&self, exercise: &Exercise) -> bool {
        exercise.user_id == self.user_id
            && self.from.map_or(true, |from| exercise.date >= from)
            && self.to.map_or(true, |to| exercise.date <= to)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("username already exists")]
    DuplicateUsername,
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

#[async_trait]
pub trait Store: Send + Sync + std::fmt::Debug {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a user with a fresh id. Fails with
    /// [`StoreError::DuplicateUsername`] if the name is already taken.
    async fn insert_user(&self, username: &str) -> Result<User, StoreError>;

    /// All users in insertion order.
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;

    async fn insert_exercise(&self, exercise: NewExercise) -> Result<Exercise, StoreError>;

    async fn find_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError>;
}

/// Opens the store named by `database_url`.
pub async fn connect(
    database_url: &str,
    acquire_timeout: Duration,
) -> Result<Arc<dyn Store>, StoreError> {
    if database_url == MEMORY_URL {
        info!("using in-memory store; data is lost on exit");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = SqliteStore::connect(database_url, acquire_timeout).await?;
    Ok(Arc::new(store))
}

fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn validate_username(username: &str) -> Result<(), StoreError> {
    if username.is_empty() {
        return Err(StoreError::Validation(String::from("username is required")));
    }
    Ok(())
}
