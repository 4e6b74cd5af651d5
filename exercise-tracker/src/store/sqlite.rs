use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use super::{
    new_id, validate_username, Exercise, ExerciseFilter, NewExercise, Store, StoreError, User,
};

/// `seq` columns preserve insertion order; `username` is unique so the store
/// refuses a duplicate even when two requests pass the handler's check at once.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS exercises (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id TEXT NOT NULL UNIQUE,
        user_id TEXT NOT NULL,
        username TEXT NOT NULL,
        description TEXT NOT NULL,
        duration REAL NOT NULL,
        date_ms INTEGER NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS exercises_user_date ON exercises (user_id, date_ms)",
];

const EXERCISE_COLUMNS: &str = "id, user_id, username, description, duration, date_ms";

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `database_url` and applies
    /// the schema.
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        debug!("sqlite schema ready");

        Ok(Self { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, username FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, username FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn insert_user(&self, username: &str) -> Result<User, StoreError> {
        validate_username(username)?;

        let user = User {
            id: new_id(),
            username: username.to_string(),
        };
        sqlx::query("INSERT INTO users (id, username) VALUES (?, ?)")
            .bind(&user.id)
            .bind(&user.username)
            .execute(&self.pool)
            .await
            .map_err(|error| match error {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateUsername
                }
                other => StoreError::Database(other),
            })?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let rows = sqlx::query("SELECT id, username FROM users ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(user_from_row).collect()
    }

    async fn insert_exercise(&self, exercise: NewExercise) -> Result<Exercise, StoreError> {
        exercise.validate()?;

        let exercise = exercise.into_exercise(new_id());
        sqlx::query(
            "INSERT INTO exercises (id, user_id, username, description, duration, date_ms)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&exercise.id)
        .bind(&exercise.user_id)
        .bind(&exercise.username)
        .bind(&exercise.description)
        .bind(exercise.duration)
        .bind(exercise.date.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(exercise)
    }

    async fn find_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE user_id = "
        ));
        query.push_bind(filter.user_id.clone());
        if let Some(from) = filter.from {
            query.push(" AND date_ms >= ").push_bind(from.timestamp_millis());
        }
        if let Some(to) = filter.to {
            query.push(" AND date_ms <= ").push_bind(to.timestamp_millis());
        }
        query.push(" ORDER BY seq");
        if let Some(limit) = filter.limit {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            query.push(" LIMIT ").push_bind(limit);
        }

        let rows = query.build().fetch_all(&self.pool).await?;
        rows.iter().map(exercise_from_row).collect()
    }
}

/// Dates are stored as epoch milliseconds, which orders numerically and
/// covers every year chrono can represent.
fn decode_date(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Corrupt(format!("exercise date out of range: {millis}")))
}

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
    })
}

fn exercise_from_row(row: &SqliteRow) -> Result<Exercise, StoreError> {
    let date_ms: i64 = row.try_get("date_ms")?;
    Ok(Exercise {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
        description: row.try_get("description")?,
        duration: row.try_get("duration")?,
        date: decode_date(date_ms)?,
    })
}
