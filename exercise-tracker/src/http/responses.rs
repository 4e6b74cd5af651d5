use serde::{Serialize, Serializer};

use crate::dates::to_date_string;
use crate::store::{Exercise, User};

/// Largest magnitude at which every integer is exactly representable in f64.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub username: String,
    #[serde(rename = "_id")]
    pub id: String,
}

impl From<User> for CreatedUserResponse {
    fn from(user: User) -> Self {
        Self {
            username: user.username,
            id: user.id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
}

impl From<User> for UserEntry {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// `_id` is the owning user's id, not the exercise's.
#[derive(Debug, Serialize)]
pub struct CreatedExerciseResponse {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub username: String,
    pub description: String,
    #[serde(serialize_with = "serialize_minutes")]
    pub duration: f64,
    pub date: String,
}

impl CreatedExerciseResponse {
    pub fn new(user: User, exercise: Exercise) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            date: to_date_string(&exercise.date),
            description: exercise.description,
            duration: exercise.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub description: String,
    #[serde(serialize_with = "serialize_minutes")]
    pub duration: f64,
    pub date: String,
}

impl From<Exercise> for LogEntry {
    fn from(exercise: Exercise) -> Self {
        Self {
            date: to_date_string(&exercise.date),
            description: exercise.description,
            duration: exercise.duration,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExerciseLogResponse {
    pub username: String,
    pub count: usize,
    #[serde(rename = "_id")]
    pub user_id: String,
    pub log: Vec<LogEntry>,
}

impl ExerciseLogResponse {
    pub fn new(user: User, exercises: Vec<Exercise>) -> Self {
        let log: Vec<LogEntry> = exercises.into_iter().map(LogEntry::from).collect();
        Self {
            username: user.username,
            count: log.len(),
            user_id: user.id,
            log,
        }
    }
}

/// Whole minutes render as JSON integers (`30`), the rest as floats (`12.5`).
fn serialize_minutes<S: Serializer>(minutes: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if minutes.fract() == 0.0 && minutes.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*minutes as i64)
    } else {
        serializer.serialize_f64(*minutes)
    }
}
