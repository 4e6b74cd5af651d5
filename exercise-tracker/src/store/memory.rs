use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    new_id, validate_username, Exercise, ExerciseFilter, NewExercise, Store, StoreError, User,
};

/// Process-local store backed by two ordered collections.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    exercises: RwLock<Vec<Exercise>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.username == username).cloned())
    }

    async fn insert_user(&self, username: &str) -> Result<User, StoreError> {
        validate_username(username)?;

        let mut users = self.users.write().await;
        if users.iter().any(|user| user.username == username) {
            return Err(StoreError::DuplicateUsername);
        }
        let user = User {
            id: new_id(),
            username: username.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.read().await.clone())
    }

    async fn insert_exercise(&self, exercise: NewExercise) -> Result<Exercise, StoreError> {
        exercise.validate()?;

        let exercise = exercise.into_exercise(new_id());
        self.exercises.write().await.push(exercise.clone());
        Ok(exercise)
    }

    async fn find_exercises(&self, filter: &ExerciseFilter) -> Result<Vec<Exercise>, StoreError> {
        let exercises = self.exercises.read().await;
        let matching = exercises.iter().filter(|exercise| filter.matches(exercise));
        let found = match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        };
        Ok(found)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::dates::parse_date;

    fn new_exercise(user: &User, date: &str) -> NewExercise {
        NewExercise {
            user_id: user.id.clone(),
            username: user.username.clone(),
            description: String::from("swim"),
            duration: 45.0,
            date: parse_date(date).unwrap(),
        }
    }

    #[tokio::test]
    async fn duplicate_usernames_are_refused() {
        let store = MemoryStore::new();
        store.insert_user("alice").await.unwrap();

        let second = store.insert_user("alice").await;
        assert!(matches!(second, Err(StoreError::DuplicateUsername)));
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn users_list_in_insertion_order() {
        let store = MemoryStore::new();
        for name in ["carol", "alice", "bob"] {
            store.insert_user(name).await.unwrap();
        }

        let names: Vec<String> = store
            .list_users()
            .await
            .unwrap()
            .into_iter()
            .map(|user| user.username)
            .collect();
        assert_eq!(names, ["carol", "alice", "bob"]);
    }

    #[tokio::test]
    async fn lookups_miss_cleanly() {
        let store = MemoryStore::new();
        assert_eq!(store.find_user_by_id("nope").await.unwrap(), None);
        assert_eq!(store.find_user_by_username("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_exercises_applies_range_and_limit() {
        let store = MemoryStore::new();
        let alice = store.insert_user("alice").await.unwrap();
        let bob = store.insert_user("bob").await.unwrap();
        for date in ["2024-01-01", "2024-01-10", "2024-01-20", "2024-02-01"] {
            store.insert_exercise(new_exercise(&alice, date)).await.unwrap();
        }
        store
            .insert_exercise(new_exercise(&bob, "2024-01-10"))
            .await
            .unwrap();

        let filter = ExerciseFilter {
            from: Some(parse_date("2024-01-05").unwrap()),
            to: Some(parse_date("2024-01-31").unwrap()),
            ..ExerciseFilter::for_user(alice.id.clone())
        };
        let found = store.find_exercises(&filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|exercise| exercise.user_id == alice.id));

        let capped = ExerciseFilter {
            limit: Some(1),
            ..filter
        };
        let found = store.find_exercises(&capped).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].date, parse_date("2024-01-10").unwrap());
    }

    #[tokio::test]
    async fn invalid_exercises_are_not_persisted() {
        let store = MemoryStore::new();
        let alice = store.insert_user("alice").await.unwrap();
        let blank = NewExercise {
            user_id: alice.id.clone(),
            username: alice.username.clone(),
            description: String::new(),
            duration: 10.0,
            date: Utc::now(),
        };

        assert!(store.insert_exercise(blank).await.is_err());
        let all = store
            .find_exercises(&ExerciseFilter::for_user(alice.id))
            .await
            .unwrap();
        assert!(all.is_empty());
    }
}
