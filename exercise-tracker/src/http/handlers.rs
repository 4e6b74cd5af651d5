use axum::extract::{Path, Query, State};
use axum::http::header::HeaderName;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::store::{ExerciseFilter, NewExercise};

use super::error::ApiError;
use super::extract::FormOrJson;
use super::requests::{
    parse_duration, parse_limit, parse_optional_date, resolve_date, LogQuery, NewExerciseForm,
    NewUserForm,
};
use super::responses::{
    CreatedExerciseResponse, CreatedUserResponse, ExerciseLogResponse, HealthResponse, UserEntry,
};
use super::state::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let landing_page = ServeFile::new(state.static_dir.join("index.html"));
    let public_assets = ServeDir::new(&state.public_dir);
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route_service("/", landing_page)
        .route("/health", get(health))
        .route("/api/users", post(create_user).get(list_users))
        .route("/api/users/{id}/exercises", post(create_exercise))
        .route("/api/users/{id}/logs", get(exercise_log))
        .fallback_service(public_assets)
        .layer(cors)
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(REQUEST_ID_HEADER),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            REQUEST_ID_HEADER,
        )))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// The lookup and the insert are separate store calls; a concurrent request
/// that slips between them is refused by the store's own uniqueness check and
/// answered the same way.
async fn create_user(
    State(state): State<AppState>,
    FormOrJson(form): FormOrJson<NewUserForm>,
) -> Result<Json<CreatedUserResponse>, ApiError> {
    let username = form
        .username
        .filter(|username| !username.is_empty())
        .ok_or(ApiError::UsernameRequired)?;

    if state.store.find_user_by_username(&username).await?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let user = state.store.insert_user(&username).await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(Json(CreatedUserResponse::from(user)))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserEntry>>, ApiError> {
    let users = state.store.list_users().await?;
    debug!(users = users.len(), "users listed");
    Ok(Json(users.into_iter().map(UserEntry::from).collect()))
}

async fn create_exercise(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    FormOrJson(form): FormOrJson<NewExerciseForm>,
) -> Result<Json<CreatedExerciseResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_id(&user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let new_exercise = NewExercise {
        user_id: user.id.clone(),
        username: user.username.clone(),
        description: form.description.unwrap_or_default(),
        duration: parse_duration(form.duration)?,
        date: resolve_date(form.date, Utc::now())?,
    };
    let exercise = state.store.insert_exercise(new_exercise).await?;
    info!(
        user_id = %user.id,
        exercise_id = %exercise.id,
        duration = exercise.duration,
        "exercise logged"
    );

    Ok(Json(CreatedExerciseResponse::new(user, exercise)))
}

async fn exercise_log(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<LogQuery>,
) -> Result<Json<ExerciseLogResponse>, ApiError> {
    let user = state
        .store
        .find_user_by_id(&user_id)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    let filter = ExerciseFilter {
        from: parse_optional_date(query.from.as_deref())?,
        to: parse_optional_date(query.to.as_deref())?,
        limit: parse_limit(query.limit.as_deref())?,
        ..ExerciseFilter::for_user(user.id.clone())
    };
    let exercises = state.store.find_exercises(&filter).await?;
    debug!(
        user_id = %user.id,
        from = ?filter.from,
        to = ?filter.to,
        limit = ?filter.limit,
        count = exercises.len(),
        "exercise log requested"
    );

    Ok(Json(ExerciseLogResponse::new(user, exercises)))
}
