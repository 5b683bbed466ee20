use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tracing::info;
use crate::controller::AppState;
use crate::discovery::stats::summarize_check_ins;
use crate::helpers::error::AppError;
use crate::models::restaurant::PlaceResult;
use crate::repositories::postgres_repo::PostgresConnectionRepo;

pub const MAX_CHECK_IN_PHOTOS: usize = 5;

pub fn router(app_state: AppState) -> Router {
    let postgres_repo = Arc::new(PostgresConnectionRepo::new(
        app_state.postgres_connection
    ));

    Router::new()
        .route("/", get(retrieve_user_check_ins).post(add_check_in))
        .route("/stats", get(retrieve_user_stats))
        .route("/:check_in_id", put(update_check_in).delete(delete_check_in))
        .route_layer(Extension(postgres_repo))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserQuery {
    pub user_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CheckInsQuery {
    pub user_id: String,
    /// Only return the most recent `limit` check-ins.
    pub limit: Option<i64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AddCheckIn {
    pub user_id: String,
    pub restaurant: PlaceResult,
    pub notes: Option<String>,
    pub rating: Option<i16>,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UpdateCheckIn {
    pub user_id: String,
    pub notes: Option<String>,
    pub rating: Option<i16>,
    pub images: Option<Vec<String>>,
}

fn require_user(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user_id is required".to_string()));
    }
    Ok(())
}

fn validate_rating(rating: Option<i16>) -> Result<(), AppError> {
    match rating {
        Some(rating) if !(1..=5).contains(&rating) => {
            Err(AppError::InvalidInput("Rating must be between 1 and 5".to_string()))
        }
        _ => Ok(()),
    }
}

fn validate_photos(images: &[String]) -> Result<(), AppError> {
    if images.len() > MAX_CHECK_IN_PHOTOS {
        return Err(AppError::InvalidInput(format!(
            "A check-in can have at most {} photos",
            MAX_CHECK_IN_PHOTOS
        )));
    }
    Ok(())
}

/// Blank notes are stored as no notes at all.
fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty())
}

pub async fn add_check_in(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Json(body): Json<AddCheckIn>,
) -> Result<impl IntoResponse, AppError> {
    require_user(&body.user_id)?;
    validate_rating(body.rating)?;
    validate_photos(&body.images)?;
    if body.restaurant.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Restaurant name is required".to_string()));
    }

    let restaurant_id = postgres_repo
        .find_or_create_restaurant(&body.restaurant)
        .await
        .map_err(|e| AppError::upstream("resolving restaurant for check-in", e))?;

    let check_in_id = postgres_repo
        .create_check_in(
            &body.user_id,
            restaurant_id,
            &normalize_notes(body.notes),
            body.rating,
            &body.images,
        )
        .await
        .map_err(|e| AppError::upstream("adding check-in", e))?;

    info!("User {} checked in at {} ({})", body.user_id, body.restaurant.name, check_in_id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": check_in_id, "restaurant_id": restaurant_id })),
    ))
}

pub async fn retrieve_user_check_ins(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Query(query): Query<CheckInsQuery>,
) -> Result<impl IntoResponse, AppError> {
    if matches!(query.limit, Some(limit) if limit < 1) {
        return Err(AppError::InvalidInput("limit must be at least 1".to_string()));
    }

    let check_ins = postgres_repo
        .retrieve_user_check_ins(&query.user_id, query.limit)
        .await
        .map_err(|e| AppError::upstream("retrieving check-ins", e))?;

    Ok((StatusCode::OK, Json(check_ins)))
}

pub async fn retrieve_user_stats(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summaries = postgres_repo
        .retrieve_check_in_summaries(&query.user_id)
        .await
        .map_err(|e| AppError::upstream("retrieving check-in stats", e))?;

    let stats = summarize_check_ins(&summaries, OffsetDateTime::now_utc());
    Ok((StatusCode::OK, Json(stats)))
}

pub async fn update_check_in(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(check_in_id): Path<i64>,
    Json(body): Json<UpdateCheckIn>,
) -> Result<impl IntoResponse, AppError> {
    require_user(&body.user_id)?;
    validate_rating(body.rating)?;
    if let Some(images) = &body.images {
        validate_photos(images)?;
    }

    let updated = postgres_repo
        .update_check_in(
            check_in_id,
            &body.user_id,
            &normalize_notes(body.notes),
            body.rating,
            &body.images,
        )
        .await
        .map_err(|e| AppError::upstream("updating check-in", e))?;

    if !updated {
        return Err(AppError::NotFound("Check-in"));
    }
    Ok((StatusCode::OK, "Successfully updated check-in"))
}

pub async fn delete_check_in(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(check_in_id): Path<i64>,
    Query(query): Query<UserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = postgres_repo
        .delete_check_in(check_in_id, &query.user_id)
        .await
        .map_err(|e| AppError::upstream("deleting check-in", e))?;

    if !deleted {
        return Err(AppError::NotFound("Check-in"));
    }
    Ok((StatusCode::OK, "Successfully removed check-in"))
}
