use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use crate::controller::AppState;
use crate::controller::google_places_api::search_restaurants;
use crate::helpers::error::AppError;
use crate::repositories::postgres_repo::PostgresConnectionRepo;

pub fn router(app_state: AppState) -> Router {
    let postgres_repo = Arc::new(PostgresConnectionRepo::new(
        app_state.postgres_connection
    ));

    Router::new()
        .route("/search", post(search_restaurants))
        .route("/:restaurant_id", get(retrieve_restaurant))
        .route_layer(Extension(postgres_repo))
        .route_layer(Extension(app_state.places_repo))
}

pub async fn retrieve_restaurant(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(restaurant_id): Path<i64>,
) -> impl IntoResponse {
    let restaurant_res = postgres_repo
        .retrieve_restaurant(restaurant_id)
        .await;

    match restaurant_res {
        Ok(Some(restaurant)) => (StatusCode::OK, Json(restaurant)).into_response(),
        Ok(None) => AppError::NotFound("Restaurant").into_response(),
        Err(e) => AppError::upstream("retrieving restaurant", e).into_response(),
    }
}
