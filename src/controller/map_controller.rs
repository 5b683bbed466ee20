use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};
use crate::config::Config;
use crate::controller::AppState;
use crate::discovery::map_locations::merge_map_locations;
use crate::helpers::error::AppError;
use crate::repositories::postgres_repo::PostgresConnectionRepo;

pub fn router(app_state: AppState) -> Router {
    let postgres_repo = Arc::new(PostgresConnectionRepo::new(
        app_state.postgres_connection
    ));

    Router::new()
        .route("/token", get(issue_map_token))
        .route("/locations", get(retrieve_map_locations))
        .route_layer(Extension(postgres_repo))
        .route_layer(Extension(app_state.config))
}

/// Hands the public map tile token to the client so it can initialise the map.
pub async fn issue_map_token(
    Extension(config): Extension<Arc<Config>>,
) -> impl IntoResponse {
    match &config.mapbox_public_token {
        Some(token) => (StatusCode::OK, Json(json!({ "token": token }))).into_response(),
        None => {
            warn!("Map token requested but MAPBOX_PUBLIC_TOKEN is not configured");
            AppError::NotConfigured("Mapbox token not configured").into_response()
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct MapLocationsQuery {
    pub user_id: String,
}

pub async fn retrieve_map_locations(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Query(query): Query<MapLocationsQuery>,
) -> impl IntoResponse {
    let sources_res = futures::try_join!(
        postgres_repo.retrieve_visit_points(&query.user_id),
        postgres_repo.retrieve_list_points(&query.user_id),
    );

    match sources_res {
        Ok((visits, list_items)) => {
            let locations = merge_map_locations(visits, list_items);
            debug!("Resolved {} map locations for user: {}", locations.len(), query.user_id);
            (StatusCode::OK, Json(locations)).into_response()
        }
        Err(e) => AppError::upstream("loading map locations", e).into_response(),
    }
}
