use std::sync::Arc;
use axum::{Extension, Json};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use crate::discovery::filter::ResultFilter;
use crate::discovery::query::normalize_search;
use crate::helpers::error::AppError;
use crate::repositories::google_places_repo::GooglePlacesRepo;

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SearchRestaurantsBody {
    pub query: Option<String>,
    /// Cuisine to browse when no free-text query is given.
    pub category: Option<String>,
    /// Kept untyped so a malformed coordinate gets a reason code instead of
    /// an extractor rejection.
    pub location: Option<Value>,
    #[serde(flatten)]
    pub filter: ResultFilter,
}

/// Validate the search, forward it to the places API, then narrow the results
/// with the caller's rating and price thresholds.
pub async fn search_restaurants(
    Extension(places_repo): Extension<Arc<GooglePlacesRepo>>,
    Json(body): Json<SearchRestaurantsBody>,
) -> impl IntoResponse {
    let raw_query = body.query.as_deref().or(body.category.as_deref());
    let normalized = match normalize_search(raw_query, body.location.as_ref()) {
        Ok(normalized) => normalized,
        Err(e) => {
            warn!("Rejected restaurant search due to: {}", e);
            return AppError::from(e).into_response();
        }
    };

    let search_res = places_repo
        .search_restaurants(&normalized)
        .await;

    match search_res {
        Ok(restaurants) => {
            let total_results = restaurants.len();
            let restaurants = body.filter.apply(restaurants);
            info!(
                "Found {} restaurants, {} after filtering (filters active: {})",
                total_results,
                restaurants.len(),
                body.filter.is_active()
            );

            (
                StatusCode::OK,
                Json(json!({
                    "restaurants": restaurants,
                    "total_results": total_results,
                    "filters": body.filter,
                })),
            ).into_response()
        }
        Err(e) => AppError::upstream("searching for restaurants", e).into_response(),
    }
}
