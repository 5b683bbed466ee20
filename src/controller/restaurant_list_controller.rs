use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use crate::controller::AppState;
use crate::helpers::error::AppError;
use crate::models::restaurant::PlaceResult;
use crate::models::restaurant_list::{ListDetails, RestaurantList, DEFAULT_LIST_COLOR};
use crate::repositories::postgres_repo::PostgresConnectionRepo;

pub fn router(app_state: AppState) -> Router {
    let postgres_repo = Arc::new(PostgresConnectionRepo::new(
        app_state.postgres_connection
    ));

    Router::new()
        .route("/", get(retrieve_user_lists).post(create_list))
        .route("/:list_id", get(retrieve_list).put(update_list).delete(delete_list))
        .route("/:list_id/restaurants", get(retrieve_list_restaurants).post(add_restaurant_to_list))
        .route("/:list_id/restaurants/:restaurant_id", delete(remove_restaurant_from_list))
        .route_layer(Extension(postgres_repo))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct OwnerQuery {
    pub user_id: String,
}

/// Private lists are only visible to their owner, anyone may view public ones.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ViewerQuery {
    pub user_id: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ListBody {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub color_theme: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AddToListBody {
    pub user_id: String,
    pub restaurant: PlaceResult,
}

fn parse_list_details(body: ListBody) -> Result<(String, ListDetails), AppError> {
    if body.user_id.trim().is_empty() {
        return Err(AppError::InvalidInput("user_id is required".to_string()));
    }

    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("List name is required".to_string()));
    }

    let description = body
        .description
        .map(|description| description.trim().to_string())
        .filter(|description| !description.is_empty());

    let color_theme = body
        .color_theme
        .filter(|color| !color.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_LIST_COLOR.to_string());

    Ok((
        body.user_id,
        ListDetails {
            name,
            description,
            color_theme,
            is_public: body.is_public,
        },
    ))
}

fn visible_to(list: &RestaurantList, viewer: Option<&str>) -> bool {
    list.is_public || viewer == Some(list.user_id.as_str())
}

async fn find_visible_list(
    postgres_repo: &PostgresConnectionRepo,
    list_id: i64,
    viewer: Option<&str>,
) -> Result<RestaurantList, AppError> {
    let list = postgres_repo
        .retrieve_list(list_id)
        .await
        .map_err(|e| AppError::upstream("retrieving list", e))?;

    match list {
        Some(list) if visible_to(&list, viewer) => Ok(list),
        _ => Err(AppError::NotFound("List")),
    }
}

pub async fn create_list(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Json(body): Json<ListBody>,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, details) = parse_list_details(body)?;

    let list_id = postgres_repo
        .create_list(&user_id, &details)
        .await
        .map_err(|e| AppError::upstream("creating list", e))?;

    info!("User {} created list {} ({})", user_id, details.name, list_id);
    Ok((StatusCode::CREATED, Json(json!({ "id": list_id }))))
}

pub async fn retrieve_user_lists(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let lists = postgres_repo
        .retrieve_user_lists(&query.user_id)
        .await
        .map_err(|e| AppError::upstream("retrieving lists", e))?;

    Ok((StatusCode::OK, Json(lists)))
}

pub async fn retrieve_list(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(list_id): Path<i64>,
    Query(query): Query<ViewerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = find_visible_list(&postgres_repo, list_id, query.user_id.as_deref()).await?;
    Ok((StatusCode::OK, Json(list)))
}

pub async fn update_list(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(list_id): Path<i64>,
    Json(body): Json<ListBody>,
) -> Result<impl IntoResponse, AppError> {
    let (user_id, details) = parse_list_details(body)?;

    let updated = postgres_repo
        .update_list(list_id, &user_id, &details)
        .await
        .map_err(|e| AppError::upstream("updating list", e))?;

    if !updated {
        return Err(AppError::NotFound("List"));
    }
    Ok((StatusCode::OK, "Successfully updated list"))
}

pub async fn delete_list(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(list_id): Path<i64>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let deleted = postgres_repo
        .delete_list(list_id, &query.user_id)
        .await
        .map_err(|e| AppError::upstream("deleting list", e))?;

    if !deleted {
        return Err(AppError::NotFound("List"));
    }
    Ok((StatusCode::OK, "Successfully deleted list"))
}

pub async fn retrieve_list_restaurants(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(list_id): Path<i64>,
    Query(query): Query<ViewerQuery>,
) -> Result<impl IntoResponse, AppError> {
    find_visible_list(&postgres_repo, list_id, query.user_id.as_deref()).await?;

    let restaurants = postgres_repo
        .retrieve_list_restaurants(list_id)
        .await
        .map_err(|e| AppError::upstream("retrieving list restaurants", e))?;

    Ok((StatusCode::OK, Json(restaurants)))
}

pub async fn add_restaurant_to_list(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path(list_id): Path<i64>,
    Json(body): Json<AddToListBody>,
) -> Result<impl IntoResponse, AppError> {
    if body.restaurant.name.trim().is_empty() {
        return Err(AppError::InvalidInput("Restaurant name is required".to_string()));
    }

    let list = find_visible_list(&postgres_repo, list_id, Some(body.user_id.as_str())).await?;
    if list.user_id != body.user_id {
        return Err(AppError::NotFound("List"));
    }

    let restaurant_id = postgres_repo
        .find_or_create_restaurant(&body.restaurant)
        .await
        .map_err(|e| AppError::upstream("resolving restaurant for list", e))?;

    let added = postgres_repo
        .add_restaurant_to_list(list_id, restaurant_id)
        .await
        .map_err(|e| AppError::upstream("adding restaurant to list", e))?;

    if !added {
        return Err(AppError::AlreadyInList);
    }

    info!("Added {} to list {}", body.restaurant.name, list.name);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "list_id": list_id, "restaurant_id": restaurant_id })),
    ))
}

pub async fn remove_restaurant_from_list(
    Extension(postgres_repo): Extension<Arc<PostgresConnectionRepo>>,
    Path((list_id, restaurant_id)): Path<(i64, i64)>,
    Query(query): Query<OwnerQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = find_visible_list(&postgres_repo, list_id, Some(query.user_id.as_str())).await?;
    if list.user_id != query.user_id {
        return Err(AppError::NotFound("List"));
    }

    let removed = postgres_repo
        .remove_restaurant_from_list(list_id, restaurant_id)
        .await
        .map_err(|e| AppError::upstream("removing restaurant from list", e))?;

    if !removed {
        return Err(AppError::NotFound("Restaurant"));
    }
    Ok((StatusCode::OK, "Successfully removed restaurant from list"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use time::macros::datetime;
    use crate::config::Config;
    use crate::controller::{router_endpoints, AppState};
    use crate::controller::test_support::*;
    use crate::repositories::postgres_repo::{migrated_test_pool, unique_suffix};
    use super::*;

    fn list_body(name: &str) -> ListBody {
        ListBody {
            user_id: "user-1".to_string(),
            name: name.to_string(),
            description: Some("  ".to_string()),
            color_theme: None,
            is_public: false,
        }
    }

    fn stored_list(is_public: bool) -> RestaurantList {
        RestaurantList {
            id: 3,
            user_id: "owner".to_string(),
            name: "Brunch".to_string(),
            description: None,
            color_theme: DEFAULT_LIST_COLOR.to_string(),
            is_public,
            created_at: datetime!(2024-01-01 0:00 UTC),
            item_count: 0,
        }
    }

    #[test]
    fn list_details_are_trimmed_and_defaulted() {
        let (user_id, details) = parse_list_details(list_body("  Date night ")).unwrap();
        assert_eq!(user_id, "user-1");
        assert_eq!(details.name, "Date night");
        assert_eq!(details.description, None);
        assert_eq!(details.color_theme, DEFAULT_LIST_COLOR);
        assert!(!details.is_public);
    }

    #[test]
    fn private_lists_are_only_visible_to_their_owner() {
        let private = stored_list(false);
        assert!(visible_to(&private, Some("owner")));
        assert!(!visible_to(&private, Some("someone-else")));
        assert!(!visible_to(&private, None));

        let public = stored_list(true);
        assert!(visible_to(&public, None));
    }

    #[tokio::test]
    #[ignore = "needs a postgres database at DATABASE_URL"]
    async fn membership_changes_are_owner_only_and_unique() {
        let pool = migrated_test_pool().await;
        let router = || router_endpoints(AppState::new(pool.clone(), Config::for_tests("http://localhost")));
        let suffix = unique_suffix();
        let owner = format!("owner-{}", suffix);
        let stranger = format!("stranger-{}", suffix);
        let restaurant = json!({ "name": format!("Lucali {}", suffix), "address": "575 Henry St" });

        let (status, created) = send(
            router(),
            json_request("POST", "/lists", json!({ "user_id": owner, "name": "Pizza" })),
        ).await;
        assert_eq!(status, StatusCode::CREATED);
        let list_id = created["id"].as_i64().unwrap();
        let items_uri = format!("/lists/{}/restaurants", list_id);

        let (status, _) = send(
            router(),
            json_request("POST", &items_uri, json!({ "user_id": stranger, "restaurant": restaurant })),
        ).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, added) = send(
            router(),
            json_request("POST", &items_uri, json!({ "user_id": owner, "restaurant": restaurant })),
        ).await;
        assert_eq!(status, StatusCode::CREATED);
        let restaurant_id = added["restaurant_id"].as_i64().unwrap();

        let (status, body) = send(
            router(),
            json_request("POST", &items_uri, json!({ "user_id": owner, "restaurant": restaurant })),
        ).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "This restaurant is already in the selected list");

        let remove_uri = |user: &str| format!("{}/{}?user_id={}", items_uri, restaurant_id, user);
        let (status, _) = send(router(), empty_request("DELETE", &remove_uri(&stranger))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(router(), empty_request("DELETE", &remove_uri(&owner))).await;
        assert_eq!(status, StatusCode::OK);

        // private list reads as missing to anyone else
        let (status, _) = send(
            router(),
            empty_request("GET", &format!("/lists/{}?user_id={}", list_id, stranger)),
        ).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rejects_blank_list_name() {
        let router = test_router(Config::for_tests("http://localhost"));
        let (status, body) = send(
            router,
            json_request("POST", "/lists", json!({ "user_id": "user-1", "name": "   " })),
        ).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "List name is required");
    }
}
