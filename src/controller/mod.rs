use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use axum::http::HeaderValue;
use axum::Router;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tracing::info;
use crate::config::Config;
use crate::helpers::handler_404::page_not_found_handler;
use crate::repositories::google_places_repo::GooglePlacesRepo;
use crate::repositories::postgres_repo::PostgresPool;

pub mod check_in_controller;
pub mod google_places_api;
pub mod health_check;
pub mod map_controller;
pub mod restaurant_controller;
pub mod restaurant_list_controller;

#[derive(Clone)]
pub struct AppState {
    pub postgres_connection: PostgresPool,
    pub places_repo: Arc<GooglePlacesRepo>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        postgres_connection: PostgresPool,
        config: Config,
    ) -> Self {
        Self {
            postgres_connection,
            places_repo: Arc::new(GooglePlacesRepo::new(&config)),
            config: Arc::new(config),
        }
    }
}

pub async fn serve(
    app_state: AppState,
) -> anyhow::Result<()> {
    let origins = app_state
        .config
        .origin_urls
        .split(',')
        .map(|s| s.trim().parse::<HeaderValue>())
        .collect::<Result<Vec<HeaderValue>, _>>()
        .context("ORIGIN_URLS contains an invalid origin")?;

    let port = SocketAddr::from(([0, 0, 0, 0], app_state.config.port));

    let application = router_endpoints(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_methods([
                            Method::GET,
                            Method::POST,
                            Method::PUT,
                            Method::DELETE,
                            Method::OPTIONS
                        ])
                        .allow_origin(origins)
                        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                )
                .layer(CompressionLayer::new())
        );

    info!("API server listening on port: {}", port);
    axum::Server::bind(&port)
        .serve(application.into_make_service())
        .await
        .context("Error spinning up the API server")
}

pub fn router_endpoints(app_state: AppState) -> Router {
    Router::new()
        .merge(health_check::router(app_state.config.clone()))
        .nest("/restaurants", restaurant_controller::router(app_state.clone()))
        .nest("/check-ins", check_in_controller::router(app_state.clone()))
        .nest("/lists", restaurant_list_controller::router(app_state.clone()))
        .nest("/map", map_controller::router(app_state))
        .fallback(page_not_found_handler)
}


#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use crate::config::Config;
    use super::test_support::*;

    #[tokio::test]
    async fn health_check_is_ok() {
        let router = test_router(Config::for_tests("http://localhost"));
        let (status, _) = send(router, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_routes_fall_through() {
        let router = test_router(Config::for_tests("http://localhost"));
        let (status, _) = send(router, empty_request("GET", "/reservations")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
