use std::sync::Arc;
use axum::{Extension, Json, Router};
use axum::routing::get;
use serde_json::{json, Value};
use crate::config::Config;

pub fn router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/health", get(get_health_check))
        .route_layer(Extension(config))
}

async fn get_health_check(
    Extension(config): Extension<Arc<Config>>,
) -> Json<Value> {
    Json(json!({ "status": "ok", "environment": config.environment }))
}
