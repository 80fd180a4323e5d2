//! HTTP surface of the preview server.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{ActionRequest, ActionResponse, CreatedPreview, FlagRequest};

use axum::{
    routing::{get, post},
    Router,
};
use qti_preview_core::{ItemResolver, PreviewConfig, StaticLabelResolver};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::session::SessionRegistry;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistry,
    pub preview: Arc<PreviewConfig>,
    pub labels: Arc<StaticLabelResolver>,
    pub items: Arc<dyn ItemResolver>,
}

impl AppState {
    pub fn new(
        preview: PreviewConfig,
        labels: StaticLabelResolver,
        items: Arc<dyn ItemResolver>,
    ) -> Self {
        Self {
            sessions: SessionRegistry::default(),
            preview: Arc::new(preview),
            labels: Arc::new(labels),
            items,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health_check))
        .route(
            "/api/previews",
            get(routes::list_previews).post(routes::create_preview),
        )
        .route(
            "/api/previews/:session_id",
            get(routes::get_preview).delete(routes::destroy_preview),
        )
        .route(
            "/api/previews/:session_id/items/:item_id",
            get(routes::get_item),
        )
        .route(
            "/api/previews/:session_id/items/:item_id/action",
            post(routes::item_action),
        )
        .route(
            "/api/previews/:session_id/items/:item_id/flag",
            post(routes::flag_item),
        )
        .route(
            "/api/previews/:session_id/context/:method",
            get(routes::context_method),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}
