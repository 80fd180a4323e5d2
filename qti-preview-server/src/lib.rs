//! HTTP endpoint for QTI test previews.
//!
//! Each `POST /api/previews` builds a test map from the posted document and
//! opens an in-memory preview session; item definitions come from a package
//! directory on disk.

pub mod api;
pub mod config;
pub mod session;

pub use api::{create_router, ApiResponse, AppState};
pub use config::ServerConfig;
