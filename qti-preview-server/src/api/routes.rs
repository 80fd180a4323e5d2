//! Preview endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use qti_preview_core::{
    NavigationRequest, NavigationResponse, NavigationWarning, PreviewDocument, PreviewProxy,
    ResolvedItem, TestContext, TestMap, TestMapBuilder,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{ApiError, ApiResponse, AppState};
use crate::session::{ServerSession, SessionSummary};

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPreview {
    pub session_id: Uuid,
    pub test_context: TestContext,
    pub test_map: Arc<TestMap>,
}

/// Navigation request plus the state of the item being left.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    #[serde(flatten)]
    pub request: NavigationRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_state: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    #[serde(flatten)]
    pub response: NavigationResponse,
    /// Warning to show before leaving the new current item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<NavigationWarning>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlagRequest {
    pub flag: bool,
}

async fn find_session(
    state: &AppState,
    session_id: Uuid,
) -> Result<Arc<ServerSession>, ApiError> {
    state
        .sessions
        .read()
        .await
        .get(&session_id)
        .cloned()
        .ok_or(ApiError::SessionNotFound(session_id))
}

/// GET /api/health
pub async fn health_check() -> Json<ApiResponse<String>> {
    Json(ApiResponse::ok("OK".to_string()))
}

/// GET /api/previews
pub async fn list_previews(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<SessionSummary>>> {
    let mut sessions: Vec<SessionSummary> = state
        .sessions
        .read()
        .await
        .values()
        .map(|s| s.summary())
        .collect();
    sessions.sort_by_key(|s| s.created_at);
    Json(ApiResponse::ok(sessions))
}

/// POST /api/previews
pub async fn create_preview(
    State(state): State<AppState>,
    Json(document): Json<PreviewDocument>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedPreview>>), ApiError> {
    let map = TestMapBuilder::new(state.labels.as_ref()).build(
        &document.test,
        &document.route,
        &state.preview.preset_categories,
    )?;

    let proxy = PreviewProxy::new(
        Arc::new(map),
        state.preview.options_resolver(),
        Arc::clone(&state.items),
    );
    let (session, response) = ServerSession::open(proxy).await?;
    let session_id = session.id;

    state
        .sessions
        .write()
        .await
        .insert(session_id, Arc::new(session));

    info!(%session_id, test = %document.test.identifier, "preview opened");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(CreatedPreview {
            session_id,
            test_context: response.test_context,
            test_map: response.test_map,
        })),
    ))
}

/// GET /api/previews/:session_id
pub async fn get_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<NavigationResponse> {
    let session = find_session(&state, session_id).await?;
    let test_context = session.test_context().await?;
    Ok(Json(ApiResponse::ok(NavigationResponse {
        test_context,
        test_map: Arc::clone(session.map()),
    })))
}

/// GET /api/previews/:session_id/items/:item_id
pub async fn get_item(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(Uuid, String)>,
) -> ApiResult<ResolvedItem> {
    let session = find_session(&state, session_id).await?;
    let entry = session.get_item(&item_id).await?;
    Ok(Json(ApiResponse::ok(entry.to_resolved())))
}

/// POST /api/previews/:session_id/items/:item_id/action
pub async fn item_action(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(Uuid, String)>,
    Json(action): Json<ActionRequest>,
) -> ApiResult<ActionResponse> {
    let session = find_session(&state, session_id).await?;
    let (response, warning) = session
        .item_action(&item_id, &action.request, action.item_state)
        .await?;
    Ok(Json(ApiResponse::ok(ActionResponse { response, warning })))
}

/// POST /api/previews/:session_id/items/:item_id/flag
pub async fn flag_item(
    State(state): State<AppState>,
    Path((session_id, item_id)): Path<(Uuid, String)>,
    Json(request): Json<FlagRequest>,
) -> ApiResult<bool> {
    let session = find_session(&state, session_id).await?;
    session.flag_item(&item_id, request.flag).await?;
    Ok(Json(ApiResponse::ok(request.flag)))
}

/// GET /api/previews/:session_id/context/:method
pub async fn context_method(
    State(state): State<AppState>,
    Path((session_id, method)): Path<(Uuid, String)>,
) -> ApiResult<Value> {
    let session = find_session(&state, session_id).await?;
    let value = session.context_call(&method).await?;
    Ok(Json(ApiResponse::ok(value)))
}

/// DELETE /api/previews/:session_id
pub async fn destroy_preview(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .sessions
        .write()
        .await
        .remove(&session_id)
        .ok_or(ApiError::SessionNotFound(session_id))?;

    session.destroy().await;
    info!(%session_id, "preview destroyed");
    Ok(StatusCode::NO_CONTENT)
}
