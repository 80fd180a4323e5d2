//! One open preview: the proxy the runner talks to and the session context
//! mirrored after every navigation.

use chrono::{DateTime, Utc};
use qti_preview_core::{
    next_warning, ItemCacheEntry, NavigationRequest, NavigationResponse, NavigationWarning,
    PreviewProxy, PreviewSessionContext, Result, RunnerServiceContext, TestContext, TestMap,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

pub type SessionRegistry = Arc<RwLock<HashMap<Uuid, Arc<ServerSession>>>>;

pub struct ServerSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    proxy: PreviewProxy,
    context: Mutex<PreviewSessionContext>,
}

/// Listing entry for `GET /api/previews`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub test_identifier: String,
    pub title: String,
    pub items: usize,
    pub created_at: DateTime<Utc>,
}

impl ServerSession {
    /// Open the proxy and put the session context on the first item.
    pub async fn open(proxy: PreviewProxy) -> Result<(Self, NavigationResponse)> {
        let response = proxy.init().await?;

        let mut context = PreviewSessionContext::new(Arc::clone(proxy.map()));
        context.init();
        context.sync(&response.test_context);

        let session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            proxy,
            context: Mutex::new(context),
        };
        Ok((session, response))
    }

    pub fn map(&self) -> &Arc<TestMap> {
        self.proxy.map()
    }

    pub fn summary(&self) -> SessionSummary {
        let map = self.map();
        SessionSummary {
            session_id: self.id,
            test_identifier: map.identifier.clone(),
            title: map.title.clone(),
            items: map.total(),
            created_at: self.created_at,
        }
    }

    pub async fn get_item(&self, identifier: &str) -> Result<ItemCacheEntry> {
        self.proxy.get_item(identifier).await
    }

    /// Navigate away from `identifier` and mirror the result into the context.
    pub async fn item_action(
        &self,
        identifier: &str,
        request: &NavigationRequest,
        item_state: Option<Map<String, Value>>,
    ) -> Result<(NavigationResponse, Option<NavigationWarning>)> {
        // Held across the proxy call so concurrent actions sync in the order
        // they navigated.
        let mut context = self.context.lock().await;
        let response = self
            .proxy
            .call_item_action(identifier, request, item_state)
            .await?;
        context.sync(&response.test_context);
        drop(context);

        let warning = next_warning(&response.test_map, &response.test_context);
        Ok((response, warning))
    }

    pub async fn flag_item(&self, identifier: &str, flag: bool) -> Result<()> {
        self.proxy.flag_item(identifier, flag).await
    }

    pub async fn test_context(&self) -> Result<TestContext> {
        self.proxy.context().await
    }

    /// Session-context method by host name.
    pub async fn context_call(&self, method: &str) -> Result<Value> {
        self.context.lock().await.call(method)
    }

    pub async fn destroy(&self) {
        self.proxy.destroy().await;
    }
}
