//! External Collaborators
//!
//! Abstract interfaces for the two lookups the preview delegates to the host:
//! display labels for item resources, and compiled item definitions.
//! Implementations can target a local package directory (preview server) or an
//! in-memory table (tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::{PreviewError, Result};

/// Resolves a display label for a resource uri.
///
/// Called synchronously during map construction. Failures are recovered by the
/// builder, so implementations should simply report them.
pub trait LabelResolver: Send + Sync {
    fn resolve_label(&self, uri: &str) -> Result<String>;
}

/// Label table keyed by resource uri.
#[derive(Debug, Clone, Default)]
pub struct StaticLabelResolver {
    labels: HashMap<String, String>,
}

impl StaticLabelResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, uri: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(uri.into(), label.into());
        self
    }
}

impl From<HashMap<String, String>> for StaticLabelResolver {
    fn from(labels: HashMap<String, String>) -> Self {
        Self { labels }
    }
}

impl LabelResolver for StaticLabelResolver {
    fn resolve_label(&self, uri: &str) -> Result<String> {
        self.labels
            .get(uri)
            .cloned()
            .ok_or_else(|| PreviewError::Resolver(format!("no label for {uri}")))
    }
}

/// Compiled item definition as served to the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    #[serde(rename = "type", default = "default_item_type")]
    pub item_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub assets: Value,
    #[serde(default)]
    pub base_url: String,
}

fn default_item_type() -> String {
    "qti".to_string()
}

/// Item definition together with its last known state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItem {
    pub item_data: ItemData,
    #[serde(default)]
    pub item_state: Map<String, Value>,
}

/// Fetches item definitions for the preview proxy.
#[async_trait]
pub trait ItemResolver: Send + Sync {
    /// Resolve an item by map identifier and backing uri.
    ///
    /// Unknown items must be reported as [`PreviewError::ItemNotFound`].
    async fn resolve_item(&self, identifier: &str, uri: &str) -> Result<ResolvedItem>;
}

/// Package directory implementation: `<base>/<identifier>.json`.
pub struct FsItemResolver {
    base_path: PathBuf,
}

impl FsItemResolver {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, identifier: &str) -> Result<PathBuf> {
        if identifier.is_empty()
            || identifier.contains(['/', '\\'])
            || identifier.starts_with('.')
        {
            return Err(PreviewError::ItemNotFound(identifier.to_string()));
        }
        Ok(self.base_path.join(format!("{identifier}.json")))
    }
}

#[async_trait]
impl ItemResolver for FsItemResolver {
    async fn resolve_item(&self, identifier: &str, _uri: &str) -> Result<ResolvedItem> {
        let path = self.path_for(identifier)?;

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PreviewError::ItemNotFound(identifier.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let mut item_data: ItemData = serde_json::from_slice(&raw)?;
        if item_data.base_url.is_empty() {
            item_data.base_url = format!("file://{}/", self.base_path.display());
        }

        Ok(ResolvedItem {
            item_data,
            item_state: Map::new(),
        })
    }
}

/// In-memory implementation counting every fetch.
#[derive(Default)]
pub struct InMemoryItemResolver {
    items: RwLock<HashMap<String, ResolvedItem>>,
    fetches: AtomicUsize,
}

impl InMemoryItemResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, identifier: impl Into<String>, item: ResolvedItem) {
        self.items.write().await.insert(identifier.into(), item);
    }

    /// Number of `resolve_item` calls served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemResolver for InMemoryItemResolver {
    async fn resolve_item(&self, identifier: &str, _uri: &str) -> Result<ResolvedItem> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.items
            .read()
            .await
            .get(identifier)
            .cloned()
            .ok_or_else(|| PreviewError::ItemNotFound(identifier.to_string()))
    }
}
