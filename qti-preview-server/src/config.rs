//! Server configuration from the environment.

use anyhow::{Context, Result};
use qti_preview_core::{PreviewConfig, StaticLabelResolver};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_PACKAGE_DIR: &str = "./package";

/// Optional `uri -> label` file inside the package directory.
pub const LABELS_FILE: &str = "labels.json";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub package_dir: PathBuf,
    pub preview: PreviewConfig,
}

impl ServerConfig {
    /// Read `PREVIEW_BIND`, `PREVIEW_PACKAGE_DIR` and `PREVIEW_CONFIG`.
    pub fn from_env() -> Result<Self> {
        let bind = std::env::var("PREVIEW_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind
            .parse()
            .with_context(|| format!("invalid PREVIEW_BIND: {bind}"))?;

        let package_dir = std::env::var("PREVIEW_PACKAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_PACKAGE_DIR));

        let preview = match std::env::var("PREVIEW_CONFIG") {
            Ok(path) => PreviewConfig::from_file(&path)
                .with_context(|| format!("failed to load preview config {path}"))?,
            Err(_) => PreviewConfig::default(),
        };

        Ok(Self {
            bind,
            package_dir,
            preview,
        })
    }

    pub fn labels(&self) -> Result<StaticLabelResolver> {
        load_labels(&self.package_dir)
    }
}

/// Load item labels from `<dir>/labels.json`; a missing file means no labels.
pub fn load_labels(package_dir: &Path) -> Result<StaticLabelResolver> {
    let path = package_dir.join(LABELS_FILE);
    if !path.is_file() {
        warn!(path = %path.display(), "no labels file, item labels will be empty");
        return Ok(StaticLabelResolver::new());
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let labels: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(path = %path.display(), labels = labels.len(), "loaded item labels");
    Ok(StaticLabelResolver::from(labels))
}
