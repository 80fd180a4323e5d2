//! Preview configuration
//!
//! ```yaml
//! categoryPresets:
//!   - optionId: calculator
//!     categoryId: x-tao-option-calculator
//! presetCategories:
//!   - x-tao-option-reviewScreen
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::categories::{default_presets, CategoryOptionsResolver, CategoryPreset};
use crate::error::{PreviewError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewConfig {
    /// Option/category pairs. Omitted means the host runner's presets.
    #[serde(default = "default_presets")]
    pub category_presets: Vec<CategoryPreset>,

    /// Categories appended to every item of the map.
    #[serde(default)]
    pub preset_categories: Vec<String>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            category_presets: default_presets(),
            preset_categories: Vec::new(),
        }
    }
}

impl PreviewConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: PreviewConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        info!(
            path = %path.display(),
            presets = config.category_presets.len(),
            "loaded preview config"
        );
        Ok(config)
    }

    pub fn options_resolver(&self) -> CategoryOptionsResolver {
        CategoryOptionsResolver::new(self.category_presets.clone())
    }

    fn validate(&self) -> Result<()> {
        for preset in &self.category_presets {
            if preset.option_id.is_empty() || preset.category_id.is_empty() {
                return Err(PreviewError::Config(format!(
                    "category preset with empty id: {preset:?}"
                )));
            }
        }
        if let Some(empty) = self.preset_categories.iter().position(String::is_empty) {
            return Err(PreviewError::Config(format!(
                "presetCategories[{empty}] is empty"
            )));
        }
        Ok(())
    }
}
