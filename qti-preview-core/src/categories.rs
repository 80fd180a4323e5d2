//! Category options
//!
//! QTI categories on an item toggle runner plugins. A preset maps a plugin
//! option to the category that enables it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Plugin options derived for one item. Only enabled options are present.
pub type ItemOptions = BTreeMap<String, bool>;

/// One `optionId -> categoryId` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPreset {
    pub option_id: String,
    pub category_id: String,
}

impl CategoryPreset {
    pub fn new(option_id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            option_id: option_id.into(),
            category_id: category_id.into(),
        }
    }
}

/// Presets shipped with the host runner.
pub fn default_presets() -> Vec<CategoryPreset> {
    [
        ("reviewScreen", "x-tao-option-reviewScreen"),
        ("markReview", "x-tao-option-markReview"),
        ("exitButton", "x-tao-option-exit"),
        ("nextSection", "x-tao-option-nextSection"),
        ("nextSectionWarning", "x-tao-option-nextSectionWarning"),
        ("nextPartWarning", "x-tao-option-nextPartWarning"),
        ("endTestWarning", "x-tao-option-endTestWarning"),
        ("unansweredWarning", "x-tao-option-unansweredWarning"),
        ("calculator", "x-tao-option-calculator"),
        ("zoom", "x-tao-option-zoom"),
        ("highlighter", "x-tao-option-highlighter"),
        ("eliminator", "x-tao-option-eliminator"),
    ]
    .into_iter()
    .map(|(option, category)| CategoryPreset::new(option, category))
    .collect()
}

/// Maps item categories to plugin options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryOptionsResolver {
    presets: Vec<CategoryPreset>,
}

impl CategoryOptionsResolver {
    pub fn new(presets: Vec<CategoryPreset>) -> Self {
        Self { presets }
    }

    pub fn presets(&self) -> &[CategoryPreset] {
        &self.presets
    }

    /// Enabled options for an item carrying `categories`.
    ///
    /// Absent categories leave their option out rather than setting `false`.
    pub fn resolve(&self, categories: &[String]) -> ItemOptions {
        self.presets
            .iter()
            .filter(|preset| categories.iter().any(|c| *c == preset.category_id))
            .map(|preset| (preset.option_id.clone(), true))
            .collect()
    }
}

/// True when `option` is present and enabled.
pub fn option_enabled(options: &ItemOptions, option: &str) -> bool {
    options.get(option).copied().unwrap_or(false)
}
