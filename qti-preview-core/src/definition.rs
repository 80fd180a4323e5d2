//! Test Definition Input Types
//!
//! The static description of a test (header plus route) that the map builder
//! consumes. These types deserialize from JSON or YAML so a preview can be
//! described as a plain document.

use serde::{Deserialize, Serialize};

/// Test-level header fields copied verbatim into the test map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDefinition {
    pub identifier: String,
    pub title: String,
    #[serde(default = "default_class_name")]
    pub class_name: String,
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
    #[serde(default)]
    pub exclusively_linear: bool,
    #[serde(default)]
    pub has_time_limits: bool,
}

fn default_class_name() -> String {
    "AssessmentTest".to_string()
}

fn default_tool_name() -> String {
    "tao".to_string()
}

impl TestDefinition {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            class_name: default_class_name(),
            tool_name: default_tool_name(),
            exclusively_linear: false,
            has_time_limits: false,
        }
    }
}

/// How a test part may be traversed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationMode {
    Linear,
    #[default]
    Nonlinear,
}

/// Per-item session control carried by an item reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSessionControl {
    /// 0 means unlimited.
    #[serde(default)]
    pub max_attempts: u32,
    #[serde(default = "default_allow_skipping")]
    pub allow_skipping: bool,
}

fn default_allow_skipping() -> bool {
    true
}

impl Default for ItemSessionControl {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            allow_skipping: true,
        }
    }
}

/// Reference to an assessment item from within a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub identifier: String,
    /// Backing resource reference. Required; a missing href fails the build.
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Items without interactions are informational and do not count as questions.
    #[serde(default)]
    pub informational: bool,
    #[serde(default)]
    pub session_control: ItemSessionControl,
}

impl ItemRef {
    pub fn new(identifier: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            href: Some(href.into()),
            categories: Vec::new(),
            informational: false,
            session_control: ItemSessionControl::default(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    pub fn informational(mut self) -> Self {
        self.informational = true;
        self
    }

    pub fn with_session_control(mut self, session_control: ItemSessionControl) -> Self {
        self.session_control = session_control;
        self
    }
}

/// Owning section of a route entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRef {
    pub identifier: String,
    #[serde(default)]
    pub title: String,
}

impl SectionRef {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
        }
    }

    /// Display label: the title, or the identifier when untitled.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            &self.identifier
        } else {
            &self.title
        }
    }
}

/// Owning test part of a route entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartRef {
    pub identifier: String,
    #[serde(default)]
    pub navigation_mode: NavigationMode,
}

impl PartRef {
    pub fn new(identifier: impl Into<String>, navigation_mode: NavigationMode) -> Self {
        Self {
            identifier: identifier.into(),
            navigation_mode,
        }
    }

    pub fn is_linear(&self) -> bool {
        self.navigation_mode == NavigationMode::Linear
    }
}

/// One item occurrence in the linearized route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEntry {
    pub item_ref: ItemRef,
    pub section: SectionRef,
    pub part: PartRef,
}

impl RouteEntry {
    pub fn new(item_ref: ItemRef, section: SectionRef, part: PartRef) -> Self {
        Self {
            item_ref,
            section,
            part,
        }
    }
}

/// A test header together with its route, as accepted by the server endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDocument {
    pub test: TestDefinition,
    #[serde(default)]
    pub route: Vec<RouteEntry>,
}
