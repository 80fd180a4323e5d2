//! Test context: the mutable session state owned by the navigator.

use serde::{Deserialize, Serialize};

use crate::categories::ItemOptions;

/// Session state codes shared with the host runner.
///
/// The numeric values are part of the host protocol and serialize as integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SessionState {
    #[default]
    Initial = 0,
    Interacting = 1,
    ModalFeedback = 2,
    Suspended = 3,
    Closed = 4,
}

impl SessionState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Interacting => "interacting",
            Self::ModalFeedback => "modalFeedback",
            Self::Suspended => "suspended",
            Self::Closed => "closed",
        }
    }

    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

impl From<SessionState> for u8 {
    fn from(state: SessionState) -> Self {
        state.code()
    }
}

impl TryFrom<u8> for SessionState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Initial),
            1 => Ok(Self::Interacting),
            2 => Ok(Self::ModalFeedback),
            3 => Ok(Self::Suspended),
            4 => Ok(Self::Closed),
            _ => Err(format!("Unknown session state: {}", code)),
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the preview currently is, and what the runner may do there.
///
/// Item fields are absent for a test without items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_part_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    pub state: SessionState,
    pub item_session_state: SessionState,
    pub attempt: u32,
    pub can_move_backward: bool,
    pub allow_skipping: bool,
    pub options: ItemOptions,
}

impl Default for TestContext {
    fn default() -> Self {
        Self {
            item_identifier: None,
            item_position: None,
            test_part_id: None,
            section_id: None,
            state: SessionState::Initial,
            item_session_state: SessionState::Initial,
            attempt: 1,
            can_move_backward: true,
            allow_skipping: true,
            options: ItemOptions::new(),
        }
    }
}

impl TestContext {
    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }
}
