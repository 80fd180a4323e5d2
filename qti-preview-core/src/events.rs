use serde::{Deserialize, Serialize};

use crate::navigator::{Direction, NavigationAction, NavigationScope};

/// Runner events published by the preview proxy.
///
/// Names mirror the host runner's event contract so a UI adapter can forward
/// them one-to-one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum RunnerEvent {
    LoadItem {
        identifier: String,
    },
    RenderItem {
        identifier: String,
    },
    DisableNav,
    EnableNav,
    Move {
        direction: Direction,
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<NavigationScope>,
        position: Option<usize>,
    },
    Skip {
        direction: Direction,
        #[serde(skip_serializing_if = "Option::is_none")]
        scope: Option<NavigationScope>,
        position: Option<usize>,
    },
    Jump {
        position: usize,
    },
    Flag {
        identifier: String,
        flag: bool,
    },
    /// The test reached its end.
    Closed,
    /// The proxy was destroyed.
    Destroyed,
}

impl RunnerEvent {
    /// Event describing a resolved navigation request.
    pub fn navigation(
        action: NavigationAction,
        direction: Direction,
        scope: Option<NavigationScope>,
        position: Option<usize>,
    ) -> Self {
        match (action, direction, position) {
            (_, Direction::Jump, Some(position)) => RunnerEvent::Jump { position },
            (NavigationAction::Skip, _, _) => RunnerEvent::Skip {
                direction,
                scope,
                position,
            },
            (NavigationAction::Move, _, _) => RunnerEvent::Move {
                direction,
                scope,
                position,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunnerEvent::LoadItem { .. } => "loaditem",
            RunnerEvent::RenderItem { .. } => "renderitem",
            RunnerEvent::DisableNav => "disablenav",
            RunnerEvent::EnableNav => "enablenav",
            RunnerEvent::Move { .. } => "move",
            RunnerEvent::Skip { .. } => "skip",
            RunnerEvent::Jump { .. } => "jump",
            RunnerEvent::Flag { .. } => "flag",
            RunnerEvent::Closed => "closed",
            RunnerEvent::Destroyed => "destroyed",
        }
    }
}
