//! Navigation warnings
//!
//! Decides whether moving forward from the current item should warn the test
//! taker first. The decision only reads the map, the context and the options
//! derived from the current item's categories.

use serde::{Deserialize, Serialize};

use crate::categories::option_enabled;
use crate::context::TestContext;
use crate::map::{Stats, TestMap};

pub const END_TEST_WARNING: &str = "endTestWarning";
pub const NEXT_PART_WARNING: &str = "nextPartWarning";
pub const UNANSWERED_WARNING: &str = "unansweredWarning";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningScope {
    Part,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationWarning {
    pub scope: WarningScope,
    pub unanswered: usize,
    pub flagged: usize,
    /// Only warn about unanswered questions.
    pub unanswered_only: bool,
}

/// Warning to show before leaving the current item, if any.
///
/// The end-of-test warning takes precedence over the end-of-part one.
pub fn next_warning(map: &TestMap, context: &TestContext) -> Option<NavigationWarning> {
    if context.is_closed() {
        return None;
    }
    let position = context.item_position?;
    let jump = map.jump(position)?;
    let options = &context.options;

    let last_in_test = position + 1 >= map.total();
    let last_in_part = map
        .jump(position + 1)
        .map_or(true, |next| next.part != jump.part);

    let (scope, stats): (WarningScope, Stats) =
        if last_in_test && option_enabled(options, END_TEST_WARNING) {
            (WarningScope::Test, map.stats.unwrap_or_default())
        } else if last_in_part && option_enabled(options, NEXT_PART_WARNING) {
            (WarningScope::Part, map.part(&jump.part)?.stats)
        } else {
            return None;
        };

    let unanswered_only = option_enabled(options, UNANSWERED_WARNING);
    if unanswered_only && stats.unanswered() == 0 {
        return None;
    }

    Some(NavigationWarning {
        scope,
        unanswered: stats.unanswered(),
        flagged: stats.flagged,
        unanswered_only,
    })
}
