//! Preview Session Context
//!
//! The host runner talks to a navigational service context with a fixed set of
//! methods. In preview there is no delivery backend, so this implementation
//! answers every adaptive, CAT and persistence question with a neutral value
//! and keeps item/position bookkeeping in a small in-memory session.
//!
//! Two surfaces are exposed:
//! - [`RunnerServiceContext`]: the typed contract. Every method is required,
//!   so a new host capability is a compile error until it is answered here.
//! - [`ContextMethod`]: the same contract addressed by host method name, for
//!   callers that dispatch by string. Unknown names are rejected with
//!   [`PreviewError::Unsupported`].

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::context::{SessionState, TestContext};
use crate::error::{PreviewError, Result};
use crate::map::{Item, Jump, TestMap};

// =============================================================================
// IN-MEMORY TEST SESSION
// =============================================================================

/// Minimal test session: the map, a position and a state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTestSession {
    #[serde(skip)]
    map: Arc<TestMap>,
    position: Option<usize>,
    state: SessionState,
}

impl PreviewTestSession {
    pub fn new(map: Arc<TestMap>) -> Self {
        Self {
            map,
            position: None,
            state: SessionState::Initial,
        }
    }

    /// Enter the first item.
    pub fn begin(&mut self) {
        self.state = SessionState::Interacting;
        self.position = (!self.map.is_empty()).then_some(0);
    }

    pub fn jump_to(&mut self, position: usize) -> Result<()> {
        if position >= self.map.total() {
            return Err(PreviewError::PositionOutOfRange {
                position,
                total: self.map.total(),
            });
        }
        self.position = Some(position);
        Ok(())
    }

    /// Mirror a navigator context.
    pub fn sync(&mut self, context: &TestContext) {
        self.position = context.item_position;
        self.state = context.state;
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn route_count(&self) -> usize {
        self.map.total()
    }

    pub fn current_jump(&self) -> Option<&Jump> {
        self.map.jump(self.position?)
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.map.item_at(self.position?)
    }
}

// =============================================================================
// CONTRACT
// =============================================================================

/// Navigational service context expected by the host runner.
pub trait RunnerServiceContext {
    // ── Session bookkeeping ──

    fn init(&mut self);
    fn test_session(&self) -> &PreviewTestSession;
    fn test_map(&self) -> &TestMap;
    fn current_position(&self) -> Option<usize>;
    fn current_item_ref(&self) -> Option<&Item>;
    fn current_test_part_id(&self) -> Option<&str>;
    fn current_section_id(&self) -> Option<&str>;
    fn item_position_in_route(&self, identifier: &str) -> Result<usize>;
    fn item_attempt(&self) -> u32;

    // ── Navigation capabilities ──

    fn can_move_backward(&self) -> bool;
    fn is_syncing_mode(&self) -> bool;

    // ── Adaptive / CAT ──

    fn is_adaptive(&self) -> bool;
    fn contains_adaptive(&self) -> bool;
    fn cat_engine(&self) -> Option<Value>;
    fn cat_session(&self) -> Option<Value>;
    fn persist_cat_session(&mut self) -> Result<()>;
    fn select_adaptive_next_item(&mut self) -> Option<String>;
    fn current_cat_item_id(&self) -> Option<String>;
    fn shadow_test(&self) -> Vec<String>;
    fn previously_seen_cat_item_ids(&self) -> Vec<String>;
    fn cat_attempts(&self, identifier: &str) -> u32;
    fn last_cat_item_output(&self) -> Map<String, Value>;

    // ── Branching ──

    fn has_branch_rules(&self) -> bool;
    fn has_pre_conditions(&self) -> bool;
}

/// Host method names, one per contract method without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextMethod {
    GetTestSession,
    GetTestMap,
    GetCurrentPosition,
    GetCurrentAssessmentItemRef,
    GetCurrentTestPart,
    GetCurrentSection,
    GetItemAttempt,
    CanMoveBackward,
    IsSyncingMode,
    IsAdaptive,
    ContainsAdaptive,
    GetCatEngine,
    GetCatSession,
    PersistCatSession,
    SelectAdaptiveNextItem,
    GetCurrentCatItemId,
    GetShadowTest,
    GetPreviouslySeenCatItemIds,
    GetLastCatItemOutput,
    HasBranchRules,
    HasPreConditions,
}

impl ContextMethod {
    pub const ALL: [ContextMethod; 21] = [
        Self::GetTestSession,
        Self::GetTestMap,
        Self::GetCurrentPosition,
        Self::GetCurrentAssessmentItemRef,
        Self::GetCurrentTestPart,
        Self::GetCurrentSection,
        Self::GetItemAttempt,
        Self::CanMoveBackward,
        Self::IsSyncingMode,
        Self::IsAdaptive,
        Self::ContainsAdaptive,
        Self::GetCatEngine,
        Self::GetCatSession,
        Self::PersistCatSession,
        Self::SelectAdaptiveNextItem,
        Self::GetCurrentCatItemId,
        Self::GetShadowTest,
        Self::GetPreviouslySeenCatItemIds,
        Self::GetLastCatItemOutput,
        Self::HasBranchRules,
        Self::HasPreConditions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetTestSession => "getTestSession",
            Self::GetTestMap => "getTestMap",
            Self::GetCurrentPosition => "getCurrentPosition",
            Self::GetCurrentAssessmentItemRef => "getCurrentAssessmentItemRef",
            Self::GetCurrentTestPart => "getCurrentTestPart",
            Self::GetCurrentSection => "getCurrentSection",
            Self::GetItemAttempt => "getItemAttempt",
            Self::CanMoveBackward => "canMoveBackward",
            Self::IsSyncingMode => "isSyncingMode",
            Self::IsAdaptive => "isAdaptive",
            Self::ContainsAdaptive => "containsAdaptive",
            Self::GetCatEngine => "getCatEngine",
            Self::GetCatSession => "getCatSession",
            Self::PersistCatSession => "persistCatSession",
            Self::SelectAdaptiveNextItem => "selectAdaptiveNextItem",
            Self::GetCurrentCatItemId => "getCurrentCatItemId",
            Self::GetShadowTest => "getShadowTest",
            Self::GetPreviouslySeenCatItemIds => "getPreviouslySeenCatItemIds",
            Self::GetLastCatItemOutput => "getLastCatItemOutput",
            Self::HasBranchRules => "hasBranchRules",
            Self::HasPreConditions => "hasPreConditions",
        }
    }
}

impl FromStr for ContextMethod {
    type Err = PreviewError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| PreviewError::Unsupported(s.to_string()))
    }
}

impl std::fmt::Display for ContextMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// PREVIEW IMPLEMENTATION
// =============================================================================

pub struct PreviewSessionContext {
    map: Arc<TestMap>,
    session: PreviewTestSession,
    attempt: u32,
}

impl PreviewSessionContext {
    pub fn new(map: Arc<TestMap>) -> Self {
        Self {
            session: PreviewTestSession::new(Arc::clone(&map)),
            map,
            attempt: 1,
        }
    }

    pub fn session_mut(&mut self) -> &mut PreviewTestSession {
        &mut self.session
    }

    /// Mirror the navigator after an action.
    pub fn sync(&mut self, context: &TestContext) {
        self.session.sync(context);
        self.attempt = context.attempt;
    }

    /// Answer a contract method addressed by host name.
    pub fn call(&mut self, method: &str) -> Result<Value> {
        let method = ContextMethod::from_str(method)?;
        debug!(method = %method, "session context call");
        self.dispatch(method)
    }

    pub fn dispatch(&mut self, method: ContextMethod) -> Result<Value> {
        let value = match method {
            ContextMethod::GetTestSession => serde_json::to_value(self.test_session())?,
            ContextMethod::GetTestMap => serde_json::to_value(self.test_map())?,
            ContextMethod::GetCurrentPosition => json!(self.current_position()),
            ContextMethod::GetCurrentAssessmentItemRef => {
                serde_json::to_value(self.current_item_ref())?
            }
            ContextMethod::GetCurrentTestPart => json!(self.current_test_part_id()),
            ContextMethod::GetCurrentSection => json!(self.current_section_id()),
            ContextMethod::GetItemAttempt => json!(self.item_attempt()),
            ContextMethod::CanMoveBackward => json!(self.can_move_backward()),
            ContextMethod::IsSyncingMode => json!(self.is_syncing_mode()),
            ContextMethod::IsAdaptive => json!(self.is_adaptive()),
            ContextMethod::ContainsAdaptive => json!(self.contains_adaptive()),
            ContextMethod::GetCatEngine => json!(self.cat_engine()),
            ContextMethod::GetCatSession => json!(self.cat_session()),
            ContextMethod::PersistCatSession => {
                self.persist_cat_session()?;
                Value::Null
            }
            ContextMethod::SelectAdaptiveNextItem => json!(self.select_adaptive_next_item()),
            ContextMethod::GetCurrentCatItemId => json!(self.current_cat_item_id()),
            ContextMethod::GetShadowTest => json!(self.shadow_test()),
            ContextMethod::GetPreviouslySeenCatItemIds => {
                json!(self.previously_seen_cat_item_ids())
            }
            ContextMethod::GetLastCatItemOutput => Value::Object(self.last_cat_item_output()),
            ContextMethod::HasBranchRules => json!(self.has_branch_rules()),
            ContextMethod::HasPreConditions => json!(self.has_pre_conditions()),
        };
        Ok(value)
    }
}

impl RunnerServiceContext for PreviewSessionContext {
    fn init(&mut self) {
        self.session.begin();
        self.attempt = 1;
    }

    fn test_session(&self) -> &PreviewTestSession {
        &self.session
    }

    fn test_map(&self) -> &TestMap {
        &self.map
    }

    fn current_position(&self) -> Option<usize> {
        self.session.position()
    }

    fn current_item_ref(&self) -> Option<&Item> {
        self.session.current_item()
    }

    fn current_test_part_id(&self) -> Option<&str> {
        self.session.current_jump().map(|j| j.part.as_str())
    }

    fn current_section_id(&self) -> Option<&str> {
        self.session.current_jump().map(|j| j.section.as_str())
    }

    fn item_position_in_route(&self, identifier: &str) -> Result<usize> {
        self.map
            .find_item(identifier)
            .map(|item| item.position)
            .ok_or_else(|| PreviewError::ItemNotFound(identifier.to_string()))
    }

    fn item_attempt(&self) -> u32 {
        self.attempt
    }

    fn can_move_backward(&self) -> bool {
        true
    }

    fn is_syncing_mode(&self) -> bool {
        true
    }

    fn is_adaptive(&self) -> bool {
        false
    }

    fn contains_adaptive(&self) -> bool {
        false
    }

    fn cat_engine(&self) -> Option<Value> {
        None
    }

    fn cat_session(&self) -> Option<Value> {
        None
    }

    fn persist_cat_session(&mut self) -> Result<()> {
        Ok(())
    }

    fn select_adaptive_next_item(&mut self) -> Option<String> {
        None
    }

    fn current_cat_item_id(&self) -> Option<String> {
        None
    }

    fn shadow_test(&self) -> Vec<String> {
        Vec::new()
    }

    fn previously_seen_cat_item_ids(&self) -> Vec<String> {
        Vec::new()
    }

    fn cat_attempts(&self, _identifier: &str) -> u32 {
        0
    }

    fn last_cat_item_output(&self) -> Map<String, Value> {
        Map::new()
    }

    fn has_branch_rules(&self) -> bool {
        false
    }

    fn has_pre_conditions(&self) -> bool {
        false
    }
}
