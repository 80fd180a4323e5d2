//! Test Preview Navigator
//!
//! Stands in for a backend test session. The navigator owns the
//! [`TestContext`] and reads the shared [`TestMap`] to resolve every
//! navigation request:
//!
//! | direction  | scope      | outcome                                                    |
//! |------------|------------|------------------------------------------------------------|
//! | `next`     | `testPart` | first item of the next part, or `closed` when none is left |
//! | `next`     | `section`  | first item of the next section, or `closed`                |
//! | `next`     | item/none  | next item, or `closed` at the end of the test              |
//! | `previous` | any        | previous item, floored at the first one                    |
//! | `jump`     | any        | item at `ref`; out of range fails                          |
//!
//! Requests are resolved against a copy of the context, which replaces the
//! current one only on success. The map is never written: stats stay as built.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::categories::CategoryOptionsResolver;
use crate::context::{SessionState, TestContext};
use crate::error::{PreviewError, Result};
use crate::map::TestMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationAction {
    #[default]
    Move,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Next,
    Previous,
    Jump,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationScope {
    Item,
    Section,
    TestPart,
}

/// Navigation request as sent by the runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    #[serde(default)]
    pub action: NavigationAction,
    pub direction: Direction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<NavigationScope>,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<i64>,
}

impl NavigationRequest {
    pub fn next() -> Self {
        Self {
            action: NavigationAction::Move,
            direction: Direction::Next,
            scope: None,
            reference: None,
        }
    }

    pub fn previous() -> Self {
        Self {
            direction: Direction::Previous,
            ..Self::next()
        }
    }

    pub fn jump(position: i64) -> Self {
        Self {
            direction: Direction::Jump,
            reference: Some(position),
            ..Self::next()
        }
    }

    pub fn next_part() -> Self {
        Self {
            scope: Some(NavigationScope::TestPart),
            ..Self::next()
        }
    }

    pub fn next_section() -> Self {
        Self {
            scope: Some(NavigationScope::Section),
            ..Self::next()
        }
    }

    pub fn skip(mut self) -> Self {
        self.action = NavigationAction::Skip;
        self
    }
}

/// The `{testContext, testMap}` pair returned by every action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationResponse {
    pub test_context: TestContext,
    pub test_map: Arc<TestMap>,
}

/// In-memory replacement for a backend test session.
#[derive(Debug, Clone)]
pub struct TestPreviewNavigator {
    map: Arc<TestMap>,
    context: TestContext,
    options: CategoryOptionsResolver,
}

impl TestPreviewNavigator {
    /// Start a session on the first jump of `map`.
    pub fn init(map: Arc<TestMap>, options: CategoryOptionsResolver) -> Self {
        let mut navigator = Self {
            map,
            context: TestContext {
                state: SessionState::Interacting,
                ..TestContext::default()
            },
            options,
        };

        if !navigator.map.is_empty() {
            let mut context = navigator.context.clone();
            if navigator.enter(&mut context, 0).is_ok() {
                navigator.context = context;
            }
        }

        debug!(
            test = %navigator.map.identifier,
            items = navigator.map.total(),
            "preview navigator initialized"
        );
        navigator
    }

    pub fn context(&self) -> &TestContext {
        &self.context
    }

    pub fn map(&self) -> &Arc<TestMap> {
        &self.map
    }

    /// Current pair, with the context cloned so callers cannot alias it.
    pub fn snapshot(&self) -> NavigationResponse {
        NavigationResponse {
            test_context: self.context.clone(),
            test_map: Arc::clone(&self.map),
        }
    }

    /// Resolve a move or skip request.
    pub fn navigate(&mut self, request: &NavigationRequest) -> Result<NavigationResponse> {
        let next = self.resolve(request)?;

        debug!(
            action = ?request.action,
            direction = ?request.direction,
            scope = ?request.scope,
            from = ?self.context.item_position,
            to = ?next.item_position,
            state = %next.state,
            "navigation resolved"
        );

        self.context = next;
        Ok(self.snapshot())
    }

    /// Skip shares the move resolution table.
    pub fn skip(&mut self, request: &NavigationRequest) -> Result<NavigationResponse> {
        self.navigate(&NavigationRequest {
            action: NavigationAction::Skip,
            ..request.clone()
        })
    }

    pub fn move_next(&mut self) -> Result<NavigationResponse> {
        self.navigate(&NavigationRequest::next())
    }

    pub fn move_previous(&mut self) -> Result<NavigationResponse> {
        self.navigate(&NavigationRequest::previous())
    }

    pub fn jump(&mut self, position: usize) -> Result<NavigationResponse> {
        let reference = i64::try_from(position).map_err(|_| PreviewError::PositionOutOfRange {
            position,
            total: self.map.total(),
        })?;
        self.navigate(&NavigationRequest::jump(reference))
    }

    /// Flags are not kept in preview; the item must still exist.
    pub fn flag_item(&self, identifier: &str, _flag: bool) -> Result<()> {
        self.map
            .find_item(identifier)
            .map(|_| ())
            .ok_or_else(|| PreviewError::ItemNotFound(identifier.to_string()))
    }

    fn resolve(&self, request: &NavigationRequest) -> Result<TestContext> {
        let total = self.map.total();
        if total == 0 {
            return Err(PreviewError::EmptyTest);
        }
        if self.context.is_closed() {
            return Err(PreviewError::SessionClosed);
        }

        let mut next = self.context.clone();
        let current = next.item_position.unwrap_or(0);

        let target = match request.direction {
            Direction::Next => {
                let candidate = match request.scope {
                    Some(NavigationScope::TestPart) => self.next_part_position(&next),
                    Some(NavigationScope::Section) => self.next_section_position(current),
                    Some(NavigationScope::Item) | None => {
                        (current + 1 < total).then_some(current + 1)
                    }
                };
                match candidate {
                    Some(position) => position.min(total - 1),
                    None => {
                        next.state = SessionState::Closed;
                        return Ok(next);
                    }
                }
            }
            Direction::Previous => current.saturating_sub(1),
            Direction::Jump => {
                let reference = request.reference.ok_or_else(|| {
                    PreviewError::InvalidRequest("jump requires a ref".to_string())
                })?;
                let position = usize::try_from(reference).map_err(|_| {
                    PreviewError::InvalidRequest(format!("negative jump ref {reference}"))
                })?;
                if position >= total {
                    return Err(PreviewError::PositionOutOfRange { position, total });
                }
                position
            }
        };

        self.enter(&mut next, target)?;
        Ok(next)
    }

    fn next_part_position(&self, context: &TestContext) -> Option<usize> {
        let part_id = context.test_part_id.as_deref()?;
        let part = self.map.next_part_after(part_id)?;
        self.map.first_position_of_part(&part.id)
    }

    fn next_section_position(&self, current: usize) -> Option<usize> {
        let here = self.map.jump(current)?;
        self.map.jumps[current + 1..]
            .iter()
            .find(|j| j.section != here.section || j.part != here.part)
            .map(|j| j.position)
    }

    /// Point `context` at the item in `position`.
    fn enter(&self, context: &mut TestContext, position: usize) -> Result<()> {
        let jump = self
            .map
            .jump(position)
            .ok_or(PreviewError::PositionOutOfRange {
                position,
                total: self.map.total(),
            })?;
        let item = self
            .map
            .item_at(position)
            .ok_or_else(|| PreviewError::ItemNotFound(jump.identifier.clone()))?;

        context.item_position = Some(position);
        context.item_identifier = Some(jump.identifier.clone());
        context.test_part_id = Some(jump.part.clone());
        context.section_id = Some(jump.section.clone());
        context.item_session_state = SessionState::Initial;
        context.options = self.options.resolve(&item.categories);
        context.allow_skipping = item.allow_skipping;
        context.can_move_backward = true;
        Ok(())
    }
}
