//! Test Map Types
//!
//! The normalized, position-indexed view of a test used by every navigation
//! decision. A map is built once per preview and never mutated afterwards.
//!
//! Serialized field names follow the host runner's wire format (camelCase),
//! so a map can be handed straight to the runner UI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Scope marker carried by every test map.
pub const TEST_SCOPE: &str = "test";

/// Progress counters for one scope (test, part or section).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub questions: usize,
    pub answered: usize,
    pub flagged: usize,
    pub viewed: usize,
    pub total: usize,
    pub questions_viewed: usize,
}

impl Stats {
    /// Count a single item.
    pub fn of_item(item: &Item) -> Self {
        let question = !item.informational;
        Self {
            questions: usize::from(question),
            answered: usize::from(item.answered > 0),
            flagged: usize::from(item.flagged),
            viewed: usize::from(item.viewed),
            total: 1,
            questions_viewed: usize::from(question && item.viewed),
        }
    }

    /// Accumulate another scope's counters into this one.
    pub fn add(&mut self, other: &Stats) {
        self.questions += other.questions;
        self.answered += other.answered;
        self.flagged += other.flagged;
        self.viewed += other.viewed;
        self.total += other.total;
        self.questions_viewed += other.questions_viewed;
    }

    pub fn unanswered(&self) -> usize {
        self.questions.saturating_sub(self.answered)
    }
}

fn allow_skipping_default() -> bool {
    true
}

/// One item occurrence in the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub uri: String,
    pub label: String,
    pub position: usize,
    pub occurrence: Option<usize>,
    /// -1 means unlimited.
    pub remaining_attempts: i64,
    pub answered: u8,
    pub flagged: bool,
    pub viewed: bool,
    pub informational: bool,
    pub categories: Vec<String>,
    /// Read by the navigator only; not part of the wire shape.
    #[serde(skip_serializing, default = "allow_skipping_default")]
    pub allow_skipping: bool,
    /// Identifier of the item-ref this occurrence comes from. Not serialized.
    #[serde(skip)]
    pub ref_identifier: String,
}

impl Item {
    /// Identifier to fetch the item definition with; shared by every
    /// occurrence of a repeated item-ref.
    pub fn source_identifier(&self) -> &str {
        if self.ref_identifier.is_empty() {
            &self.id
        } else {
            &self.ref_identifier
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub label: String,
    pub is_cat_adaptive: bool,
    pub position: usize,
    pub items: IndexMap<String, Item>,
    pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub label: String,
    pub position: usize,
    pub is_linear: bool,
    pub sections: IndexMap<String, Section>,
    pub stats: Stats,
}

/// Linear index entry: global position to item/section/part identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jump {
    pub identifier: String,
    pub part: String,
    pub section: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMap {
    pub scope: String,
    pub title: String,
    pub identifier: String,
    pub class_name: String,
    pub tool_name: String,
    pub exclusively_linear: bool,
    pub has_time_limits: bool,
    pub parts: IndexMap<String, Part>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub jumps: Vec<Jump>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<Stats>,
}

impl TestMap {
    /// Number of item occurrences in the route.
    pub fn total(&self) -> usize {
        self.jumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jumps.is_empty()
    }

    pub fn jump(&self, position: usize) -> Option<&Jump> {
        self.jumps.get(position)
    }

    pub fn part(&self, part_id: &str) -> Option<&Part> {
        self.parts.get(part_id)
    }

    pub fn section(&self, part_id: &str, section_id: &str) -> Option<&Section> {
        self.part(part_id)?.sections.get(section_id)
    }

    /// Item at a global position, resolved through the jump table.
    pub fn item_at(&self, position: usize) -> Option<&Item> {
        let jump = self.jump(position)?;
        self.section(&jump.part, &jump.section)?
            .items
            .get(&jump.identifier)
    }

    /// Item by map-local identifier.
    pub fn find_item(&self, identifier: &str) -> Option<&Item> {
        let jump = self.jumps.iter().find(|j| j.identifier == identifier)?;
        self.item_at(jump.position)
    }

    /// Global position of the first item belonging to a part.
    pub fn first_position_of_part(&self, part_id: &str) -> Option<usize> {
        self.jumps
            .iter()
            .find(|j| j.part == part_id)
            .map(|j| j.position)
    }

    /// The part with the smallest position strictly after `part_id`'s.
    pub fn next_part_after(&self, part_id: &str) -> Option<&Part> {
        let current = self.part(part_id)?.position;
        self.parts
            .values()
            .filter(|p| p.position > current)
            .min_by_key(|p| p.position)
    }

    /// Items in route order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        (0..self.total()).filter_map(move |pos| self.item_at(pos))
    }

    /// Recompute stats bottom-up: section, then part, then test.
    ///
    /// The test-level `stats` key is dropped when the map holds no item.
    pub fn update_stats(&mut self) {
        let mut test_stats = Stats::default();

        for part in self.parts.values_mut() {
            let mut part_stats = Stats::default();
            for section in part.sections.values_mut() {
                let mut section_stats = Stats::default();
                for item in section.items.values() {
                    section_stats.add(&Stats::of_item(item));
                }
                section.stats = section_stats;
                part_stats.add(&section_stats);
            }
            part.stats = part_stats;
            test_stats.add(&part_stats);
        }

        self.stats = (test_stats.total > 0).then_some(test_stats);
    }

    /// Verify that every jump resolves to an item holding the same position.
    pub fn check_jumps(&self) -> Result<(), String> {
        for (index, jump) in self.jumps.iter().enumerate() {
            if jump.position != index {
                return Err(format!(
                    "jump {} records position {}",
                    index, jump.position
                ));
            }
            match self.item_at(index) {
                Some(item) if item.position == index => {}
                Some(item) => {
                    return Err(format!(
                        "item {} at jump {} has position {}",
                        item.id, index, item.position
                    ))
                }
                None => {
                    return Err(format!(
                        "jump {} does not resolve ({} in {}/{})",
                        index, jump.identifier, jump.part, jump.section
                    ))
                }
            }
        }
        Ok(())
    }
}
