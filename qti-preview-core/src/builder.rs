//! Test Map Builder
//!
//! Turns a test definition and its linear route into a [`TestMap`]. The build
//! is a pure function of its inputs: the same definition, route and preset
//! categories always produce structurally equal maps.
//!
//! Label lookups go through a [`LabelResolver`]; a failed lookup yields an
//! empty label and a warning, never a failed build. Structural problems in the
//! route (missing href, duplicate ids) fail the whole build.

use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::definition::{ItemRef, RouteEntry, TestDefinition};
use crate::error::{PreviewError, Result};
use crate::map::{Item, Jump, Part, Section, Stats, TestMap, TEST_SCOPE};
use crate::resolver::LabelResolver;

/// Builds test maps, resolving item labels through the given resolver.
pub struct TestMapBuilder<'a> {
    labels: &'a dyn LabelResolver,
}

impl<'a> TestMapBuilder<'a> {
    pub fn new(labels: &'a dyn LabelResolver) -> Self {
        Self { labels }
    }

    /// Build a map from `route`.
    ///
    /// `preset_categories` are appended to every item's own categories.
    pub fn build(
        &self,
        test: &TestDefinition,
        route: &[RouteEntry],
        preset_categories: &[String],
    ) -> Result<TestMap> {
        let mut map = TestMap {
            scope: TEST_SCOPE.to_string(),
            title: test.title.clone(),
            identifier: test.identifier.clone(),
            class_name: test.class_name.clone(),
            tool_name: test.tool_name.clone(),
            exclusively_linear: test.exclusively_linear,
            has_time_limits: test.has_time_limits,
            parts: IndexMap::new(),
            jumps: Vec::with_capacity(route.len()),
            stats: None,
        };

        let repeats = count_repeats(route);
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut section_count = 0usize;

        for (position, entry) in route.iter().enumerate() {
            validate_entry(position, entry)?;

            let item_ref = &entry.item_ref;
            let repeated = repeats
                .get(item_ref.identifier.as_str())
                .is_some_and(|&n| n > 1);
            let occurrence = if repeated {
                let count = seen.entry(item_ref.identifier.as_str()).or_insert(0);
                let occurrence = *count;
                *count += 1;
                Some(occurrence)
            } else {
                None
            };
            let item_id = occurrence_id(&item_ref.identifier, occurrence);

            if map.find_item(&item_id).is_some() {
                return Err(PreviewError::MalformedRoute {
                    index: position,
                    reason: format!("duplicate item id {item_id}"),
                });
            }

            let part_position = map.parts.len();
            let part = map
                .parts
                .entry(entry.part.identifier.clone())
                .or_insert_with(|| Part {
                    id: entry.part.identifier.clone(),
                    label: entry.part.identifier.clone(),
                    position: part_position,
                    is_linear: entry.part.is_linear(),
                    sections: IndexMap::new(),
                    stats: Stats::default(),
                });

            let section = part
                .sections
                .entry(entry.section.identifier.clone())
                .or_insert_with(|| {
                    section_count += 1;
                    Section {
                        id: entry.section.identifier.clone(),
                        label: entry.section.label().to_string(),
                        is_cat_adaptive: false,
                        position: section_count - 1,
                        items: IndexMap::new(),
                        stats: Stats::default(),
                    }
                });

            let item =
                self.build_item(item_ref, &item_id, position, occurrence, preset_categories);
            section.items.insert(item_id.clone(), item);

            map.jumps.push(Jump {
                identifier: item_id,
                part: entry.part.identifier.clone(),
                section: entry.section.identifier.clone(),
                position,
            });
        }

        map.update_stats();

        debug!(
            test = %map.identifier,
            parts = map.parts.len(),
            items = map.total(),
            "built test map"
        );

        Ok(map)
    }

    fn build_item(
        &self,
        item_ref: &ItemRef,
        item_id: &str,
        position: usize,
        occurrence: Option<usize>,
        preset_categories: &[String],
    ) -> Item {
        // validate_entry guarantees the href
        let uri = item_ref.href.clone().unwrap_or_default();

        let label = match self.labels.resolve_label(&uri) {
            Ok(label) => label,
            Err(e) => {
                warn!(item = %item_id, uri = %uri, error = %e, "label lookup failed");
                String::new()
            }
        };

        let max_attempts = item_ref.session_control.max_attempts;

        Item {
            id: item_id.to_string(),
            uri,
            label,
            position,
            occurrence,
            remaining_attempts: if max_attempts > 0 {
                i64::from(max_attempts)
            } else {
                -1
            },
            answered: 0,
            flagged: false,
            viewed: false,
            informational: item_ref.informational,
            categories: merge_categories(&item_ref.categories, preset_categories),
            allow_skipping: item_ref.session_control.allow_skipping,
            ref_identifier: item_ref.identifier.clone(),
        }
    }
}

fn validate_entry(index: usize, entry: &RouteEntry) -> Result<()> {
    let malformed = |reason: &str| PreviewError::MalformedRoute {
        index,
        reason: reason.to_string(),
    };

    if entry.item_ref.identifier.is_empty() {
        return Err(malformed("item-ref identifier is empty"));
    }
    match entry.item_ref.href.as_deref() {
        None | Some("") => return Err(malformed("item-ref href is missing")),
        Some(_) => {}
    }
    if entry.section.identifier.is_empty() {
        return Err(malformed("section identifier is empty"));
    }
    if entry.part.identifier.is_empty() {
        return Err(malformed("test part identifier is empty"));
    }
    Ok(())
}

fn count_repeats(route: &[RouteEntry]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for entry in route {
        *counts.entry(entry.item_ref.identifier.as_str()).or_insert(0) += 1;
    }
    counts
}

/// Map-local id: occurrence 0 keeps the plain identifier.
fn occurrence_id(identifier: &str, occurrence: Option<usize>) -> String {
    match occurrence {
        Some(n) if n > 0 => format!("{identifier}.{n}"),
        _ => identifier.to_string(),
    }
}

/// Ordered, de-duplicated union of item categories and preset categories.
fn merge_categories(own: &[String], presets: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(own.len() + presets.len());
    for category in own.iter().chain(presets) {
        if !merged.contains(category) {
            merged.push(category.clone());
        }
    }
    merged
}
