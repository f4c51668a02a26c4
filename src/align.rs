//! Cross-source aligner
//!
//! Puts every source on a strictly regular time index at its declared
//! period. Each entity's grid starts at its own first sample and steps by
//! the period from there, so a feed logged at :05, :15, ... keeps its
//! instants. Missing grid points become explicit gap rows (every field
//! missing); nothing is interpolated and no timestamp is moved.
//!
//! Column-name collisions are resolved here too, through an explicit
//! [`ColumnPolicy`] rather than whatever order the inputs happened to use.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::stream::{Record, Stream};

/// How a source is put on its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AlignMode {
    /// Keep the native cadence: a sample off the grid is a schema
    /// violation on the time field.
    #[default]
    Native,
    /// One sample per declared period: samples between grid points are
    /// discarded and counted.
    Regularize,
}

/// Counts produced by [`align`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlignOutcome {
    pub gap_rows: usize,
    pub off_grid: usize,
}

/// Bring `stream` onto its regular grid, per entity.
///
/// `time_field` names the raw time column in errors. Fails with
/// [`PipelineError::UnalignableSource`] when an entity's timestamps do not
/// strictly increase, and with [`PipelineError::SchemaViolation`] when a
/// [`AlignMode::Native`] sample breaks the declared cadence.
pub fn align(stream: &mut Stream, mode: AlignMode, time_field: &str) -> Result<AlignOutcome, PipelineError> {
    let period = stream.period();
    let step = period.as_duration();
    let width = stream.fields().len();

    let groups: Vec<Vec<usize>> = stream.entity_groups().into_values().collect();
    for rows in &groups {
        for pair in rows.windows(2) {
            let (prev, next) = (&stream.records()[pair[0]], &stream.records()[pair[1]]);
            if next.timestamp <= prev.timestamp {
                return Err(PipelineError::UnalignableSource {
                    source_name: stream.name().to_string(),
                    entity: next.entity.clone(),
                    timestamp: next.timestamp,
                });
            }
            if mode == AlignMode::Native && !period.is_on_grid(prev.timestamp, next.timestamp) {
                return Err(PipelineError::schema(
                    stream.name(),
                    time_field,
                    format!(
                        "sample at {}{} is off the declared {} cadence",
                        next.timestamp,
                        next.entity
                            .as_deref()
                            .map(|e| format!(" for '{e}'"))
                            .unwrap_or_default(),
                        period
                    ),
                ));
            }
        }
    }

    let mut outcome = AlignOutcome::default();
    let mut pool: Vec<Option<Record>> = stream.take_records().into_iter().map(Some).collect();
    let mut aligned = Vec::with_capacity(pool.len());

    for rows in groups {
        let mut origin = None;
        let mut on_grid: Vec<Record> = Vec::with_capacity(rows.len());
        for i in rows {
            let Some(record) = pool[i].take() else {
                continue;
            };
            let anchor = *origin.get_or_insert(record.timestamp);
            if period.is_on_grid(anchor, record.timestamp) {
                on_grid.push(record);
            } else {
                outcome.off_grid += 1;
            }
        }

        let mut gaps = 0;
        let mut expected = None;
        for record in on_grid {
            if let Some(mut ts) = expected {
                while ts < record.timestamp {
                    aligned.push(Record::gap(ts, record.entity.clone(), width));
                    gaps += 1;
                    match ts.checked_add_signed(step) {
                        Some(next) => ts = next,
                        None => break,
                    }
                }
            }
            expected = record.timestamp.checked_add_signed(step);
            aligned.push(record);
        }

        if gaps > 0 {
            debug!(
                "{}: {} gap rows inserted for {}",
                stream.name(),
                gaps,
                aligned
                    .last()
                    .and_then(|r: &Record| r.entity.as_deref())
                    .unwrap_or("plant")
            );
        }
        outcome.gap_rows += gaps;
    }

    if outcome.off_grid > 0 {
        warn!(
            "{}: {} samples between {} grid points discarded",
            stream.name(),
            outcome.off_grid,
            period
        );
    }
    stream.replace_records(aligned);
    Ok(outcome)
}

/// What to do when two columns end up with the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Keep the first occurrence, drop later ones.
    #[default]
    KeepFirst,
    /// Keep the last occurrence (at the first occurrence's position).
    KeepLast,
    /// Fail with a schema violation.
    Reject,
}

/// Rename/merge policy applied to a source's raw columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnPolicy {
    /// Raw column renames applied before the contract mapping.
    #[serde(default)]
    pub renames: BTreeMap<String, String>,
    #[serde(default)]
    pub on_collision: CollisionPolicy,
}

/// Columns retained after collision resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    /// (input position, resolved name), in output order.
    pub columns: Vec<(usize, String)>,
    /// Columns removed as duplicates.
    pub collisions: usize,
}

impl ColumnPolicy {
    /// Apply the rename table to one raw column name.
    pub fn rename<'a>(&'a self, raw: &'a str) -> &'a str {
        self.renames.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Resolve candidate (position, name) pairs into unique names.
    pub fn resolve(
        &self,
        source_name: &str,
        candidates: Vec<(usize, String)>,
    ) -> Result<ColumnSelection, PipelineError> {
        let mut selection = ColumnSelection::default();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (position, name) in candidates {
            match seen.get(&name) {
                None => {
                    seen.insert(name.clone(), selection.columns.len());
                    selection.columns.push((position, name));
                }
                Some(&slot) => {
                    match self.on_collision {
                        CollisionPolicy::KeepFirst => {}
                        CollisionPolicy::KeepLast => selection.columns[slot].0 = position,
                        CollisionPolicy::Reject => {
                            return Err(PipelineError::schema(
                                source_name,
                                name,
                                "column appears more than once",
                            ));
                        }
                    }
                    warn!(
                        "{}: duplicate column '{}' resolved ({:?})",
                        source_name, name, self.on_collision
                    );
                    selection.collisions += 1;
                }
            }
        }

        Ok(selection)
    }
}
