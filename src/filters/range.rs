//! Range filter

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stream::Stream;

/// What to do with a reading outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangeAction {
    /// Replace the cell with a missing value (ambient/sensor fields).
    #[default]
    NullCell,
    /// Remove the whole record.
    DropRow,
}

/// Inclusive valid range for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeRule {
    pub field: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub action: RangeAction,
}

impl RangeRule {
    pub fn new(field: &str, min: f64, max: f64) -> Self {
        Self {
            field: field.to_string(),
            min,
            max,
            action: RangeAction::NullCell,
        }
    }

    pub fn with_action(mut self, action: RangeAction) -> Self {
        self.action = action;
        self
    }

    /// Bounds must be finite and ordered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidRange {
                field: self.field.clone(),
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// True when `value` lies within [min, max].
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Counts produced by [`apply_range_rules`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeOutcome {
    pub cells_nulled: usize,
    pub rows_dropped: usize,
}

/// Apply every range rule to the stream.
///
/// Missing cells are left alone. Rules naming a field the stream does not
/// carry are skipped.
pub fn apply_range_rules(stream: &mut Stream, rules: &[RangeRule]) -> RangeOutcome {
    let mut outcome = RangeOutcome::default();

    for rule in rules {
        let Some(idx) = stream.field_index(&rule.field) else {
            debug!("{}: no field '{}', range rule skipped", stream.name(), rule.field);
            continue;
        };

        match rule.action {
            RangeAction::NullCell => {
                let mut nulled = 0;
                for record in stream.records_mut() {
                    if let Some(v) = record.values[idx] {
                        if !rule.contains(v) {
                            record.values[idx] = None;
                            nulled += 1;
                        }
                    }
                }
                outcome.cells_nulled += nulled;
                if nulled > 0 {
                    debug!(
                        "{}: nulled {} '{}' cells outside [{}, {}]",
                        stream.name(),
                        nulled,
                        rule.field,
                        rule.min,
                        rule.max
                    );
                }
            }
            RangeAction::DropRow => {
                let dropped = stream.retain_records(|r| match r.values[idx] {
                    Some(v) => rule.contains(v),
                    None => true,
                });
                outcome.rows_dropped += dropped;
                if dropped > 0 {
                    warn!(
                        "{}: dropped {} rows with '{}' outside [{}, {}]",
                        stream.name(),
                        dropped,
                        rule.field,
                        rule.min,
                        rule.max
                    );
                }
            }
        }
    }

    outcome
}

/// Drop records of an entity-keyed stream that carry no usable entity id.
pub fn drop_unidentified(stream: &mut Stream) -> usize {
    if !stream.is_keyed_by_entity() {
        return 0;
    }
    let dropped = stream.retain_records(|r| r.entity.as_deref().is_some_and(|e| !e.is_empty()));
    if dropped > 0 {
        warn!("{}: dropped {} rows without an entity id", stream.name(), dropped);
    }
    dropped
}
