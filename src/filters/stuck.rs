//! Stuck-sensor detector
//!
//! A sensor is considered stuck when it reports the bit-identical value for
//! at least `window` consecutive samples of one entity. Every sample of such
//! a run is flagged and the rule's invalidation group is nulled at those
//! positions. Missing values break a run.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::stream::Stream;

/// One detector instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StuckRule {
    /// Reference signal scanned for unchanged runs.
    pub field: String,
    /// Minimum run length (>= 2).
    pub window: usize,
    /// Fields nulled where the reference is stuck. Empty means the
    /// reference field alone.
    #[serde(default)]
    pub invalidates: Vec<String>,
}

impl StuckRule {
    pub fn new(field: &str, window: usize) -> Self {
        Self {
            field: field.to_string(),
            window,
            invalidates: Vec::new(),
        }
    }

    pub fn invalidating(mut self, fields: &[&str]) -> Self {
        self.invalidates = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window < 2 {
            return Err(ConfigError::StuckWindowTooShort {
                field: self.field.clone(),
                window: self.window,
            });
        }
        Ok(())
    }

    /// Fields nulled by this rule.
    pub fn targets(&self) -> Vec<&str> {
        if self.invalidates.is_empty() {
            vec![self.field.as_str()]
        } else {
            self.invalidates.iter().map(String::as_str).collect()
        }
    }
}

/// Counts produced by [`apply_stuck_rules`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StuckOutcome {
    pub runs: usize,
    pub cells_nulled: usize,
}

/// Flag every position belonging to a run of at least `window` identical values.
///
/// Returns the flags and the number of runs found.
pub fn flag_stuck(values: &[Option<f64>], window: usize) -> (Vec<bool>, usize) {
    let mut flags = vec![false; values.len()];
    let mut runs = 0;
    let mut start = 0;

    while start < values.len() {
        let Some(first) = values[start] else {
            start += 1;
            continue;
        };

        let mut end = start + 1;
        while end < values.len() && values[end].map(f64::to_bits) == Some(first.to_bits()) {
            end += 1;
        }

        if end - start >= window {
            flags[start..end].iter_mut().for_each(|f| *f = true);
            runs += 1;
        }
        start = end;
    }

    (flags, runs)
}

/// Run every detector over every entity of the stream, in rule order.
///
/// Each rule sees the nulls written by the rules before it.
pub fn apply_stuck_rules(stream: &mut Stream, rules: &[StuckRule]) -> StuckOutcome {
    let mut outcome = StuckOutcome::default();

    for rule in rules {
        let Some(reference) = stream.field_index(&rule.field) else {
            debug!("{}: no field '{}', stuck rule skipped", stream.name(), rule.field);
            continue;
        };
        let targets: Vec<usize> = rule
            .targets()
            .into_iter()
            .filter_map(|name| stream.field_index(name))
            .collect();

        let mut groups: Vec<(Option<String>, Vec<usize>)> = stream
            .entity_groups()
            .into_iter()
            .map(|(entity, rows)| (entity.map(str::to_string), rows))
            .collect();

        for (entity, rows) in groups.iter_mut() {
            rows.sort_by_key(|&i| stream.records()[i].timestamp);

            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|&i| stream.records()[i].values[reference])
                .collect();
            let (flags, runs) = flag_stuck(&values, rule.window);
            if runs == 0 {
                continue;
            }

            let mut nulled = 0;
            let records = stream.records_mut();
            for (&row, _) in rows.iter().zip(&flags).filter(|(_, &f)| f) {
                for &t in &targets {
                    if records[row].values[t].take().is_some() {
                        nulled += 1;
                    }
                }
            }

            debug!(
                "{}: {} stuck '{}' runs (w={}) for {}, {} cells nulled",
                stream.name(),
                runs,
                rule.field,
                rule.window,
                entity.as_deref().unwrap_or("plant"),
                nulled
            );
            outcome.runs += runs;
            outcome.cells_nulled += nulled;
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::SamplingPeriod;
    use crate::stream::{Field, Record};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: usize) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(10 * i as i64)
    }

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_run_of_window_flags_exactly_the_run() {
        let (flags, runs) = flag_stuck(&some(&[5.0, 5.0, 5.0, 6.0]), 3);
        assert_eq!(flags, vec![true, true, true, false]);
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_run_shorter_than_window_not_flagged() {
        let (flags, runs) = flag_stuck(&some(&[1.0, 5.0, 5.0, 6.0]), 3);
        assert!(flags.iter().all(|f| !f));
        assert_eq!(runs, 0);
    }

    #[test]
    fn test_missing_breaks_run() {
        let values = vec![Some(5.0), Some(5.0), None, Some(5.0), Some(5.0)];
        let (flags, _) = flag_stuck(&values, 3);
        assert!(flags.iter().all(|f| !f));
    }

    #[test]
    fn test_bit_identical_only() {
        let values = some(&[0.1 + 0.2, 0.3, 0.3]);
        let (flags, _) = flag_stuck(&values, 3);
        assert!(flags.iter().all(|f| !f));
    }

    #[test]
    fn test_long_run_flags_whole_run() {
        let (flags, runs) = flag_stuck(&some(&[1.0, 2.0, 2.0, 2.0, 2.0, 2.0, 3.0]), 3);
        assert_eq!(flags, vec![false, true, true, true, true, true, false]);
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_window_validation() {
        assert!(StuckRule::new("WMET_EnvTmp", 1).validate().is_err());
        assert!(StuckRule::new("WMET_EnvTmp", 2).validate().is_ok());
    }

    #[test]
    fn test_group_invalidation_per_entity() {
        let mut s = Stream::new(
            "scada",
            SamplingPeriod::ten_minutes(),
            true,
            vec![
                Field::new("WMET_HorWdDirRel", Some("deg")),
                Field::new("WTUR_W", Some("kW")),
                Field::new("WMET_EnvTmp", Some("C")),
            ],
        );
        // T1 vane stuck at 4.0 for 3 samples, T2 interleaved and varying
        for i in 0..4 {
            let vane = if i < 3 { 4.0 } else { 7.0 };
            s.push(Record::new(ts(i), Some("T1"), vec![Some(vane), Some(100.0), Some(10.0)]));
            s.push(Record::new(ts(i), Some("T2"), vec![Some(i as f64), Some(100.0), Some(10.0)]));
        }

        let rule = StuckRule::new("WMET_HorWdDirRel", 3).invalidating(&["WMET_HorWdDirRel", "WTUR_W"]);
        let outcome = apply_stuck_rules(&mut s, &[rule]);

        assert_eq!(outcome.runs, 1);
        assert_eq!(outcome.cells_nulled, 6);
        let t1_power: Vec<Option<f64>> = s
            .entity_records("T1")
            .map(|r| r.values[1])
            .collect();
        assert_eq!(t1_power, vec![None, None, None, Some(100.0)]);
        // temperature is not in the group
        assert!(s.entity_records("T1").all(|r| r.values[2].is_some()));
        assert!(s.entity_records("T2").all(|r| r.values[1].is_some()));
    }
}
