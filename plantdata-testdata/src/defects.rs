// PlantData Testdata - Defect injection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Defect injection.
//!
//! Raw plant feeds carry a small zoo of recurring defects. This module
//! decides where each one goes so that a pipeline run over the result has
//! exactly predictable quality counts:
//!
//! - turbine-level defects (duplicate rows, temperature spikes, stuck vane
//!   and stuck temperature runs) each get their own slot of the SCADA time
//!   axis, so no two of them touch on the same turbine;
//! - reanalysis defects (missing hours, duplicated columns) are placed
//!   mid-series.

use serde::{Deserialize, Serialize};

/// Temperature written by a spike, well outside any plausible range.
pub const SPIKE_TEMPERATURE: f64 = 50.0;

/// How many defects of each kind to inject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectConfig {
    /// SCADA rows emitted twice.
    pub duplicate_rows: usize,
    /// SCADA temperature cells replaced with [`SPIKE_TEMPERATURE`].
    pub temperature_spikes: usize,
    /// Runs of unchanged wind-vane readings.
    pub stuck_vane_runs: usize,
    /// Samples per stuck vane run.
    pub stuck_vane_length: usize,
    /// Runs of unchanged temperature readings.
    pub stuck_temperature_runs: usize,
    /// Samples per stuck temperature run.
    pub stuck_temperature_length: usize,
    /// Consecutive hours removed from the first reanalysis product.
    pub reanalysis_gap_hours: usize,
    /// Emit the wind-speed column of the second reanalysis product twice.
    pub duplicate_reanalysis_column: bool,
    /// Asset-table rows with no SCADA data behind them.
    pub spare_assets: usize,
}

impl Default for DefectConfig {
    fn default() -> Self {
        Self {
            duplicate_rows: 1,
            temperature_spikes: 1,
            stuck_vane_runs: 1,
            stuck_vane_length: 5,
            stuck_temperature_runs: 1,
            stuck_temperature_length: 24,
            reanalysis_gap_hours: 3,
            duplicate_reanalysis_column: true,
            spare_assets: 1,
        }
    }
}

impl DefectConfig {
    /// A clean plant.
    pub fn none() -> Self {
        Self {
            duplicate_rows: 0,
            temperature_spikes: 0,
            stuck_vane_runs: 0,
            stuck_vane_length: 5,
            stuck_temperature_runs: 0,
            stuck_temperature_length: 24,
            reanalysis_gap_hours: 0,
            duplicate_reanalysis_column: false,
            spare_assets: 0,
        }
    }

    /// Number of turbine-level defects.
    pub fn turbine_defects(&self) -> usize {
        self.duplicate_rows + self.temperature_spikes + self.stuck_vane_runs + self.stuck_temperature_runs
    }

    /// Longest run any turbine-level defect occupies.
    pub fn longest_run(&self) -> usize {
        let mut longest = 1;
        if self.stuck_vane_runs > 0 {
            longest = longest.max(self.stuck_vane_length);
        }
        if self.stuck_temperature_runs > 0 {
            longest = longest.max(self.stuck_temperature_length);
        }
        longest
    }
}

/// Kind of an injected turbine-level defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefectKind {
    DuplicateRow,
    TemperatureSpike,
    StuckVane,
    StuckTemperature,
}

impl DefectKind {
    /// Quality-report counter the defect is expected to move.
    pub fn expected_effect(&self) -> &'static str {
        match self {
            DefectKind::DuplicateRow => "duplicates_removed",
            DefectKind::TemperatureSpike => "range_cells_nulled",
            DefectKind::StuckVane | DefectKind::StuckTemperature => "stuck_runs",
        }
    }
}

/// One placed turbine-level defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub kind: DefectKind,
    /// Index into the turbine list.
    pub turbine: usize,
    /// First affected SCADA sample.
    pub start_sample: usize,
    /// Affected samples (1 for point defects).
    pub length: usize,
}

impl Placement {
    pub fn covers(&self, turbine: usize, sample: usize) -> bool {
        self.turbine == turbine && sample >= self.start_sample && sample < self.start_sample + self.length
    }
}

/// Where every defect of a [`DefectConfig`] lands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefectPlan {
    pub placements: Vec<Placement>,
    /// Removed reanalysis hours, as an index range into the hourly series.
    pub reanalysis_gap: Option<(usize, usize)>,
}

impl DefectPlan {
    /// Lay out the defects over `samples` SCADA samples of `turbines`
    /// turbines and `hours` reanalysis hours.
    ///
    /// Returns `None` when the series is too short to keep the defects
    /// apart.
    pub fn layout(config: &DefectConfig, turbines: usize, samples: usize, hours: usize) -> Option<Self> {
        let mut plan = Self::default();

        let count = config.turbine_defects();
        if count > 0 {
            if turbines == 0 {
                return None;
            }
            // one slot per defect plus a margin, each long enough for the
            // longest run with a clean sample on both sides
            let slot = samples / (count + 1);
            if slot < config.longest_run() + 2 {
                return None;
            }

            let kinds = std::iter::repeat(DefectKind::DuplicateRow)
                .take(config.duplicate_rows)
                .chain(std::iter::repeat(DefectKind::TemperatureSpike).take(config.temperature_spikes))
                .chain(std::iter::repeat(DefectKind::StuckVane).take(config.stuck_vane_runs))
                .chain(std::iter::repeat(DefectKind::StuckTemperature).take(config.stuck_temperature_runs));

            for (j, kind) in kinds.enumerate() {
                let length = match kind {
                    DefectKind::StuckVane => config.stuck_vane_length,
                    DefectKind::StuckTemperature => config.stuck_temperature_length,
                    _ => 1,
                };
                plan.placements.push(Placement {
                    kind,
                    turbine: j % turbines,
                    start_sample: (j + 1) * slot,
                    length,
                });
            }
        }

        if config.reanalysis_gap_hours > 0 {
            let start = hours / 2;
            // keep at least one real hour on each side of the hole
            if start == 0 || start + config.reanalysis_gap_hours >= hours {
                return None;
            }
            plan.reanalysis_gap = Some((start, start + config.reanalysis_gap_hours));
        }

        Some(plan)
    }

    /// Defect of `kind` covering a turbine sample, if any.
    pub fn at(&self, kind: DefectKind, turbine: usize, sample: usize) -> Option<&Placement> {
        self.placements
            .iter()
            .find(|p| p.kind == kind && p.covers(turbine, sample))
    }

    pub fn count(&self, kind: DefectKind) -> usize {
        self.placements.iter().filter(|p| p.kind == kind).count()
    }

    /// Whether reanalysis hour `hour` was removed.
    pub fn is_gap_hour(&self, hour: usize) -> bool {
        matches!(self.reanalysis_gap, Some((start, end)) if hour >= start && hour < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placements_do_not_overlap() {
        let plan = DefectPlan::layout(&DefectConfig::default(), 1, 144, 24).unwrap();
        assert_eq!(plan.placements.len(), 4);

        for (i, a) in plan.placements.iter().enumerate() {
            for b in &plan.placements[i + 1..] {
                assert!(a.start_sample + a.length < b.start_sample);
            }
        }
        let last = plan.placements.last().unwrap();
        assert!(last.start_sample + last.length < 144);
    }

    #[test]
    fn test_turbines_rotate() {
        let plan = DefectPlan::layout(&DefectConfig::default(), 4, 288, 48).unwrap();
        let turbines: Vec<usize> = plan.placements.iter().map(|p| p.turbine).collect();
        assert_eq!(turbines, vec![0, 1, 2, 3]);
        assert_eq!(plan.count(DefectKind::StuckVane), 1);
    }

    #[test]
    fn test_too_short_series() {
        assert!(DefectPlan::layout(&DefectConfig::default(), 4, 40, 24).is_none());
        assert!(DefectPlan::layout(&DefectConfig::none(), 4, 40, 24).is_some());
    }

    #[test]
    fn test_reanalysis_gap() {
        let plan = DefectPlan::layout(&DefectConfig::default(), 4, 144, 24).unwrap();
        assert_eq!(plan.reanalysis_gap, Some((12, 15)));
        assert!(plan.is_gap_hour(12));
        assert!(plan.is_gap_hour(14));
        assert!(!plan.is_gap_hour(15));
    }

    #[test]
    fn test_lookup() {
        let plan = DefectPlan::layout(&DefectConfig::default(), 4, 144, 24).unwrap();
        let vane = plan.placements[2];
        assert_eq!(vane.kind, DefectKind::StuckVane);
        assert!(plan.at(DefectKind::StuckVane, vane.turbine, vane.start_sample + 4).is_some());
        assert!(plan.at(DefectKind::StuckVane, vane.turbine, vane.start_sample + 5).is_none());
        assert_eq!(DefectKind::DuplicateRow.expected_effect(), "duplicates_removed");
    }
}
