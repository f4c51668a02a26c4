//! Data-quality report
//!
//! Counts every cell-level correction the pipeline made, per source, so a
//! run that "succeeded" can still be audited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Corrections applied to one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Data rows in the raw table.
    pub rows_read: usize,
    /// Rows dropped for a structural defect (no entity id).
    pub rows_invalid: usize,
    /// Rows removed by deduplication.
    pub duplicates_removed: usize,
    /// Non-empty cells that did not parse as numbers.
    pub cells_unparsed: usize,
    /// Cells nulled by range rules.
    pub range_cells_nulled: usize,
    /// Rows dropped by range rules.
    pub range_rows_dropped: usize,
    /// Stuck runs detected.
    pub stuck_runs: usize,
    /// Cells nulled by stuck-sensor rules.
    pub stuck_cells_nulled: usize,
    /// Angle cells remapped into (-180, 180].
    pub angles_normalized: usize,
    /// Explicit gap rows inserted by the aligner.
    pub gap_rows_inserted: usize,
    /// Samples discarded because they fell off the grid.
    pub off_grid_discarded: usize,
    /// Duplicate columns resolved.
    pub columns_collided: usize,
    /// Raw columns not declared in the contract.
    pub columns_undeclared: usize,
    /// Rows in the conformed stream.
    pub rows_out: usize,
}

impl SourceReport {
    /// Cells nulled by any rule.
    pub fn cells_nulled(&self) -> usize {
        self.range_cells_nulled + self.stuck_cells_nulled
    }

    /// Rows removed by any stage.
    pub fn rows_removed(&self) -> usize {
        self.rows_invalid + self.duplicates_removed + self.range_rows_dropped + self.off_grid_discarded
    }
}

/// Quality report of a whole pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Per-source counts keyed by source name.
    pub sources: BTreeMap<String, SourceReport>,
    /// Assets in the raw table.
    pub assets_loaded: usize,
    /// Assets pruned because no stream references them.
    pub assets_pruned: usize,
}

impl QualityReport {
    pub fn source(&self, name: &str) -> Option<&SourceReport> {
        self.sources.get(name)
    }

    pub(crate) fn source_mut(&mut self, name: &str) -> &mut SourceReport {
        self.sources.entry(name.to_string()).or_default()
    }

    /// Serialize the report as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>9} {:>7} {:>6} {:>7} {:>7} {:>6} {:>8} {:>7}",
            "source", "rows_in", "dups", "range", "stuck", "gaps", "offgrid", "dupcols", "rows_out"
        )?;
        for (name, s) in &self.sources {
            writeln!(
                f,
                "{:<10} {:>9} {:>7} {:>6} {:>7} {:>7} {:>6} {:>8} {:>7}",
                name,
                s.rows_read,
                s.duplicates_removed,
                s.range_cells_nulled + s.range_rows_dropped,
                s.stuck_cells_nulled,
                s.gap_rows_inserted,
                s.off_grid_discarded,
                s.columns_collided,
                s.rows_out
            )?;
        }
        write!(
            f,
            "assets: {} loaded, {} pruned",
            self.assets_loaded, self.assets_pruned
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals() {
        let s = SourceReport {
            duplicates_removed: 1,
            rows_invalid: 2,
            range_cells_nulled: 3,
            stuck_cells_nulled: 5,
            ..Default::default()
        };
        assert_eq!(s.cells_nulled(), 8);
        assert_eq!(s.rows_removed(), 3);
    }

    #[test]
    fn test_json_and_display() {
        let mut report = QualityReport::default();
        report.source_mut("scada").duplicates_removed = 4;
        report.assets_loaded = 4;

        let json = report.to_json().unwrap();
        assert!(json.contains("\"duplicates_removed\": 4"));
        let back: QualityReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);

        let text = report.to_string();
        assert!(text.contains("scada"));
        assert!(text.contains("4 loaded"));
    }
}
