// PlantData Testdata - Plant manifest
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Plant manifest.
//!
//! Written next to the generated files. It records how the plant was
//! generated, where every defect went, and the quality counts a pipeline
//! run with the reference cleaning should report.

use crate::defects::{DefectKind, DefectPlan, Placement};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Manifest describing a generated plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantManifest {
    /// Plant name.
    pub name: String,
    /// Turbine identifiers, in generation order.
    pub turbines: Vec<String>,
    /// Asset-table rows with no SCADA data.
    #[serde(default)]
    pub spare_assets: Vec<String>,
    /// First SCADA timestamp (UTC).
    pub start: NaiveDateTime,
    /// SCADA samples per turbine, before defects.
    pub samples: usize,
    /// SCADA cadence in seconds.
    pub cadence_secs: u64,
    /// Reanalysis hours per product, before defects.
    pub reanalysis_hours: usize,
    /// Placed turbine-level defects.
    #[serde(default)]
    pub defects: Vec<DefectManifest>,
    /// Expected quality counts.
    pub expected: ExpectedCounts,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Random seed used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// One defect as recorded in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefectManifest {
    pub kind: DefectKind,
    pub turbine: String,
    pub start: NaiveDateTime,
    pub samples: usize,
    /// Quality-report counter the defect moves.
    pub expected_effect: String,
}

/// Quality counts expected from a run with the reference cleaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedCounts {
    /// SCADA rows removed by deduplication.
    pub duplicates_removed: usize,
    /// SCADA temperature cells nulled by the range filter.
    pub range_cells_nulled: usize,
    /// Stuck runs found in SCADA.
    pub stuck_runs: usize,
    /// SCADA samples inside stuck vane runs.
    pub stuck_vane_samples: usize,
    /// SCADA samples inside stuck temperature runs.
    pub stuck_temperature_samples: usize,
    /// Gap rows inserted per reanalysis product.
    #[serde(default)]
    pub gap_rows: BTreeMap<String, usize>,
    /// Duplicated columns per reanalysis product.
    #[serde(default)]
    pub columns_collided: BTreeMap<String, usize>,
    /// Assets dropped from the entity table.
    pub assets_pruned: usize,
}

impl ExpectedCounts {
    /// Derive the expected counts from a defect plan.
    pub fn from_plan(plan: &DefectPlan) -> Self {
        let samples = |kind: DefectKind| -> usize {
            plan.placements
                .iter()
                .filter(|p| p.kind == kind)
                .map(|p| p.length)
                .sum()
        };

        Self {
            duplicates_removed: plan.count(DefectKind::DuplicateRow),
            range_cells_nulled: plan.count(DefectKind::TemperatureSpike),
            stuck_runs: plan.count(DefectKind::StuckVane) + plan.count(DefectKind::StuckTemperature),
            stuck_vane_samples: samples(DefectKind::StuckVane),
            stuck_temperature_samples: samples(DefectKind::StuckTemperature),
            ..Default::default()
        }
    }
}

impl DefectManifest {
    pub fn from_placement(placement: &Placement, turbine: &str, start: NaiveDateTime) -> Self {
        Self {
            kind: placement.kind,
            turbine: turbine.to_string(),
            start,
            samples: placement.length,
            expected_effect: placement.kind.expected_effect().to_string(),
        }
    }
}

impl PlantManifest {
    /// Create a new manifest.
    pub fn new(name: &str, start: NaiveDateTime, cadence_secs: u64) -> Self {
        Self {
            name: name.to_string(),
            turbines: Vec::new(),
            spare_assets: Vec::new(),
            start,
            samples: 0,
            cadence_secs,
            reanalysis_hours: 0,
            defects: Vec::new(),
            expected: ExpectedCounts::default(),
            generated_at: Utc::now(),
            seed: None,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to a JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
