// PlantData Testdata - Synthetic wind-plant generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # PlantData Testdata
//!
//! Synthetic wind-plant raw feeds for exercising the `plantdata` pipeline.
//!
//! A generated plant comes as the same set of files a real plant ships:
//!
//! - **SCADA**: 10-minute turbine records with local-offset timestamps
//! - **Plant data**: revenue meter, availability and curtailment energy
//! - **Reanalysis**: hourly ERA5-like and MERRA-2-like wind components
//! - **Asset table**: one row per turbine, plus optional spare rows
//! - **Contract**: a `plant_meta.json` mapping raw columns to canonical names
//!
//! Defects are injected at deterministic positions and recorded in a
//! manifest, so tests can assert exact quality-report counts.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plantdata_testdata::{generate_plant, PlantGeneratorConfig};
//!
//! let config = PlantGeneratorConfig::new()
//!     .with_turbines(4)
//!     .with_days(2)
//!     .with_seed(42);
//!
//! let plant = generate_plant(&config).unwrap();
//! plant.write_to("target/synthetic").unwrap();
//! println!("{} duplicate rows injected", plant.manifest.expected.duplicates_removed);
//! ```

pub mod contract;
pub mod dataset;
pub mod defects;
pub mod generator;
pub mod manifest;
pub mod patterns;

// Re-exports for convenience
pub use dataset::{CsvTable, DatasetError, SyntheticPlant};
pub use defects::{DefectConfig, DefectKind, DefectPlan};
pub use generator::{generate_plant, PlantGeneratorConfig};
pub use manifest::{ExpectedCounts, PlantManifest};
pub use patterns::PlantWeather;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
