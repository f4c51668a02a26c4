//! Pipeline configuration
//!
//! Every static knob of a run: range bounds, stuck-sensor detectors, angle
//! fields, energy integration, derived features and alignment policy, all
//! keyed by source name. [`PipelineConfig::default`] reproduces the
//! reference La Haute Borne cleaning. Any key left out of a JSON file keeps
//! its default.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::align::{AlignMode, ColumnPolicy};
use crate::contract::{PlantContract, CURTAIL, METER, SCADA};
use crate::energy::EnergyRule;
use crate::error::{ConfigError, LoadError};
use crate::features::DerivedFeature;
use crate::filters::{RangeRule, StuckRule};

/// Turbine power, kW
pub const POWER: &str = "WTUR_W";
/// Turbine interval energy, kWh
pub const ENERGY: &str = "WTUR_SupWh";
/// Nacelle wind speed, m/s
pub const WIND_SPEED: &str = "WMET_HorWdSpd";
/// Wind vane (direction relative to nacelle), deg
pub const VANE: &str = "WMET_HorWdDirRel";
/// Absolute wind direction, deg
pub const WIND_DIRECTION: &str = "WMET_HorWdDir";
/// Nacelle direction, deg
pub const NACELLE_DIRECTION: &str = "WNAC_Dir";
/// Ambient temperature, C
pub const TEMPERATURE: &str = "WMET_EnvTmp";
/// Blade pitch angle, deg
pub const PITCH: &str = "WROT_BlPthAngVal";

/// Reanalysis eastward wind component, m/s
pub const REANALYSIS_U: &str = "WMETR_HorWdSpdU";
/// Reanalysis northward wind component, m/s
pub const REANALYSIS_V: &str = "WMETR_HorWdSpdV";
/// Reanalysis wind direction, deg
pub const REANALYSIS_DIRECTION: &str = "WMETR_HorWdDir";

/// Cell-level rules for one sensor stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningRules {
    #[serde(default)]
    pub range: Vec<RangeRule>,
    /// Detectors, applied in order.
    #[serde(default)]
    pub stuck: Vec<StuckRule>,
    /// Angular fields normalized to (-180, 180].
    #[serde(default)]
    pub angles: Vec<String>,
    #[serde(default)]
    pub energy: Vec<EnergyRule>,
}

/// How one source is put on its grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentRule {
    #[serde(default)]
    pub mode: AlignMode,
    #[serde(default)]
    pub columns: ColumnPolicy,
}

impl AlignmentRule {
    pub fn regularize() -> Self {
        Self {
            mode: AlignMode::Regularize,
            columns: ColumnPolicy::default(),
        }
    }
}

/// Static configuration of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Cleaning rules keyed by source name.
    pub cleaning: BTreeMap<String, CleaningRules>,
    /// Derived features keyed by source name.
    pub derived: BTreeMap<String, Vec<DerivedFeature>>,
    /// Alignment overrides keyed by source name.
    pub alignment: BTreeMap<String, AlignmentRule>,
    /// Drop assets no stream references from the entity table.
    pub prune_unreferenced_assets: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let scada = CleaningRules {
            range: vec![RangeRule::new(TEMPERATURE, -15.0, 45.0)],
            stuck: vec![
                StuckRule::new(VANE, 3).invalidating(&[
                    PITCH,
                    POWER,
                    WIND_SPEED,
                    VANE,
                    TEMPERATURE,
                    NACELLE_DIRECTION,
                    WIND_DIRECTION,
                ]),
                StuckRule::new(TEMPERATURE, 20),
            ],
            angles: vec![PITCH.to_string()],
            energy: vec![EnergyRule::new(POWER, ENERGY)],
        };

        let direction = DerivedFeature::WindDirection {
            u: REANALYSIS_U.to_string(),
            v: REANALYSIS_V.to_string(),
            output: REANALYSIS_DIRECTION.to_string(),
        };

        let mut cleaning = BTreeMap::new();
        cleaning.insert(SCADA.to_string(), scada);

        let mut derived = BTreeMap::new();
        derived.insert("era5".to_string(), vec![direction.clone()]);
        derived.insert("merra2".to_string(), vec![direction]);

        let mut alignment = BTreeMap::new();
        alignment.insert("era5".to_string(), AlignmentRule::regularize());
        alignment.insert("merra2".to_string(), AlignmentRule::regularize());

        Self {
            cleaning,
            derived,
            alignment,
            prune_unreferenced_assets: true,
        }
    }
}

impl PipelineConfig {
    /// A configuration with no rules at all.
    pub fn empty() -> Self {
        Self {
            cleaning: BTreeMap::new(),
            derived: BTreeMap::new(),
            alignment: BTreeMap::new(),
            prune_unreferenced_assets: true,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::MissingFile(path.display().to_string()));
        }
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn cleaning_for(&self, source: &str) -> Option<&CleaningRules> {
        self.cleaning.get(source)
    }

    pub fn derived_for(&self, source: &str) -> &[DerivedFeature] {
        self.derived.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Alignment rule for a source: the override if any, otherwise native
    /// cadence for plant/turbine feeds and regularization for reanalysis.
    pub fn alignment_for(&self, source: &str) -> AlignmentRule {
        match self.alignment.get(source) {
            Some(rule) => rule.clone(),
            None if [SCADA, METER, CURTAIL].contains(&source) => AlignmentRule::default(),
            None => AlignmentRule::regularize(),
        }
    }

    /// Reject invalid rules and rules for sources the contract does not declare.
    pub fn validate(&self, contract: &PlantContract) -> Result<(), ConfigError> {
        let known = |source: &str| -> Result<(), ConfigError> {
            contract
                .source(source)
                .map(|_| ())
                .ok_or_else(|| ConfigError::UnknownSource(source.to_string()))
        };

        for (source, rules) in &self.cleaning {
            known(source)?;
            for rule in &rules.range {
                rule.validate()?;
            }
            for rule in &rules.stuck {
                rule.validate()?;
            }
            for rule in &rules.energy {
                rule.units()?;
            }
        }
        for source in self.derived.keys().chain(self.alignment.keys()) {
            known(source)?;
        }
        Ok(())
    }
}
