//! Conformed dataset
//!
//! The terminal artifact of a pipeline run. Only the validator builds one;
//! consumers get read-only accessors and share it freely (`Arc`), cloning
//! when they need a private working copy.

use std::collections::BTreeMap;

use crate::asset::AssetTable;
use crate::contract::PlantContract;
use crate::report::QualityReport;
use crate::stream::Stream;

/// Cleaned, aligned and validated plant data.
#[derive(Debug, Clone, PartialEq)]
pub struct PlantDataset {
    pub(crate) metadata: PlantContract,
    pub(crate) assets: AssetTable,
    pub(crate) scada: Stream,
    pub(crate) meter: Stream,
    pub(crate) curtail: Stream,
    pub(crate) reanalysis: BTreeMap<String, Stream>,
    pub(crate) report: QualityReport,
}

impl PlantDataset {
    /// The metadata contract the dataset was validated against.
    pub fn metadata(&self) -> &PlantContract {
        &self.metadata
    }

    /// Entity table, restricted to referenced assets unless pruning is off.
    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    /// Turbine SCADA, indexed by (entity, timestamp).
    pub fn scada(&self) -> &Stream {
        &self.scada
    }

    /// Revenue meter, indexed by timestamp.
    pub fn meter(&self) -> &Stream {
        &self.meter
    }

    /// Curtailment and availability, indexed by timestamp.
    pub fn curtail(&self) -> &Stream {
        &self.curtail
    }

    /// Reanalysis streams keyed by product name.
    pub fn reanalysis(&self) -> &BTreeMap<String, Stream> {
        &self.reanalysis
    }

    pub fn reanalysis_product(&self, name: &str) -> Option<&Stream> {
        self.reanalysis.get(name)
    }

    /// Cell-level corrections made while conforming.
    pub fn report(&self) -> &QualityReport {
        &self.report
    }
}
