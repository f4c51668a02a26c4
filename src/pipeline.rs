//! Pipeline orchestration
//!
//! Runs the stages in their fixed order for every source:
//!
//! 1. ingest (column policy, contract renames, time normalization)
//! 2. structural row check and deduplication
//! 3. range and stuck-sensor filters
//! 4. angle normalization and energy integration
//! 5. derived features
//! 6. alignment
//!
//! and hands the results to the validator. A run is a pure function of the
//! raw sources, the contract and the configuration; it keeps no state
//! between calls. Caching lives in [`crate::cache`].

use std::collections::BTreeMap;

use log::{info, warn};

use crate::align::align;
use crate::angle;
use crate::asset::AssetTable;
use crate::config::PipelineConfig;
use crate::contract::{PlantContract, SourceSchema, CURTAIL, METER, SCADA};
use crate::dataset::PlantDataset;
use crate::dedup::dedup;
use crate::energy;
use crate::error::{PipelineError, Result};
use crate::filters::{apply_range_rules, apply_stuck_rules, drop_unidentified};
use crate::ingest::build_stream;
use crate::io::{RawSources, RawTable};
use crate::report::{QualityReport, SourceReport};
use crate::stream::Stream;
use crate::validate::{ConformInputs, Validator};

/// A validated contract + configuration pair, ready to run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    contract: PlantContract,
    config: PipelineConfig,
}

impl Pipeline {
    /// Check the contract and configuration before any data is touched.
    pub fn new(contract: PlantContract, config: PipelineConfig) -> Result<Self> {
        contract.validate()?;
        config.validate(&contract)?;
        Ok(Self { contract, config })
    }

    pub fn contract(&self) -> &PlantContract {
        &self.contract
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Conform every raw source into a validated dataset.
    pub fn run(&self, raw: &RawSources) -> Result<PlantDataset> {
        let mut report = QualityReport::default();

        let assets = AssetTable::from_raw(&raw.assets, &self.contract.asset)?;
        report.assets_loaded = assets.len();

        let scada = self.conform_source(SCADA, &raw.scada, &self.contract.scada, &mut report)?;
        let meter = self.conform_source(METER, &raw.plant, &self.contract.meter, &mut report)?;
        let curtail = self.conform_source(CURTAIL, &raw.plant, &self.contract.curtail, &mut report)?;

        let mut reanalysis = BTreeMap::new();
        for (product, schema) in &self.contract.reanalysis {
            let table = raw
                .reanalysis
                .get(product)
                .ok_or_else(|| PipelineError::schema(product, "*", "no raw table supplied"))?;
            let stream = self.conform_source(product, table, schema, &mut report)?;
            reanalysis.insert(product.clone(), stream);
        }
        for product in raw.reanalysis.keys() {
            if !self.contract.reanalysis.contains_key(product) {
                warn!("reanalysis product '{}' not declared in contract, ignored", product);
            }
        }

        let mut validator = Validator::new(&self.contract);
        if !self.config.prune_unreferenced_assets {
            validator = validator.keep_unreferenced();
        }
        let dataset = validator.conform(ConformInputs {
            scada,
            meter,
            curtail,
            reanalysis,
            assets,
            report,
        })?;
        Ok(dataset)
    }

    fn conform_source(
        &self,
        name: &str,
        table: &RawTable,
        schema: &SourceSchema,
        report: &mut QualityReport,
    ) -> Result<Stream> {
        let rule = self.config.alignment_for(name);
        let mut counts = SourceReport::default();

        let (mut stream, ingest) = build_stream(name, table, schema, &rule.columns)?;
        counts.rows_read = ingest.rows_read;
        counts.cells_unparsed = ingest.cells_unparsed;
        counts.columns_undeclared = ingest.columns_undeclared;
        counts.columns_collided = ingest.columns_collided;

        counts.rows_invalid = drop_unidentified(&mut stream);
        counts.duplicates_removed = dedup(&mut stream);

        if let Some(rules) = self.config.cleaning_for(name) {
            let range = apply_range_rules(&mut stream, &rules.range);
            counts.range_cells_nulled = range.cells_nulled;
            counts.range_rows_dropped = range.rows_dropped;

            let stuck = apply_stuck_rules(&mut stream, &rules.stuck);
            counts.stuck_runs = stuck.runs;
            counts.stuck_cells_nulled = stuck.cells_nulled;

            for field in &rules.angles {
                counts.angles_normalized += angle::normalize_field(&mut stream, field);
            }
            for energy_rule in &rules.energy {
                if !energy::integrate(&mut stream, energy_rule)? {
                    warn!("{}: no '{}' field to integrate", name, energy_rule.power_field);
                }
            }
        }

        for feature in self.config.derived_for(name) {
            feature.apply(&mut stream);
        }

        let aligned = align(&mut stream, rule.mode, &schema.time)?;
        counts.gap_rows_inserted = aligned.gap_rows;
        counts.off_grid_discarded = aligned.off_grid;
        counts.rows_out = stream.len();

        info!(
            "{}: {} rows in, {} out ({} duplicates, {} cells nulled, {} gap rows)",
            name,
            counts.rows_read,
            counts.rows_out,
            counts.duplicates_removed,
            counts.cells_nulled(),
            counts.gap_rows_inserted
        );
        *report.source_mut(name) = counts;
        Ok(stream)
    }
}
