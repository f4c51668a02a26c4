//! Dataset conformance validator
//!
//! Final gate of a run. Every stream is checked against its contract entry
//! (required fields present with the declared unit, declared period, strict
//! cadence), entity ids are reconciled against the asset table, and only
//! then is the [`PlantDataset`] assembled.

use std::collections::{BTreeMap, BTreeSet};

use log::{info, warn};

use crate::asset::AssetTable;
use crate::contract::{PlantContract, CURTAIL, METER, SCADA};
use crate::dataset::PlantDataset;
use crate::error::PipelineError;
use crate::report::QualityReport;
use crate::stream::Stream;

/// Cleaned and aligned sources awaiting validation.
#[derive(Debug, Clone)]
pub struct ConformInputs {
    pub scada: Stream,
    pub meter: Stream,
    pub curtail: Stream,
    pub reanalysis: BTreeMap<String, Stream>,
    pub assets: AssetTable,
    pub report: QualityReport,
}

/// Checks streams against the metadata contract.
pub struct Validator<'a> {
    contract: &'a PlantContract,
    prune_unreferenced: bool,
}

impl<'a> Validator<'a> {
    pub fn new(contract: &'a PlantContract) -> Self {
        Self {
            contract,
            prune_unreferenced: true,
        }
    }

    /// Keep assets no stream refers to.
    pub fn keep_unreferenced(mut self) -> Self {
        self.prune_unreferenced = false;
        self
    }

    /// Check one stream against the contract entry of the same name.
    pub fn check_stream(&self, stream: &Stream) -> Result<(), PipelineError> {
        let source = stream.name();
        let schema = self
            .contract
            .source(source)
            .ok_or_else(|| PipelineError::schema(source, "*", "source not declared in contract"))?;

        if stream.period() != schema.frequency {
            return Err(PipelineError::schema(
                source,
                "frequency",
                format!("declared {} but stream is {}", schema.frequency, stream.period()),
            ));
        }

        if schema.is_per_entity() != stream.is_keyed_by_entity() {
            return Err(PipelineError::schema(
                source,
                schema.asset_id.as_deref().unwrap_or("asset_id"),
                "entity keying does not match the contract",
            ));
        }

        for spec in &schema.fields {
            match stream.field_index(&spec.name) {
                None if spec.required => {
                    return Err(PipelineError::schema(source, &spec.name, "required field missing"));
                }
                None => {}
                Some(idx) => {
                    let actual = stream.fields()[idx].unit.as_deref();
                    if let Some(declared) = spec.unit.as_deref() {
                        if actual != Some(declared) {
                            return Err(PipelineError::schema(
                                source,
                                &spec.name,
                                format!(
                                    "unit '{}' does not match declared '{}'",
                                    actual.unwrap_or("none"),
                                    declared
                                ),
                            ));
                        }
                    }
                }
            }
        }

        let step = stream.period().as_duration();
        for rows in stream.entity_groups().values() {
            for pair in rows.windows(2) {
                let (prev, next) = (&stream.records()[pair[0]], &stream.records()[pair[1]]);
                if next.timestamp - prev.timestamp != step {
                    return Err(PipelineError::schema(
                        source,
                        &schema.time,
                        format!("cadence breaks at {}", next.timestamp),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Every entity referenced by a stream must exist in the asset table.
    ///
    /// Unreferenced assets are pruned unless disabled; the number pruned is
    /// returned.
    pub fn reconcile(&self, assets: &mut AssetTable, streams: &[&Stream]) -> Result<usize, PipelineError> {
        let mut referenced = BTreeSet::new();
        for stream in streams.iter().filter(|s| s.is_keyed_by_entity()) {
            for entity in stream.entities() {
                if !assets.contains(entity) {
                    return Err(PipelineError::EntityReconciliation {
                        asset_id: entity.to_string(),
                        source_name: stream.name().to_string(),
                    });
                }
                referenced.insert(entity.to_string());
            }
        }

        if !self.prune_unreferenced {
            return Ok(0);
        }
        let pruned = assets.retain(|a| referenced.contains(&a.asset_id));
        if pruned > 0 {
            warn!("pruned {} assets not referenced by any stream", pruned);
        }
        Ok(pruned)
    }

    /// Validate everything and assemble the conformed dataset.
    pub fn conform(&self, inputs: ConformInputs) -> Result<PlantDataset, PipelineError> {
        let ConformInputs {
            scada,
            meter,
            curtail,
            reanalysis,
            mut assets,
            mut report,
        } = inputs;

        for (expected, stream) in [(SCADA, &scada), (METER, &meter), (CURTAIL, &curtail)] {
            if stream.name() != expected {
                return Err(PipelineError::schema(expected, "*", "stream supplied under the wrong role"));
            }
            self.check_stream(stream)?;
        }
        for product in self.contract.reanalysis.keys() {
            let stream = reanalysis
                .get(product)
                .ok_or_else(|| PipelineError::schema(product, "*", "declared reanalysis product missing"))?;
            self.check_stream(stream)?;
        }

        let mut streams = vec![&scada, &meter, &curtail];
        streams.extend(reanalysis.values());
        let pruned = self.reconcile(&mut assets, &streams)?;
        report.assets_pruned = pruned;

        info!(
            "conformed dataset: {} assets, {} scada rows, {} reanalysis products",
            assets.len(),
            scada.len(),
            reanalysis.len()
        );

        Ok(PlantDataset {
            metadata: self.contract.clone(),
            assets,
            scada,
            meter,
            curtail,
            reanalysis,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::contract::{FieldSpec, PlantMetadata, SamplingPeriod, SourceSchema};
    use crate::stream::{Field, Record};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn ts(i: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            + Duration::minutes(10 * i)
    }

    fn contract() -> PlantContract {
        let ten = SamplingPeriod::ten_minutes();
        PlantContract {
            plant: PlantMetadata {
                name: "test".to_string(),
                latitude: 48.45,
                longitude: 5.59,
                capacity: 8.2,
            },
            scada: SourceSchema::new(ten, "Date_time")
                .with_asset_id("Wind_turbine_name")
                .with_field(FieldSpec::new("WTUR_W", "P_avg").with_unit("kW")),
            meter: SourceSchema::new(ten, "time_utc")
                .with_field(FieldSpec::new("MMTR_SupWh", "net_energy_kwh").with_unit("kWh")),
            curtail: SourceSchema::new(ten, "time_utc"),
            reanalysis: BTreeMap::new(),
            asset: Default::default(),
            files: Default::default(),
        }
    }

    fn scada(entities: &[&str]) -> Stream {
        let mut s = Stream::new(
            SCADA,
            SamplingPeriod::ten_minutes(),
            true,
            vec![Field::new("WTUR_W", Some("kW"))],
        );
        for e in entities {
            for i in 0..3 {
                s.push(Record::new(ts(i), Some(e), vec![Some(1.0)]));
            }
        }
        s
    }

    fn plant_stream(name: &str, field: Option<(&str, &str)>) -> Stream {
        let fields = field
            .map(|(n, u)| vec![Field::new(n, Some(u))])
            .unwrap_or_default();
        let width = fields.len();
        let mut s = Stream::new(name, SamplingPeriod::ten_minutes(), false, fields);
        for i in 0..3 {
            s.push(Record::new(ts(i), None, vec![Some(5.0); width]));
        }
        s
    }

    fn inputs(assets: &[&str]) -> ConformInputs {
        ConformInputs {
            scada: scada(&["R80711", "R80721"]),
            meter: plant_stream(METER, Some(("MMTR_SupWh", "kWh"))),
            curtail: plant_stream(CURTAIL, None),
            reanalysis: BTreeMap::new(),
            assets: AssetTable::new(assets.iter().map(|a| Asset::turbine(a)).collect()).unwrap(),
            report: QualityReport::default(),
        }
    }

    #[test]
    fn test_conform_prunes_unreferenced_assets() {
        let contract = contract();
        let dataset = Validator::new(&contract)
            .conform(inputs(&["R80711", "R80721", "R80790"]))
            .unwrap();

        assert_eq!(dataset.assets().ids().collect::<Vec<_>>(), vec!["R80711", "R80721"]);
        assert_eq!(dataset.report().assets_pruned, 1);
    }

    #[test]
    fn test_keep_unreferenced() {
        let contract = contract();
        let dataset = Validator::new(&contract)
            .keep_unreferenced()
            .conform(inputs(&["R80711", "R80721", "R80790"]))
            .unwrap();
        assert_eq!(dataset.assets().len(), 3);
    }

    #[test]
    fn test_missing_asset_names_id() {
        let contract = contract();
        let err = Validator::new(&contract).conform(inputs(&["R80711"])).unwrap_err();
        assert_eq!(
            err,
            PipelineError::EntityReconciliation {
                asset_id: "R80721".to_string(),
                source_name: "scada".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_required_field() {
        let contract = contract();
        let mut input = inputs(&["R80711", "R80721"]);
        input.meter = plant_stream(METER, None);
        let err = Validator::new(&contract).conform(input).unwrap_err();
        assert_eq!(
            err,
            PipelineError::schema("meter", "MMTR_SupWh", "required field missing")
        );
    }

    #[test]
    fn test_unit_mismatch() {
        let contract = contract();
        let mut input = inputs(&["R80711", "R80721"]);
        input.meter = plant_stream(METER, Some(("MMTR_SupWh", "MWh")));
        assert!(matches!(
            Validator::new(&contract).conform(input),
            Err(PipelineError::SchemaViolation { field, .. }) if field == "MMTR_SupWh"
        ));
    }

    #[test]
    fn test_period_and_cadence() {
        let contract = contract();
        let validator = Validator::new(&contract);

        let hourly = Stream::new(METER, SamplingPeriod::hourly(), false, vec![]);
        assert!(matches!(
            validator.check_stream(&hourly),
            Err(PipelineError::SchemaViolation { field, .. }) if field == "frequency"
        ));

        let mut broken = plant_stream(METER, Some(("MMTR_SupWh", "kWh")));
        broken.push(Record::new(ts(5), None, vec![Some(1.0)]));
        assert!(matches!(
            validator.check_stream(&broken),
            Err(PipelineError::SchemaViolation { field, .. }) if field == "time_utc"
        ));
    }

    #[test]
    fn test_missing_reanalysis_product() {
        let mut contract = contract();
        contract.reanalysis.insert(
            "era5".to_string(),
            SourceSchema::new(SamplingPeriod::hourly(), "datetime"),
        );
        let err = Validator::new(&contract)
            .conform(inputs(&["R80711", "R80721"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::SchemaViolation { source_name, .. } if source_name == "era5"));
    }
}
