// PlantData - Wind-plant data conformance
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! End-to-end conformance over generated plants.
//!
//! Every test writes a synthetic plant to disk, loads it back through the
//! contract's file table and runs the reference pipeline, then checks the
//! result against the defect manifest.

use plantdata::config::{
    NACELLE_DIRECTION, PITCH, POWER, TEMPERATURE, VANE, WIND_DIRECTION, WIND_SPEED,
};
use plantdata::contract::SCADA;
use plantdata::{io, Pipeline, PipelineConfig, PlantContract, PlantDataset, RawSources};
use plantdata_testdata::contract::CONTRACT_FILE;
use plantdata_testdata::defects::DefectKind;
use plantdata_testdata::{generate_plant, PlantGeneratorConfig, SyntheticPlant};
use tempfile::tempdir;

/// Fields nulled together when the wind vane is stuck.
const VANE_GROUP: [&str; 7] = [PITCH, POWER, WIND_SPEED, VANE, TEMPERATURE, NACELLE_DIRECTION, WIND_DIRECTION];

fn load(config: &PlantGeneratorConfig) -> (SyntheticPlant, PlantContract, RawSources) {
    let dir = tempdir().unwrap();
    let plant = generate_plant(config).unwrap();
    plant.write_to(dir.path()).unwrap();

    let contract = PlantContract::from_path(dir.path().join(CONTRACT_FILE)).unwrap();
    let raw = io::load_sources(dir.path(), &contract.files).unwrap();
    (plant, contract, raw)
}

fn conform(config: &PlantGeneratorConfig) -> (SyntheticPlant, PlantDataset) {
    let (plant, contract, raw) = load(config);
    let dataset = Pipeline::new(contract, PipelineConfig::default())
        .unwrap()
        .run(&raw)
        .unwrap();
    (plant, dataset)
}

fn one_day(seed: u64) -> PlantGeneratorConfig {
    PlantGeneratorConfig::new().with_days(1).with_seed(seed)
}

#[test]
fn test_reference_cleaning_counts() {
    let (plant, dataset) = conform(&one_day(42));
    let expected = &plant.manifest.expected;
    let scada = dataset.report().source(SCADA).unwrap();

    assert_eq!(scada.duplicates_removed, expected.duplicates_removed);
    assert_eq!(scada.range_cells_nulled, expected.range_cells_nulled);
    assert_eq!(scada.stuck_runs, expected.stuck_runs);
    assert_eq!(
        scada.stuck_cells_nulled,
        expected.stuck_vane_samples * VANE_GROUP.len() + expected.stuck_temperature_samples
    );
    assert_eq!(scada.gap_rows_inserted, 0);
    assert_eq!(dataset.scada().len(), 4 * 144);
}

#[test]
fn test_stuck_vane_nulls_dependent_fields() {
    let (plant, dataset) = conform(&one_day(7));
    let run = plant
        .manifest
        .defects
        .iter()
        .find(|d| d.kind == DefectKind::StuckVane)
        .unwrap();
    let end = run.start + chrono::Duration::minutes(10 * run.samples as i64);

    let scada = dataset.scada();
    let in_run: Vec<_> = scada
        .entity_records(&run.turbine)
        .filter(|r| r.timestamp >= run.start && r.timestamp < end)
        .collect();
    assert_eq!(in_run.len(), run.samples);

    for record in &in_run {
        for field in VANE_GROUP {
            let i = scada.field_index(field).unwrap();
            assert_eq!(record.values[i], None, "{} at {}", field, record.timestamp);
        }
    }

    // the sample right after the run is untouched
    let after = scada
        .entity_records(&run.turbine)
        .find(|r| r.timestamp == end)
        .unwrap();
    assert!(after.values[scada.field_index(VANE).unwrap()].is_some());
}

#[test]
fn test_out_of_range_temperature_nulled() {
    let (plant, dataset) = conform(&one_day(3));
    let spike = plant
        .manifest
        .defects
        .iter()
        .find(|d| d.kind == DefectKind::TemperatureSpike)
        .unwrap();

    let scada = dataset.scada();
    let record = scada
        .entity_records(&spike.turbine)
        .find(|r| r.timestamp == spike.start)
        .unwrap();
    assert_eq!(record.values[scada.field_index(TEMPERATURE).unwrap()], None);
    assert!(record.values[scada.field_index(POWER).unwrap()].is_some());

    let temperatures = scada.column(TEMPERATURE).unwrap();
    assert!(temperatures.iter().flatten().all(|t| (-15.0..=45.0).contains(t)));
}

#[test]
fn test_scada_time_base_is_utc() {
    let (plant, dataset) = conform(&one_day(5));
    let first = dataset.scada().records().iter().map(|r| r.timestamp).min().unwrap();
    assert_eq!(first, plant.manifest.start);
    assert_eq!(dataset.meter().records()[0].timestamp, plant.manifest.start);
}

#[test]
fn test_reanalysis_gap_and_collision() {
    let (plant, dataset) = conform(&one_day(9));
    let expected = &plant.manifest.expected;

    let era5 = dataset.reanalysis_product("era5").unwrap();
    assert_eq!(era5.len(), 24);
    assert_eq!(era5.records().iter().filter(|r| r.is_gap()).count(), expected.gap_rows["era5"]);
    assert_eq!(
        dataset.report().source("era5").unwrap().gap_rows_inserted,
        expected.gap_rows["era5"]
    );
    assert!(era5.has_field("WMETR_HorWdDir"));

    let merra2 = dataset.report().source("merra2").unwrap();
    assert_eq!(merra2.columns_collided, expected.columns_collided["merra2"]);
}

#[test]
fn test_entity_table_matches_scada() {
    let (plant, dataset) = conform(&one_day(13));

    let assets: Vec<&str> = dataset.assets().ids().collect();
    assert_eq!(assets, dataset.scada().entities());
    assert_eq!(dataset.assets().len(), plant.manifest.turbines.len());
    assert_eq!(dataset.report().assets_pruned, plant.manifest.expected.assets_pruned);
    assert_eq!(dataset.report().assets_loaded, plant.assets.len());
}

#[test]
fn test_doubled_scada_conforms_to_the_same_streams() {
    let (_, contract, raw) = load(&one_day(21));
    let pipeline = Pipeline::new(contract, PipelineConfig::default()).unwrap();
    let once = pipeline.run(&raw).unwrap();

    let mut doubled = raw.clone();
    doubled.scada.rows = raw.scada.rows.iter().flat_map(|r| [r.clone(), r.clone()]).collect();
    let twice = pipeline.run(&doubled).unwrap();

    assert_eq!(once.scada(), twice.scada());
    assert_eq!(
        twice.report().source(SCADA).unwrap().duplicates_removed,
        raw.scada.len() + once.report().source(SCADA).unwrap().duplicates_removed
    );
}

#[test]
fn test_runs_are_deterministic() {
    let (_, contract, raw) = load(&one_day(17));
    let pipeline = Pipeline::new(contract, PipelineConfig::default()).unwrap();
    assert_eq!(pipeline.run(&raw).unwrap(), pipeline.run(&raw).unwrap());
}
