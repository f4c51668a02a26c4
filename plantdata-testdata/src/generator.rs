// PlantData Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Core plant generation logic.
//!
//! One weather state drives every turbine. SCADA is written with
//! local-offset timestamps, plant data and reanalysis in naive UTC, the
//! way the real feeds arrive.

use crate::contract::{plant_contract, ASSET_COLUMNS, ERA5_COLUMNS, MERRA2_COLUMNS, PLANT_COLUMNS, SCADA_COLUMNS};
use crate::dataset::{CsvTable, DatasetError, SyntheticPlant};
use crate::defects::{DefectConfig, DefectKind, DefectPlan, SPIKE_TEMPERATURE};
use crate::manifest::{DefectManifest, ExpectedCounts, PlantManifest};
use crate::patterns::{
    gaussian, pitch_angle, power_curve, shear, wind_components, PlantWeather, WeatherPattern, WeatherSample,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// SCADA cadence, seconds.
pub const SCADA_CADENCE_SECS: u64 = 600;
const SAMPLES_PER_HOUR: usize = 6;

/// Turbine names of the La Haute Borne plant, used first.
pub const REFERENCE_TURBINES: [&str; 4] = ["R80711", "R80721", "R80736", "R80790"];

const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const KELVIN: f64 = 273.15;

/// Generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantGeneratorConfig {
    /// Plant name written to the contract.
    pub name: String,
    /// Number of turbines.
    pub turbines: usize,
    /// Days of data.
    pub days: usize,
    /// First SCADA timestamp (UTC).
    pub start: NaiveDateTime,
    /// Offset of the SCADA logger clock from UTC, hours.
    pub scada_utc_offset_hours: i32,
    /// Rated power per turbine, kW.
    pub rated_power_kw: f64,
    /// Hub height, m.
    pub hub_height: f64,
    /// Rotor diameter, m.
    pub rotor_diameter: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub weather: WeatherPattern,
    pub defects: DefectConfig,
}

impl Default for PlantGeneratorConfig {
    fn default() -> Self {
        Self {
            name: "Synthetic Haute Borne".to_string(),
            turbines: 4,
            days: 2,
            start: NaiveDate::from_ymd_opt(2014, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default(),
            scada_utc_offset_hours: 1,
            rated_power_kw: 2050.0,
            hub_height: 80.0,
            rotor_diameter: 82.0,
            latitude: 48.452,
            longitude: 5.588,
            seed: None,
            weather: WeatherPattern::default(),
            defects: DefectConfig::default(),
        }
    }
}

impl PlantGeneratorConfig {
    /// Create a new generator config.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_turbines(mut self, turbines: usize) -> Self {
        self.turbines = turbines;
        self
    }

    pub fn with_days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    pub fn with_start(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_defects(mut self, defects: DefectConfig) -> Self {
        self.defects = defects;
        self
    }

    /// SCADA samples per turbine.
    pub fn samples(&self) -> usize {
        self.days * 24 * SAMPLES_PER_HOUR
    }

    /// Reanalysis hours per product.
    pub fn hours(&self) -> usize {
        self.days * 24
    }

    /// Total plant capacity, MW.
    pub fn capacity_mw(&self) -> f64 {
        self.turbines as f64 * self.rated_power_kw / 1000.0
    }

    fn scada_offset_suffix(&self) -> String {
        format!("{:+03}:00", self.scada_utc_offset_hours)
    }
}

/// Turbine identifiers for a plant of `count` turbines.
pub fn turbine_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match REFERENCE_TURBINES.get(i) {
            Some(name) => name.to_string(),
            None => format!("R8{:04}", 800 + i),
        })
        .collect()
}

fn spare_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("R89{:03}", i + 1)).collect()
}

struct TurbineReading {
    power: f64,
    speed: f64,
    vane: f64,
    temperature: f64,
    nacelle: f64,
    direction: f64,
    pitch: f64,
}

fn read_turbine<R: Rng + ?Sized>(rng: &mut R, weather: &WeatherSample, rated_kw: f64) -> TurbineReading {
    let speed = (weather.speed + gaussian(rng, 0.3)).max(0.0);
    let power = (power_curve(speed, rated_kw) * (1.0 + gaussian(rng, 0.01))).clamp(0.0, rated_kw);
    let vane = gaussian(rng, 8.0);
    let direction = (weather.direction + gaussian(rng, 2.0)).rem_euclid(360.0);

    TurbineReading {
        power,
        speed,
        vane,
        temperature: weather.temperature + gaussian(rng, 0.2),
        nacelle: (direction - vane).rem_euclid(360.0),
        direction,
        pitch: (pitch_angle(speed) + gaussian(rng, 0.3)).rem_euclid(360.0),
    }
}

/// Generate a complete plant from configuration.
pub fn generate_plant(config: &PlantGeneratorConfig) -> Result<SyntheticPlant, DatasetError> {
    if config.turbines == 0 {
        return Err(DatasetError::InvalidConfig("at least one turbine is required".to_string()));
    }
    if config.days == 0 {
        return Err(DatasetError::InvalidConfig("at least one day is required".to_string()));
    }

    let samples = config.samples();
    let hours = config.hours();
    let plan = DefectPlan::layout(&config.defects, config.turbines, samples, hours).ok_or_else(|| {
        DatasetError::InvalidConfig(format!(
            "{} days are too short to keep the requested defects apart",
            config.days
        ))
    })?;

    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(StdRng::from_entropy()),
    };

    let turbines = turbine_names(config.turbines);
    let offset = Duration::hours(i64::from(config.scada_utc_offset_hours));
    let suffix = config.scada_offset_suffix();

    let mut scada_headers = vec!["Wind_turbine_name", "Date_time"];
    scada_headers.extend(SCADA_COLUMNS);
    let mut scada = CsvTable::new(&scada_headers);

    let mut plant_headers = vec!["time_utc"];
    plant_headers.extend(PLANT_COLUMNS);
    let mut plant = CsvTable::new(&plant_headers);

    let mut weather = PlantWeather::new(config.weather.clone());
    let mut hourly = Vec::with_capacity(hours);
    let mut held_vane = vec![0.0; config.turbines];
    let mut held_temperature = vec![0.0; config.turbines];

    for s in 0..samples {
        let ts = config.start + Duration::seconds((s as u64 * SCADA_CADENCE_SECS) as i64);
        let hour_of_day = f64::from(ts.hour()) + f64::from(ts.minute()) / 60.0;
        let sample = weather.step(&mut rng, hour_of_day);
        if s % SAMPLES_PER_HOUR == 0 {
            hourly.push(sample);
        }

        let local = (ts + offset).format("%Y-%m-%dT%H:%M:%S").to_string() + &suffix;
        let mut plant_energy = 0.0;

        for (t, turbine) in turbines.iter().enumerate() {
            let mut reading = read_turbine(&mut rng, &sample, config.rated_power_kw);
            plant_energy += reading.power / SAMPLES_PER_HOUR as f64;

            if let Some(run) = plan.at(DefectKind::StuckVane, t, s) {
                if s == run.start_sample {
                    held_vane[t] = reading.vane;
                }
                reading.vane = held_vane[t];
            }
            if let Some(run) = plan.at(DefectKind::StuckTemperature, t, s) {
                if s == run.start_sample {
                    held_temperature[t] = reading.temperature;
                }
                reading.temperature = held_temperature[t];
            }
            if plan.at(DefectKind::TemperatureSpike, t, s).is_some() {
                reading.temperature = SPIKE_TEMPERATURE;
            }

            let row = vec![
                turbine.clone(),
                local.clone(),
                format!("{:.2}", reading.power),
                format!("{:.3}", reading.speed),
                format!("{:.3}", reading.vane),
                format!("{:.2}", reading.temperature),
                format!("{:.2}", reading.nacelle),
                format!("{:.2}", reading.direction),
                format!("{:.2}", reading.pitch),
            ];
            if plan.at(DefectKind::DuplicateRow, t, s).is_some() {
                scada.push(row.clone());
            }
            scada.push(row);
        }

        plant.push(vec![
            ts.format(NAIVE_FORMAT).to_string(),
            format!("{:.3}", plant_energy * 0.97),
            "0.000".to_string(),
            "0.000".to_string(),
        ]);
    }

    let mut reanalysis = BTreeMap::new();
    reanalysis.insert(
        "era5".to_string(),
        reanalysis_table(&mut rng, config, &hourly, &ERA5_COLUMNS, 100.0, &plan, false),
    );
    reanalysis.insert(
        "merra2".to_string(),
        reanalysis_table(
            &mut rng,
            config,
            &hourly,
            &MERRA2_COLUMNS,
            50.0,
            &DefectPlan::default(),
            config.defects.duplicate_reanalysis_column,
        ),
    );

    let spares = spare_names(config.defects.spare_assets);
    let mut assets = CsvTable::new(&ASSET_COLUMNS);
    for (i, name) in turbines.iter().chain(&spares).enumerate() {
        assets.push(vec![
            name.clone(),
            format!("{}", config.rated_power_kw),
            format!("{}", config.hub_height),
            format!("{}", config.rotor_diameter),
            format!("{:.5}", config.latitude + 0.002 * i as f64),
            format!("{:.5}", config.longitude + 0.001 * i as f64),
            "411".to_string(),
            "turbine".to_string(),
        ]);
    }

    let mut expected = ExpectedCounts::from_plan(&plan);
    if let Some((start, end)) = plan.reanalysis_gap {
        expected.gap_rows.insert("era5".to_string(), end - start);
    }
    if config.defects.duplicate_reanalysis_column {
        expected.columns_collided.insert("merra2".to_string(), 1);
    }
    expected.assets_pruned = spares.len();

    let mut manifest = PlantManifest::new(&config.name, config.start, SCADA_CADENCE_SECS);
    manifest.samples = samples;
    manifest.reanalysis_hours = hours;
    manifest.defects = plan
        .placements
        .iter()
        .map(|p| {
            let start = config.start + Duration::seconds((p.start_sample as u64 * SCADA_CADENCE_SECS) as i64);
            DefectManifest::from_placement(p, &turbines[p.turbine], start)
        })
        .collect();
    manifest.turbines = turbines;
    manifest.spare_assets = spares;
    manifest.expected = expected;
    manifest.seed = config.seed;

    Ok(SyntheticPlant {
        contract: plant_contract(&config.name, config.latitude, config.longitude, config.capacity_mw()),
        scada,
        plant,
        reanalysis,
        assets,
        manifest,
    })
}

fn reanalysis_table(
    rng: &mut dyn RngCore,
    config: &PlantGeneratorConfig,
    hourly: &[WeatherSample],
    columns: &[&str; 5],
    height: f64,
    plan: &DefectPlan,
    duplicate_speed: bool,
) -> CsvTable {
    let mut headers = vec!["datetime"];
    headers.extend(columns);
    if duplicate_speed {
        headers.push(columns[2]);
    }
    let mut table = CsvTable::new(&headers);

    for (h, sample) in hourly.iter().enumerate() {
        if plan.is_gap_hour(h) {
            continue;
        }
        let ts = config.start + Duration::hours(h as i64);
        let speed = shear(sample.speed, config.hub_height, height);
        let (u, v) = wind_components(speed, sample.direction);

        let mut row = vec![
            ts.format(NAIVE_FORMAT).to_string(),
            format!("{:.4}", u),
            format!("{:.4}", v),
            format!("{:.4}", speed),
            format!("{:.2}", sample.temperature + KELVIN),
            format!("{:.1}", 98_500.0 + gaussian(rng, 150.0)),
        ];
        if duplicate_speed {
            row.push(format!("{:.4}", speed * 1.01));
        }
        table.push(row);
    }
    table
}
