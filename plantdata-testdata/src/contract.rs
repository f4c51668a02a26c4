// PlantData Testdata - Plant contract
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! `plant_meta.json` for a generated plant.
//!
//! Raw column names, units and file names follow the La Haute Borne
//! layout, so a generated plant loads with the same contract shape as the
//! real one.

use serde_json::{json, Value};

pub const SCADA_FILE: &str = "la-haute-borne-data-2014-2015.csv";
pub const PLANT_FILE: &str = "plant_data.csv";
pub const ERA5_FILE: &str = "era5_wind_la_haute_borne.csv";
pub const MERRA2_FILE: &str = "merra2_la_haute_borne.csv";
pub const ASSET_FILE: &str = "la-haute-borne_asset_table.csv";
pub const CONTRACT_FILE: &str = "plant_meta.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// Raw SCADA columns after the id and time columns.
pub const SCADA_COLUMNS: [&str; 7] = ["P_avg", "Ws_avg", "Va_avg", "Ot_avg", "Ya_avg", "Wa_avg", "Ba_avg"];
pub const PLANT_COLUMNS: [&str; 3] = ["net_energy_kwh", "availability_kwh", "curtailment_kwh"];
pub const ERA5_COLUMNS: [&str; 5] = ["u_100", "v_100", "ws_100", "t_2m", "surf_pres"];
pub const MERRA2_COLUMNS: [&str; 5] = ["u_50", "v_50", "ws_50", "temp_2m", "surface_pressure"];
pub const ASSET_COLUMNS: [&str; 8] = [
    "Wind_turbine_name",
    "Rated_power",
    "Hub_height",
    "Rotor_diameter",
    "Latitude",
    "Longitude",
    "Altitude",
    "type",
];

fn reanalysis(columns: &[&str; 5]) -> Value {
    json!({
        "frequency": "1h",
        "time": "datetime",
        "fields": [
            { "name": "WMETR_HorWdSpdU", "column": columns[0], "unit": "m/s" },
            { "name": "WMETR_HorWdSpdV", "column": columns[1], "unit": "m/s" },
            { "name": "WMETR_HorWdSpd", "column": columns[2], "unit": "m/s", "required": false },
            { "name": "WMETR_EnvTmp", "column": columns[3], "unit": "K", "required": false },
            { "name": "WMETR_EnvPres", "column": columns[4], "unit": "Pa", "required": false },
            { "name": "WMETR_HorWdDir", "unit": "deg", "derived": true }
        ]
    })
}

/// Contract for a plant of the given name and location.
pub fn plant_contract(name: &str, latitude: f64, longitude: f64, capacity_mw: f64) -> Value {
    json!({
        "plant": {
            "name": name,
            "latitude": latitude,
            "longitude": longitude,
            "capacity": capacity_mw
        },
        "scada": {
            "frequency": "10min",
            "time": "Date_time",
            "asset_id": "Wind_turbine_name",
            "fields": [
                { "name": "WTUR_W", "column": "P_avg", "unit": "kW" },
                { "name": "WMET_HorWdSpd", "column": "Ws_avg", "unit": "m/s" },
                { "name": "WMET_HorWdDirRel", "column": "Va_avg", "unit": "deg" },
                { "name": "WMET_EnvTmp", "column": "Ot_avg", "unit": "C" },
                { "name": "WNAC_Dir", "column": "Ya_avg", "unit": "deg" },
                { "name": "WMET_HorWdDir", "column": "Wa_avg", "unit": "deg" },
                { "name": "WROT_BlPthAngVal", "column": "Ba_avg", "unit": "deg" },
                { "name": "WTUR_SupWh", "unit": "kWh", "derived": true }
            ]
        },
        "meter": {
            "frequency": "10min",
            "time": "time_utc",
            "fields": [
                { "name": "MMTR_SupWh", "column": PLANT_COLUMNS[0], "unit": "kWh" }
            ]
        },
        "curtail": {
            "frequency": "10min",
            "time": "time_utc",
            "fields": [
                { "name": "IAVL_DnWh", "column": PLANT_COLUMNS[1], "unit": "kWh" },
                { "name": "IAVL_ExtPwrDnWh", "column": PLANT_COLUMNS[2], "unit": "kWh" }
            ]
        },
        "reanalysis": {
            "era5": reanalysis(&ERA5_COLUMNS),
            "merra2": reanalysis(&MERRA2_COLUMNS)
        },
        "asset": {
            "asset_id": ASSET_COLUMNS[0]
        },
        "files": {
            "scada": SCADA_FILE,
            "plant": PLANT_FILE,
            "reanalysis": {
                "era5": ERA5_FILE,
                "merra2": MERRA2_FILE
            },
            "assets": ASSET_FILE
        }
    })
}
