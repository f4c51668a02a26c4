//! Derived-feature engine
//!
//! Features absent from raw feeds, computed from fields that are present.
//! Every feature is a pure function of one record's values; a missing input
//! gives a missing output.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::stream::{Field, Stream};

/// Specific gas constant of dry air, J/(kg·K)
pub const DRY_AIR_GAS_CONSTANT: f64 = 287.05;

/// Offset between degrees Celsius and kelvin
pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Compass bearing the wind blows *from*, in [0, 360), given the eastward
/// (`u`) and northward (`v`) components.
///
/// ```rust
/// use plantdata::features::wind_direction;
///
/// // wind blowing towards the south comes from the north
/// assert_eq!(wind_direction(0.0, -5.0), 0.0);
/// // wind blowing towards the west comes from the east
/// assert!((wind_direction(-5.0, 0.0) - 90.0).abs() < 1e-9);
/// ```
pub fn wind_direction(u: f64, v: f64) -> f64 {
    let bearing = (180.0 + u.atan2(v).to_degrees()).rem_euclid(360.0);
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Horizontal wind speed from its components.
pub fn wind_speed(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

/// Air density (kg/m³) from pressure in Pa and temperature in K.
pub fn air_density(pressure_pa: f64, temperature_k: f64) -> f64 {
    pressure_pa / (DRY_AIR_GAS_CONSTANT * temperature_k)
}

/// A feature to compute on one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DerivedFeature {
    /// Wind direction (deg) from vector components.
    WindDirection { u: String, v: String, output: String },
    /// Horizontal wind speed (m/s) from vector components.
    WindSpeed { u: String, v: String, output: String },
    /// Air density (kg/m3) from surface pressure and temperature.
    AirDensity {
        pressure: String,
        temperature: String,
        output: String,
    },
}

impl DerivedFeature {
    pub fn output(&self) -> &str {
        match self {
            DerivedFeature::WindDirection { output, .. }
            | DerivedFeature::WindSpeed { output, .. }
            | DerivedFeature::AirDensity { output, .. } => output,
        }
    }

    /// Unit label attached to the output column.
    pub fn unit(&self) -> &'static str {
        match self {
            DerivedFeature::WindDirection { .. } => "deg",
            DerivedFeature::WindSpeed { .. } => "m/s",
            DerivedFeature::AirDensity { .. } => "kg/m3",
        }
    }

    fn inputs(&self) -> [&str; 2] {
        match self {
            DerivedFeature::WindDirection { u, v, .. } | DerivedFeature::WindSpeed { u, v, .. } => {
                [u.as_str(), v.as_str()]
            }
            DerivedFeature::AirDensity {
                pressure,
                temperature,
                ..
            } => [pressure.as_str(), temperature.as_str()],
        }
    }

    /// Compute the feature and add it to the stream.
    ///
    /// Returns `false`, leaving the stream untouched, when an input field is
    /// absent.
    pub fn apply(&self, stream: &mut Stream) -> bool {
        let [a_name, b_name] = self.inputs();
        let (Some(a_idx), Some(b_idx)) = (stream.field_index(a_name), stream.field_index(b_name)) else {
            debug!(
                "{}: inputs of '{}' missing, feature skipped",
                stream.name(),
                self.output()
            );
            return false;
        };

        let compute: Box<dyn Fn(f64, f64) -> f64> = match self {
            DerivedFeature::WindDirection { .. } => Box::new(wind_direction),
            DerivedFeature::WindSpeed { .. } => Box::new(wind_speed),
            DerivedFeature::AirDensity { .. } => {
                let pressure_scale = match stream.unit(a_name) {
                    Some("hPa") => 100.0,
                    Some("kPa") => 1000.0,
                    _ => 1.0,
                };
                let kelvin_offset = match stream.unit(b_name) {
                    Some("C") | Some("degC") => CELSIUS_TO_KELVIN,
                    _ => 0.0,
                };
                Box::new(move |p: f64, t: f64| air_density(p * pressure_scale, t + kelvin_offset))
            }
        };

        let values = stream
            .records()
            .iter()
            .map(|r| match (r.values[a_idx], r.values[b_idx]) {
                (Some(a), Some(b)) => Some(compute(a, b)),
                _ => None,
            })
            .collect();
        stream.set_column(Field::new(self.output(), Some(self.unit())), values);
        true
    }
}
