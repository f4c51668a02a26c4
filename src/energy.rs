//! Energy integrator
//!
//! Interval energy is `power × period`, scaled between the declared power
//! and energy units. A 10-minute average of 1200 kW delivers 200 kWh.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::contract::SamplingPeriod;
use crate::error::ConfigError;
use crate::stream::{Field, Stream};

/// Unit of an instantaneous power signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerUnit {
    Watt,
    Kilowatt,
    Megawatt,
}

impl PowerUnit {
    fn watts(self) -> f64 {
        match self {
            PowerUnit::Watt => 1.0,
            PowerUnit::Kilowatt => 1e3,
            PowerUnit::Megawatt => 1e6,
        }
    }
}

impl FromStr for PowerUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "W" => Ok(PowerUnit::Watt),
            "kW" => Ok(PowerUnit::Kilowatt),
            "MW" => Ok(PowerUnit::Megawatt),
            other => Err(other.to_string()),
        }
    }
}

/// Unit of an interval energy value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyUnit {
    WattHour,
    KilowattHour,
    MegawattHour,
}

impl EnergyUnit {
    fn watt_hours(self) -> f64 {
        match self {
            EnergyUnit::WattHour => 1.0,
            EnergyUnit::KilowattHour => 1e3,
            EnergyUnit::MegawattHour => 1e6,
        }
    }
}

impl FromStr for EnergyUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Wh" => Ok(EnergyUnit::WattHour),
            "kWh" => Ok(EnergyUnit::KilowattHour),
            "MWh" => Ok(EnergyUnit::MegawattHour),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for EnergyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EnergyUnit::WattHour => "Wh",
            EnergyUnit::KilowattHour => "kWh",
            EnergyUnit::MegawattHour => "MWh",
        };
        f.write_str(label)
    }
}

/// Energy delivered over one period at a constant average power.
pub fn interval_energy(power: f64, period: SamplingPeriod, power_unit: PowerUnit, energy_unit: EnergyUnit) -> f64 {
    power * power_unit.watts() * period.hours() / energy_unit.watt_hours()
}

/// Derives an energy column from a power column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRule {
    pub power_field: String,
    pub energy_field: String,
    pub power_unit: String,
    pub energy_unit: String,
}

impl EnergyRule {
    pub fn new(power_field: &str, energy_field: &str) -> Self {
        Self {
            power_field: power_field.to_string(),
            energy_field: energy_field.to_string(),
            power_unit: "kW".to_string(),
            energy_unit: "kWh".to_string(),
        }
    }

    /// Parsed unit pair.
    pub fn units(&self) -> Result<(PowerUnit, EnergyUnit), ConfigError> {
        let power = self.power_unit.parse().map_err(|unit| ConfigError::UnknownUnit {
            field: self.power_field.clone(),
            unit,
        })?;
        let energy = self.energy_unit.parse().map_err(|unit| ConfigError::UnknownUnit {
            field: self.energy_field.clone(),
            unit,
        })?;
        Ok((power, energy))
    }
}

/// Add (or overwrite) the rule's energy column using the stream's period.
///
/// Missing power gives missing energy. Returns `Ok(false)` when the stream
/// has no power field.
pub fn integrate(stream: &mut Stream, rule: &EnergyRule) -> Result<bool, ConfigError> {
    let (power_unit, energy_unit) = rule.units()?;
    let Some(power) = stream.column(&rule.power_field) else {
        return Ok(false);
    };

    let period = stream.period();
    let energy = power
        .into_iter()
        .map(|p| p.map(|p| interval_energy(p, period, power_unit, energy_unit)))
        .collect();
    stream.set_column(
        Field::new(&rule.energy_field, Some(&energy_unit.to_string())),
        energy,
    );
    Ok(true)
}
