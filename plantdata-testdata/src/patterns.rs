// PlantData Testdata - Weather and turbine response patterns
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Weather and turbine response patterns.
//!
//! The plant shares one weather state (mean-reverting wind speed, wandering
//! direction, diurnal temperature). Each turbine reads it through its own
//! noise and responds with a simple power curve and pitch schedule.

use rand::prelude::*;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Cut-in wind speed, m/s.
pub const CUT_IN: f64 = 3.0;
/// Wind speed at which rated power is reached, m/s.
pub const RATED_SPEED: f64 = 12.5;
/// Cut-out wind speed, m/s.
pub const CUT_OUT: f64 = 25.0;

/// Weather pattern parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherPattern {
    /// Long-run mean wind speed, m/s.
    pub mean_speed: f64,
    /// Pull back toward the mean per step (0..1).
    pub reversion: f64,
    /// Wind speed innovation per step, m/s.
    pub speed_step_std: f64,
    /// Direction innovation per step, deg.
    pub direction_step_std: f64,
    /// Daily mean temperature, C.
    pub mean_temperature: f64,
    /// Half the daily temperature swing, C.
    pub temperature_amplitude: f64,
    /// Hour of the daily temperature peak.
    pub peak_hour: f64,
}

impl Default for WeatherPattern {
    fn default() -> Self {
        Self {
            mean_speed: 7.0,
            reversion: 0.1,
            speed_step_std: 0.6,
            direction_step_std: 3.0,
            mean_temperature: 8.0,
            temperature_amplitude: 5.0,
            peak_hour: 15.0,
        }
    }
}

/// Plant-wide weather at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    /// Hub-height wind speed, m/s.
    pub speed: f64,
    /// Direction the wind blows from, deg in [0, 360).
    pub direction: f64,
    /// Ambient temperature, C.
    pub temperature: f64,
}

/// Evolving weather state.
#[derive(Debug, Clone)]
pub struct PlantWeather {
    pattern: WeatherPattern,
    speed: f64,
    direction: f64,
}

impl PlantWeather {
    pub fn new(pattern: WeatherPattern) -> Self {
        Self {
            speed: pattern.mean_speed,
            direction: 240.0,
            pattern,
        }
    }

    /// Advance one step and return the weather at `hour_of_day`.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R, hour_of_day: f64) -> WeatherSample {
        let pull = self.pattern.reversion * (self.pattern.mean_speed - self.speed);
        let gust = gaussian(rng, self.pattern.speed_step_std);
        self.speed = (self.speed + pull + gust).clamp(0.3, CUT_OUT - 1.0);
        let veer = gaussian(rng, self.pattern.direction_step_std);
        self.direction = (self.direction + veer).rem_euclid(360.0);
        if self.direction >= 360.0 {
            self.direction = 0.0;
        }

        WeatherSample {
            speed: self.speed,
            direction: self.direction,
            temperature: diurnal_temperature(&self.pattern, hour_of_day),
        }
    }
}

/// Zero-mean Gaussian noise with standard deviation `std`.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, std: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    z * std
}

/// Smooth daily temperature cycle peaking at `peak_hour`.
pub fn diurnal_temperature(pattern: &WeatherPattern, hour_of_day: f64) -> f64 {
    let phase = 2.0 * PI * (hour_of_day - pattern.peak_hour) / 24.0;
    pattern.mean_temperature + pattern.temperature_amplitude * phase.cos()
}

/// Idealized power curve: cubic between cut-in and rated speed.
pub fn power_curve(speed: f64, rated_kw: f64) -> f64 {
    if !(CUT_IN..CUT_OUT).contains(&speed) {
        return 0.0;
    }
    if speed >= RATED_SPEED {
        return rated_kw;
    }
    let fraction = (speed.powi(3) - CUT_IN.powi(3)) / (RATED_SPEED.powi(3) - CUT_IN.powi(3));
    rated_kw * fraction
}

/// Blade pitch: near zero below rated, feathering above.
///
/// Values slightly below zero are reported wrapped to just under 360, the
/// way many controllers log them.
pub fn pitch_angle(speed: f64) -> f64 {
    let pitch = if speed < RATED_SPEED {
        -1.0
    } else {
        2.0 * (speed - RATED_SPEED)
    };
    pitch.rem_euclid(360.0)
}

/// Eastward and northward components of a wind blowing from `direction`.
pub fn wind_components(speed: f64, direction: f64) -> (f64, f64) {
    let theta = direction.to_radians();
    (-speed * theta.sin(), -speed * theta.cos())
}

/// Extrapolate a hub-height speed to `height` metres with a power law.
pub fn shear(speed: f64, hub_height: f64, height: f64) -> f64 {
    speed * (height / hub_height).powf(0.14)
}
