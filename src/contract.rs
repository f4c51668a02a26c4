//! Metadata contract
//!
//! The contract declares, for every source, its sampling period, the raw
//! columns carrying time and asset identity, and the table of fields the
//! conformed dataset must expose (canonical name, raw column, unit). Raw
//! column names are renamed to canonical names through this table.
//!
//! ```rust
//! use plantdata::contract::SamplingPeriod;
//!
//! let scada: SamplingPeriod = "10min".parse().unwrap();
//! assert_eq!(scada.seconds(), 600);
//! assert_eq!(scada.to_string(), "10min");
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{Duration, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LoadError};
use crate::io::SourceFiles;

/// Name of the turbine SCADA source
pub const SCADA: &str = "scada";
/// Name of the revenue meter source
pub const METER: &str = "meter";
/// Name of the curtailment/availability source
pub const CURTAIL: &str = "curtail";
/// Name of the asset table
pub const ASSET: &str = "asset";

/// Longest accepted sampling period (one leap year).
pub const MAX_PERIOD_SECONDS: i64 = 366 * 86_400;

/// Fixed sampling period of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SamplingPeriod {
    seconds: i64,
}

impl SamplingPeriod {
    /// Period from a number of seconds, in `1..=MAX_PERIOD_SECONDS`.
    pub fn from_seconds(seconds: i64) -> Result<Self, ConfigError> {
        if seconds <= 0 || seconds > MAX_PERIOD_SECONDS {
            return Err(ConfigError::InvalidPeriod(format!("{seconds}s")));
        }
        Ok(Self { seconds })
    }

    /// Ten-minute SCADA cadence.
    pub const fn ten_minutes() -> Self {
        Self { seconds: 600 }
    }

    /// Hourly reanalysis cadence.
    pub const fn hourly() -> Self {
        Self { seconds: 3600 }
    }

    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Period length in hours.
    pub fn hours(&self) -> f64 {
        self.seconds as f64 / 3600.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::seconds(self.seconds)
    }

    /// True when `ts` sits a whole number of periods away from `anchor`.
    pub fn is_on_grid(&self, anchor: NaiveDateTime, ts: NaiveDateTime) -> bool {
        let delta = ts - anchor;
        let secs = delta.num_seconds();
        delta == Duration::seconds(secs) && secs % self.seconds == 0
    }
}

impl FromStr for SamplingPeriod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (count, unit) = trimmed.split_at(split);
        let count: i64 = if count.is_empty() {
            1
        } else {
            count
                .parse()
                .map_err(|_| ConfigError::InvalidPeriod(s.to_string()))?
        };

        // pandas-style aliases are accepted so existing plant metadata parses as-is
        let unit_seconds = match unit {
            "s" | "S" | "sec" => 1,
            "min" | "T" | "m" => 60,
            "h" | "H" | "hour" => 3600,
            "d" | "D" | "day" => 86_400,
            _ => return Err(ConfigError::InvalidPeriod(s.to_string())),
        };

        count
            .checked_mul(unit_seconds)
            .and_then(|seconds| Self::from_seconds(seconds).ok())
            .ok_or_else(|| ConfigError::InvalidPeriod(s.to_string()))
    }
}

impl TryFrom<String> for SamplingPeriod {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SamplingPeriod> for String {
    fn from(value: SamplingPeriod) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SamplingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.seconds;
        if s % 86_400 == 0 {
            write!(f, "{}d", s / 86_400)
        } else if s % 3600 == 0 {
            write!(f, "{}h", s / 3600)
        } else if s % 60 == 0 {
            write!(f, "{}min", s / 60)
        } else {
            write!(f, "{}s", s)
        }
    }
}

/// Parse a UTC offset such as `+01:00`, `-0530`, `Z` or `UTC`.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| ConfigError::InvalidOffset(s.to_string()));
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(ConfigError::InvalidOffset(s.to_string())),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::InvalidOffset(s.to_string()));
    }
    let hours: i32 = digits[..2]
        .parse()
        .map_err(|_| ConfigError::InvalidOffset(s.to_string()))?;
    let minutes: i32 = digits[2..]
        .parse()
        .map_err(|_| ConfigError::InvalidOffset(s.to_string()))?;

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| ConfigError::InvalidOffset(s.to_string()))
}

fn default_true() -> bool {
    true
}

/// One declared field of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Canonical name in the conformed dataset.
    pub name: String,
    /// Raw column in the input file (defaults to `name`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    /// Declared unit label (e.g. `kW`, `kWh`, `deg`, `C`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Must exist as a column in the conformed stream.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Produced by the pipeline rather than read from the raw feed.
    #[serde(default)]
    pub derived: bool,
}

impl FieldSpec {
    pub fn new(name: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            column: Some(column.to_string()),
            unit: None,
            required: true,
            derived: false,
        }
    }

    /// A field computed by the pipeline.
    pub fn derived(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column: None,
            unit: None,
            required: true,
            derived: true,
        }
    }

    pub fn with_unit(mut self, unit: &str) -> Self {
        self.unit = Some(unit.to_string());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Raw column name this field is read from.
    pub fn raw_column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// Contract for one time-series source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSchema {
    /// Declared sampling period.
    pub frequency: SamplingPeriod,
    /// Raw timestamp column.
    pub time: String,
    /// Raw asset-id column for per-entity sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    /// Offset assumed for timestamps that carry no zone (UTC when absent).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_offset: Option<String>,
    /// Declared fields.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl SourceSchema {
    pub fn new(frequency: SamplingPeriod, time: &str) -> Self {
        Self {
            frequency,
            time: time.to_string(),
            asset_id: None,
            utc_offset: None,
            fields: Vec::new(),
        }
    }

    pub fn with_asset_id(mut self, column: &str) -> Self {
        self.asset_id = Some(column.to_string());
        self
    }

    pub fn with_utc_offset(mut self, offset: &str) -> Self {
        self.utc_offset = Some(offset.to_string());
        self
    }

    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declared field by canonical name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Canonical name for a raw column, if the column is declared.
    pub fn canonical_name(&self, raw: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| !f.derived && f.raw_column() == raw)
            .map(|f| f.name.as_str())
    }

    /// Assumed offset for zone-less timestamps.
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        match &self.utc_offset {
            Some(s) => parse_utc_offset(s),
            None => parse_utc_offset("UTC"),
        }
    }

    pub fn is_per_entity(&self) -> bool {
        self.asset_id.is_some()
    }
}

/// Raw column names of the asset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSchema {
    pub asset_id: String,
    #[serde(default = "AssetSchema::default_rated_power")]
    pub rated_power: String,
    #[serde(default = "AssetSchema::default_hub_height")]
    pub hub_height: String,
    #[serde(default = "AssetSchema::default_rotor_diameter")]
    pub rotor_diameter: String,
    #[serde(default = "AssetSchema::default_latitude")]
    pub latitude: String,
    #[serde(default = "AssetSchema::default_longitude")]
    pub longitude: String,
    #[serde(default = "AssetSchema::default_elevation")]
    pub elevation: String,
    #[serde(default = "AssetSchema::default_kind")]
    pub kind: String,
}

impl AssetSchema {
    fn default_rated_power() -> String {
        "Rated_power".to_string()
    }
    fn default_hub_height() -> String {
        "Hub_height".to_string()
    }
    fn default_rotor_diameter() -> String {
        "Rotor_diameter".to_string()
    }
    fn default_latitude() -> String {
        "Latitude".to_string()
    }
    fn default_longitude() -> String {
        "Longitude".to_string()
    }
    fn default_elevation() -> String {
        "Altitude".to_string()
    }
    fn default_kind() -> String {
        "type".to_string()
    }
}

impl Default for AssetSchema {
    fn default() -> Self {
        Self {
            asset_id: "Wind_turbine_name".to_string(),
            rated_power: Self::default_rated_power(),
            hub_height: Self::default_hub_height(),
            rotor_diameter: Self::default_rotor_diameter(),
            latitude: Self::default_latitude(),
            longitude: Self::default_longitude(),
            elevation: Self::default_elevation(),
            kind: Self::default_kind(),
        }
    }
}

/// Plant-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantMetadata {
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Installed capacity in MW.
    pub capacity: f64,
}

/// The full metadata contract of a plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantContract {
    pub plant: PlantMetadata,
    pub scada: SourceSchema,
    pub meter: SourceSchema,
    pub curtail: SourceSchema,
    /// Reanalysis products keyed by product name.
    #[serde(default)]
    pub reanalysis: BTreeMap<String, SourceSchema>,
    #[serde(default)]
    pub asset: AssetSchema,
    /// Raw file names inside the data directory.
    #[serde(default)]
    pub files: SourceFiles,
}

impl PlantContract {
    /// Parse a contract from JSON text.
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a contract from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::MissingFile(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Schema of a time-series source by name (`scada`, `meter`, `curtail` or a product).
    pub fn source(&self, name: &str) -> Option<&SourceSchema> {
        match name {
            SCADA => Some(&self.scada),
            METER => Some(&self.meter),
            CURTAIL => Some(&self.curtail),
            product => self.reanalysis.get(product),
        }
    }

    /// All time-series sources in pipeline order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, &SourceSchema)> {
        [
            (SCADA, &self.scada),
            (METER, &self.meter),
            (CURTAIL, &self.curtail),
        ]
        .into_iter()
        .chain(self.reanalysis.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Check everything that can be checked without data.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (_, schema) in self.sources() {
            schema.offset()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_period_parse_aliases() {
        assert_eq!("10min".parse::<SamplingPeriod>().unwrap().seconds(), 600);
        assert_eq!("10T".parse::<SamplingPeriod>().unwrap().seconds(), 600);
        assert_eq!("h".parse::<SamplingPeriod>().unwrap().seconds(), 3600);
        assert_eq!("1h".parse::<SamplingPeriod>().unwrap().seconds(), 3600);
        assert_eq!("30s".parse::<SamplingPeriod>().unwrap().seconds(), 30);
        assert_eq!("D".parse::<SamplingPeriod>().unwrap().seconds(), 86_400);
    }

    #[test]
    fn test_period_parse_rejects_garbage() {
        assert!("fortnight".parse::<SamplingPeriod>().is_err());
        assert!("0min".parse::<SamplingPeriod>().is_err());
        assert!("".parse::<SamplingPeriod>().is_err());
    }

    #[test]
    fn test_period_display() {
        assert_eq!(SamplingPeriod::ten_minutes().to_string(), "10min");
        assert_eq!(SamplingPeriod::hourly().to_string(), "1h");
        assert_eq!(SamplingPeriod::from_seconds(90).unwrap().to_string(), "90s");
    }

    #[test]
    fn test_period_grid_follows_anchor() {
        let p = SamplingPeriod::ten_minutes();
        assert!(p.is_on_grid(ts(0, 5, 0), ts(0, 25, 0)));
        assert!(p.is_on_grid(ts(0, 5, 0), ts(0, 5, 0)));
        assert!(!p.is_on_grid(ts(0, 5, 0), ts(0, 20, 0)));
        assert!(!p.is_on_grid(ts(0, 5, 0), ts(0, 15, 1)));
    }

    #[test]
    fn test_period_overflow_is_a_config_error() {
        assert_eq!(
            "200000000000000d".parse::<SamplingPeriod>(),
            Err(ConfigError::InvalidPeriod("200000000000000d".to_string()))
        );
        assert!("99999999999999999999s".parse::<SamplingPeriod>().is_err());
        assert!("367d".parse::<SamplingPeriod>().is_err());
        assert!(SamplingPeriod::from_seconds(MAX_PERIOD_SECONDS + 1).is_err());

        let longest = "366d".parse::<SamplingPeriod>().unwrap();
        assert_eq!(longest.as_duration().num_days(), 366);

        let json = r#"{"frequency": "200000000000000d", "time": "t"}"#;
        assert!(serde_json::from_str::<SourceSchema>(json).is_err());
    }

    #[test]
    fn test_utc_offset_parse() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+01:00").unwrap().local_minus_utc(), 3600);
        assert_eq!(parse_utc_offset("-0530").unwrap().local_minus_utc(), -19_800);
        assert!(parse_utc_offset("CET").is_err());
    }

    #[test]
    fn test_contract_json() {
        let json = r#"{
            "plant": {"name": "test", "latitude": 48.45, "longitude": 5.59, "capacity": 8.2},
            "scada": {
                "frequency": "10min",
                "time": "Date_time",
                "asset_id": "Wind_turbine_name",
                "fields": [
                    {"name": "WTUR_W", "column": "P_avg", "unit": "kW"},
                    {"name": "WTUR_SupWh", "unit": "kWh", "derived": true}
                ]
            },
            "meter": {"frequency": "10min", "time": "time_utc", "fields": []},
            "curtail": {"frequency": "10min", "time": "time_utc", "fields": []},
            "reanalysis": {
                "era5": {"frequency": "h", "time": "datetime", "fields": []}
            },
            "asset": {"asset_id": "Wind_turbine_name"}
        }"#;

        let contract = PlantContract::from_json(json).unwrap();
        assert_eq!(contract.scada.frequency, SamplingPeriod::ten_minutes());
        assert_eq!(contract.scada.canonical_name("P_avg"), Some("WTUR_W"));
        assert!(contract.scada.field("WTUR_SupWh").unwrap().derived);
        assert_eq!(contract.source("era5").unwrap().frequency, SamplingPeriod::hourly());
        assert_eq!(contract.asset.rated_power, "Rated_power");
        assert_eq!(contract.sources().count(), 4);
        assert_eq!(contract.files, SourceFiles::default());
        assert!(contract.validate().is_ok());
    }
}
