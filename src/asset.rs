//! Entity (asset) table
//!
//! Loaded once from the raw asset table and immutable afterwards. Every
//! per-entity stream refers to an [`Asset`] by its `asset_id`.

use std::collections::HashSet;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::contract::{AssetSchema, ASSET};
use crate::error::PipelineError;
use crate::io::RawTable;

/// Asset type assumed when the table carries none.
pub const DEFAULT_ASSET_KIND: &str = "turbine";

/// One plant asset with its static attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: String,
    /// Asset type (`turbine`, `tower`, ...).
    pub kind: String,
    /// Rated power, kW.
    pub rated_power: Option<f64>,
    /// Hub height, m.
    pub hub_height: Option<f64>,
    /// Rotor diameter, m.
    pub rotor_diameter: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Ground elevation, m.
    pub elevation: Option<f64>,
}

impl Asset {
    pub fn turbine(asset_id: &str) -> Self {
        Self {
            asset_id: asset_id.to_string(),
            kind: DEFAULT_ASSET_KIND.to_string(),
            rated_power: None,
            hub_height: None,
            rotor_diameter: None,
            latitude: None,
            longitude: None,
            elevation: None,
        }
    }
}

/// The plant's entity table, ordered as loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetTable {
    assets: Vec<Asset>,
}

impl AssetTable {
    /// Build a table, rejecting duplicate ids.
    pub fn new(assets: Vec<Asset>) -> Result<Self, PipelineError> {
        let mut seen = HashSet::new();
        for asset in &assets {
            if !seen.insert(asset.asset_id.as_str()) {
                return Err(PipelineError::EntityReconciliation {
                    asset_id: asset.asset_id.clone(),
                    source_name: ASSET.to_string(),
                });
            }
        }
        Ok(Self { assets })
    }

    /// Map a raw asset table through the contract's column names.
    pub fn from_raw(table: &RawTable, schema: &AssetSchema) -> Result<Self, PipelineError> {
        let id_col = table
            .column_index(&schema.asset_id)
            .ok_or_else(|| PipelineError::schema(ASSET, &schema.asset_id, "asset id column missing"))?;

        let number = |row: &[String], column: &str| -> Option<f64> {
            table
                .column_index(column)
                .and_then(|i| row.get(i))
                .and_then(|cell| cell.trim().parse::<f64>().ok())
        };
        let kind_col = table.column_index(&schema.kind);

        let mut assets = Vec::with_capacity(table.rows.len());
        for row in &table.rows {
            let asset_id = row.get(id_col).map(|s| s.trim()).unwrap_or_default();
            if asset_id.is_empty() {
                warn!("{}: row without asset id skipped", table.name);
                continue;
            }
            let kind = kind_col
                .and_then(|i| row.get(i))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_ASSET_KIND);

            assets.push(Asset {
                asset_id: asset_id.to_string(),
                kind: kind.to_string(),
                rated_power: number(row, &schema.rated_power),
                hub_height: number(row, &schema.hub_height),
                rotor_diameter: number(row, &schema.rotor_diameter),
                latitude: number(row, &schema.latitude),
                longitude: number(row, &schema.longitude),
                elevation: number(row, &schema.elevation),
            });
        }

        Self::new(assets)
    }

    pub fn get(&self, asset_id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.asset_id == asset_id)
    }

    pub fn contains(&self, asset_id: &str) -> bool {
        self.get(asset_id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.assets.iter().map(|a| a.asset_id.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Total rated power, kW, over assets that declare one.
    pub fn rated_capacity(&self) -> f64 {
        self.assets.iter().filter_map(|a| a.rated_power).sum()
    }

    /// Keep only the assets for which `keep` holds. Returns how many were removed.
    pub(crate) fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Asset) -> bool,
    {
        let before = self.assets.len();
        self.assets.retain(|a| keep(a));
        before - self.assets.len()
    }
}
