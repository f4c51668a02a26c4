// PlantData Testdata - Generated tables and file output
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generated tables and file output.

use crate::contract::{ASSET_FILE, CONTRACT_FILE, MANIFEST_FILE, PLANT_FILE, SCADA_FILE};
use crate::manifest::PlantManifest;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Dataset error types.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid generator config: {0}")]
    InvalidConfig(String),
}

/// A raw table exactly as it will be written, cells already formatted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Export to a comma-delimited file.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", self.headers.join(","))?;
        for row in &self.rows {
            writeln!(writer, "{}", row.join(","))?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// A complete generated plant.
#[derive(Debug, Clone)]
pub struct SyntheticPlant {
    /// `plant_meta.json` contents.
    pub contract: Value,
    pub scada: CsvTable,
    /// Meter, availability and curtailment in one table.
    pub plant: CsvTable,
    /// Reanalysis tables keyed by product name.
    pub reanalysis: BTreeMap<String, CsvTable>,
    pub assets: CsvTable,
    pub manifest: PlantManifest,
}

impl SyntheticPlant {
    /// Write every table, the contract and the manifest into `dir`.
    ///
    /// Returns the paths written.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, DatasetError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let reanalysis_files = self.contract["files"]["reanalysis"].as_object();
        let mut written = Vec::new();

        for (table, file) in [
            (&self.scada, SCADA_FILE),
            (&self.plant, PLANT_FILE),
            (&self.assets, ASSET_FILE),
        ] {
            let path = dir.join(file);
            table.to_csv(&path)?;
            written.push(path);
        }

        for (product, table) in &self.reanalysis {
            let file = reanalysis_files
                .and_then(|files| files.get(product))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{}.csv", product));
            let path = dir.join(file);
            table.to_csv(&path)?;
            written.push(path);
        }

        let path = dir.join(CONTRACT_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(&self.contract)?)?;
        written.push(path);

        let path = dir.join(MANIFEST_FILE);
        self.manifest.to_json_file(&path)?;
        written.push(path);

        Ok(written)
    }
}
