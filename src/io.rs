//! Raw-source input/output
//!
//! The file side of the pipeline: archive extraction (zip or gzip),
//! reading every raw table in full before the pipeline starts, and writing
//! a conformed dataset back out. Nothing in here interprets values; cells stay strings
//! until the pipeline parses them.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use zip::ZipArchive;

use crate::dataset::PlantDataset;
use crate::error::LoadError;
use crate::stream::Stream;

/// Timestamp layout used when writing streams.
pub const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A delimited file read in full: headers plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Position of the first column with this header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Every raw input of one plant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSources {
    /// Turbine SCADA, one row per entity per timestamp.
    pub scada: RawTable,
    /// Combined meter + curtailment feed, one row per plant timestamp.
    pub plant: RawTable,
    /// Reanalysis feeds keyed by product name.
    pub reanalysis: BTreeMap<String, RawTable>,
    /// Asset table, one row per entity.
    pub assets: RawTable,
}

/// File names of the raw inputs inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFiles {
    pub scada: String,
    pub plant: String,
    #[serde(default)]
    pub reanalysis: BTreeMap<String, String>,
    pub assets: String,
}

impl Default for SourceFiles {
    fn default() -> Self {
        let mut reanalysis = BTreeMap::new();
        reanalysis.insert("era5".to_string(), "era5_wind_la_haute_borne.csv".to_string());
        reanalysis.insert("merra2".to_string(), "merra2_la_haute_borne.csv".to_string());
        Self {
            scada: "la-haute-borne-data-2014-2015.csv".to_string(),
            plant: "plant_data.csv".to_string(),
            reanalysis,
            assets: "la-haute-borne_asset_table.csv".to_string(),
        }
    }
}

/// Read a comma-delimited file fully into memory.
///
/// A UTF-8 byte-order mark on the first header is stripped and every cell
/// is trimmed.
pub fn read_table(path: impl AsRef<Path>) -> Result<RawTable, LoadError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(LoadError::MissingFile(path.display().to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(LoadError::EmptyTable(path.display().to_string()));
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!("read {} rows x {} columns from {}", rows.len(), headers.len(), path.display());

    Ok(RawTable { name, headers, rows })
}

/// Default archive location for an extracted directory: `<target>.zip`.
pub fn default_archive(target: impl AsRef<Path>) -> PathBuf {
    target.as_ref().with_extension("zip")
}

/// Unpack the raw dataset once.
///
/// When `target` already exists nothing happens and `Ok(false)` is
/// returned. Otherwise `archive` is unpacked into `target`: a `.zip` file
/// is extracted as-is, a directory has every `*.gz` file in it
/// decompressed under its name without the suffix.
pub fn ensure_extracted(target: impl AsRef<Path>, archive: impl AsRef<Path>) -> Result<bool, LoadError> {
    let target = target.as_ref();
    let archive = archive.as_ref();
    if target.exists() {
        debug!("{} already extracted", target.display());
        return Ok(false);
    }
    if !archive.exists() {
        return Err(LoadError::MissingFile(archive.display().to_string()));
    }

    // extract next to the target first so a failed run leaves no half-filled directory
    let staging = target.with_extension("partial");
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let extracted = if archive.is_dir() {
        extract_gzip_members(archive, &staging)
    } else {
        extract_zip(archive, &staging)
    };
    let count = match extracted {
        Ok(count) => count,
        Err(e) => {
            fs::remove_dir_all(&staging)?;
            return Err(e);
        }
    };

    fs::rename(&staging, target)?;
    info!("extracted {} files into {}", count, target.display());
    Ok(true)
}

fn extract_zip(archive: &Path, staging: &Path) -> Result<usize, LoadError> {
    let mut zip = ZipArchive::new(BufReader::new(File::open(archive)?))?;
    let count = zip.len();
    zip.extract(staging)?;
    Ok(count)
}

fn extract_gzip_members(archive: &Path, staging: &Path) -> Result<usize, LoadError> {
    let mut members: Vec<PathBuf> = fs::read_dir(archive)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "gz"))
        .collect();
    members.sort();

    for member in &members {
        let Some(stem) = member.file_stem() else {
            continue;
        };
        let mut decoder = GzDecoder::new(BufReader::new(File::open(member)?));
        let mut out = BufWriter::new(File::create(staging.join(stem))?);
        std::io::copy(&mut decoder, &mut out)?;
    }
    Ok(members.len())
}

/// Read every raw input listed in `files` from `dir`.
pub fn load_sources(dir: impl AsRef<Path>, files: &SourceFiles) -> Result<RawSources, LoadError> {
    let dir = dir.as_ref();

    let mut reanalysis = BTreeMap::new();
    for (product, file) in &files.reanalysis {
        reanalysis.insert(product.clone(), read_table(dir.join(file))?);
    }

    let sources = RawSources {
        scada: read_table(dir.join(&files.scada))?,
        plant: read_table(dir.join(&files.plant))?,
        reanalysis,
        assets: read_table(dir.join(&files.assets))?,
    };
    info!(
        "loaded {} scada rows, {} plant rows, {} reanalysis products, {} assets",
        sources.scada.len(),
        sources.plant.len(),
        sources.reanalysis.len(),
        sources.assets.len()
    );
    Ok(sources)
}

fn write_stream(stream: &Stream, path: &Path) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["time".to_string()];
    if stream.is_keyed_by_entity() {
        header.push("asset_id".to_string());
    }
    header.extend(stream.fields().iter().map(|f| f.name.clone()));
    writer.write_record(&header)?;

    for record in stream.records() {
        let mut row = vec![record.timestamp.format(EXPORT_TIME_FORMAT).to_string()];
        if stream.is_keyed_by_entity() {
            row.push(record.entity.clone().unwrap_or_default());
        }
        row.extend(
            record
                .values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Write the conformed dataset to `dir` as CSV files plus the quality report.
///
/// Returns the paths written.
pub fn export_dataset(dataset: &PlantDataset, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, LoadError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let mut streams = vec![dataset.scada(), dataset.meter(), dataset.curtail()];
    streams.extend(dataset.reanalysis().values());
    for stream in streams {
        let path = dir.join(format!("{}.csv", stream.name()));
        write_stream(stream, &path)?;
        written.push(path);
    }

    let assets_path = dir.join("assets.csv");
    let mut writer = csv::Writer::from_path(&assets_path)?;
    for asset in dataset.assets().iter() {
        writer.serialize(asset)?;
    }
    writer.flush()?;
    written.push(assets_path);

    let report_path = dir.join("quality_report.json");
    serde_json::to_writer_pretty(BufWriter::new(File::create(&report_path)?), dataset.report())?;
    written.push(report_path);

    info!("exported {} files to {}", written.len(), dir.display());
    Ok(written)
}
