// PlantData CLI - Conform command
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! `conform`: extract, load, run, export.
//!
//! The dataset cache is owned by `main` for the lifetime of the process and
//! passed in, so a front end that conforms several times in one process
//! builds each distinct input only once.

use crate::summary::RunSummary;
use crate::{CliError, ConformArgs};
use plantdata::{io, DatasetCache, Fingerprint, Pipeline, PipelineConfig, PlantContract};
use plantdata_testdata::contract::CONTRACT_FILE;
use tracing::{debug, info};

pub fn run(args: &ConformArgs, cache: &DatasetCache) -> Result<(), CliError> {
    let archive = args
        .archive
        .clone()
        .unwrap_or_else(|| io::default_archive(&args.data));
    if !args.data.exists() && io::ensure_extracted(&args.data, &archive)? {
        info!("extracted {} into {}", archive.display(), args.data.display());
    }

    let contract_path = args
        .contract
        .clone()
        .unwrap_or_else(|| args.data.join(CONTRACT_FILE));
    let contract = PlantContract::from_path(&contract_path)?;
    info!("contract: {} ({})", contract.plant.name, contract_path.display());

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    if args.keep_unreferenced {
        config.prune_unreferenced_assets = false;
    }

    let raw = io::load_sources(&args.data, &contract.files)?;
    let fingerprint = Fingerprint::of(&raw, &contract, &config)?;
    debug!("input fingerprint {}", fingerprint);

    let pipeline = Pipeline::new(contract, config)?;
    let dataset = cache.get_or_build(fingerprint, || pipeline.run(&raw))?;

    let summary = RunSummary::new(fingerprint, &dataset);
    println!("{}", summary);

    if let Some(dir) = &args.export {
        let written = io::export_dataset(&dataset, dir)?;
        info!("wrote {} files to {}", written.len(), dir.display());
    }
    if let Some(path) = &args.report {
        std::fs::write(path, summary.to_json()?)?;
        info!("summary written to {}", path.display());
    }

    Ok(())
}
