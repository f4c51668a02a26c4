//! # plantdata - wind-plant data conformance
//!
//! Turns heterogeneous wind-plant feeds (turbine SCADA, revenue meter,
//! curtailment, atmospheric reanalysis, asset table) into one cleaned,
//! time-aligned and schema-validated dataset that downstream estimators
//! can share read-only.
//!
//! ## Key Features
//!
//! - **Naive-UTC time base**: every source agrees on the same instant
//! - **Cell-level cleaning**: duplicates, out-of-range readings and stuck
//!   sensors are corrected and counted, never fatal
//! - **Gap-aware alignment**: each source gets a strictly regular index at
//!   its declared period, with explicit gap rows
//! - **Contract validation**: required fields, units, cadence and entity
//!   identity are checked before a dataset exists
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plantdata::{io, Pipeline, PipelineConfig, PlantContract};
//!
//! let contract = PlantContract::from_path("data/plant_meta.json")?;
//! let raw = io::load_sources("data/la_haute_borne", &contract.files)?;
//!
//! let pipeline = Pipeline::new(contract, PipelineConfig::default())?;
//! let dataset = pipeline.run(&raw)?;
//!
//! println!("{} turbines", dataset.assets().len());
//! println!("{}", dataset.report());
//! # Ok::<(), plantdata::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`contract`]: Metadata contract (sampling periods, field tables)
//! - [`config`]: Pipeline configuration and reference defaults
//! - [`time`]: Time normalizer
//! - [`dedup`]: Deduplicator
//! - [`filters`]: Range filter and stuck-sensor detector
//! - [`angle`]: Angle normalizer
//! - [`energy`]: Energy integrator
//! - [`features`]: Derived-feature engine
//! - [`align`]: Cross-source aligner and column policy
//! - [`validate`]: Dataset conformance validator
//! - [`pipeline`]: Stage orchestration
//! - [`cache`]: Fingerprint-keyed dataset cache
//! - [`io`]: Raw-source reading, extraction and export

// Modules
pub mod align;
pub mod angle;
pub mod asset;
pub mod cache;
pub mod config;
pub mod contract;
pub mod dataset;
pub mod dedup;
pub mod energy;
pub mod error;
pub mod features;
pub mod filters;
pub mod ingest;
pub mod io;
pub mod pipeline;
pub mod report;
pub mod stream;
pub mod time;
pub mod validate;

// Re-exports for convenient access
pub use align::{AlignMode, CollisionPolicy, ColumnPolicy};
pub use asset::{Asset, AssetTable};
pub use cache::{DatasetCache, Fingerprint};
pub use config::{AlignmentRule, CleaningRules, PipelineConfig};
pub use contract::{FieldSpec, PlantContract, SamplingPeriod, SourceSchema};
pub use dataset::PlantDataset;
pub use error::{ConfigError, Error, LoadError, PipelineError, Result};
pub use features::DerivedFeature;
pub use filters::{RangeAction, RangeRule, StuckRule};
pub use io::{RawSources, RawTable, SourceFiles};
pub use pipeline::Pipeline;
pub use report::{QualityReport, SourceReport};
pub use stream::{Field, Record, Stream};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
