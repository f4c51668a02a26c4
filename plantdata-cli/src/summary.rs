// PlantData CLI - Run summary
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Run summary printed after `conform` and optionally saved as JSON.

use plantdata::{Fingerprint, PlantDataset, QualityReport, Stream};
use serde::Serialize;
use std::fmt;

const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Shape of one conformed stream.
#[derive(Debug, Clone, Serialize)]
pub struct StreamSummary {
    pub name: String,
    pub period: String,
    pub rows: usize,
    pub fields: usize,
    pub entities: usize,
    pub first: Option<String>,
    pub last: Option<String>,
}

impl StreamSummary {
    fn of(stream: &Stream) -> Self {
        let stamps = || stream.records().iter().map(|r| r.timestamp);
        let first = stamps().min().map(|t| t.format(STAMP_FORMAT).to_string());
        let last = stamps().max().map(|t| t.format(STAMP_FORMAT).to_string());

        Self {
            name: stream.name().to_string(),
            period: stream.period().to_string(),
            rows: stream.len(),
            fields: stream.fields().len(),
            entities: stream.entities().len(),
            first,
            last,
        }
    }
}

/// Everything worth knowing about a finished run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub plant: String,
    pub fingerprint: String,
    pub assets: Vec<String>,
    pub streams: Vec<StreamSummary>,
    pub report: QualityReport,
}

impl RunSummary {
    pub fn new(fingerprint: Fingerprint, dataset: &PlantDataset) -> Self {
        let mut streams = vec![
            StreamSummary::of(dataset.scada()),
            StreamSummary::of(dataset.meter()),
            StreamSummary::of(dataset.curtail()),
        ];
        streams.extend(dataset.reanalysis().values().map(StreamSummary::of));

        Self {
            plant: dataset.metadata().plant.name.clone(),
            fingerprint: fingerprint.to_string(),
            assets: dataset.assets().ids().map(str::to_string).collect(),
            streams,
            report: dataset.report().clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.plant, self.fingerprint)?;
        writeln!(f, "assets: {}", self.assets.join(", "))?;
        for s in &self.streams {
            writeln!(
                f,
                "  {:<8} {:>6} {:>7} rows x {:>2} fields, {} entities, {} .. {}",
                s.name,
                s.period,
                s.rows,
                s.fields,
                s.entities,
                s.first.as_deref().unwrap_or("-"),
                s.last.as_deref().unwrap_or("-")
            )?;
        }
        write!(f, "{}", self.report)
    }
}
