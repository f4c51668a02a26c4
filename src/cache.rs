//! Conformed-dataset cache
//!
//! Lives on the orchestration side: the pipeline never looks at it. A
//! dataset is stored under the [`Fingerprint`] of everything that
//! determines it (raw tables, contract, configuration), so the expensive
//! run happens at most once per distinct input and the result is shared
//! read-only through an `Arc`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use log::debug;
use xxhash_rust::xxh64::Xxh64;

use crate::config::PipelineConfig;
use crate::contract::PlantContract;
use crate::dataset::PlantDataset;
use crate::error::{LoadError, Result};
use crate::io::{RawSources, RawTable};

const FINGERPRINT_SEED: u64 = 0x706c_616e_7464_6174;

// ASCII unit/record/group separators keep adjacent cells from running together
const UNIT_SEP: &[u8] = &[0x1f];
const RECORD_SEP: &[u8] = &[0x1e];
const GROUP_SEP: &[u8] = &[0x1d];

/// Content fingerprint of one pipeline input set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Hash the raw inputs together with the contract and configuration.
    pub fn of(
        raw: &RawSources,
        contract: &PlantContract,
        config: &PipelineConfig,
    ) -> std::result::Result<Self, LoadError> {
        let mut hasher = Xxh64::new(FINGERPRINT_SEED);

        hash_table(&mut hasher, "scada", &raw.scada);
        hash_table(&mut hasher, "plant", &raw.plant);
        for (product, table) in &raw.reanalysis {
            hash_table(&mut hasher, product, table);
        }
        hash_table(&mut hasher, "assets", &raw.assets);

        hasher.update(&serde_json::to_vec(contract)?);
        hasher.update(GROUP_SEP);
        hasher.update(&serde_json::to_vec(config)?);

        Ok(Self(hasher.digest()))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

fn hash_table(hasher: &mut Xxh64, role: &str, table: &RawTable) {
    hasher.update(role.as_bytes());
    hasher.update(GROUP_SEP);
    for header in &table.headers {
        hasher.update(header.as_bytes());
        hasher.update(UNIT_SEP);
    }
    hasher.update(RECORD_SEP);
    for row in &table.rows {
        for cell in row {
            hasher.update(cell.as_bytes());
            hasher.update(UNIT_SEP);
        }
        hasher.update(RECORD_SEP);
    }
    hasher.update(GROUP_SEP);
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<Fingerprint, Arc<PlantDataset>>,
    stats: CacheStats,
}

/// Process-wide store of conformed datasets, keyed by fingerprint.
#[derive(Default)]
pub struct DatasetCache {
    inner: Mutex<CacheInner>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the dataset stored under `fingerprint`, building it first if
    /// needed. Builds are serialized, so each fingerprint is built at most
    /// once. A failed build stores nothing.
    pub fn get_or_build<F>(&self, fingerprint: Fingerprint, build: F) -> Result<Arc<PlantDataset>>
    where
        F: FnOnce() -> Result<PlantDataset>,
    {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(dataset) = inner.entries.get(&fingerprint).cloned() {
            inner.stats.hits += 1;
            debug!("cache hit for {}", fingerprint);
            return Ok(dataset);
        }

        inner.stats.misses += 1;
        debug!("cache miss for {}, building", fingerprint);
        let dataset = Arc::new(build()?);
        inner.entries.insert(fingerprint, Arc::clone(&dataset));
        Ok(dataset)
    }

    pub fn get(&self, fingerprint: Fingerprint) -> Option<Arc<PlantDataset>> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.entries.get(&fingerprint).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).stats
    }

    /// Drop every stored dataset. Outstanding `Arc`s stay valid.
    pub fn clear(&self) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetTable;
    use crate::contract::{PlantMetadata, SamplingPeriod, SourceSchema};
    use crate::error::{Error, PipelineError};
    use crate::report::QualityReport;
    use crate::stream::Stream;
    use std::collections::BTreeMap;

    fn contract() -> PlantContract {
        let ten = SamplingPeriod::ten_minutes();
        PlantContract {
            plant: PlantMetadata {
                name: String::new(),
                latitude: 0.0,
                longitude: 0.0,
                capacity: 1.0,
            },
            scada: SourceSchema::new(ten, "t").with_asset_id("id"),
            meter: SourceSchema::new(ten, "t"),
            curtail: SourceSchema::new(ten, "t"),
            reanalysis: BTreeMap::new(),
            asset: Default::default(),
            files: Default::default(),
        }
    }

    fn dataset() -> PlantDataset {
        let ten = SamplingPeriod::ten_minutes();
        PlantDataset {
            metadata: contract(),
            assets: AssetTable::default(),
            scada: Stream::new("scada", ten, true, vec![]),
            meter: Stream::new("meter", ten, false, vec![]),
            curtail: Stream::new("curtail", ten, false, vec![]),
            reanalysis: BTreeMap::new(),
            report: QualityReport::default(),
        }
    }

    fn raw(cell: &str) -> RawSources {
        RawSources {
            scada: RawTable {
                name: "scada".to_string(),
                headers: vec!["t".to_string()],
                rows: vec![vec![cell.to_string()]],
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_fingerprint_tracks_content_and_config() {
        let config = PipelineConfig::default();
        let a = Fingerprint::of(&raw("x"), &contract(), &config).unwrap();
        let b = Fingerprint::of(&raw("x"), &contract(), &config).unwrap();
        let c = Fingerprint::of(&raw("y"), &contract(), &config).unwrap();
        let d = Fingerprint::of(&raw("x"), &contract(), &PipelineConfig::empty()).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        assert_eq!(a.to_string().len(), 16);
    }

    #[test]
    fn test_cell_boundaries_matter() {
        let mut left = raw("ab");
        left.scada.rows[0].push("c".to_string());
        let mut right = raw("a");
        right.scada.rows[0].push("bc".to_string());

        let config = PipelineConfig::default();
        assert_ne!(
            Fingerprint::of(&left, &contract(), &config).unwrap(),
            Fingerprint::of(&right, &contract(), &config).unwrap()
        );
    }

    #[test]
    fn test_builds_once() {
        let cache = DatasetCache::new();
        let fp = Fingerprint(42);
        let mut builds = 0;

        let first = cache
            .get_or_build(fp, || {
                builds += 1;
                Ok(dataset())
            })
            .unwrap();
        let second = cache
            .get_or_build(fp, || {
                builds += 1;
                Ok(dataset())
            })
            .unwrap();

        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_errors_not_cached() {
        let cache = DatasetCache::new();
        let fp = Fingerprint(7);

        let failed = cache.get_or_build(fp, || {
            Err(Error::Pipeline(PipelineError::EntityReconciliation {
                asset_id: "R80711".to_string(),
                source_name: "scada".to_string(),
            }))
        });
        assert!(failed.is_err());
        assert!(cache.is_empty());

        assert!(cache.get_or_build(fp, || Ok(dataset())).is_ok());
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.get(fp).is_none());
    }
}
