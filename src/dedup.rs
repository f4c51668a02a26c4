//! Deduplicator
//!
//! Keeps exactly one record per (entity, timestamp) key. The first record
//! seen in input order wins.

use std::collections::HashSet;

use log::debug;

use crate::stream::Stream;

/// Remove duplicate (entity, timestamp) records, returning how many were dropped.
pub fn dedup(stream: &mut Stream) -> usize {
    let mut seen = HashSet::with_capacity(stream.len());
    let removed = stream.retain_records(|r| seen.insert((r.entity.clone(), r.timestamp)));
    if removed > 0 {
        debug!("{}: removed {} duplicate records", stream.name(), removed);
    }
    removed
}
