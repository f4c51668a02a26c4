//! Time normalizer
//!
//! Every source ends up on naive UTC: values carrying an explicit offset are
//! converted to UTC, zone-less values are read in the source's assumed
//! offset, and the zone annotation is stripped in both cases.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::PipelineError;

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parse one timestamp cell into naive UTC.
///
/// Returns `None` when the text matches no known layout.
pub fn parse_timestamp(text: &str, assumed: FixedOffset) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for fmt in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, fmt) {
            return Some(dt.naive_utc());
        }
    }

    // trailing "Z" / " UTC" on an otherwise naive layout
    let (body, offset) = match text
        .strip_suffix('Z')
        .or_else(|| text.strip_suffix(" UTC"))
    {
        Some(body) => (body.trim_end(), 0),
        None => (text, assumed.local_minus_utc()),
    };

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(body, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(body, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    Some(naive - Duration::seconds(i64::from(offset)))
}

/// Normalize a whole timestamp column.
///
/// Fails on the first cell that cannot be parsed, naming its row (0-based,
/// header excluded).
pub fn normalize_timestamps<'a, I>(
    source_name: &str,
    cells: I,
    assumed: FixedOffset,
) -> Result<Vec<NaiveDateTime>, PipelineError>
where
    I: IntoIterator<Item = &'a str>,
{
    cells
        .into_iter()
        .enumerate()
        .map(|(row, cell)| {
            parse_timestamp(cell, assumed).ok_or_else(|| PipelineError::MalformedTimestamp {
                source_name: source_name.to_string(),
                row,
                value: cell.to_string(),
            })
        })
        .collect()
}
