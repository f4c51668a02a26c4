//! Raw table to stream
//!
//! Maps a raw table through its contract entry: the time column goes
//! through the time normalizer, the asset-id column becomes the entity,
//! declared columns are renamed to their canonical names and parsed as
//! numbers. Undeclared columns are left behind.

use log::debug;

use crate::align::ColumnPolicy;
use crate::contract::SourceSchema;
use crate::error::PipelineError;
use crate::io::RawTable;
use crate::stream::{Field, Record, Stream};
use crate::time::normalize_timestamps;

/// Counts produced while building a stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub rows_read: usize,
    pub cells_unparsed: usize,
    pub columns_undeclared: usize,
    pub columns_collided: usize,
}

fn parse_cell(cell: &str, unparsed: &mut usize) -> Option<f64> {
    let cell = cell.trim();
    if cell.is_empty() {
        return None;
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(_) => None,
        Err(_) => {
            *unparsed += 1;
            None
        }
    }
}

/// Build the stream `name` from `table` according to `schema`.
pub fn build_stream(
    name: &str,
    table: &RawTable,
    schema: &SourceSchema,
    policy: &ColumnPolicy,
) -> Result<(Stream, IngestOutcome), PipelineError> {
    let mut outcome = IngestOutcome {
        rows_read: table.len(),
        ..Default::default()
    };

    let time_col = table
        .column_index(&schema.time)
        .ok_or_else(|| PipelineError::schema(name, &schema.time, "time column missing"))?;
    let id_col = match &schema.asset_id {
        Some(id) => Some(
            table
                .column_index(id)
                .ok_or_else(|| PipelineError::schema(name, id, "asset id column missing"))?,
        ),
        None => None,
    };

    let mut candidates = Vec::new();
    for (i, header) in table.headers.iter().enumerate() {
        if *header == schema.time || Some(header) == schema.asset_id.as_ref() {
            continue;
        }
        match schema.canonical_name(policy.rename(header)) {
            Some(canonical) => candidates.push((i, canonical.to_string())),
            None => outcome.columns_undeclared += 1,
        }
    }
    let selection = policy.resolve(name, candidates)?;
    outcome.columns_collided = selection.collisions;

    let fields: Vec<Field> = selection
        .columns
        .iter()
        .map(|(_, canonical)| {
            let unit = schema.field(canonical).and_then(|f| f.unit.as_deref());
            Field::new(canonical, unit)
        })
        .collect();

    let offset = schema
        .offset()
        .map_err(|e| PipelineError::schema(name, "utc_offset", e.to_string()))?;
    let timestamps = normalize_timestamps(
        name,
        table
            .rows
            .iter()
            .map(|row| row.get(time_col).map(String::as_str).unwrap_or("")),
        offset,
    )?;

    let mut stream = Stream::new(name, schema.frequency, schema.is_per_entity(), fields);
    for (row, timestamp) in table.rows.iter().zip(timestamps) {
        let entity = id_col
            .and_then(|i| row.get(i))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty());
        let values = selection
            .columns
            .iter()
            .map(|(pos, _)| {
                row.get(*pos)
                    .and_then(|cell| parse_cell(cell, &mut outcome.cells_unparsed))
            })
            .collect();
        stream.push(Record::new(timestamp, entity, values));
    }

    debug!(
        "{}: built {} records with {} fields ({} undeclared columns left out)",
        name,
        stream.len(),
        stream.fields().len(),
        outcome.columns_undeclared
    );
    Ok((stream, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::CollisionPolicy;
    use crate::contract::{FieldSpec, SamplingPeriod};

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable {
            name: "raw".to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn scada_schema() -> SourceSchema {
        SourceSchema::new(SamplingPeriod::ten_minutes(), "Date_time")
            .with_asset_id("Wind_turbine_name")
            .with_field(FieldSpec::new("WTUR_W", "P_avg").with_unit("kW"))
            .with_field(FieldSpec::new("WMET_EnvTmp", "Ot_avg").with_unit("C"))
    }

    #[test]
    fn test_renames_and_parses() {
        let raw = table(
            &["Wind_turbine_name", "Date_time", "P_avg", "Ot_avg", "Ba_min"],
            &[
                &["R80711", "2014-01-01T00:00:00+00:00", "512.5", "", "1"],
                &["R80711", "2014-01-01T00:10:00+00:00", "oops", "4.5", "1"],
            ],
        );

        let (stream, outcome) =
            build_stream("scada", &raw, &scada_schema(), &ColumnPolicy::default()).unwrap();

        assert_eq!(stream.fields()[0], Field::new("WTUR_W", Some("kW")));
        assert_eq!(stream.column("WTUR_W").unwrap(), vec![Some(512.5), None]);
        assert_eq!(stream.column("WMET_EnvTmp").unwrap(), vec![None, Some(4.5)]);
        assert_eq!(stream.entities(), vec!["R80711"]);
        assert_eq!(outcome.rows_read, 2);
        assert_eq!(outcome.cells_unparsed, 1);
        assert_eq!(outcome.columns_undeclared, 1);
    }

    #[test]
    fn test_missing_time_column() {
        let raw = table(&["Wind_turbine_name", "P_avg"], &[]);
        let err = build_stream("scada", &raw, &scada_schema(), &ColumnPolicy::default()).unwrap_err();
        assert_eq!(err, PipelineError::schema("scada", "Date_time", "time column missing"));
    }

    #[test]
    fn test_malformed_timestamp_aborts() {
        let raw = table(
            &["Wind_turbine_name", "Date_time", "P_avg"],
            &[&["R80711", "yesterday", "1"]],
        );
        let err = build_stream("scada", &raw, &scada_schema(), &ColumnPolicy::default()).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedTimestamp { row: 0, .. }));
    }

    #[test]
    fn test_duplicate_columns_follow_policy() {
        let schema = SourceSchema::new(SamplingPeriod::hourly(), "datetime")
            .with_field(FieldSpec::new("WMETR_HorWdSpdU", "u_100"));
        let raw = table(
            &["datetime", "u_100", "u_100"],
            &[&["2014-01-01 00:00:00", "1.0", "2.0"]],
        );

        let (first, outcome) = build_stream("era5", &raw, &schema, &ColumnPolicy::default()).unwrap();
        assert_eq!(first.column("WMETR_HorWdSpdU").unwrap(), vec![Some(1.0)]);
        assert_eq!(outcome.columns_collided, 1);

        let last = ColumnPolicy {
            on_collision: CollisionPolicy::KeepLast,
            ..Default::default()
        };
        let (stream, _) = build_stream("era5", &raw, &schema, &last).unwrap();
        assert_eq!(stream.column("WMETR_HorWdSpdU").unwrap(), vec![Some(2.0)]);
    }

    #[test]
    fn test_empty_entity_kept_as_none() {
        let raw = table(
            &["Wind_turbine_name", "Date_time", "P_avg"],
            &[&["", "2014-01-01 00:00:00", "1"]],
        );
        let (stream, _) = build_stream("scada", &raw, &scada_schema(), &ColumnPolicy::default()).unwrap();
        assert_eq!(stream.records()[0].entity, None);
    }
}
