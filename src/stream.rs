//! Observation streams
//!
//! A [`Stream`] is the tabular form every stage works on: an ordered list of
//! records, each carrying a naive-UTC timestamp, an optional entity id and
//! one optional value per declared field. Missing cells are `None`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::contract::SamplingPeriod;

/// A named column with its declared unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub unit: Option<String>,
}

impl Field {
    pub fn new(name: &str, unit: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.map(str::to_string),
        }
    }
}

/// One observation: timestamp, entity and a value per field.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: NaiveDateTime,
    pub entity: Option<String>,
    pub values: Vec<Option<f64>>,
    // set only on rows the aligner inserted
    gap: bool,
}

impl Record {
    pub fn new(timestamp: NaiveDateTime, entity: Option<&str>, values: Vec<Option<f64>>) -> Self {
        Self {
            timestamp,
            entity: entity.map(str::to_string),
            values,
            gap: false,
        }
    }

    /// A gap row: every field missing.
    pub fn gap(timestamp: NaiveDateTime, entity: Option<String>, width: usize) -> Self {
        Self {
            timestamp,
            entity,
            values: vec![None; width],
            gap: true,
        }
    }

    /// True for rows inserted where the recorded cadence broke.
    ///
    /// An observed row whose cells were all nulled by cleaning is not a gap.
    pub fn is_gap(&self) -> bool {
        self.gap
    }
}

/// A single-source observation stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    name: String,
    period: SamplingPeriod,
    keyed_by_entity: bool,
    fields: Vec<Field>,
    records: Vec<Record>,
}

impl Stream {
    /// Create an empty stream.
    pub fn new(name: &str, period: SamplingPeriod, keyed_by_entity: bool, fields: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            period,
            keyed_by_entity,
            fields,
            records: Vec::new(),
        }
    }

    /// Source name (`scada`, `meter`, a reanalysis product...).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared sampling period.
    pub fn period(&self) -> SamplingPeriod {
        self.period
    }

    /// True when records are indexed by (entity, timestamp).
    pub fn is_keyed_by_entity(&self) -> bool {
        self.keyed_by_entity
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Position of a field by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Declared unit of a field.
    pub fn unit(&self, name: &str) -> Option<&str> {
        self.field_index(name)
            .and_then(|i| self.fields[i].unit.as_deref())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_index(name).is_some()
    }

    /// Copy of one column, in record order.
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.field_index(name)?;
        Some(self.records.iter().map(|r| r.values[idx]).collect())
    }

    /// Value of `field` at record `row`.
    pub fn value(&self, row: usize, field: &str) -> Option<f64> {
        let idx = self.field_index(field)?;
        self.records.get(row).and_then(|r| r.values[idx])
    }

    /// Distinct entity ids, sorted.
    pub fn entities(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .filter_map(|r| r.entity.as_deref())
            .collect();
        set.into_iter().collect()
    }

    /// Records of one entity, in stream order.
    pub fn entity_records<'a>(&'a self, entity: &'a str) -> impl Iterator<Item = &'a Record> + 'a {
        self.records
            .iter()
            .filter(move |r| r.entity.as_deref() == Some(entity))
    }

    /// Record positions grouped by entity (plant-level streams form a single
    /// `None` group), each group in stream order.
    pub fn entity_groups(&self) -> BTreeMap<Option<&str>, Vec<usize>> {
        let mut groups: BTreeMap<Option<&str>, Vec<usize>> = BTreeMap::new();
        for (i, record) in self.records.iter().enumerate() {
            groups.entry(record.entity.as_deref()).or_default().push(i);
        }
        groups
    }

    /// Append a record. Its width must match the field list.
    pub fn push(&mut self, record: Record) {
        debug_assert_eq!(record.values.len(), self.fields.len());
        self.records.push(record);
    }

    pub(crate) fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub(crate) fn retain_records<F>(&mut self, keep: F) -> usize
    where
        F: FnMut(&Record) -> bool,
    {
        let before = self.records.len();
        self.records.retain(keep);
        before - self.records.len()
    }

    pub(crate) fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub(crate) fn take_records(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.records)
    }

    /// Set a column, appending the field if it does not exist yet.
    pub(crate) fn set_column(&mut self, field: Field, values: Vec<Option<f64>>) {
        debug_assert_eq!(values.len(), self.records.len());
        match self.field_index(&field.name) {
            Some(idx) => {
                self.fields[idx].unit = field.unit;
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.values[idx] = value;
                }
            }
            None => {
                self.fields.push(field);
                for (record, value) in self.records.iter_mut().zip(values) {
                    record.values.push(value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2014, 1, 1)
            .unwrap()
            .and_hms_opt(0, m, 0)
            .unwrap()
    }

    fn sample() -> Stream {
        let mut s = Stream::new(
            "scada",
            SamplingPeriod::ten_minutes(),
            true,
            vec![Field::new("WTUR_W", Some("kW"))],
        );
        s.push(Record::new(ts(0), Some("T2"), vec![Some(1.0)]));
        s.push(Record::new(ts(0), Some("T1"), vec![Some(2.0)]));
        s.push(Record::new(ts(10), Some("T2"), vec![None]));
        s
    }

    #[test]
    fn test_column_and_value() {
        let s = sample();
        assert_eq!(s.column("WTUR_W").unwrap(), vec![Some(1.0), Some(2.0), None]);
        assert_eq!(s.value(1, "WTUR_W"), Some(2.0));
        assert_eq!(s.unit("WTUR_W"), Some("kW"));
        assert!(s.column("missing").is_none());
    }

    #[test]
    fn test_entities_sorted_and_grouped() {
        let s = sample();
        assert_eq!(s.entities(), vec!["T1", "T2"]);
        let groups = s.entity_groups();
        assert_eq!(groups[&Some("T2")], vec![0, 2]);
        assert_eq!(s.entity_records("T2").count(), 2);
    }

    #[test]
    fn test_set_column_appends_then_overwrites() {
        let mut s = sample();
        s.set_column(Field::new("WTUR_SupWh", Some("kWh")), vec![Some(1.0); 3]);
        assert_eq!(s.fields().len(), 2);
        s.set_column(Field::new("WTUR_SupWh", Some("kWh")), vec![None; 3]);
        assert_eq!(s.fields().len(), 2);
        assert_eq!(s.column("WTUR_SupWh").unwrap(), vec![None; 3]);
    }

    #[test]
    fn test_gap_record() {
        let gap = Record::gap(ts(20), None, 3);
        assert!(gap.is_gap());
        assert_eq!(gap.values.len(), 3);

        let nulled = Record::new(ts(20), None, vec![None; 3]);
        assert!(!nulled.is_gap());
        assert_ne!(nulled, gap);
    }
}
