//! Sensor-stream filters
//!
//! Cell-level quality rules. Nothing in here fails: out-of-range readings
//! and stuck-sensor runs become missing cells (or dropped rows where a rule
//! asks for it) and the counts flow into the quality report.
//!
//! - [`range`]: valid-range bounds per field, plus the structural row check
//!   on entity ids
//! - [`stuck`]: unchanged-value runs per entity, invalidating a field group

pub mod range;
pub mod stuck;

pub use range::{apply_range_rules, drop_unidentified, RangeAction, RangeOutcome, RangeRule};
pub use stuck::{apply_stuck_rules, flag_stuck, StuckOutcome, StuckRule};
