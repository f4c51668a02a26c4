//! Angle normalizer

use crate::stream::Stream;

/// Map an angle in degrees onto the signed half-range (-180, 180].
///
/// ```rust
/// use plantdata::angle::normalize_angle;
///
/// assert_eq!(normalize_angle(370.0), 10.0);
/// assert_eq!(normalize_angle(190.0), -170.0);
/// assert_eq!(normalize_angle(-180.0), 180.0);
/// ```
pub fn normalize_angle(degrees: f64) -> f64 {
    let reduced = degrees.rem_euclid(360.0);
    if reduced > 180.0 {
        reduced - 360.0
    } else {
        reduced
    }
}

/// Normalize one column in place. Returns the number of cells whose value changed.
pub fn normalize_field(stream: &mut Stream, field: &str) -> usize {
    let Some(idx) = stream.field_index(field) else {
        return 0;
    };

    let mut changed = 0;
    for record in stream.records_mut() {
        if let Some(v) = record.values[idx] {
            let n = normalize_angle(v);
            if n.to_bits() != v.to_bits() {
                record.values[idx] = Some(n);
                changed += 1;
            }
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_examples() {
        assert_eq!(normalize_angle(370.0), 10.0);
        assert_eq!(normalize_angle(190.0), -170.0);
        assert_eq!(normalize_angle(180.0), 180.0);
        assert_eq!(normalize_angle(-180.0), 180.0);
        assert_eq!(normalize_angle(-190.0), 170.0);
        assert_eq!(normalize_angle(720.0), 0.0);
    }

    #[test]
    fn test_range_closed() {
        let mut deg = -1000.0;
        while deg <= 1000.0 {
            let n = normalize_angle(deg);
            assert!(n > -180.0 && n <= 180.0, "{} -> {}", deg, n);
            deg += 7.3;
        }
    }

    #[test]
    fn test_idempotent() {
        for deg in [-179.5, -90.0, 0.0, 45.25, 179.9, 180.0, 370.0, -725.0] {
            let once = normalize_angle(deg);
            assert_eq!(normalize_angle(once), once);
        }
    }
}
