//! Preset dose-time tables.
//!
//! A fixed table keyed by times-per-day cadence supplies default clock times
//! when the caller does not spell them out. The times stay caller-editable
//! after that; the table is only consulted when a cadence is (re)selected.

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Raw preset table; parsed once into `NaiveTime` on first use
const PRESET_SOURCE: [(usize, &[&str]); 6] = [
    (1, &["12:00"]),
    (2, &["08:00", "20:00"]),
    (3, &["08:00", "14:00", "20:00"]),
    (4, &["08:00", "12:00", "16:00", "20:00"]),
    (5, &["06:00", "10:00", "14:00", "18:00", "22:00"]),
    (6, &["06:00", "10:00", "12:00", "16:00", "20:00", "23:59"]),
];

/// Cached parsed presets - built once and reused across all operations
static PRESET_TABLE: Lazy<HashMap<usize, Vec<NaiveTime>>> = Lazy::new(|| {
    PRESET_SOURCE
        .iter()
        .map(|(cadence, times)| {
            let parsed = times
                .iter()
                .map(|t| {
                    NaiveTime::parse_from_str(t, crate::types::CLOCK_TIME_FORMAT)
                        .unwrap_or_else(|e| panic!("bad preset time {:?}: {}", t, e))
                })
                .collect();
            (*cadence, parsed)
        })
        .collect()
});

/// Default dose times for a cadence, in ascending slot order.
///
/// Returns None for a cadence outside 1..=6.
pub fn preset_times(times_per_day: usize) -> Option<&'static [NaiveTime]> {
    PRESET_TABLE.get(&times_per_day).map(|v| v.as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_cadence_has_a_preset() {
        for cadence in 1..=6 {
            let times = preset_times(cadence).unwrap();
            assert_eq!(times.len(), cadence);
        }
    }

    #[test]
    fn test_presets_are_ascending() {
        for cadence in 1..=6 {
            let times = preset_times(cadence).unwrap();
            for pair in times.windows(2) {
                assert!(pair[0] < pair[1], "preset for {} not ascending", cadence);
            }
        }
    }

    #[test]
    fn test_unknown_cadence_has_no_preset() {
        assert!(preset_times(0).is_none());
        assert!(preset_times(7).is_none());
    }
}
