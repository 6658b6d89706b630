//! Treatment phase resolution.
//!
//! Maps (medication, calendar date) to the active phase, or None once the
//! treatment is exhausted. Day arithmetic is done on calendar dates, so
//! time-of-day never leaks into phase boundaries.

use crate::{Medication, MedicationSchedule};
use chrono::NaiveDate;

/// Whole days elapsed between the medication's start date and `date`.
///
/// Negative when `date` is before the start date; the resolver applies the
/// same cumulative-sum rule either way and does not special-case "before
/// start".
pub fn days_since_start(medication: &Medication, date: NaiveDate) -> i64 {
    (date - medication.start_date).num_days()
}

/// Resolve the phase active on `date`.
///
/// Walks the phase list accumulating durations; the active phase is the first
/// one whose cumulative window still contains `days_since_start` (strict
/// less-than, so a date exactly on a boundary belongs to the later phase).
/// Returns None when the treatment is exhausted; callers must render that
/// distinctly from "no medication".
pub fn resolve_phase(medication: &Medication, date: NaiveDate) -> Option<&MedicationSchedule> {
    let days = days_since_start(medication, date);

    let mut total_days: i64 = 0;
    for phase in &medication.schedules {
        if days < total_days + i64::from(phase.duration) {
            return Some(phase);
        }
        total_days += i64::from(phase.duration);
    }

    None
}

/// 1-based position of the active phase, with the phase count, for display
/// ("phase 2 of 3"). None when the treatment is exhausted.
pub fn phase_position(medication: &Medication, date: NaiveDate) -> Option<(usize, usize)> {
    let days = days_since_start(medication, date);

    let mut total_days: i64 = 0;
    for (index, phase) in medication.schedules.iter().enumerate() {
        if days < total_days + i64::from(phase.duration) {
            return Some((index + 1, medication.schedules.len()));
        }
        total_days += i64::from(phase.duration);
    }

    None
}
