//! Core domain types for the Dosewatch system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Treatment phases and their dose cadence
//! - Medications and their phase lists
//! - Reminder instances (scheduled and retroactively logged)
//!
//! All timestamps are local wall-clock time; the engine never does
//! timezone-aware scheduling.

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Smallest allowed dose cadence
pub const MIN_TIMES_PER_DAY: usize = 1;
/// Largest allowed dose cadence
pub const MAX_TIMES_PER_DAY: usize = 6;
/// Phase duration is clamped to [1, 365] days
pub const MAX_PHASE_DURATION_DAYS: u32 = 365;

/// Wire format for dose clock times ("08:00")
pub const CLOCK_TIME_FORMAT: &str = "%H:%M";

/// Parse a `HH:MM` clock-time string
pub fn parse_clock_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s, CLOCK_TIME_FORMAT)
        .map_err(|e| Error::Validation(format!("invalid clock time {:?}: {}", s, e)))
}

// ============================================================================
// Treatment Phase
// ============================================================================

/// One contiguous segment of a treatment plan.
///
/// Phases are evaluated in the order they appear in the owning medication's
/// phase list. A phase has no explicit start date: its start is implicit from
/// the cumulative durations of the phases before it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MedicationSchedule {
    pub times_per_day: usize,
    /// Clock times in slot order, one per dose (`times.len() == times_per_day`)
    pub times: Vec<String>,
    /// Duration of this phase in days
    pub duration: u32,
}

impl MedicationSchedule {
    /// Build a phase, validating the cadence/times invariant.
    ///
    /// Duration is clamped to [1, 365] days rather than rejected.
    pub fn new(times_per_day: usize, times: Vec<String>, duration: u32) -> Result<Self> {
        if !(MIN_TIMES_PER_DAY..=MAX_TIMES_PER_DAY).contains(&times_per_day) {
            return Err(Error::Validation(format!(
                "times per day must be between {} and {}, got {}",
                MIN_TIMES_PER_DAY, MAX_TIMES_PER_DAY, times_per_day
            )));
        }

        if times.len() != times_per_day {
            return Err(Error::Validation(format!(
                "expected {} dose times, got {}",
                times_per_day,
                times.len()
            )));
        }

        for time in &times {
            parse_clock_time(time)?;
        }

        Ok(Self {
            times_per_day,
            times,
            duration: duration.clamp(1, MAX_PHASE_DURATION_DAYS),
        })
    }

    /// Build a phase from the preset time table for the given cadence
    pub fn with_preset(times_per_day: usize, duration: u32) -> Result<Self> {
        let times = crate::presets::preset_times(times_per_day)
            .ok_or_else(|| {
                Error::Validation(format!("no preset for {} times per day", times_per_day))
            })?
            .iter()
            .map(|t| t.format(CLOCK_TIME_FORMAT).to_string())
            .collect();

        Self::new(times_per_day, times, duration)
    }

    /// Parsed clock time for a slot index.
    ///
    /// Returns None for an out-of-range slot or a time string that no longer
    /// parses (possible for hand-edited persisted data).
    pub fn slot_time(&self, slot: usize) -> Option<NaiveTime> {
        self.times
            .get(slot)
            .and_then(|t| NaiveTime::parse_from_str(t, CLOCK_TIME_FORMAT).ok())
    }
}

// ============================================================================
// Medication
// ============================================================================

/// A tracked medication: an owned, independent aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    /// Opaque unique identifier, stable for the medication's lifetime
    pub id: String,
    pub name: String,
    pub drops_per_dose: u32,
    /// Phases applied back-to-back starting at `start_date`
    pub schedules: Vec<MedicationSchedule>,
    /// Calendar date the first phase begins (time-of-day is never stored)
    pub start_date: NaiveDate,
    /// Inactive medications are excluded from reminder generation but kept
    /// in storage and statistics
    pub is_active: bool,
    /// Audit timestamp, set once at creation
    pub created_at: DateTime<Local>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Medication {
    /// Create a medication, assigning its id and creation timestamp.
    ///
    /// Rejects invalid input before a value exists: empty name, zero dose
    /// count, empty phase list.
    pub fn new(
        name: &str,
        drops_per_dose: u32,
        schedules: Vec<MedicationSchedule>,
        start_date: NaiveDate,
        notes: Option<String>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }

        if drops_per_dose == 0 {
            return Err(Error::Validation("drops per dose must be at least 1".into()));
        }

        if schedules.is_empty() {
            return Err(Error::Validation(
                "a medication needs at least one treatment phase".into(),
            ));
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            drops_per_dose,
            schedules,
            start_date,
            is_active: true,
            created_at: now,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }

    /// Total treatment length in days across all phases
    pub fn total_duration_days(&self) -> i64 {
        self.schedules.iter().map(|s| i64::from(s.duration)).sum()
    }
}

// ============================================================================
// Reminder Instance
// ============================================================================

/// A single dose event, scheduled or retroactively logged.
///
/// Scheduled instances derive their id from
/// `(medication id, calendar day, slot index)`, so the same slot always maps
/// to the same identity across regenerations. Retroactive entries carry an
/// opaque tagged id instead.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    /// Weak back-reference; deleting the medication deletes its reminders
    pub medication_id: String,
    /// The moment this dose was due (or was logged, for retroactive entries)
    pub scheduled_time: DateTime<Local>,
    pub completed: bool,
    /// Present if and only if `completed` is true
    #[serde(default)]
    pub completed_at: Option<DateTime<Local>>,
}

impl Reminder {
    /// Whether this instance was logged outside the regular schedule
    pub fn is_retroactive(&self) -> bool {
        self.id.contains("-retroactive-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn times(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_schedule_validates_cadence_bounds() {
        assert!(MedicationSchedule::new(0, vec![], 7).is_err());
        assert!(MedicationSchedule::new(7, times(&["01:00"; 7]), 7).is_err());
        assert!(MedicationSchedule::new(1, times(&["12:00"]), 7).is_ok());
    }

    #[test]
    fn test_schedule_rejects_mismatched_times() {
        let result = MedicationSchedule::new(3, times(&["08:00", "20:00"]), 7);
        assert!(result.is_err());
    }

    #[test]
    fn test_schedule_rejects_unparseable_times() {
        assert!(MedicationSchedule::new(1, times(&["24:00"]), 7).is_err());
        assert!(MedicationSchedule::new(1, times(&["8am"]), 7).is_err());
    }

    #[test]
    fn test_schedule_clamps_duration() {
        let short = MedicationSchedule::new(1, times(&["12:00"]), 0).unwrap();
        assert_eq!(short.duration, 1);

        let long = MedicationSchedule::new(1, times(&["12:00"]), 1000).unwrap();
        assert_eq!(long.duration, MAX_PHASE_DURATION_DAYS);
    }

    #[test]
    fn test_schedule_with_preset() {
        let phase = MedicationSchedule::with_preset(3, 7).unwrap();
        assert_eq!(phase.times, times(&["08:00", "14:00", "20:00"]));
        assert_eq!(phase.times_per_day, 3);
    }

    #[test]
    fn test_medication_rejects_empty_name() {
        let phase = MedicationSchedule::with_preset(3, 7).unwrap();
        let result = Medication::new(
            "   ",
            1,
            vec![phase],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            Local::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_medication_rejects_zero_drops() {
        let phase = MedicationSchedule::with_preset(3, 7).unwrap();
        let result = Medication::new(
            "Refresh",
            0,
            vec![phase],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            Local::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_medication_rejects_empty_phase_list() {
        let result = Medication::new(
            "Refresh",
            1,
            vec![],
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            None,
            Local::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_medication_new_assigns_identity() {
        let phase = MedicationSchedule::with_preset(2, 14).unwrap();
        let med = Medication::new(
            "Timolol",
            2,
            vec![phase],
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            Some("shake before use".into()),
            Local::now(),
        )
        .unwrap();

        assert!(!med.id.is_empty());
        assert!(med.is_active);
        assert_eq!(med.total_duration_days(), 14);
        assert_eq!(med.notes.as_deref(), Some("shake before use"));
    }

    #[test]
    fn test_blank_notes_normalized_to_none() {
        let phase = MedicationSchedule::with_preset(1, 7).unwrap();
        let med = Medication::new(
            "Latanoprost",
            1,
            vec![phase],
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            Some("  ".into()),
            Local::now(),
        )
        .unwrap();

        assert!(med.notes.is_none());
    }

    #[test]
    fn test_reminder_retroactive_tag() {
        let scheduled = Reminder {
            id: "med1-2024-01-01-0".into(),
            medication_id: "med1".into(),
            scheduled_time: Local::now(),
            completed: false,
            completed_at: None,
        };
        assert!(!scheduled.is_retroactive());

        let logged = Reminder {
            id: "med1-2024-01-01-retroactive-abc".into(),
            ..scheduled
        };
        assert!(logged.is_retroactive());
    }
}
