//! Live reminder status classification.
//!
//! A pure, stateless classification re-evaluated every time `now` advances;
//! it has no memory of previously reported states.

use crate::Reminder;
use chrono::{DateTime, Duration, Local};
use serde::{Deserialize, Serialize};

/// A reminder counts as due for this long after its scheduled moment
pub const DUE_WINDOW_MINUTES: i64 = 60;
/// A reminder shows as upcoming this long before its scheduled moment
pub const UPCOMING_WINDOW_MINUTES: i64 = 30;

/// Lifecycle state of a reminder relative to the current time
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Completed,
    Overdue,
    Due,
    Upcoming,
    Scheduled,
}

impl ReminderStatus {
    /// Display label for lists and reports
    pub fn label(&self) -> &'static str {
        match self {
            ReminderStatus::Completed => "completed",
            ReminderStatus::Overdue => "overdue",
            ReminderStatus::Due => "due",
            ReminderStatus::Upcoming => "upcoming",
            ReminderStatus::Scheduled => "scheduled",
        }
    }
}

/// Classify a reminder against the current time.
///
/// Rules in order, first match wins:
/// 1. Completed
/// 2. Overdue   - more than 60 minutes past the scheduled moment
/// 3. Due       - 0 to 60 minutes past, inclusive on both ends
/// 4. Upcoming  - within 30 minutes before
/// 5. Scheduled - further in the future
pub fn classify(reminder: &Reminder, now: DateTime<Local>) -> ReminderStatus {
    if reminder.completed {
        return ReminderStatus::Completed;
    }

    let elapsed = now - reminder.scheduled_time;

    if elapsed > Duration::minutes(DUE_WINDOW_MINUTES) {
        ReminderStatus::Overdue
    } else if elapsed >= Duration::zero() {
        ReminderStatus::Due
    } else if elapsed >= Duration::minutes(-UPCOMING_WINDOW_MINUTES) {
        ReminderStatus::Upcoming
    } else {
        ReminderStatus::Scheduled
    }
}

/// Whole minutes a reminder is past its scheduled moment (0 if not yet due)
pub fn minutes_late(reminder: &Reminder, now: DateTime<Local>) -> i64 {
    (now - reminder.scheduled_time).num_minutes().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reminder_at(scheduled_time: DateTime<Local>) -> Reminder {
        Reminder {
            id: "med-2024-06-01-0".into(),
            medication_id: "med".into(),
            scheduled_time,
            completed: false,
            completed_at: None,
        }
    }

    #[test]
    fn test_completed_wins_regardless_of_elapsed_time() {
        let now = Local::now();
        let mut reminder = reminder_at(now - Duration::hours(30));
        reminder.completed = true;
        reminder.completed_at = Some(now);

        assert_eq!(classify(&reminder, now), ReminderStatus::Completed);
    }

    #[test]
    fn test_due_window() {
        let now = Local::now();

        // Exactly on time.
        let on_time = reminder_at(now);
        assert_eq!(classify(&on_time, now), ReminderStatus::Due);

        // 45 minutes late is still due.
        let late = reminder_at(now - Duration::minutes(45));
        assert_eq!(classify(&late, now), ReminderStatus::Due);

        // The 60-minute boundary is inclusive.
        let edge = reminder_at(now - Duration::minutes(60));
        assert_eq!(classify(&edge, now), ReminderStatus::Due);
    }

    #[test]
    fn test_overdue_past_the_hour() {
        let now = Local::now();
        let reminder = reminder_at(now - Duration::minutes(61));

        assert_eq!(classify(&reminder, now), ReminderStatus::Overdue);
    }

    #[test]
    fn test_upcoming_within_half_hour() {
        let now = Local::now();

        let soon = reminder_at(now + Duration::minutes(10));
        assert_eq!(classify(&soon, now), ReminderStatus::Upcoming);

        let edge = reminder_at(now + Duration::minutes(30));
        assert_eq!(classify(&edge, now), ReminderStatus::Upcoming);
    }

    #[test]
    fn test_scheduled_beyond_half_hour() {
        let now = Local::now();
        let reminder = reminder_at(now + Duration::minutes(31));

        assert_eq!(classify(&reminder, now), ReminderStatus::Scheduled);
    }

    #[test]
    fn test_minutes_late() {
        let now = Local::now();

        assert_eq!(minutes_late(&reminder_at(now - Duration::minutes(75)), now), 75);
        assert_eq!(minutes_late(&reminder_at(now + Duration::minutes(5)), now), 0);
    }
}
