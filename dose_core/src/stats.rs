//! Adherence statistics over a selectable window.

use crate::{Medication, Reminder};
use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// The streak walk looks back at most this many days
pub const STREAK_HORIZON_DAYS: i64 = 365;

/// Reporting window presets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsWindow {
    /// Trailing 7 days
    Week,
    /// Trailing 30 days
    Month,
    /// Everything on record
    All,
}

impl StatsWindow {
    /// Inclusive window start, or None for the unbounded window
    pub fn start(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            StatsWindow::Week => Some(now - Duration::days(7)),
            StatsWindow::Month => Some(now - Duration::days(30)),
            StatsWindow::All => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatsWindow::Week => "last 7 days",
            StatsWindow::Month => "last 30 days",
            StatsWindow::All => "all time",
        }
    }
}

/// Per-day completion tally for the breakdown chart
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct DayTally {
    pub completed: usize,
    pub total: usize,
}

impl DayTally {
    pub fn rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f64 / self.total as f64 * 100.0
        }
    }
}

/// Adherence summary over one window
#[derive(Clone, Debug, Serialize)]
pub struct AdherenceStats {
    pub total_reminders: usize,
    pub completed_reminders: usize,
    /// Percentage; 0.0 when there are no reminders in the window
    pub adherence_rate: f64,
    pub streak_days: u32,
    pub daily_breakdown: BTreeMap<NaiveDate, DayTally>,
}

/// Per-medication adherence, for the overview list
#[derive(Clone, Debug, Serialize)]
pub struct MedicationSummary {
    pub medication_id: String,
    pub name: String,
    pub is_active: bool,
    pub total_reminders: usize,
    pub completed_reminders: usize,
    pub adherence_rate: f64,
}

/// Aggregate adherence statistics.
///
/// Window filtering applies to the totals, the rate and the daily breakdown;
/// the streak always walks the full history regardless of the window.
pub fn aggregate(reminders: &[Reminder], window: StatsWindow, now: DateTime<Local>) -> AdherenceStats {
    let start = window.start(now);
    let in_window: Vec<&Reminder> = reminders
        .iter()
        .filter(|r| start.map_or(true, |s| r.scheduled_time >= s))
        .collect();

    let total_reminders = in_window.len();
    let completed_reminders = in_window.iter().filter(|r| r.completed).count();
    let adherence_rate = if total_reminders > 0 {
        completed_reminders as f64 / total_reminders as f64 * 100.0
    } else {
        0.0
    };

    let mut daily_breakdown: BTreeMap<NaiveDate, DayTally> = BTreeMap::new();
    for reminder in &in_window {
        let tally = daily_breakdown
            .entry(reminder.scheduled_time.date_naive())
            .or_default();
        tally.total += 1;
        if reminder.completed {
            tally.completed += 1;
        }
    }

    AdherenceStats {
        total_reminders,
        completed_reminders,
        adherence_rate,
        streak_days: streak_days(reminders, now),
        daily_breakdown,
    }
}

/// Consecutive trailing calendar days with no incomplete reminders.
///
/// Walks backward from today for up to a year. A day with zero reminders is
/// skipped; it neither breaks nor extends the streak. A day with at least
/// one reminder and at least one incomplete reminder ends the walk.
pub fn streak_days(reminders: &[Reminder], now: DateTime<Local>) -> u32 {
    let today = now.date_naive();
    let mut streak = 0;

    for offset in 0..STREAK_HORIZON_DAYS {
        let day = today - Duration::days(offset);

        let mut day_has_reminders = false;
        let mut day_fully_completed = true;
        for reminder in reminders {
            if reminder.scheduled_time.date_naive() == day {
                day_has_reminders = true;
                if !reminder.completed {
                    day_fully_completed = false;
                    break;
                }
            }
        }

        if !day_has_reminders {
            continue;
        }

        if day_fully_completed {
            streak += 1;
        } else {
            break;
        }
    }

    streak
}

/// Per-medication totals and rates across the full reminder history
pub fn medication_summaries(
    medications: &[Medication],
    reminders: &[Reminder],
) -> Vec<MedicationSummary> {
    medications
        .iter()
        .map(|medication| {
            let total = reminders
                .iter()
                .filter(|r| r.medication_id == medication.id)
                .count();
            let completed = reminders
                .iter()
                .filter(|r| r.medication_id == medication.id && r.completed)
                .count();

            MedicationSummary {
                medication_id: medication.id.clone(),
                name: medication.name.clone(),
                is_active: medication.is_active,
                total_reminders: total,
                completed_reminders: completed,
                adherence_rate: if total > 0 {
                    completed as f64 / total as f64 * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect()
}
