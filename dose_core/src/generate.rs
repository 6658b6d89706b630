//! Daily reminder generation and merge.
//!
//! Regeneration runs on every render and every tick, so reminder identity must
//! be deterministic: the same (medication, day, slot) always yields the same
//! id, and completion state recorded under that id is inherited by the freshly
//! generated instance instead of being discarded.

use crate::schedule::resolve_phase;
use crate::{Medication, Reminder};
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use uuid::Uuid;

/// Deterministic id for a regularly scheduled dose slot
pub fn slot_reminder_id(medication_id: &str, date: NaiveDate, slot: usize) -> String {
    format!("{}-{}-{}", medication_id, date.format("%Y-%m-%d"), slot)
}

/// Opaque id for a retroactively logged dose
pub fn retroactive_reminder_id(medication_id: &str, date: NaiveDate) -> String {
    format!(
        "{}-{}-retroactive-{}",
        medication_id,
        date.format("%Y-%m-%d"),
        Uuid::new_v4()
    )
}

/// Combine a calendar date with a clock time in the local wall-clock.
///
/// During a DST fold the earlier instant wins; a time inside a spring-forward
/// gap falls back to interpreting the naive value as UTC.
pub fn at_local(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    match naive.and_local_timezone(Local) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => Local.from_utc_datetime(&naive),
    }
}

/// Generate the ordered reminder set for one medication on one date.
///
/// Inactive medications and exhausted treatments produce an empty set (the
/// latter means "treatment completed", not an error). Completion state is
/// inherited from any prior reminder sharing the slot id. Output order is
/// slot order; no re-sorting happens within a single medication.
pub fn generate_for_day(
    medication: &Medication,
    date: NaiveDate,
    prior_reminders: &[Reminder],
) -> Vec<Reminder> {
    if !medication.is_active {
        return Vec::new();
    }

    let phase = match resolve_phase(medication, date) {
        Some(phase) => phase,
        None => return Vec::new(),
    };

    let mut reminders = Vec::with_capacity(phase.times.len());
    for (slot, raw_time) in phase.times.iter().enumerate() {
        let time = match phase.slot_time(slot) {
            Some(time) => time,
            None => {
                tracing::warn!(
                    "Skipping unparseable dose time {:?} for medication {}",
                    raw_time,
                    medication.id
                );
                continue;
            }
        };

        let id = slot_reminder_id(&medication.id, date, slot);
        let prior = prior_reminders.iter().find(|r| r.id == id);

        reminders.push(Reminder {
            id,
            medication_id: medication.id.clone(),
            scheduled_time: at_local(date, time),
            completed: prior.map_or(false, |r| r.completed),
            completed_at: prior.and_then(|r| r.completed_at),
        });
    }

    reminders
}

/// Consolidated "today" view across all medications.
///
/// Merges the generated sets with persisted-but-not-regenerated instances
/// (retroactive entries) whose scheduled time falls on the requested date,
/// then sorts by scheduled time ascending with ties broken by medication id
/// to keep the ordering deterministic.
pub fn today_view(
    medications: &[Medication],
    reminders: &[Reminder],
    date: NaiveDate,
) -> Vec<Reminder> {
    let mut merged = Vec::new();
    for medication in medications {
        merged.extend(generate_for_day(medication, date, reminders));
    }

    for reminder in reminders {
        if reminder.scheduled_time.date_naive() == date
            && !merged.iter().any(|r| r.id == reminder.id)
        {
            merged.push(reminder.clone());
        }
    }

    merged.sort_by(|a, b| {
        a.scheduled_time
            .cmp(&b.scheduled_time)
            .then_with(|| a.medication_id.cmp(&b.medication_id))
    });

    merged
}

/// Record a dose taken outside any scheduled slot.
///
/// The entry is completed at creation and carries a tagged opaque id, so
/// later regenerations never produce it; it survives only because it is
/// explicitly persisted.
pub fn retroactive_entry(
    medication: &Medication,
    scheduled_time: DateTime<Local>,
    now: DateTime<Local>,
) -> Reminder {
    Reminder {
        id: retroactive_reminder_id(&medication.id, scheduled_time.date_naive()),
        medication_id: medication.id.clone(),
        scheduled_time,
        completed: true,
        completed_at: Some(now),
    }
}

/// Copy-on-write completion transition.
///
/// Updates the persisted record matching `target.id`, or appends the given
/// instance when no record exists yet (the usual case for a generated slot
/// completed for the first time). `completed_at` is set exactly when
/// `completed` transitions to true and cleared when it transitions to false.
pub fn set_completed(
    reminders: &[Reminder],
    target: &Reminder,
    completed: bool,
    now: DateTime<Local>,
) -> Vec<Reminder> {
    let completed_at = if completed { Some(now) } else { None };
    let mut updated = reminders.to_vec();

    match updated.iter_mut().find(|r| r.id == target.id) {
        Some(existing) => {
            existing.completed = completed;
            existing.completed_at = completed_at;
        }
        None => {
            let mut fresh = target.clone();
            fresh.completed = completed;
            fresh.completed_at = completed_at;
            updated.push(fresh);
        }
    }

    updated
}
