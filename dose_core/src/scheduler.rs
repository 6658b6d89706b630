//! Minute-aligned reminder tick scheduling.
//!
//! The pure part (`DueTracker`, `tick`) is independently testable with a
//! synthetic clock; `TickScheduler` is the thin harness that owns the single
//! recurring timer. Delivery is triggered on an explicit transition into the
//! due state, tracked per reminder id, so a reminder still sitting in the due
//! window on a later tick is not re-delivered even if ticks are missed or
//! delayed.

use crate::generate::generate_for_day;
use crate::notify::NotificationSink;
use crate::status::{classify, ReminderStatus};
use crate::store::MedicationStore;
use crate::Reminder;
use chrono::{DateTime, Local, Timelike};
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Delay from `now` until the next wall-clock minute boundary
pub fn delay_until_next_minute(now: DateTime<Local>) -> Duration {
    let into_minute = u64::from(now.second()) * 1000 + u64::from(now.timestamp_subsec_millis());
    Duration::from_millis(60_000u64.saturating_sub(into_minute))
}

/// Tracks the last classified status per reminder id and reports transitions
/// into the due state.
#[derive(Debug, Default)]
pub struct DueTracker {
    last_status: HashMap<String, ReminderStatus>,
}

impl DueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify every reminder and return the ones that newly entered `Due`
    /// since the previous observation.
    ///
    /// A reminder first observed already inside the due window triggers once
    /// (covers startup mid-window and missed ticks). Entries for ids no
    /// longer present are pruned.
    pub fn observe(&mut self, reminders: &[Reminder], now: DateTime<Local>) -> Vec<Reminder> {
        let mut newly_due = Vec::new();
        let mut next = HashMap::with_capacity(reminders.len());

        for reminder in reminders {
            let status = classify(reminder, now);
            let previous = self.last_status.get(&reminder.id).copied();

            if status == ReminderStatus::Due && previous != Some(ReminderStatus::Due) {
                newly_due.push(reminder.clone());
            }

            next.insert(reminder.id.clone(), status);
        }

        self.last_status = next;
        newly_due
    }
}

/// One scheduler firing: regenerate today's reminders for every active
/// medication, classify them, and deliver exactly one notification per
/// reminder that newly became due.
///
/// Load failures are logged and the firing is skipped; they never propagate.
pub fn tick(
    store: &dyn MedicationStore,
    notifier: &dyn NotificationSink,
    tracker: &mut DueTracker,
    now: DateTime<Local>,
) {
    let medications = match store.load_medications() {
        Ok(medications) => medications,
        Err(e) => {
            tracing::warn!("Tick skipped: failed to load medications: {}", e);
            return;
        }
    };

    let reminders = match store.load_reminders() {
        Ok(reminders) => reminders,
        Err(e) => {
            tracing::warn!("Tick skipped: failed to load reminders: {}", e);
            return;
        }
    };

    let today = now.date_naive();
    let mut todays: Vec<Reminder> = Vec::new();
    for medication in &medications {
        todays.extend(generate_for_day(medication, today, &reminders));
    }

    for due in tracker.observe(&todays, now) {
        let medication = match medications.iter().find(|m| m.id == due.medication_id) {
            Some(medication) => medication,
            None => continue,
        };

        tracing::info!(
            "Reminder due: {} at {}",
            medication.name,
            due.scheduled_time.format("%H:%M")
        );

        notifier.deliver(
            &format!("Time for {}", medication.name),
            &format!("Take {} drop(s) now", medication.drops_per_dose),
        );
        notifier.present_blocking_alert(
            &format!(
                "Take {} drop(s) of {} now",
                medication.drops_per_dose, medication.name
            ),
            Box::new(|| tracing::debug!("Alarm dismissed")),
        );
    }
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the single recurring timer.
///
/// The first firing lands on the next minute boundary; subsequent firings
/// come every 60 seconds. Restarting (after the medication set changes)
/// stops and joins the previous worker before spawning a new one, so two
/// concurrent timers can never run against the same store.
#[derive(Default)]
pub struct TickScheduler {
    worker: Option<Worker>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the tick loop, replacing any previous one
    pub fn restart(
        &mut self,
        store: Arc<dyn MedicationStore + Send + Sync>,
        notifier: Arc<dyn NotificationSink + Send + Sync>,
    ) {
        self.stop();

        let (stop_tx, stop_rx) = channel();
        let handle = std::thread::spawn(move || run_loop(store, notifier, stop_rx));
        self.worker = Some(Worker { stop_tx, handle });
    }

    /// Cancel the outstanding timer, including its alignment delay
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for TickScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    store: Arc<dyn MedicationStore + Send + Sync>,
    notifier: Arc<dyn NotificationSink + Send + Sync>,
    stop_rx: Receiver<()>,
) {
    let mut tracker = DueTracker::new();
    let mut wait = delay_until_next_minute(Local::now());
    tracing::debug!("First tick in {:?}", wait);

    loop {
        match stop_rx.recv_timeout(wait) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }

        tick(store.as_ref(), notifier.as_ref(), &mut tracker, Local::now());
        wait = Duration::from_secs(60);
    }
}
