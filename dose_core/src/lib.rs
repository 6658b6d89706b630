#![forbid(unsafe_code)]

//! Core domain model and scheduling engine for the Dosewatch system.
//!
//! This crate provides:
//! - Domain types (medications, treatment phases, reminder instances)
//! - Phase resolution and daily reminder generation
//! - Live status classification and adherence statistics
//! - The minute-aligned tick scheduler
//! - Persistence and notification collaborators

pub mod types;
pub mod error;
pub mod presets;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod generate;
pub mod status;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod notify;
pub mod transfer;
pub mod report;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use generate::{generate_for_day, retroactive_entry, set_completed, today_view};
pub use notify::{LogNotifier, NotificationSink, RecordingNotifier};
pub use presets::preset_times;
pub use schedule::{phase_position, resolve_phase};
pub use scheduler::{DueTracker, TickScheduler};
pub use stats::{aggregate, medication_summaries, AdherenceStats, StatsWindow};
pub use status::{classify, minutes_late, ReminderStatus};
pub use store::{JsonFileStore, MedicationStore, MemoryStore};
pub use transfer::{export_to_file, import_from_file};
