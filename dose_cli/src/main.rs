use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dose_core::*;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dosewatch")]
#[command(about = "Medication dose reminder and adherence tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a medication with its treatment phases
    Add {
        /// Medication name
        name: String,

        /// Drops per dose
        #[arg(long, default_value_t = 1)]
        drops: u32,

        /// Date the first phase begins (YYYY-MM-DD, default today)
        #[arg(long)]
        start: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Explicit phase as "HH:MM,HH:MM/DAYS"; repeat for multiple phases
        #[arg(long = "phase")]
        phases: Vec<String>,

        /// Dose cadence for a single preset phase (used when no --phase given)
        #[arg(long, default_value_t = 3)]
        times_per_day: usize,

        /// Duration in days for the preset phase
        #[arg(long, default_value_t = 7)]
        duration: u32,
    },

    /// List medications and their active phase
    List,

    /// Show the reminders for a day with live statuses
    Today {
        /// Day to show (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<String>,
    },

    /// Mark a reminder completed
    Done {
        /// Reminder id (as printed by `today`)
        reminder_id: String,
    },

    /// Mark a reminder incomplete again
    Undo {
        /// Reminder id (as printed by `today`)
        reminder_id: String,
    },

    /// Record a dose taken outside the schedule
    Log {
        /// Medication id (or prefix) or name
        medication: String,

        /// Clock time the dose was taken (HH:MM, default now)
        #[arg(long)]
        time: Option<String>,
    },

    /// Pause or resume a medication
    Toggle {
        /// Medication id (or prefix) or name
        medication: String,
    },

    /// Delete a medication and all its reminders
    Remove {
        /// Medication id (or prefix) or name
        medication: String,
    },

    /// Show adherence statistics
    Stats {
        /// Reporting window (week, month, all)
        #[arg(long, default_value = "week")]
        window: String,

        /// Also write the daily breakdown to a CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Watch for due reminders and notify on the minute
    Watch,

    /// Export the medication collection to a JSON file
    Export {
        /// Destination path
        path: PathBuf,
    },

    /// Replace the medication collection from a JSON file
    Import {
        /// Source path
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    dose_core::logging::init();

    let cli = Cli::parse();

    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let store = JsonFileStore::new(&data_dir);

    match cli.command {
        Commands::Add {
            name,
            drops,
            start,
            notes,
            phases,
            times_per_day,
            duration,
        } => cmd_add(&store, &name, drops, start, notes, phases, times_per_day, duration),
        Commands::List => cmd_list(&store),
        Commands::Today { date } => cmd_today(&store, date),
        Commands::Done { reminder_id } => cmd_set_completed(&store, &reminder_id, true),
        Commands::Undo { reminder_id } => cmd_set_completed(&store, &reminder_id, false),
        Commands::Log { medication, time } => cmd_log(&store, &medication, time),
        Commands::Toggle { medication } => cmd_toggle(&store, &medication),
        Commands::Remove { medication } => cmd_remove(&store, &medication),
        Commands::Stats { window, csv } => cmd_stats(&store, &window, csv, &config),
        Commands::Watch => cmd_watch(store, &config),
        Commands::Export { path } => cmd_export(&store, &path),
        Commands::Import { path } => cmd_import(&store, &path),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| Error::Validation(format!("invalid date {:?}: {}", s, e)))
}

/// Parse a phase spec of the form "08:00,14:00,20:00/7"
fn parse_phase_spec(spec: &str) -> Result<MedicationSchedule> {
    let (times_part, duration_part) = spec.split_once('/').ok_or_else(|| {
        Error::Validation(format!(
            "phase {:?} must look like HH:MM,HH:MM/DAYS",
            spec
        ))
    })?;

    let times: Vec<String> = times_part
        .split(',')
        .map(|t| t.trim().to_string())
        .collect();

    let duration: u32 = duration_part.trim().parse().map_err(|_| {
        Error::Validation(format!("invalid phase duration {:?}", duration_part.trim()))
    })?;

    MedicationSchedule::new(times.len(), times, duration)
}

/// Resolve a medication by id, unique id prefix, or name
fn find_medication<'a>(medications: &'a [Medication], needle: &str) -> Result<&'a Medication> {
    let matches: Vec<&Medication> = medications
        .iter()
        .filter(|m| {
            m.id == needle || m.id.starts_with(needle) || m.name.eq_ignore_ascii_case(needle)
        })
        .collect();

    match matches.len() {
        1 => Ok(matches[0]),
        0 => Err(Error::Other(format!("no medication matches {:?}", needle))),
        _ => Err(Error::Other(format!(
            "{:?} matches more than one medication, use the id",
            needle
        ))),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_add(
    store: &JsonFileStore,
    name: &str,
    drops: u32,
    start: Option<String>,
    notes: Option<String>,
    phases: Vec<String>,
    times_per_day: usize,
    duration: u32,
) -> Result<()> {
    let now = Local::now();
    let start_date = match start {
        Some(s) => parse_date(&s)?,
        None => now.date_naive(),
    };

    let schedules = if phases.is_empty() {
        vec![MedicationSchedule::with_preset(times_per_day, duration)?]
    } else {
        phases
            .iter()
            .map(|spec| parse_phase_spec(spec))
            .collect::<Result<Vec<_>>>()?
    };

    let medication = Medication::new(name, drops, schedules, start_date, notes, now)?;

    let mut medications = store.load_medications()?;
    medications.push(medication.clone());
    store.save_medications(&medications)?;

    println!("✓ Added {}", medication.name);
    println!("  ID: {}", medication.id);
    for (index, phase) in medication.schedules.iter().enumerate() {
        println!(
            "  Phase {}: {}x/day at {} for {} day(s)",
            index + 1,
            phase.times_per_day,
            phase.times.join(", "),
            phase.duration
        );
    }

    Ok(())
}

fn cmd_list(store: &JsonFileStore) -> Result<()> {
    let medications = store.load_medications()?;
    if medications.is_empty() {
        println!("No medications yet. Add one with `dosewatch add`.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    for medication in &medications {
        let marker = if medication.is_active { "●" } else { "○" };
        println!("{} {}  [{}]", marker, medication.name, medication.id);
        println!(
            "    {} drop(s) per dose, started {}",
            medication.drops_per_dose, medication.start_date
        );

        match (
            resolve_phase(medication, today),
            phase_position(medication, today),
        ) {
            (Some(phase), Some((position, count))) => {
                println!(
                    "    Phase {} of {}: {}x/day at {}",
                    position,
                    count,
                    phase.times_per_day,
                    phase.times.join(", ")
                );
            }
            _ => {
                println!("    Treatment completed");
            }
        }

        if let Some(ref notes) = medication.notes {
            println!("    Notes: {}", notes);
        }
    }

    Ok(())
}

fn cmd_today(store: &JsonFileStore, date: Option<String>) -> Result<()> {
    let now = Local::now();
    let date = match date {
        Some(s) => parse_date(&s)?,
        None => now.date_naive(),
    };

    let medications = store.load_medications()?;
    let reminders = store.load_reminders()?;
    let view = today_view(&medications, &reminders, date);

    if view.is_empty() {
        println!("No reminders for {}", date);
        return Ok(());
    }

    println!("Reminders for {}", date);
    println!();

    let mut completed = 0;
    for reminder in &view {
        let status = classify(reminder, now);
        if reminder.completed {
            completed += 1;
        }

        let name = medications
            .iter()
            .find(|m| m.id == reminder.medication_id)
            .map(|m| m.name.as_str())
            .unwrap_or("(unknown)");

        let mut line = format!(
            "  {}  {:9}  {}",
            reminder.scheduled_time.format("%H:%M"),
            status.label(),
            name
        );
        if status == ReminderStatus::Overdue {
            line.push_str(&format!("  ({} min late)", minutes_late(reminder, now)));
        }
        if reminder.is_retroactive() {
            line.push_str("  (logged)");
        }
        println!("{}", line);
        println!("      id: {}", reminder.id);
    }

    println!();
    println!("Completed: {}/{}", completed, view.len());

    Ok(())
}

fn cmd_set_completed(store: &JsonFileStore, reminder_id: &str, completed: bool) -> Result<()> {
    let now = Local::now();
    let medications = store.load_medications()?;
    let reminders = store.load_reminders()?;

    // The target is usually a freshly generated slot from today's view;
    // fall back to any persisted record (older days, retroactive entries).
    let view = today_view(&medications, &reminders, now.date_naive());
    let target = view
        .iter()
        .find(|r| r.id == reminder_id)
        .or_else(|| reminders.iter().find(|r| r.id == reminder_id))
        .cloned()
        .ok_or_else(|| Error::Other(format!("no reminder with id {:?}", reminder_id)))?;

    let updated = set_completed(&reminders, &target, completed, now);
    store.save_reminders(&updated)?;

    if completed {
        println!("✓ Marked complete at {}", now.format("%H:%M"));
    } else {
        println!("✓ Marked incomplete");
    }

    Ok(())
}

fn cmd_log(store: &JsonFileStore, medication: &str, time: Option<String>) -> Result<()> {
    let now = Local::now();
    let medications = store.load_medications()?;
    let medication = find_medication(&medications, medication)?;

    let scheduled_time = match time {
        Some(t) => generate::at_local(now.date_naive(), types::parse_clock_time(&t)?),
        None => now,
    };

    let entry = retroactive_entry(medication, scheduled_time, now);

    let mut reminders = store.load_reminders()?;
    reminders.push(entry.clone());
    store.save_reminders(&reminders)?;

    println!(
        "✓ Logged dose of {} at {}",
        medication.name,
        entry.scheduled_time.format("%H:%M")
    );

    Ok(())
}

fn cmd_toggle(store: &JsonFileStore, needle: &str) -> Result<()> {
    let medications = store.load_medications()?;
    let target_id = find_medication(&medications, needle)?.id.clone();

    let updated: Vec<Medication> = medications
        .into_iter()
        .map(|mut m| {
            if m.id == target_id {
                m.is_active = !m.is_active;
            }
            m
        })
        .collect();
    store.save_medications(&updated)?;

    let medication = updated
        .iter()
        .find(|m| m.id == target_id)
        .ok_or_else(|| Error::Other("medication vanished during toggle".into()))?;
    if medication.is_active {
        println!("✓ {} is now active", medication.name);
    } else {
        println!("✓ {} is now paused", medication.name);
    }

    Ok(())
}

fn cmd_remove(store: &JsonFileStore, needle: &str) -> Result<()> {
    let medications = store.load_medications()?;
    let target = find_medication(&medications, needle)?.clone();

    // Deleting a medication cascades to its reminders; the store holds two
    // independent collections, so the cascade happens here.
    let kept_medications: Vec<Medication> = medications
        .into_iter()
        .filter(|m| m.id != target.id)
        .collect();
    let kept_reminders: Vec<Reminder> = store
        .load_reminders()?
        .into_iter()
        .filter(|r| r.medication_id != target.id)
        .collect();

    store.save_medications(&kept_medications)?;
    store.save_reminders(&kept_reminders)?;

    println!("✓ Removed {} and its reminders", target.name);
    Ok(())
}

fn cmd_stats(
    store: &JsonFileStore,
    window: &str,
    csv: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    let parsed_window = match window.to_lowercase().as_str() {
        "week" => StatsWindow::Week,
        "month" => StatsWindow::Month,
        "all" => StatsWindow::All,
        other => {
            eprintln!("Unknown window: {}. Using week.", other);
            StatsWindow::Week
        }
    };

    let now = Local::now();
    let medications = store.load_medications()?;
    let reminders = store.load_reminders()?;
    let stats = aggregate(&reminders, parsed_window, now);

    println!("Adherence ({})", parsed_window.label());
    println!(
        "  Doses: {}/{}",
        stats.completed_reminders, stats.total_reminders
    );
    println!("  Rate: {:.0}%", stats.adherence_rate);
    println!("  Streak: {} day(s)", stats.streak_days);

    if !stats.daily_breakdown.is_empty() {
        println!();
        println!("Daily breakdown");
        let skip = stats
            .daily_breakdown
            .len()
            .saturating_sub(config.stats.chart_days);
        for (date, tally) in stats.daily_breakdown.iter().skip(skip) {
            let bar = "#".repeat((tally.rate() / 10.0).round() as usize);
            println!(
                "  {}  {}/{}  {:<10}  {:.0}%",
                date, tally.completed, tally.total, bar, tally.rate()
            );
        }
    }

    let summaries = medication_summaries(&medications, &reminders);
    if !summaries.is_empty() {
        println!();
        println!("Per medication (all time)");
        for summary in summaries {
            let marker = if summary.is_active { "●" } else { "○" };
            println!(
                "  {} {}  {}/{} doses, {:.0}%",
                marker,
                summary.name,
                summary.completed_reminders,
                summary.total_reminders,
                summary.adherence_rate
            );
        }
    }

    if let Some(path) = csv {
        let rows = report::write_daily_breakdown_csv(&stats, &path)?;
        println!();
        println!("✓ Wrote {} breakdown rows to {}", rows, path.display());
    }

    Ok(())
}

fn cmd_watch(store: JsonFileStore, config: &Config) -> Result<()> {
    let notifier = ConsoleNotifier {
        alarm: config.notifications.alarm,
    };

    if !config.notifications.enabled {
        println!("Notifications are disabled in the config; watching silently.");
    }
    if !notifier.request_permission() {
        eprintln!("Notification permission not granted");
    }

    let mut scheduler = TickScheduler::new();
    scheduler.restart(Arc::new(store), Arc::new(notifier));

    println!("Watching for due reminders (checks on the minute). Ctrl+C to stop.");
    loop {
        std::thread::park();
    }
}

fn cmd_export(store: &JsonFileStore, path: &std::path::Path) -> Result<()> {
    let medications = store.load_medications()?;
    export_to_file(&medications, path)?;

    println!(
        "✓ Exported {} medication(s) to {}",
        medications.len(),
        path.display()
    );
    Ok(())
}

fn cmd_import(store: &JsonFileStore, path: &std::path::Path) -> Result<()> {
    let imported = import_from_file(path)?;

    // The import replaces the whole collection; reminders whose medication
    // no longer exists are pruned to keep the two files consistent.
    let kept_reminders: Vec<Reminder> = store
        .load_reminders()?
        .into_iter()
        .filter(|r| imported.iter().any(|m| m.id == r.medication_id))
        .collect();

    store.save_medications(&imported)?;
    store.save_reminders(&kept_reminders)?;

    println!("✓ Imported {} medication(s)", imported.len());
    Ok(())
}

/// Terminal notification sink used by `watch`
struct ConsoleNotifier {
    alarm: bool,
}

impl NotificationSink for ConsoleNotifier {
    fn request_permission(&self) -> bool {
        // A terminal needs no permission prompt.
        true
    }

    fn deliver(&self, title: &str, body: &str) {
        println!();
        println!("⏰ {}: {}", title, body);
    }

    fn present_blocking_alert(&self, message: &str, on_dismiss: notify::DismissFn) {
        if self.alarm {
            // BEL nudges terminals that support it.
            println!("\x07  {}", message);
        }
        on_dismiss();
    }
}
