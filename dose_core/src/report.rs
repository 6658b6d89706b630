//! CSV export of the adherence daily breakdown.

use crate::stats::AdherenceStats;
use crate::Result;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    completed: usize,
    total: usize,
    rate: f64,
}

/// Write the daily breakdown of an aggregated window as CSV.
///
/// One row per calendar day in ascending date order. Returns the number of
/// rows written.
pub fn write_daily_breakdown_csv(stats: &AdherenceStats, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;

    for (date, tally) in &stats.daily_breakdown {
        writer.serialize(CsvRow {
            date: date.format("%Y-%m-%d").to_string(),
            completed: tally.completed,
            total: tally.total,
            rate: tally.rate(),
        })?;
    }

    writer.flush()?;
    tracing::info!(
        "Wrote {} breakdown rows to {:?}",
        stats.daily_breakdown.len(),
        path
    );

    Ok(stats.daily_breakdown.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{aggregate, StatsWindow};
    use crate::Reminder;
    use chrono::{Duration, Local};

    #[test]
    fn test_breakdown_csv_has_one_row_per_day() {
        let now = Local::now();
        let reminders: Vec<Reminder> = (0..3)
            .map(|i| Reminder {
                id: format!("r{}", i),
                medication_id: "med".into(),
                scheduled_time: now - Duration::days(i),
                completed: i % 2 == 0,
                completed_at: (i % 2 == 0).then(|| now),
            })
            .collect();

        let stats = aggregate(&reminders, StatsWindow::Week, now);

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("breakdown.csv");
        let rows = write_daily_breakdown_csv(&stats, &path).unwrap();

        assert_eq!(rows, 3);

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("date,completed,total,rate"));
        assert_eq!(lines.count(), 3);
    }

    #[test]
    fn test_empty_breakdown_writes_no_rows() {
        let stats = aggregate(&[], StatsWindow::All, Local::now());

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("empty.csv");
        let rows = write_daily_breakdown_csv(&stats, &path).unwrap();

        assert_eq!(rows, 0);
        assert!(path.exists());
    }
}
