use std::path::Path;

use crate::model::TimelineRow;
use crate::settings::DashboardSettings;

/// Write the timeline schedule as delimited CSV to any writer.
///
/// Columns: Project ; Title ; Start ; End ; Duration (days)
/// Duration is the displayed duration, so crossed ranges show as one day.
/// Returns the number of rows written.
pub fn write_schedule<W: std::io::Write>(
    rows: &[TimelineRow],
    settings: &DashboardSettings,
    writer: W,
) -> crate::Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(settings.export_delimiter_byte())
        .from_writer(writer);

    wtr.write_record(["Project", "Title", "Start", "End", "Duration (days)"])?;
    for row in rows {
        let start = settings.format_date(row.range_start)?;
        let end = settings.format_date(row.range_end)?;
        let days = row.display_days().to_string();
        wtr.write_record([
            row.id.as_str(),
            row.title.as_str(),
            start.as_str(),
            end.as_str(),
            days.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(rows.len())
}

/// Export the timeline schedule to a CSV file.
pub fn export_schedule(rows: &[TimelineRow], settings: &DashboardSettings, path: &Path) -> crate::Result<usize> {
    let file = std::fs::File::create(path)?;
    let written = write_schedule(rows, settings, file)?;
    tracing::debug!(path = %path.display(), rows = written, "schedule exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::PortfolioError;

    fn row(id: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> TimelineRow {
        TimelineRow {
            id: id.into(),
            title: format!("{id} title"),
            range_start: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            range_end: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn writes_header_and_rows() {
        let rows = vec![row("PRJ-001", (2024, 8, 1), (2024, 12, 15)), row("PRJ-002", (2024, 9, 10), (2024, 9, 1))];
        let mut out = Vec::new();
        let n = write_schedule(&rows, &DashboardSettings::default(), &mut out).unwrap();
        assert_eq!(n, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Project;Title;Start;End;Duration (days)");
        assert_eq!(lines[1], "PRJ-001;PRJ-001 title;01/08/2024;15/12/2024;136");
        assert_eq!(lines[2], "PRJ-002;PRJ-002 title;10/09/2024;01/09/2024;1");
    }

    #[test]
    fn honours_configured_format() {
        let settings = DashboardSettings {
            date_format: "%Y-%m-%d".into(),
            export_delimiter: ',',
            ..Default::default()
        };
        let mut out = Vec::new();
        write_schedule(&[row("A", (2024, 1, 1), (2024, 1, 3))], &settings, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("A,A title,2024-01-01,2024-01-03,2"));
    }

    #[test]
    fn time_only_format_is_an_error() {
        let settings = DashboardSettings {
            date_format: "%H:%M".into(),
            ..Default::default()
        };
        let mut out = Vec::new();
        let result = write_schedule(&[row("A", (2024, 1, 1), (2024, 1, 3))], &settings, &mut out);
        assert!(matches!(result, Err(PortfolioError::DateFormat(f)) if f == "%H:%M"));
    }
}
