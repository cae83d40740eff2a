use chrono::NaiveDate;
use serde::Serialize;

use super::project::ProjectRecord;

/// Signed whole days from `a` to `b`.
pub fn days_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b - a).num_days()
}

/// Shift a date by a signed number of days, saturating at the calendar limits.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let shifted = chrono::Duration::try_days(days).and_then(|d| date.checked_add_signed(d));
    match shifted {
        Some(d) => d,
        None if days < 0 => NaiveDate::MIN,
        None => NaiveDate::MAX,
    }
}

/// Inclusive day count of the timeline, never less than one.
pub fn total_span_days(min_date: NaiveDate, max_date: NaiveDate) -> i64 {
    (days_between(min_date, max_date) + 1).max(1)
}

/// Which part of a bar a gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Edge {
    /// The left handle.
    Start,
    /// The right handle.
    End,
    /// The bar body; moves the whole range.
    Both,
}

/// The editable date range of one project bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineRow {
    pub id: String,
    pub title: String,
    pub range_start: NaiveDate,
    /// May precede `range_start` after a drag; see [`layout`].
    pub range_end: NaiveDate,
}

impl TimelineRow {
    pub fn from_record(record: &ProjectRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            range_start: record.start_date,
            range_end: record.target_date,
        }
    }

    /// Displayed duration in days, clamped to at least one.
    pub fn display_days(&self) -> i64 {
        days_between(self.range_start, self.range_end).max(1)
    }
}

/// Horizontal placement of a bar as fractions of the track width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RowLayout {
    pub left_fraction: f64,
    pub width_fraction: f64,
}

impl RowLayout {
    /// Convert to `(x, width)` in pixels for a track of the given width.
    pub fn to_pixels(self, track_width: f64) -> (f64, f64) {
        (self.left_fraction * track_width, self.width_fraction * track_width)
    }
}

/// Place `row` on a timeline starting at `min_date` and spanning `total_span_days`.
///
/// Crossed ranges are shown one day wide; the stored dates are left alone.
pub fn layout(row: &TimelineRow, min_date: NaiveDate, total_span_days: i64) -> RowLayout {
    let span = total_span_days.max(1) as f64;
    RowLayout {
        left_fraction: days_between(min_date, row.range_start) as f64 / span,
        width_fraction: row.display_days() as f64 / span,
    }
}

/// Authoritative per-project date ranges for one session.
#[derive(Debug, Clone, Default)]
pub struct TimelineModel {
    rows: Vec<TimelineRow>,
}

impl TimelineModel {
    /// One row per record, spanning its start to target date.
    pub fn initialize(records: &[ProjectRecord]) -> Self {
        Self {
            rows: records.iter().map(TimelineRow::from_record).collect(),
        }
    }

    pub fn rows(&self) -> &[TimelineRow] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&TimelineRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest start and latest end across all rows, recomputed each call.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.rows.iter().map(|r| r.range_start).min()?;
        let max = self.rows.iter().map(|r| r.range_end).max()?;
        Some((min, max))
    }

    /// Span of the current bounds; one for an empty model.
    pub fn span_days(&self) -> i64 {
        self.bounds()
            .map(|(min, max)| total_span_days(min, max))
            .unwrap_or(1)
    }

    /// Layout of every row against the current bounds, in row order.
    pub fn layouts(&self) -> Vec<(&str, RowLayout)> {
        let Some((min, max)) = self.bounds() else {
            return Vec::new();
        };
        let span = total_span_days(min, max);
        self.rows
            .iter()
            .map(|r| (r.id.as_str(), layout(r, min, span)))
            .collect()
    }

    /// Move one or both endpoints of `row_id` by `delta_days`.
    ///
    /// `Start`/`End` move independently and may cross; `Both` keeps the
    /// duration. Returns false when no row has that id.
    pub fn shift_range(&mut self, row_id: &str, delta_days: i64, edge: Edge) -> bool {
        let Some(row) = self.rows.iter_mut().find(|r| r.id == row_id) else {
            return false;
        };
        match edge {
            Edge::Start => row.range_start = add_days(row.range_start, delta_days),
            Edge::End => row.range_end = add_days(row.range_end, delta_days),
            Edge::Both => {
                // Clamp so neither endpoint saturates and the duration holds.
                let (lo, hi) = (row.range_start.min(row.range_end), row.range_start.max(row.range_end));
                let delta = delta_days.clamp(days_between(lo, NaiveDate::MIN), days_between(hi, NaiveDate::MAX));
                row.range_start = add_days(row.range_start, delta);
                row.range_end = add_days(row.range_end, delta);
            }
        }
        true
    }
}
