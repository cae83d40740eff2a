use chrono::{DateTime, Utc};

use crate::model::{
    compute_aggregate, compute_project_metrics, validate_records, DragController, Edge,
    PortfolioAggregate, ProjectMetrics, ProjectRecord, RowLayout, TimelineModel, TimelineRow,
};
use crate::settings::DashboardSettings;

/// One interactive session over a fixed set of projects.
///
/// Holds the validated records, the editable timeline and the drag state.
/// Renderers read values from here; the input adapter forwards pointer events.
pub struct Dashboard {
    records: Vec<ProjectRecord>,
    timeline: TimelineModel,
    drag: DragController,
    settings: DashboardSettings,
}

impl Dashboard {
    /// Start a session. Rejects records that break the input contract;
    /// unusable settings fall back to their defaults.
    pub fn new(records: Vec<ProjectRecord>, settings: DashboardSettings) -> crate::Result<Self> {
        validate_records(&records)?;
        let settings = settings.sanitized();
        let timeline = TimelineModel::initialize(&records);
        tracing::debug!(projects = records.len(), "dashboard session started");
        Ok(Self {
            records,
            timeline,
            drag: DragController::new(),
            settings,
        })
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }

    pub fn settings(&self) -> &DashboardSettings {
        &self.settings
    }

    pub fn timeline(&self) -> &TimelineModel {
        &self.timeline
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    /// Indicators for every project, in record order.
    pub fn project_metrics(&self, now: DateTime<Utc>) -> Vec<(&ProjectRecord, ProjectMetrics)> {
        self.records
            .iter()
            .map(|r| (r, compute_project_metrics(r, now)))
            .collect()
    }

    pub fn aggregate(&self, now: DateTime<Utc>) -> PortfolioAggregate {
        compute_aggregate(&self.records, now)
    }

    pub fn timeline_rows(&self) -> &[TimelineRow] {
        self.timeline.rows()
    }

    /// Bar placement for every row against the current bounds.
    pub fn timeline_layouts(&self) -> Vec<(&str, RowLayout)> {
        self.timeline.layouts()
    }

    // ── Pointer input ───────────────────────────────────────────

    /// Pointer pressed on a bar handle (`Start`/`End`) or body (`Both`).
    pub fn pointer_down(&mut self, row_id: &str, edge: Edge, pixel_x: f64) -> bool {
        let width = self.settings.track_width_px;
        self.drag.begin(row_id, edge, pixel_x, width, &self.timeline)
    }

    /// Pointer moved; returns the whole days committed by this event.
    pub fn pointer_move(&mut self, pixel_x: f64) -> i64 {
        self.drag.movement(pixel_x, &mut self.timeline)
    }

    pub fn pointer_up(&mut self) {
        self.drag.end();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Risk;
    use crate::PortfolioError;
    use chrono::{NaiveDate, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn records() -> Vec<ProjectRecord> {
        vec![
            ProjectRecord::new("PRJ-001", 220.0, 186.5, 24.0, date(2024, 8, 1), date(2024, 12, 15))
                .with_percent(80)
                .with_risk(Risk::Amber),
            ProjectRecord::new("PRJ-003", 180.0, 98.75, 18.0, date(2024, 8, 12), date(2024, 11, 30))
                .with_percent(55),
        ]
    }

    #[test]
    fn rejects_invalid_records() {
        let mut bad = records();
        bad[1].id = "PRJ-001".into();
        assert!(matches!(
            Dashboard::new(bad, DashboardSettings::default()),
            Err(PortfolioError::Validation(_))
        ));
    }

    #[test]
    fn drag_does_not_touch_records_or_metrics() {
        let now = Utc.with_ymd_and_hms(2024, 11, 27, 0, 0, 0).unwrap();
        let mut dash = Dashboard::new(records(), DashboardSettings::default()).unwrap();
        let before = dash.aggregate(now);

        // 2024-08-01..=2024-12-15 is 137 days on a 720px track.
        let ppd = 720.0 / 137.0;
        assert!(dash.pointer_down("PRJ-003", Edge::Both, 100.0));
        assert_eq!(dash.pointer_move(100.0 + 10.0 * ppd), 10);
        dash.pointer_up();

        let row = dash.timeline().row("PRJ-003").unwrap();
        assert_eq!(row.range_start, date(2024, 8, 22));
        assert_eq!(row.range_end, date(2024, 12, 10));
        assert_eq!(dash.records()[1].start_date, date(2024, 8, 12));
        assert_eq!(dash.aggregate(now), before);
        assert_eq!(dash.project_metrics(now).len(), 2);
    }

    #[test]
    fn unusable_settings_are_replaced_at_session_start() {
        let settings = DashboardSettings {
            track_width_px: 0.0,
            date_format: "%H:%M".into(),
            export_delimiter: ',',
        };
        let dash = Dashboard::new(records(), settings).unwrap();
        assert_eq!(dash.settings().track_width_px, crate::settings::DEFAULT_TRACK_WIDTH_PX);
        assert_eq!(dash.settings().date_format, "%d/%m/%Y");
        assert_eq!(dash.settings().export_delimiter, ',');

        let mut out = Vec::new();
        let written = crate::io::csv_export::write_schedule(dash.timeline_rows(), dash.settings(), &mut out).unwrap();
        assert_eq!(written, 2);
        assert!(String::from_utf8(out).unwrap().contains("PRJ-001,,01/08/2024,15/12/2024,136"));
    }

    #[test]
    fn layouts_follow_rows() {
        let dash = Dashboard::new(records(), DashboardSettings::default()).unwrap();
        let layouts = dash.timeline_layouts();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[0].0, "PRJ-001");
        assert_eq!(layouts[0].1.left_fraction, 0.0);
    }
}
