use tracing::{debug, trace};

use super::timeline::{Edge, TimelineModel};

/// An in-progress pointer gesture on one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub row_id: String,
    pub edge: Edge,
    /// Pointer x at the last committed step.
    pub anchor_x: f64,
    /// Fixed for the whole gesture, even if the drag rescales the timeline.
    pub pixels_per_day: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Turns pointer movement into whole-day shifts on the timeline.
///
/// Each step commits immediately; releasing the pointer never rolls back.
/// Events arriving while idle are dropped.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Start a gesture on `row_id` at `pixel_x`, on a track `track_width_px` wide.
    ///
    /// Replaces any gesture already running. Stays idle (and returns false) for
    /// an unknown row or an unusable track width.
    pub fn begin(
        &mut self,
        row_id: &str,
        edge: Edge,
        pixel_x: f64,
        track_width_px: f64,
        timeline: &TimelineModel,
    ) -> bool {
        if timeline.row(row_id).is_none() || !track_width_px.is_finite() || track_width_px <= 0.0 {
            trace!(row_id, track_width_px, "ignoring gesture start");
            self.state = DragState::Idle;
            return false;
        }
        let pixels_per_day = track_width_px / timeline.span_days() as f64;
        debug!(row_id, ?edge, pixel_x, pixels_per_day, "drag started");
        self.state = DragState::Dragging(DragSession {
            row_id: row_id.to_string(),
            edge,
            anchor_x: pixel_x,
            pixels_per_day,
        });
        true
    }

    /// Apply pointer movement to `pixel_x`. Returns the day delta committed, if any.
    pub fn movement(&mut self, pixel_x: f64, timeline: &mut TimelineModel) -> i64 {
        let DragState::Dragging(session) = &mut self.state else {
            trace!(pixel_x, "movement while idle");
            return 0;
        };
        let delta_days = pixel_delta_to_days(pixel_x - session.anchor_x, session.pixels_per_day);
        if delta_days != 0 {
            timeline.shift_range(&session.row_id, delta_days, session.edge);
            // Re-anchor so leftover sub-day motion is not counted twice.
            session.anchor_x = pixel_x;
        }
        delta_days
    }

    /// Finish the gesture. Committed steps stay.
    pub fn end(&mut self) {
        if let DragState::Dragging(session) = std::mem::take(&mut self.state) {
            debug!(row_id = %session.row_id, "drag finished");
        }
    }
}

/// Nearest whole day, halves rounding toward positive infinity.
fn pixel_delta_to_days(delta_px: f64, pixels_per_day: f64) -> i64 {
    let days = (delta_px / pixels_per_day + 0.5).floor();
    if days.is_finite() {
        days as i64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProjectRecord;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Two rows spanning 2024-01-01..=2024-01-20: 20 days, so a 200px track is 10px/day.
    fn timeline() -> TimelineModel {
        TimelineModel::initialize(&[
            ProjectRecord::new("A", 10.0, 0.0, 1.0, date(2024, 1, 1), date(2024, 1, 10)),
            ProjectRecord::new("B", 10.0, 0.0, 1.0, date(2024, 1, 5), date(2024, 1, 20)),
        ])
    }

    #[test]
    fn end_edge_drag_commits_to_end_only() {
        let mut tl = timeline();
        let mut drag = DragController::new();
        assert!(drag.begin("A", Edge::End, 100.0, 200.0, &tl));
        assert_eq!(drag.movement(130.0, &mut tl), 3);
        drag.end();

        let a = tl.row("A").unwrap();
        assert_eq!(a.range_start, date(2024, 1, 1));
        assert_eq!(a.range_end, date(2024, 1, 13));
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn small_moves_accumulate_until_half_a_day() {
        let mut tl = timeline();
        let mut drag = DragController::new();
        drag.begin("B", Edge::Both, 50.0, 200.0, &tl);

        assert_eq!(drag.movement(52.0, &mut tl), 0);
        assert_eq!(drag.movement(54.0, &mut tl), 0);
        assert_eq!(drag.movement(55.0, &mut tl), 1);
        assert_eq!(tl.row("B").unwrap().range_start, date(2024, 1, 6));

        // Anchor moved to 55; going back to 50 is half a day left, which rounds to zero.
        assert_eq!(drag.movement(50.0, &mut tl), 0);
        assert_eq!(drag.movement(44.0, &mut tl), -1);
        let b = tl.row("B").unwrap();
        assert_eq!((b.range_start, b.range_end), (date(2024, 1, 5), date(2024, 1, 20)));
    }

    #[test]
    fn conversion_factor_survives_rescale() {
        let mut tl = timeline();
        let mut drag = DragController::new();
        drag.begin("B", Edge::End, 200.0, 200.0, &tl);
        assert_eq!(drag.movement(300.0, &mut tl), 10);
        // The span grew to 30 days, but the gesture keeps 10px/day.
        assert_eq!(tl.span_days(), 30);
        assert_eq!(drag.movement(320.0, &mut tl), 2);
        assert_eq!(tl.row("B").unwrap().range_end, date(2024, 2, 1));
        match drag.state() {
            DragState::Dragging(s) => assert_eq!(s.pixels_per_day, 10.0),
            DragState::Idle => panic!("gesture ended early"),
        }
    }

    #[test]
    fn movement_while_idle_is_ignored() {
        let mut tl = timeline();
        let before = tl.rows().to_vec();
        let mut drag = DragController::new();
        assert_eq!(drag.movement(500.0, &mut tl), 0);
        drag.begin("A", Edge::Start, 0.0, 200.0, &tl);
        drag.end();
        drag.end();
        assert_eq!(drag.movement(90.0, &mut tl), 0);
        assert_eq!(tl.rows(), before.as_slice());
    }

    #[test]
    fn bad_gesture_starts_stay_idle() {
        let tl = timeline();
        let mut drag = DragController::new();
        assert!(!drag.begin("missing", Edge::Both, 0.0, 200.0, &tl));
        assert!(!drag.begin("A", Edge::Both, 0.0, 0.0, &tl));
        assert!(!drag.begin("A", Edge::Both, 0.0, f64::NAN, &tl));
        assert!(!drag.is_dragging());
    }

    #[test]
    fn new_gesture_replaces_running_one() {
        let mut tl = timeline();
        let mut drag = DragController::new();
        drag.begin("A", Edge::Start, 0.0, 200.0, &tl);
        drag.begin("B", Edge::Start, 100.0, 200.0, &tl);
        drag.movement(80.0, &mut tl);
        assert_eq!(tl.row("A").unwrap().range_start, date(2024, 1, 1));
        assert_eq!(tl.row("B").unwrap().range_start, date(2024, 1, 3));
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(pixel_delta_to_days(15.0, 10.0), 2);
        assert_eq!(pixel_delta_to_days(-15.0, 10.0), -1);
        assert_eq!(pixel_delta_to_days(-16.0, 10.0), -2);
        assert_eq!(pixel_delta_to_days(f64::NAN, 10.0), 0);
    }
}
