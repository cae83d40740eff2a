//! Per-project health indicators and portfolio rollups.
//!
//! Everything here is a pure function of the input records and an injected
//! `now`; results are recomputed on demand and never cached.
//!
//! | Indicator | Definition |
//! |-----------|-----------|
//! | Hours remaining | max(0, allocated - consumed) |
//! | Efficiency | allocated / consumed * 100, or 100 with nothing consumed |
//! | Projected completion | now + remaining / burn rate weeks, none at zero burn |
//! | Schedule variance | projected - target, in whole days |
//! | Budget variance | consumed - allocated, positive is over budget |

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;

use super::project::{ProjectRecord, Risk};

const MS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;
const MS_PER_WEEK: f64 = 7.0 * MS_PER_DAY;

/// Derived indicators for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMetrics {
    pub hours_remaining: f64,
    pub efficiency_percent: f64,
    /// `None` when the burn rate is zero.
    pub projected_completion: Option<DateTime<Utc>>,
    /// Negative or zero means on or ahead of schedule.
    pub schedule_variance_days: Option<i64>,
    pub budget_variance_hours: f64,
    pub on_track: bool,
    /// Card ETA in weeks; divides by at least one hour per week.
    pub weeks_to_complete: f64,
    pub milestones_done: usize,
    pub milestones_total: usize,
}

/// Coarse progress band the portfolio median falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PhaseBand {
    Inception,
    Planning,
    Design,
    Development,
    Testing,
    Deployment,
    Complete,
}

impl PhaseBand {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0..=5 => PhaseBand::Inception,
            6..=20 => PhaseBand::Planning,
            21..=40 => PhaseBand::Design,
            41..=70 => PhaseBand::Development,
            71..=85 => PhaseBand::Testing,
            86..=95 => PhaseBand::Deployment,
            _ => PhaseBand::Complete,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PhaseBand::Inception => "Inception",
            PhaseBand::Planning => "Planning",
            PhaseBand::Design => "Design",
            PhaseBand::Development => "Development",
            PhaseBand::Testing => "Testing",
            PhaseBand::Deployment => "Deployment",
            PhaseBand::Complete => "Complete",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub green: usize,
    pub amber: usize,
    pub red: usize,
}

impl RiskCounts {
    pub fn get(&self, risk: Risk) -> usize {
        match risk {
            Risk::Green => self.green,
            Risk::Amber => self.amber,
            Risk::Red => self.red,
        }
    }

    fn bump(&mut self, risk: Risk) {
        match risk {
            Risk::Green => self.green += 1,
            Risk::Amber => self.amber += 1,
            Risk::Red => self.red += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseCount {
    pub phase: String,
    pub count: usize,
}

/// Rollup over the whole record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioAggregate {
    pub project_count: usize,
    pub average_percent: u8,
    pub median_percent: u8,
    pub risk_counts: RiskCounts,
    /// In order of first appearance.
    pub phase_counts: Vec<PhaseCount>,
    pub total_hours_allocated: f64,
    pub total_hours_consumed: f64,
    pub portfolio_efficiency_percent: f64,
    pub on_track_count: usize,
    /// Missing estimates count as zero days.
    pub average_eta_days: u32,
    pub median_phase: PhaseBand,
}

impl PortfolioAggregate {
    /// The value shown when there is nothing to aggregate.
    pub fn empty() -> Self {
        Self {
            project_count: 0,
            average_percent: 0,
            median_percent: 0,
            risk_counts: RiskCounts::default(),
            phase_counts: Vec::new(),
            total_hours_allocated: 0.0,
            total_hours_consumed: 0.0,
            portfolio_efficiency_percent: 0.0,
            on_track_count: 0,
            average_eta_days: 0,
            median_phase: PhaseBand::Inception,
        }
    }
}

/// Round half toward positive infinity.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// Midnight UTC at the start of the record's target date.
fn target_instant(record: &ProjectRecord) -> DateTime<Utc> {
    record.target_date.and_time(NaiveTime::MIN).and_utc()
}

fn project_completion(now: DateTime<Utc>, hours_remaining: f64, burn_rate: f64) -> Option<DateTime<Utc>> {
    if burn_rate > 0.0 {
        let ms = (hours_remaining * MS_PER_WEEK / burn_rate).round();
        // Out-of-calendar projections are reported as no projection.
        if !ms.is_finite() || ms >= i64::MAX as f64 {
            return None;
        }
        now.checked_add_signed(Duration::try_milliseconds(ms as i64)?)
    } else {
        None
    }
}

/// Compute the indicators for one project as of `now`. Total over well-formed input.
pub fn compute_project_metrics(record: &ProjectRecord, now: DateTime<Utc>) -> ProjectMetrics {
    let hours_remaining = (record.hours_allocated - record.hours_consumed).max(0.0);
    let efficiency_percent = if record.hours_consumed > 0.0 {
        record.hours_allocated / record.hours_consumed * 100.0
    } else {
        100.0
    };

    let projected_completion = project_completion(now, hours_remaining, record.burn_rate_per_week);
    let target = target_instant(record);
    let schedule_variance_days = projected_completion.map(|projected| {
        let days = (projected - target).num_milliseconds() as f64 / MS_PER_DAY;
        round_half_up(days) as i64
    });
    let on_track = projected_completion.is_some_and(|projected| projected <= target);

    let weeks_to_complete = if hours_remaining > 0.0 {
        hours_remaining / record.burn_rate_per_week.max(1.0)
    } else {
        0.0
    };

    ProjectMetrics {
        hours_remaining,
        efficiency_percent,
        projected_completion,
        schedule_variance_days,
        budget_variance_hours: record.hours_consumed - record.hours_allocated,
        on_track,
        weeks_to_complete,
        milestones_done: record.milestones_done(),
        milestones_total: record.milestones.len(),
    }
}

/// Median of integer percentages; the even case averages the two middle values and rounds.
pub fn median_percent(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        let pair = f64::from(sorted[mid - 1]) + f64::from(sorted[mid]);
        round_half_up(pair / 2.0) as u8
    }
}

/// Roll up the whole portfolio as of `now`. An empty slice gives [`PortfolioAggregate::empty`].
pub fn compute_aggregate(records: &[ProjectRecord], now: DateTime<Utc>) -> PortfolioAggregate {
    if records.is_empty() {
        return PortfolioAggregate::empty();
    }
    let count = records.len() as f64;

    let percents: Vec<u8> = records.iter().map(|r| r.percent_complete).collect();
    let percent_sum: u32 = percents.iter().map(|&p| u32::from(p)).sum();
    let average_percent = round_half_up(f64::from(percent_sum) / count) as u8;
    let median = median_percent(&percents);

    let mut risk_counts = RiskCounts::default();
    let mut phase_counts: Vec<PhaseCount> = Vec::new();
    let mut total_hours_allocated = 0.0;
    let mut total_hours_consumed = 0.0;
    let mut on_track_count = 0;
    let mut eta_sum: u64 = 0;

    for record in records {
        risk_counts.bump(record.risk);
        match phase_counts.iter_mut().find(|p| p.phase == record.phase) {
            Some(entry) => entry.count += 1,
            None => phase_counts.push(PhaseCount {
                phase: record.phase.clone(),
                count: 1,
            }),
        }
        total_hours_allocated += record.hours_allocated;
        total_hours_consumed += record.hours_consumed;
        if compute_project_metrics(record, now).on_track {
            on_track_count += 1;
        }
        eta_sum += u64::from(record.eta_days.unwrap_or(0));
    }

    PortfolioAggregate {
        project_count: records.len(),
        average_percent,
        median_percent: median,
        risk_counts,
        phase_counts,
        total_hours_allocated,
        total_hours_consumed,
        portfolio_efficiency_percent: total_hours_allocated / f64::max(1.0, total_hours_consumed) * 100.0,
        on_track_count,
        average_eta_days: round_half_up(eta_sum as f64 / count) as u32,
        median_phase: PhaseBand::from_percent(median),
    }
}
