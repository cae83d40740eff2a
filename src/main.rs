use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use portfolio_dashboard::io::{self, csv_export};
use portfolio_dashboard::model::Risk;
use portfolio_dashboard::settings::DashboardSettings;
use portfolio_dashboard::Dashboard;

#[derive(Debug, Parser)]
#[command(name = "portfolio-dashboard")]
#[command(about = "Portfolio metrics and timeline report for a JSON or CSV project file")]
#[command(after_help = "Environment:\n  RUST_LOG   Log filter (default: warn)")]
struct Args {
    /// Portfolio JSON (`{ "projects": [...] }`) or records CSV.
    input: PathBuf,
    /// Evaluate projections as of this date (YYYY-MM-DD) instead of now.
    #[arg(long)]
    now: Option<NaiveDate>,
    /// Write the timeline schedule to this CSV file.
    #[arg(long)]
    export: Option<PathBuf>,
    /// Settings file; defaults to the platform config directory.
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Print metrics and layouts as JSON instead of a text report.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let settings_path = args.settings.clone().unwrap_or_else(DashboardSettings::default_path);
    let settings = DashboardSettings::load(&settings_path);

    let records = io::load_records(&args.input)
        .with_context(|| format!("loading {}", args.input.display()))?;
    let dashboard = Dashboard::new(records, settings)?;

    let now: DateTime<Utc> = match args.now {
        Some(d) => d.and_time(NaiveTime::MIN).and_utc(),
        None => Utc::now(),
    };

    if args.json {
        print_json(&dashboard, now)?;
    } else {
        print_report(&dashboard, now);
    }

    if let Some(path) = &args.export {
        let written = csv_export::export_schedule(dashboard.timeline_rows(), dashboard.settings(), path)
            .with_context(|| format!("exporting schedule to {}", path.display()))?;
        eprintln!("Exported {written} rows to {}", path.display());
    }
    Ok(())
}

fn print_json(dashboard: &Dashboard, now: DateTime<Utc>) -> anyhow::Result<()> {
    let projects: Vec<_> = dashboard
        .project_metrics(now)
        .into_iter()
        .map(|(record, metrics)| serde_json::json!({ "id": record.id, "metrics": metrics }))
        .collect();
    let layouts: Vec<_> = dashboard
        .timeline_layouts()
        .into_iter()
        .map(|(id, layout)| serde_json::json!({ "id": id, "layout": layout }))
        .collect();
    let out = serde_json::json!({
        "now": now,
        "projects": projects,
        "aggregate": dashboard.aggregate(now),
        "timeline": layouts,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn print_report(dashboard: &Dashboard, now: DateTime<Utc>) {
    let fmt = dashboard.settings().date_format.as_str();
    let agg = dashboard.aggregate(now);

    println!("Portfolio as of {}", now.format(fmt));
    println!(
        "  {} projects, average {}%, median {}% ({})",
        agg.project_count,
        agg.average_percent,
        agg.median_percent,
        agg.median_phase.name()
    );
    println!(
        "  Hours {:.1} allocated / {:.1} consumed, efficiency {:.0}%",
        agg.total_hours_allocated, agg.total_hours_consumed, agg.portfolio_efficiency_percent
    );
    println!("  On track: {}", agg.on_track_count);
    let risks: Vec<String> = Risk::ALL
        .iter()
        .map(|r| format!("{} {}", r.as_str(), agg.risk_counts.get(*r)))
        .collect();
    println!("  Risk: {}", risks.join(", "));
    let phases: Vec<String> = agg
        .phase_counts
        .iter()
        .map(|p| format!("{} x{}", if p.phase.is_empty() { "-" } else { p.phase.as_str() }, p.count))
        .collect();
    println!("  Phases: {}", phases.join(", "));
    println!();

    for (record, m) in dashboard.project_metrics(now) {
        let projected = m
            .projected_completion
            .map(|d| d.format(fmt).to_string())
            .unwrap_or_else(|| "N/A".into());
        let variance = m
            .schedule_variance_days
            .map(|v| format!("{v}d"))
            .unwrap_or_else(|| "N/A".into());
        println!(
            "{:<10} {:>3}%  remaining {:>7.2}h  eff {:>4.0}%  projected {:<10}  sched {:>6}  budget {:>+7.1}h  {}  milestones {}/{}",
            record.id,
            record.percent_complete,
            m.hours_remaining,
            m.efficiency_percent,
            projected,
            variance,
            m.budget_variance_hours,
            if m.on_track { "on track" } else { "at risk " },
            m.milestones_done,
            m.milestones_total,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_and_flags() {
        let args = Args::try_parse_from([
            "portfolio-dashboard",
            "demos/portfolio.json",
            "--now",
            "2024-11-27",
            "--export",
            "schedule.csv",
            "--json",
        ])
        .expect("parse");
        assert_eq!(args.input, PathBuf::from("demos/portfolio.json"));
        assert_eq!(args.now, NaiveDate::from_ymd_opt(2024, 11, 27));
        assert_eq!(args.export, Some(PathBuf::from("schedule.csv")));
        assert_eq!(args.settings, None);
        assert!(args.json);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Args::try_parse_from(["portfolio-dashboard"]).is_err());
        assert!(Args::try_parse_from(["portfolio-dashboard", "p.json", "--now", "27/11/2024"]).is_err());
        assert!(Args::try_parse_from(["portfolio-dashboard", "p.json", "--verbose"]).is_err());
        assert!(Args::try_parse_from(["portfolio-dashboard", "a.json", "b.json"]).is_err());
    }
}
