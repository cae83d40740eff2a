use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationErrors;

/// RAG status reported for a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Risk {
    Green,
    Amber,
    Red,
}

impl Risk {
    pub const ALL: [Risk; 3] = [Risk::Green, Risk::Amber, Risk::Red];

    pub fn as_str(self) -> &'static str {
        match self {
            Risk::Green => "Green",
            Risk::Amber => "Amber",
            Risk::Red => "Red",
        }
    }

    /// Lenient parse used by the CSV importer.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "green" | "g" | "low" => Some(Risk::Green),
            "amber" | "a" | "yellow" | "medium" => Some(Risk::Amber),
            "red" | "r" | "high" => Some(Risk::Red),
            _ => None,
        }
    }
}

/// A named checkpoint inside a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// A directed link between two components of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyLink {
    pub from: String,
    pub to: String,
}

/// The component dependency graph shown on a project card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub links: Vec<DependencyLink>,
}

impl DependencyGraph {
    /// Links with `node` at either end.
    pub fn links_touching<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a DependencyLink> {
        self.links
            .iter()
            .filter(move |l| l.from == node || l.to == node)
    }

    /// Nodes directly linked to `node`, in declaration order, without duplicates.
    pub fn neighbors(&self, node: &str) -> Vec<&str> {
        let linked: HashSet<&str> = self
            .links_touching(node)
            .map(|l| if l.from == node { l.to.as_str() } else { l.from.as_str() })
            .collect();
        self.nodes
            .iter()
            .map(String::as_str)
            .filter(|n| *n != node && linked.contains(n))
            .collect()
    }
}

/// One project as supplied by the loading collaborator. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub client: String,
    /// Free-text phase label; only tallied, never interpreted.
    #[serde(default)]
    pub phase: String,
    pub hours_allocated: f64,
    #[serde(alias = "timeInvestedHours")]
    pub hours_consumed: f64,
    /// Hours per week. Zero means no projection.
    pub burn_rate_per_week: f64,
    /// Externally estimated completion, 0..=100.
    #[serde(alias = "percent")]
    pub percent_complete: u8,
    pub start_date: NaiveDate,
    /// May precede `start_date`.
    pub target_date: NaiveDate,
    pub risk: Risk,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub dependencies: DependencyGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_days: Option<u32>,
}

impl ProjectRecord {
    /// Create a record with the scheduling fields set and everything else empty.
    pub fn new(
        id: impl Into<String>,
        hours_allocated: f64,
        hours_consumed: f64,
        burn_rate_per_week: f64,
        start_date: NaiveDate,
        target_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            client: String::new(),
            phase: String::new(),
            hours_allocated,
            hours_consumed,
            burn_rate_per_week,
            percent_complete: 0,
            start_date,
            target_date,
            risk: Risk::Green,
            milestones: Vec::new(),
            dependencies: DependencyGraph::default(),
            eta_days: None,
        }
    }

    pub fn with_percent(mut self, percent: u8) -> Self {
        self.percent_complete = percent;
        self
    }

    pub fn with_risk(mut self, risk: Risk) -> Self {
        self.risk = risk;
        self
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = phase.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Number of milestones marked done.
    pub fn milestones_done(&self) -> usize {
        self.milestones.iter().filter(|m| m.done).count()
    }
}

fn check_hours(errors: &mut ValidationErrors, id: &str, field: &'static str, value: f64) {
    if !value.is_finite() {
        errors.add(id, field, "must be a finite number");
    } else if value < 0.0 {
        errors.add(id, field, format!("must not be negative (got {value})"));
    }
}

/// Check the input contract over a whole record set.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_records(records: &[ProjectRecord]) -> crate::Result<()> {
    let mut errors = ValidationErrors::new();
    let mut seen = HashSet::new();

    for (i, r) in records.iter().enumerate() {
        let id = if r.id.trim().is_empty() {
            errors.add(format!("#{i}"), "id", "must not be empty");
            format!("#{i}")
        } else {
            if !seen.insert(r.id.as_str()) {
                errors.add(r.id.as_str(), "id", "duplicate project id");
            }
            r.id.clone()
        };

        check_hours(&mut errors, &id, "hoursAllocated", r.hours_allocated);
        check_hours(&mut errors, &id, "hoursConsumed", r.hours_consumed);
        check_hours(&mut errors, &id, "burnRatePerWeek", r.burn_rate_per_week);

        if r.percent_complete > 100 {
            errors.add(
                id.as_str(),
                "percentComplete",
                format!("must be within 0..=100 (got {})", r.percent_complete),
            );
        }

        let mut nodes = HashSet::new();
        for node in &r.dependencies.nodes {
            if !nodes.insert(node.as_str()) {
                errors.add(id.as_str(), "dependencies", format!("duplicate node '{node}'"));
            }
        }
        for link in &r.dependencies.links {
            for end in [&link.from, &link.to] {
                if !nodes.contains(end.as_str()) {
                    errors.add(id.as_str(), "dependencies", format!("link names unknown node '{end}'"));
                }
            }
        }
    }

    errors.into_result()
}
