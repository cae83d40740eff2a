pub mod drag;
pub mod metrics;
pub mod project;
pub mod timeline;

pub use drag::{DragController, DragSession, DragState};
pub use metrics::{
    compute_aggregate, compute_project_metrics, PhaseBand, PortfolioAggregate, ProjectMetrics,
};
pub use project::{validate_records, DependencyGraph, Milestone, ProjectRecord, Risk};
pub use timeline::{Edge, RowLayout, TimelineModel, TimelineRow};
