use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{validate_records, ProjectRecord};

/// On-disk portfolio: `{ "projects": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioFile {
    pub projects: Vec<ProjectRecord>,
}

/// Parse and validate a portfolio from JSON text.
pub fn parse_portfolio(json: &str) -> crate::Result<Vec<ProjectRecord>> {
    let file: PortfolioFile = serde_json::from_str(json)?;
    validate_records(&file.projects)?;
    Ok(file.projects)
}

/// Load a portfolio from a JSON file. Contract violations are rejected here.
pub fn load_portfolio(path: &Path) -> crate::Result<Vec<ProjectRecord>> {
    let json = std::fs::read_to_string(path)?;
    let projects = parse_portfolio(&json)?;
    tracing::debug!(path = %path.display(), count = projects.len(), "portfolio loaded");
    Ok(projects)
}

/// Save a portfolio to a JSON file.
pub fn save_portfolio(projects: &[ProjectRecord], path: &Path) -> crate::Result<()> {
    let file = PortfolioFile {
        projects: projects.to_vec(),
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    Ok(())
}
