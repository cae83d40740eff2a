use std::path::Path;

use chrono::NaiveDate;

use crate::error::PortfolioError;
use crate::model::{validate_records, ProjectRecord, Risk};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Title,
    Client,
    Phase,
    Allocated,
    Consumed,
    BurnRate,
    Percent,
    Start,
    Target,
    Risk,
    Eta,
}

const REQUIRED: [(Column, &str); 7] = [
    (Column::Id, "project id"),
    (Column::Start, "start date"),
    (Column::Target, "target date"),
    (Column::Allocated, "hours allocated"),
    (Column::Consumed, "hours consumed"),
    (Column::BurnRate, "burn rate"),
    (Column::Percent, "percent complete"),
];

/// Try parsing a date string with several common formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim()
        .to_lowercase()
        .replace([' ', '-', '_', '(', ')', '/', '%'], "")
}

fn header_to_col(normalized: &str) -> Option<Column> {
    match normalized {
        "id" | "project" | "projectid" | "code" => Some(Column::Id),
        "title" | "name" | "projectname" => Some(Column::Title),
        "client" | "department" | "owner" => Some(Column::Client),
        "phase" | "stage" => Some(Column::Phase),
        "hoursallocated" | "allocated" | "budget" | "budgethours" => Some(Column::Allocated),
        "hoursconsumed" | "consumed" | "timeinvestedhours" | "timeinvested" | "spent" => {
            Some(Column::Consumed)
        }
        "burnrateperweek" | "burnrate" | "burn" | "hoursperweek" => Some(Column::BurnRate),
        "percentcomplete" | "percent" | "progress" | "complete" => Some(Column::Percent),
        "startdate" | "start" | "begin" => Some(Column::Start),
        "targetdate" | "target" | "due" | "duedate" | "end" | "enddate" => Some(Column::Target),
        "risk" | "rag" | "status" => Some(Column::Risk),
        "eta" | "etadays" => Some(Column::Eta),
        _ => None,
    }
}

struct RowReader<'a> {
    row: usize,
    fields: Vec<(Column, &'a str)>,
}

impl<'a> RowReader<'a> {
    fn get(&self, col: Column) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(c, _)| *c == col)
            .map(|(_, v)| *v)
            .filter(|v| !v.is_empty())
    }

    fn error(&self, message: String) -> PortfolioError {
        PortfolioError::Parse {
            row: self.row,
            message,
        }
    }

    fn required(&self, col: Column, label: &str) -> crate::Result<&'a str> {
        self.get(col)
            .ok_or_else(|| self.error(format!("missing {label}")))
    }

    fn number(&self, col: Column, label: &str) -> crate::Result<f64> {
        let raw = self.required(col, label)?;
        raw.trim_end_matches('h')
            .trim()
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid {label} '{raw}'")))
    }

    fn date(&self, col: Column, label: &str) -> crate::Result<NaiveDate> {
        let raw = self.required(col, label)?;
        parse_date(raw).ok_or_else(|| self.error(format!("invalid {label} '{raw}'")))
    }
}

fn parse_row(reader: &RowReader<'_>) -> crate::Result<ProjectRecord> {
    let id = reader.required(Column::Id, "project id")?;
    let percent_raw = reader.required(Column::Percent, "percent complete")?;
    let percent_complete = percent_raw
        .trim_end_matches('%')
        .trim()
        .parse::<u8>()
        .map_err(|_| reader.error(format!("invalid percent complete '{percent_raw}'")))?;

    let risk = match reader.get(Column::Risk) {
        Some(raw) => Risk::parse(raw).ok_or_else(|| reader.error(format!("unknown risk '{raw}'")))?,
        None => Risk::Green,
    };
    let eta_days = match reader.get(Column::Eta) {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| reader.error(format!("invalid eta '{raw}'")))?,
        ),
        None => None,
    };

    let mut record = ProjectRecord::new(
        id,
        reader.number(Column::Allocated, "hours allocated")?,
        reader.number(Column::Consumed, "hours consumed")?,
        reader.number(Column::BurnRate, "burn rate")?,
        reader.date(Column::Start, "start date")?,
        reader.date(Column::Target, "target date")?,
    )
    .with_percent(percent_complete)
    .with_risk(risk)
    .with_title(reader.get(Column::Title).unwrap_or_default());
    record.client = reader.get(Column::Client).unwrap_or_default().to_string();
    record.phase = reader.get(Column::Phase).unwrap_or_default().to_string();
    record.eta_days = eta_days;
    Ok(record)
}

/// Import records from CSV text.
///
/// Auto-detects delimiter (comma, semicolon, tab) and matches headers
/// flexibly ("Hours Allocated", "burn_rate", ...). Unlike a spreadsheet
/// import, a bad row rejects the whole file: records must reach the engine
/// complete.
pub fn parse_csv(content: &str) -> crate::Result<Vec<ProjectRecord>> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let col_map: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_col(&normalize_header(h)))
        .collect();

    let missing: Vec<&str> = REQUIRED
        .iter()
        .filter(|(col, _)| !col_map.contains(&Some(*col)))
        .map(|(_, label)| *label)
        .collect();
    if !missing.is_empty() {
        let found: Vec<&str> = headers.iter().collect();
        return Err(PortfolioError::Parse {
            row: 1,
            message: format!("missing columns {missing:?}; found headers {found:?}"),
        });
    }

    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let fields = record
            .iter()
            .zip(col_map.iter())
            .filter_map(|(value, col)| col.map(|c| (c, value)))
            .collect();
        let row = RowReader { row: i + 2, fields };
        records.push(parse_row(&row)?);
    }

    validate_records(&records)?;
    Ok(records)
}

/// Import records from a CSV file.
pub fn import_csv(path: &Path) -> crate::Result<Vec<ProjectRecord>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_csv(&content)?;
    tracing::debug!(path = %path.display(), count = records.len(), "records imported from CSV");
    Ok(records)
}
