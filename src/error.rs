use std::fmt;

use thiserror::Error;

/// Errors raised at the portfolio boundary (loading, validation, export).
///
/// The engine itself is total; nothing past `Dashboard::new` returns this.
#[derive(Debug, Error)]
pub enum PortfolioError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed portfolio JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("Invalid portfolio: {0}")]
    Validation(ValidationErrors),

    #[error("Cannot format dates with '{0}'")]
    DateFormat(String),
}

/// A single field-level contract violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Record id, or `#<index>` when the id itself is unusable.
    pub record: String,
    pub field: &'static str,
    pub message: String,
}

/// Every violation found in one pass over the record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: impl Into<String>, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            record: record.into(),
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// True if any violation names `field`.
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise the collected violations as an error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(PortfolioError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}.{}: {}", e.record, e.field, e.message)?;
        }
        Ok(())
    }
}

pub type Result<T> = std::result::Result<T, PortfolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_result_reports_collected_errors() {
        assert!(ValidationErrors::new().into_result().is_ok());

        let mut errors = ValidationErrors::new();
        errors.add("PRJ-001", "hoursAllocated", "must not be negative (got -1)");
        errors.add("#2", "id", "must not be empty");
        match errors.into_result() {
            Err(PortfolioError::Validation(e)) => {
                assert_eq!(e.errors.len(), 2);
                assert_eq!(
                    e.to_string(),
                    "PRJ-001.hoursAllocated: must not be negative (got -1); #2.id: must not be empty"
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
