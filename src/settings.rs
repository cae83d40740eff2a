//! User settings, persisted as JSON in the OS config directory.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::PortfolioError;

pub const DEFAULT_TRACK_WIDTH_PX: f64 = 720.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Width of the timeline track, used to convert drag pixels to days.
    pub track_width_px: f64,
    /// `chrono` format string for dates in reports and exports.
    pub date_format: String,
    /// Field separator for the schedule CSV export.
    pub export_delimiter: char,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            track_width_px: DEFAULT_TRACK_WIDTH_PX,
            date_format: "%d/%m/%Y".into(),
            export_delimiter: ';',
        }
    }
}

impl DashboardSettings {
    /// `settings.json` under the platform config dir, or the working directory as fallback.
    pub fn default_path() -> PathBuf {
        match directories::ProjectDirs::from("", "", "PortfolioDashboard") {
            Some(dirs) => dirs.config_dir().join("settings.json"),
            None => PathBuf::from(".").join("settings.json"),
        }
    }

    /// Load from `path`. A missing or unreadable file gives defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read settings, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&contents) {
            Ok(settings) => settings.sanitized(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed settings, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Render `date` with the configured format.
    ///
    /// Formats with time fields (`%H`, `%M`, ...) cannot render a date and
    /// give [`PortfolioError::DateFormat`].
    pub fn format_date(&self, date: NaiveDate) -> crate::Result<String> {
        let mut out = String::new();
        write!(out, "{}", date.format(&self.date_format))
            .map_err(|_| PortfolioError::DateFormat(self.date_format.clone()))?;
        Ok(out)
    }

    /// Replace values the drag controller or CSV writer cannot use.
    pub fn sanitized(mut self) -> Self {
        if !self.track_width_px.is_finite() || self.track_width_px <= 0.0 {
            warn!(track_width_px = self.track_width_px, "invalid track width, using default");
            self.track_width_px = DEFAULT_TRACK_WIDTH_PX;
        }
        if self.format_date(NaiveDate::MIN).is_err() {
            warn!(date_format = %self.date_format, "unusable date format, using default");
            self.date_format = Self::default().date_format;
        }
        if !self.export_delimiter.is_ascii() {
            warn!(delimiter = %self.export_delimiter, "export delimiter must be ASCII, using ';'");
            self.export_delimiter = ';';
        }
        self
    }

    pub fn export_delimiter_byte(&self) -> u8 {
        // `sanitized` guarantees ASCII for loaded settings.
        u8::try_from(self.export_delimiter).unwrap_or(b';')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("portfolio-dashboard-settings-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn missing_file_gives_defaults() {
        let s = DashboardSettings::load(&scratch("does-not-exist.json"));
        assert_eq!(s, DashboardSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = scratch("partial.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "track_width_px": 960.0 }"#).unwrap();
        let s = DashboardSettings::load(&path);
        assert_eq!(s.track_width_px, 960.0);
        assert_eq!(s.date_format, "%d/%m/%Y");
        assert_eq!(s.export_delimiter_byte(), b';');
    }

    #[test]
    fn invalid_values_are_replaced() {
        let path = scratch("invalid.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{ "track_width_px": -5.0, "export_delimiter": "é", "date_format": "%H:%M" }"#,
        )
        .unwrap();
        let s = DashboardSettings::load(&path);
        assert_eq!(s.track_width_px, DEFAULT_TRACK_WIDTH_PX);
        assert_eq!(s.export_delimiter, ';');
        assert_eq!(s.date_format, "%d/%m/%Y");
    }

    #[test]
    fn time_only_format_is_reported_then_sanitized() {
        let s = DashboardSettings {
            date_format: "%H:%M".into(),
            ..Default::default()
        };
        let day = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
        assert!(matches!(s.format_date(day), Err(PortfolioError::DateFormat(f)) if f == "%H:%M"));
        assert_eq!(s.sanitized().format_date(day).unwrap(), "01/08/2024");
    }

    #[test]
    fn save_then_load() {
        let path = scratch("nested/saved.json");
        let s = DashboardSettings {
            track_width_px: 1024.0,
            date_format: "%Y-%m-%d".into(),
            export_delimiter: ',',
        };
        s.save(&path).unwrap();
        assert_eq!(DashboardSettings::load(&path), s);
    }
}
