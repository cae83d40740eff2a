pub mod csv_export;
pub mod csv_import;
pub mod file;

use std::path::Path;

use crate::model::ProjectRecord;

/// Load records by file extension: `.csv` goes through the importer, anything else is JSON.
pub fn load_records(path: &Path) -> crate::Result<Vec<ProjectRecord>> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if is_csv {
        csv_import::import_csv(path)
    } else {
        file::load_portfolio(path)
    }
}
