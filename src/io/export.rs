//! Export mock prediction rows to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::domain::PredictionRow;
use crate::error::AppError;

/// Write prediction rows (`week,date,actual,predicted,error`) to a CSV file.
pub fn write_predictions_csv(path: &Path, rows: &[PredictionRow]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::usage(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::usage(format!("Failed to write export CSV: {e}")))?;

    tracing::info!(path = %path.display(), rows = rows.len(), "exported predictions");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_writes_header_and_rows() {
        let path = std::env::temp_dir().join(format!("salescast_export_{}.csv", std::process::id()));
        let rows = vec![PredictionRow {
            week: "W1".into(),
            date: "2010-02-05".into(),
            actual: 100.0,
            predicted: 98.0,
            error: 2.0,
        }];

        write_predictions_csv(&path, &rows).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(text, "week,date,actual,predicted,error\nW1,2010-02-05,100.0,98.0,2.0\n");
    }
}
