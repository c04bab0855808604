//! Read/write saved dashboard JSON files.
//!
//! A dashboard file is a snapshot of everything a run displayed, so it can be
//! re-rendered later with `salescast show` without the source CSV or the
//! forecasting service.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dashboard::Dashboard;
use crate::error::AppError;

const TOOL_NAME: &str = "salescast";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardFile {
    pub tool: String,
    /// RFC 3339 timestamp of when the file was written.
    pub generated: String,
    #[serde(default)]
    pub source_file: Option<String>,
    pub dashboard: Dashboard,
}

/// Write a dashboard JSON file.
pub fn write_dashboard_json(path: &Path, dashboard: &Dashboard, source_file: Option<&str>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create dashboard JSON '{}': {e}", path.display())))?;

    let saved = DashboardFile {
        tool: TOOL_NAME.to_string(),
        generated: chrono::Utc::now().to_rfc3339(),
        source_file: source_file.map(str::to_string),
        dashboard: dashboard.clone(),
    };

    serde_json::to_writer_pretty(file, &saved)
        .map_err(|e| AppError::usage(format!("Failed to write dashboard JSON: {e}")))?;

    tracing::info!(path = %path.display(), "saved dashboard");
    Ok(())
}

/// Read a dashboard JSON file.
pub fn read_dashboard_json(path: &Path) -> Result<DashboardFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::usage(format!("Failed to open dashboard JSON '{}': {e}", path.display())))?;
    let saved: DashboardFile =
        serde_json::from_reader(file).map_err(|e| AppError::usage(format!("Invalid dashboard JSON: {e}")))?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrainResult;

    #[test]
    fn saved_dashboard_reads_back() {
        let path = std::env::temp_dir().join(format!("salescast_dash_{}.json", std::process::id()));
        let dashboard = Dashboard::from_train_result(TrainResult::default(), None);

        write_dashboard_json(&path, &dashboard, Some("train.csv")).unwrap();
        let saved = read_dashboard_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(saved.tool, "salescast");
        assert_eq!(saved.source_file.as_deref(), Some("train.csv"));
        assert_eq!(saved.dashboard, dashboard);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let err = read_dashboard_json(Path::new("/nonexistent/dash.json")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
