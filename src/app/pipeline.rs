//! Shared forecast pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CSV ingest -> mock generation or remote training -> dashboard
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::dashboard::Dashboard;
use crate::data::ForecastClient;
use crate::domain::{DatasetSummary, PredictionRow, RunConfig, TrainOptions};
use crate::error::AppError;
use crate::forecast::mock::generate_predictions;
use crate::io::ingest::{IngestedSales, load_sales_file};

/// All computed outputs of a single local mock run.
#[derive(Debug, Clone)]
pub struct LocalRun {
    pub ingest: IngestedSales,
    pub rows: Vec<PredictionRow>,
    pub dashboard: Dashboard,
}

/// Load the sales file and build a mock dashboard.
pub fn run_local(config: &RunConfig) -> Result<LocalRun, AppError> {
    let ingest = load_sales_file(&config.csv_path)?;
    Ok(run_local_with_ingest(ingest, config.seed, config.store_limit, config.dept_limit))
}

/// Build a mock dashboard from already-ingested sales.
///
/// This is useful for the TUI where we want to regenerate without re-reading.
pub fn run_local_with_ingest(ingest: IngestedSales, seed: u64, store_limit: usize, dept_limit: usize) -> LocalRun {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = generate_predictions(&ingest.records, &mut rng);
    tracing::debug!(weeks = rows.len(), seed, "generated mock predictions");

    let dashboard = Dashboard::from_mock(
        &ingest.records,
        &rows,
        ingest.summary.clone(),
        store_limit,
        dept_limit,
    );
    LocalRun { ingest, rows, dashboard }
}

/// Train on the forecasting service and build a dashboard from its response.
///
/// `summary` only feeds the store/department counts in the KPIs.
pub fn run_remote(
    client: &ForecastClient,
    path: &Path,
    options: &TrainOptions,
    summary: Option<DatasetSummary>,
) -> Result<Dashboard, AppError> {
    let started = std::time::Instant::now();
    let result = client.train(path, options)?;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        predictions = result.predictions.len(),
        models = result.metrics.len(),
        "training finished"
    );
    Ok(Dashboard::from_train_result(result, summary))
}

/// Dataset summary for the KPIs of a remote run.
///
/// The service parses the file itself, so a local parse failure is not fatal.
pub fn local_summary(path: &Path) -> Option<DatasetSummary> {
    match load_sales_file(path) {
        Ok(ingest) => Some(ingest.summary),
        Err(err) => {
            tracing::debug!(path = %path.display(), "no local summary: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastSource;
    use crate::io::ingest::ingest_text;

    const CSV: &str = "Store,Dept,Date,Weekly_Sales,IsHoliday\n\
                       1,1,2010-02-05,24924.50,FALSE\n\
                       1,2,2010-02-05,50605.27,FALSE\n\
                       2,1,2010-02-12,46039.49,TRUE\n\
                       2,1,2010-02-19,41595.55,FALSE\n";

    #[test]
    fn local_run_builds_a_full_mock_dashboard() {
        let ingest = ingest_text(CSV, "train.csv").unwrap();
        let run = run_local_with_ingest(ingest, 42, 5, 6);

        assert_eq!(run.rows.len(), 3);
        assert_eq!(run.rows[0].actual, 75530.0);
        assert_eq!(run.dashboard.source, ForecastSource::Mock);
        assert_eq!(run.dashboard.store_data.len(), 2);
        assert_eq!(run.dashboard.dept_data.len(), 2);
        assert_eq!(run.dashboard.holiday_impact.len(), 1);
        assert_eq!(run.dashboard.kpis.stores, 2);
    }

    #[test]
    fn local_runs_are_reproducible_per_seed() {
        let a = run_local_with_ingest(ingest_text(CSV, "a").unwrap(), 7, 5, 6);
        let b = run_local_with_ingest(ingest_text(CSV, "b").unwrap(), 7, 5, 6);
        assert_eq!(a.rows, b.rows);
    }

    #[test]
    fn missing_file_has_no_local_summary() {
        assert!(local_summary(Path::new("/nonexistent/train.csv")).is_none());
    }
}
