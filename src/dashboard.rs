//! Dashboard presentation state.
//!
//! A `Dashboard` is everything the report and TUI views draw, whether it was
//! computed locally from the mock generator or returned by the forecasting
//! service. `DashboardState` holds the one currently on screen.

use serde::{Deserialize, Serialize};

use crate::domain::{
    DEFAULT_DEPT_LIMIT, DEFAULT_STORE_LIMIT, DatasetSummary, DeptData, ErrorMetrics, ForecastSource, HolidayImpact, Kpis, Metric, Prediction, PredictionRow,
    SalesRecord, StoreData, TrainResult,
};
use crate::error::AppError;
use crate::forecast::{aggregate, metrics};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub source: ForecastSource,
    #[serde(default)]
    pub summary: Option<DatasetSummary>,
    pub kpis: Kpis,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub store_data: Vec<StoreData>,
    #[serde(default)]
    pub dept_data: Vec<DeptData>,
    #[serde(default)]
    pub holiday_impact: Vec<HolidayImpact>,
    #[serde(default)]
    pub forecast_history: Vec<Prediction>,
    #[serde(default)]
    pub forecast: Vec<Prediction>,
    #[serde(default)]
    pub arima_metrics: Option<ErrorMetrics>,
}

impl Dashboard {
    /// Build a dashboard from a local mock run.
    pub fn from_mock(
        records: &[SalesRecord],
        rows: &[PredictionRow],
        summary: DatasetSummary,
        store_limit: usize,
        dept_limit: usize,
    ) -> Self {
        let predictions: Vec<Prediction> = rows.iter().map(PredictionRow::to_prediction).collect();
        let metrics = metrics::calculate_metrics(rows)
            .map(|m| vec![m.to_metric()])
            .unwrap_or_default();
        let kpis = metrics::dashboard_kpis(&predictions, Some(&summary), store_limit, dept_limit);

        Self {
            source: ForecastSource::Mock,
            summary: Some(summary),
            kpis,
            predictions,
            metrics,
            store_data: aggregate::by_store(records, store_limit),
            dept_data: aggregate::by_department(records, dept_limit),
            holiday_impact: aggregate::holiday_impact(records),
            forecast_history: Vec::new(),
            forecast: Vec::new(),
            arima_metrics: None,
        }
    }

    /// Build a dashboard from the service's training response.
    ///
    /// The response is shown as returned; only the KPIs are derived here.
    pub fn from_train_result(result: TrainResult, summary: Option<DatasetSummary>) -> Self {
        let kpis = metrics::dashboard_kpis(
            &result.predictions,
            summary.as_ref(),
            DEFAULT_STORE_LIMIT,
            DEFAULT_DEPT_LIMIT,
        );
        Self {
            source: ForecastSource::Remote,
            summary,
            kpis,
            predictions: result.predictions,
            metrics: result.metrics,
            store_data: result.store_data,
            dept_data: result.dept_data,
            holiday_impact: result.holiday_impact,
            forecast_history: result.forecast_history,
            forecast: result.forecast,
            arima_metrics: result.arima_metrics,
        }
    }

    /// Historical points for the main chart.
    ///
    /// The service may send a separate `forecastHistory` series; it is
    /// preferred over `predictions` when present.
    pub fn history(&self) -> &[Prediction] {
        if self.forecast_history.is_empty() {
            &self.predictions
        } else {
            &self.forecast_history
        }
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty() && self.forecast_history.is_empty() && self.forecast.is_empty()
    }
}

/// The dashboard on screen plus the last error message.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    current: Option<Dashboard>,
    error: Option<String>,
}

impl DashboardState {
    pub fn current(&self) -> Option<&Dashboard> {
        self.current.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Apply the outcome of a generate/train action.
    ///
    /// A failure records its message and leaves the displayed dashboard as it
    /// was. Returns whether the dashboard was replaced.
    pub fn apply(&mut self, outcome: Result<Dashboard, AppError>) -> bool {
        match outcome {
            Ok(dashboard) => {
                self.current = Some(dashboard);
                self.error = None;
                true
            }
            Err(err) => {
                tracing::debug!(exit_code = err.exit_code(), "{}", err.message());
                self.error = Some(err.message().to_string());
                false
            }
        }
    }
}
