//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built in-memory from an uploaded CSV
//! - decoded from the forecasting service's JSON response
//! - saved to a dashboard file and reloaded later for display

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Forecast horizon (weeks) requested from the service unless overridden.
pub const DEFAULT_HORIZON: usize = 12;

/// Number of leading distinct stores shown in the store breakdown.
pub const DEFAULT_STORE_LIMIT: usize = 5;

/// Number of leading distinct departments shown in the department breakdown.
pub const DEFAULT_DEPT_LIMIT: usize = 6;

/// Aggregation level requested for a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForecastScope {
    Overall,
    Store,
    Department,
}

impl ForecastScope {
    pub const ALL: [ForecastScope; 3] = [
        ForecastScope::Overall,
        ForecastScope::Store,
        ForecastScope::Department,
    ];

    /// Wire value for the `scope` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            ForecastScope::Overall => "overall",
            ForecastScope::Store => "store",
            ForecastScope::Department => "department",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ForecastScope::Overall => "Overall",
            ForecastScope::Store => "By Store",
            ForecastScope::Department => "By Department",
        }
    }

    pub fn next(self) -> Self {
        match self {
            ForecastScope::Overall => ForecastScope::Store,
            ForecastScope::Store => ForecastScope::Department,
            ForecastScope::Department => ForecastScope::Overall,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ForecastScope::Overall => ForecastScope::Department,
            ForecastScope::Store => ForecastScope::Overall,
            ForecastScope::Department => ForecastScope::Store,
        }
    }
}

/// Where a dashboard's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ForecastSource {
    /// Synthetic predictions generated locally.
    Mock,
    /// Results returned by the remote forecasting service.
    Remote,
}

impl ForecastSource {
    pub fn display_name(self) -> &'static str {
        match self {
            ForecastSource::Mock => "mock (local)",
            ForecastSource::Remote => "remote service",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            ForecastSource::Mock => ForecastSource::Remote,
            ForecastSource::Remote => ForecastSource::Mock,
        }
    }
}

/// A typed sales row, coerced from a loosely-typed CSV record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub store: String,
    pub dept: String,
    /// Date exactly as written in the file (ordering is lexical).
    pub date: String,
    pub weekly_sales: f64,
    pub is_holiday: bool,
}

/// One row of the local mock forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    /// Display label, `W1`, `W2`, ...
    pub week: String,
    pub date: String,
    pub actual: f64,
    pub predicted: f64,
    pub error: f64,
}

impl PredictionRow {
    pub fn to_prediction(&self) -> Prediction {
        Prediction {
            date: self.date.clone(),
            actual: Some(self.actual),
            predicted: self.predicted,
        }
    }
}

/// Prediction for a single date.
///
/// `actual` is present only for historical points; forward forecast points
/// carry a predicted value alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub date: String,
    #[serde(default)]
    pub actual: Option<f64>,
    #[serde(alias = "forecast", alias = "value", alias = "yhat")]
    pub predicted: f64,
}

/// Per-model error metrics shown in the model comparison view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub model: String,
    #[serde(alias = "MAE")]
    pub mae: f64,
    #[serde(alias = "RMSE")]
    pub rmse: f64,
    #[serde(default, alias = "R2")]
    pub r2: f64,
}

/// Loose metric bundle (used for the service's `arimaMetrics`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    #[serde(default, alias = "MAE")]
    pub mae: Option<f64>,
    #[serde(default, alias = "RMSE")]
    pub rmse: Option<f64>,
    #[serde(default, alias = "MAPE")]
    pub mape: Option<f64>,
    #[serde(default, alias = "R2")]
    pub r2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreData {
    /// e.g. `Store 1`
    pub name: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeptData {
    /// e.g. `Dept 5`
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HolidayImpact {
    pub holiday: String,
    /// Percentage uplift over an average non-holiday week.
    pub lift: f64,
    /// Average holiday-week sales.
    pub sales: f64,
}

/// Headline numbers shown above the dashboard tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub total_predicted: f64,
    pub accuracy_pct: f64,
    pub stores: usize,
    pub departments: usize,
}

/// Dataset-level summary of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub stores: usize,
    pub departments: usize,
    pub date_min: Option<String>,
    pub date_max: Option<String>,
    pub avg_sales: f64,
}

/// Training request parameters sent alongside the uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainOptions {
    pub scope: ForecastScope,
    pub store_id: Option<u32>,
    pub dept_id: Option<u32>,
    pub horizon: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            scope: ForecastScope::Overall,
            store_id: None,
            dept_id: None,
            horizon: DEFAULT_HORIZON,
        }
    }
}

impl TrainOptions {
    /// Keep only the id the scope uses: a store id for `store`, a department
    /// id for `department`, neither for `overall`.
    pub fn for_scope(scope: ForecastScope, store_id: Option<u32>, dept_id: Option<u32>, horizon: usize) -> Self {
        Self {
            scope,
            store_id: store_id.filter(|_| scope == ForecastScope::Store),
            dept_id: dept_id.filter(|_| scope == ForecastScope::Department),
            horizon,
        }
    }
}

/// JSON body returned by `POST /train`.
///
/// The schema is owned by the service; every list is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainResult {
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub predictions: Vec<Prediction>,
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

/// A dated scalar (residual series entries).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedValue {
    pub date: String,
    pub value: f64,
}

/// Residual diagnostics returned by `GET /residuals`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidualSeries {
    #[serde(default)]
    pub train_residuals: Vec<DatedValue>,
    #[serde(default)]
    pub valid_residuals: Vec<DatedValue>,
    #[serde(default)]
    pub smoothed_train: Vec<DatedValue>,
    #[serde(default)]
    pub smoothed_forecast: Vec<DatedValue>,
}

/// Actual vs predicted pair returned by `GET /scatter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    #[serde(alias = "x")]
    pub actual: f64,
    #[serde(alias = "y")]
    pub predicted: f64,
}

/// Weekly total returned by `GET /weekly`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub date: String,
    #[serde(alias = "weekly_sales", alias = "Weekly_Sales", alias = "value")]
    pub sales: f64,
}

/// A full local run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub csv_path: PathBuf,
    pub seed: u64,
    pub store_limit: usize,
    pub dept_limit: usize,

    pub export_predictions: Option<PathBuf>,
    pub save_dashboard: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_result_tolerates_missing_fields_and_upper_case_metrics() {
        let body = r#"{
            "metrics": [{"model": "RF", "MAE": 10.5, "RMSE": 20.25}],
            "predictions": [{"date": "2012-01-06", "actual": 5.0, "predicted": 6.0}],
            "forecast": [{"date": "2012-11-02", "forecast": 7.0}]
        }"#;
        let result: TrainResult = serde_json::from_str(body).unwrap();
        assert_eq!(result.metrics[0].mae, 10.5);
        assert_eq!(result.metrics[0].r2, 0.0);
        assert_eq!(result.predictions[0].actual, Some(5.0));
        assert_eq!(result.forecast[0].actual, None);
        assert_eq!(result.forecast[0].predicted, 7.0);
        assert!(result.store_data.is_empty());
        assert!(result.arima_metrics.is_none());
    }

    #[test]
    fn scope_cycles_through_all_values() {
        let mut scope = ForecastScope::Overall;
        for _ in 0..ForecastScope::ALL.len() {
            scope = scope.next();
        }
        assert_eq!(scope, ForecastScope::Overall);
        assert_eq!(ForecastScope::Store.prev(), ForecastScope::Overall);
        assert_eq!(ForecastScope::Department.as_str(), "department");
    }
}
