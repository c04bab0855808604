//! Error metrics and headline KPIs.

use serde::{Deserialize, Serialize};

use crate::domain::{DatasetSummary, Kpis, Metric, Prediction, PredictionRow};
use crate::forecast::mock::round_half_up;

/// Model name reported for the local mock generator.
pub const MOCK_MODEL_NAME: &str = "Mock baseline";

/// Error metrics for a set of mock prediction rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockMetrics {
    /// Mean absolute error, rounded to an integer.
    pub mae: f64,
    /// Root-mean-square error, rounded to an integer.
    pub rmse: f64,
    /// Coefficient of determination, rounded to 3 decimals.
    pub r2: f64,
}

impl MockMetrics {
    pub fn to_metric(&self) -> Metric {
        Metric {
            model: MOCK_MODEL_NAME.to_string(),
            mae: self.mae,
            rmse: self.rmse,
            r2: self.r2,
        }
    }
}

/// MAE, RMSE and R² computed from the per-row (rounded) errors.
///
/// Returns `None` for an empty slice. When all actual values are equal the
/// total variance is zero and R² is reported as 0.
pub fn calculate_metrics(rows: &[PredictionRow]) -> Option<MockMetrics> {
    if rows.is_empty() {
        return None;
    }

    let n = rows.len() as f64;
    let mae = rows.iter().map(|r| r.error).sum::<f64>() / n;
    let residual_ss = rows.iter().map(|r| r.error * r.error).sum::<f64>();
    let rmse = (residual_ss / n).sqrt();

    let actual_mean = rows.iter().map(|r| r.actual).sum::<f64>() / n;
    let total_ss = rows.iter().map(|r| (r.actual - actual_mean).powi(2)).sum::<f64>();
    let r2 = if total_ss > 0.0 {
        1.0 - residual_ss / total_ss
    } else {
        0.0
    };

    Some(MockMetrics {
        mae: round_half_up(mae),
        rmse: round_half_up(rmse),
        r2: (r2 * 1000.0).round() / 1000.0,
    })
}

/// Headline numbers for the dashboard.
///
/// Only points with an actual value take part in the totals, so forward
/// forecast points never distort the accuracy figure. Store and department
/// counts are capped at the number of bars the dashboard charts.
pub fn dashboard_kpis(
    predictions: &[Prediction],
    summary: Option<&DatasetSummary>,
    store_limit: usize,
    dept_limit: usize,
) -> Kpis {
    let (total_sales, total_predicted) = predictions
        .iter()
        .filter_map(|p| p.actual.map(|a| (a, p.predicted)))
        .fold((0.0, 0.0), |(sa, sp), (a, p)| (sa + a, sp + p));

    let accuracy_pct = if total_sales != 0.0 {
        (1.0 - (total_sales - total_predicted).abs() / total_sales) * 100.0
    } else {
        0.0
    };

    Kpis {
        total_sales,
        total_predicted,
        accuracy_pct: (accuracy_pct * 10.0).round() / 10.0,
        stores: summary.map(|s| s.stores.min(store_limit)).unwrap_or(0),
        departments: summary.map(|s| s.departments.min(dept_limit)).unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(actual: f64, predicted: f64) -> PredictionRow {
        PredictionRow {
            week: "W1".to_string(),
            date: "2010-02-05".to_string(),
            actual,
            predicted,
            error: (actual - predicted).abs(),
        }
    }

    #[test]
    fn empty_rows_have_no_metrics() {
        assert!(calculate_metrics(&[]).is_none());
    }

    #[test]
    fn metrics_match_hand_computation() {
        // errors: 10, 20, 30 -> MAE 20, MSE (100+400+900)/3 = 466.67, RMSE 21.6
        let rows = vec![row(100.0, 110.0), row(200.0, 180.0), row(300.0, 330.0)];
        let m = calculate_metrics(&rows).unwrap();
        assert_eq!(m.mae, 20.0);
        assert_eq!(m.rmse, 22.0);
        // total SS = 20000, residual SS = 1400 -> R² = 0.93
        assert!((m.r2 - 0.93).abs() < 1e-12);
    }

    #[test]
    fn constant_actuals_report_zero_r2() {
        let rows = vec![row(100.0, 90.0), row(100.0, 110.0)];
        let m = calculate_metrics(&rows).unwrap();
        assert_eq!(m.r2, 0.0);
        assert_eq!(m.to_metric().model, MOCK_MODEL_NAME);
    }

    #[test]
    fn kpis_ignore_points_without_actuals() {
        let predictions = vec![
            Prediction { date: "a".into(), actual: Some(100.0), predicted: 90.0 },
            Prediction { date: "b".into(), actual: Some(100.0), predicted: 100.0 },
            Prediction { date: "c".into(), actual: None, predicted: 1_000.0 },
        ];
        let summary = DatasetSummary {
            rows: 10,
            stores: 3,
            departments: 4,
            date_min: None,
            date_max: None,
            avg_sales: 0.0,
        };
        let k = dashboard_kpis(&predictions, Some(&summary), 5, 6);
        assert_eq!(k.total_sales, 200.0);
        assert_eq!(k.total_predicted, 190.0);
        assert_eq!(k.accuracy_pct, 95.0);
        assert_eq!(k.stores, 3);
        assert_eq!(k.departments, 4);
    }

    #[test]
    fn kpis_on_empty_input_are_zero() {
        let k = dashboard_kpis(&[], None, 5, 6);
        assert_eq!(k.accuracy_pct, 0.0);
        assert_eq!(k.stores, 0);
    }

    #[test]
    fn store_and_department_counts_stop_at_the_chart_limits() {
        let summary = DatasetSummary {
            rows: 1000,
            stores: 45,
            departments: 81,
            date_min: None,
            date_max: None,
            avg_sales: 0.0,
        };
        let k = dashboard_kpis(&[], Some(&summary), 5, 6);
        assert_eq!(k.stores, 5);
        assert_eq!(k.departments, 6);
    }
}
