//! Local mock forecast.
//!
//! This is a placeholder, not a forecasting model: weekly totals are perturbed
//! with uniform noise (±2.5% of the value), a yearly sinusoid (±10%) and a
//! linear trend of 500 per week index. It exists so the dashboard can be
//! explored without a forecasting service.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use rand::Rng;

use crate::domain::{PredictionRow, SalesRecord};

/// Maximum number of weekly points produced.
pub const MAX_WEEKS: usize = 52;

const NOISE_FRACTION: f64 = 0.05;
const SEASONAL_AMPLITUDE: f64 = 0.1;
const TREND_PER_WEEK: f64 = 500.0;

/// Sum weekly sales per date, sorted lexically by date and truncated to
/// `MAX_WEEKS` entries.
///
/// Records with an empty date or zero sales are ignored.
pub fn weekly_totals(records: &[SalesRecord]) -> Vec<(String, f64)> {
    let mut by_date: BTreeMap<&str, f64> = BTreeMap::new();
    for r in records {
        if r.date.is_empty() || r.weekly_sales == 0.0 {
            continue;
        }
        *by_date.entry(r.date.as_str()).or_insert(0.0) += r.weekly_sales;
    }

    by_date
        .into_iter()
        .take(MAX_WEEKS)
        .map(|(date, sales)| (date.to_string(), sales))
        .collect()
}

/// Generate mock predictions for the weekly totals of `records`.
///
/// The RNG is injected so callers can make runs reproducible.
pub fn generate_predictions<R: Rng>(records: &[SalesRecord], rng: &mut R) -> Vec<PredictionRow> {
    weekly_totals(records)
        .into_iter()
        .enumerate()
        .map(|(index, (date, sales))| {
            let u: f64 = rng.r#gen();
            let predicted = mock_value(sales, index, u);
            PredictionRow {
                week: format!("W{}", index + 1),
                date,
                actual: round_half_up(sales),
                predicted: round_half_up(predicted),
                error: round_half_up((sales - predicted).abs()),
            }
        })
        .collect()
}

/// Perturb one weekly total. `u` is a uniform sample from `[0, 1)`.
pub fn mock_value(sales: f64, index: usize, u: f64) -> f64 {
    let noise = (u - 0.5) * (sales * NOISE_FRACTION);
    let seasonal = ((index as f64 / MAX_WEEKS as f64) * 2.0 * PI).sin() * SEASONAL_AMPLITUDE;
    let trend = index as f64 * TREND_PER_WEEK;
    sales + noise + sales * seasonal + trend
}

/// Round to the nearest integer, halves toward +∞.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}
