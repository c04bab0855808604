//! Formatted terminal output for dashboards.
//!
//! We keep formatting code in one place so:
//! - the forecasting code stays clean and testable
//! - output changes are localized (golden tests below)

use crate::dashboard::Dashboard;
use crate::domain::{DeptData, ErrorMetrics, HolidayImpact, Kpis, Metric, Prediction, StoreData};
use crate::io::ingest::IngestedSales;

const BAR_WIDTH: usize = 30;
const MAX_ROW_ERRORS_SHOWN: usize = 5;

/// Format the ingest summary (file, row counts, dataset stats, row errors).
pub fn format_ingest_summary(ingest: &IngestedSales) -> String {
    let s = &ingest.summary;
    let mut out = String::new();

    out.push_str("=== salescast - Weekly Sales Forecast ===\n");
    out.push_str(&format!("File: {}\n", ingest.source_name));
    out.push_str(&format!(
        "Rows: read={} used={} skipped={}\n",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    ));
    out.push_str(&format!("Stores: {} | Departments: {}\n", s.stores, s.departments));
    if let (Some(min), Some(max)) = (&s.date_min, &s.date_max) {
        out.push_str(&format!("Dates: {min} .. {max}\n"));
    }
    out.push_str(&format!("Avg weekly sales: {}\n", fmt_money(s.avg_sales)));

    for err in ingest.row_errors.iter().take(MAX_ROW_ERRORS_SHOWN) {
        out.push_str(&format!("  line {}: {}\n", err.line, err.message));
    }
    if ingest.row_errors.len() > MAX_ROW_ERRORS_SHOWN {
        out.push_str(&format!(
            "  ... and {} more\n",
            ingest.row_errors.len() - MAX_ROW_ERRORS_SHOWN
        ));
    }

    out
}

/// Format every dashboard section, in the order the TUI tabs show them.
pub fn format_dashboard(d: &Dashboard) -> String {
    let mut out = String::new();

    out.push_str(&format!("Source: {}\n\n", d.source.display_name()));
    out.push_str(&format_kpis(&d.kpis));
    out.push('\n');
    out.push_str(&format_metrics(&d.metrics, d.arima_metrics.as_ref()));
    out.push('\n');
    out.push_str(&format_stores(&d.store_data));
    out.push('\n');
    out.push_str(&format_departments(&d.dept_data));
    out.push('\n');
    out.push_str(&format_holidays(&d.holiday_impact));
    if !d.forecast.is_empty() {
        out.push('\n');
        out.push_str(&format_forecast(&d.forecast));
    }

    out
}

pub fn format_kpis(k: &Kpis) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total sales:     {}\n", fmt_money(k.total_sales)));
    out.push_str(&format!("Total predicted: {}\n", fmt_money(k.total_predicted)));
    out.push_str(&format!("Accuracy:        {:.1}%\n", k.accuracy_pct));
    out.push_str(&format!("Stores analyzed: {}\n", k.stores));
    out.push_str(&format!("Departments:     {}\n", k.departments));
    out
}

/// Model comparison table, plus the service's ARIMA metrics when present.
pub fn format_metrics(metrics: &[Metric], arima: Option<&ErrorMetrics>) -> String {
    let mut out = String::from("Model comparison:\n");
    if metrics.is_empty() {
        out.push_str("(none)\n");
    } else {
        push_line(&mut out, format!("{:<24} {:>12} {:>12} {:>8}", "model", "mae", "rmse", "r2"));
        push_line(&mut out, format!("{:-<24} {:-<12} {:-<12} {:-<8}", "", "", "", ""));
        for m in metrics {
            push_line(
                &mut out,
                format!(
                    "{:<24} {:>12.2} {:>12.2} {:>8.3}",
                    truncate(&m.model, 24),
                    m.mae,
                    m.rmse,
                    m.r2
                ),
            );
        }
    }

    if let Some(a) = arima {
        let parts: Vec<String> = [("MAE", a.mae), ("RMSE", a.rmse), ("MAPE", a.mape), ("R2", a.r2)]
            .into_iter()
            .filter_map(|(name, v)| v.map(|v| format!("{name}={v:.2}")))
            .collect();
        if !parts.is_empty() {
            out.push_str(&format!("ARIMA: {}\n", parts.join(" ")));
        }
    }

    out
}

pub fn format_stores(stores: &[StoreData]) -> String {
    let rows: Vec<(&str, f64)> = stores.iter().map(|s| (s.name.as_str(), s.sales)).collect();
    format_bar_table("Sales by store:", &rows)
}

pub fn format_departments(depts: &[DeptData]) -> String {
    let rows: Vec<(&str, f64)> = depts.iter().map(|d| (d.name.as_str(), d.value)).collect();
    format_bar_table("Sales by department:", &rows)
}

pub fn format_holidays(impact: &[HolidayImpact]) -> String {
    let mut out = String::from("Holiday impact:\n");
    if impact.is_empty() {
        out.push_str("(none)\n");
        return out;
    }
    for h in impact {
        push_line(
            &mut out,
            format!(
                "{:<14} {:>8} {:>14}",
                h.holiday,
                format!("{:+.1}%", h.lift),
                fmt_money(h.sales)
            ),
        );
    }
    out
}

pub fn format_forecast(forecast: &[Prediction]) -> String {
    let mut out = String::from("Forecast:\n");
    for p in forecast {
        push_line(&mut out, format!("{:<12} {:>14}", p.date, fmt_money(p.predicted)));
    }
    out
}

fn format_bar_table(title: &str, rows: &[(&str, f64)]) -> String {
    let mut out = format!("{title}\n");
    if rows.is_empty() {
        out.push_str("(none)\n");
        return out;
    }

    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);
    for (name, value) in rows {
        let len = if max > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round().max(0.0) as usize
        } else {
            0
        };
        push_line(
            &mut out,
            format!("{:<12} {:>14} {}", truncate(name, 12), fmt_money(*value), "#".repeat(len)),
        );
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Whole dollars with thousands separators, e.g. `$1,234,567`.
pub fn fmt_money(v: f64) -> String {
    let rounded = v.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
