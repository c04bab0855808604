//! CSV ingest and coercion.
//!
//! This module turns an uploaded weekly-sales CSV into typed `SalesRecord`s in
//! two steps:
//!
//! 1. `parse_records` zips every data row with the header row, producing
//!    loosely-typed records keyed by header name (all values are strings).
//! 2. `coerce_record` picks the known columns out of a raw record and converts
//!    them, reporting a row-level error when a value cannot be used.
//!
//! Parsing goes through the `csv` crate, so quoted fields and embedded commas
//! are handled; rows with missing or extra columns are accepted.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use chrono::NaiveDate;
use csv::StringRecord;

use crate::domain::{DatasetSummary, SalesRecord};
use crate::error::AppError;

/// A data row keyed by header name, exactly as found in the file.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// 1-based line number in the source text.
    pub line: usize,
    pub fields: HashMap<String, String>,
}

impl RawRecord {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.fields.get(header).map(String::as_str)
    }
}

/// Header row plus all non-blank data rows.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
    pub row_errors: Vec<RowError>,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: typed records + summary + row errors.
#[derive(Debug, Clone)]
pub struct IngestedSales {
    /// File name shown in reports and saved dashboards.
    pub source_name: String,
    pub records: Vec<SalesRecord>,
    pub summary: DatasetSummary,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

/// Header names resolved for each known column.
#[derive(Debug, Clone)]
struct SalesColumns {
    store: Option<String>,
    dept: Option<String>,
    date: String,
    sales: String,
    holiday: Option<String>,
}

const STORE_NAMES: [&str; 2] = ["store", "storeid"];
const DEPT_NAMES: [&str; 4] = ["dept", "department", "deptid", "departmentid"];
const DATE_NAMES: [&str; 2] = ["date", "weekdate"];
const SALES_NAMES: [&str; 2] = ["weeklysales", "sales"];
const HOLIDAY_NAMES: [&str; 2] = ["isholiday", "holiday"];

/// Split CSV text into header-keyed records.
///
/// The first non-blank row is the header. Blank rows are skipped, and a row
/// shorter than the header simply lacks the trailing keys.
pub fn parse_records(text: &str) -> Result<RawTable, AppError> {
    // Headers are taken by hand so leading blank lines can be skipped.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let mut table = RawTable::default();
    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                table.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if is_blank(&record) {
            continue;
        }

        if table.headers.is_empty() {
            table.headers = record
                .iter()
                .map(|h| h.trim_start_matches('\u{feff}').to_string())
                .collect();
            continue;
        }

        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let fields = table
            .headers
            .iter()
            .enumerate()
            .filter_map(|(idx, header)| record.get(idx).map(|v| (header.clone(), v.to_string())))
            .collect();

        table.records.push(RawRecord { line, fields });
    }

    Ok(table)
}

/// Read a sales CSV from disk and coerce it into typed records.
pub fn load_sales_file(path: &Path) -> Result<IngestedSales, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::usage(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let ingest = ingest_text(&text, source_name)?;
    tracing::info!(
        path = %path.display(),
        rows_read = ingest.rows_read,
        rows_used = ingest.rows_used,
        row_errors = ingest.row_errors.len(),
        "loaded sales file"
    );
    Ok(ingest)
}

/// Coerce already-loaded CSV text.
pub fn ingest_text(text: &str, source_name: impl Into<String>) -> Result<IngestedSales, AppError> {
    let table = parse_records(text)?;
    if table.headers.is_empty() {
        return Err(AppError::no_data("CSV file is empty (no header row)."));
    }

    let columns = resolve_columns(&table.headers)?;

    let mut records = Vec::with_capacity(table.records.len());
    let mut row_errors = table.row_errors;
    for raw in &table.records {
        match coerce_record(raw, &columns) {
            Ok(record) => records.push(record),
            Err(message) => row_errors.push(RowError {
                line: raw.line,
                message,
            }),
        }
    }

    let rows_read = table.records.len();
    let rows_used = records.len();
    if rows_used == 0 {
        return Err(AppError::no_data("No valid sales rows found in the CSV."));
    }

    let summary = summarize(&records);
    Ok(IngestedSales {
        source_name: source_name.into(),
        records,
        summary,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Dataset-level summary: counts, date range and average weekly sales.
pub fn summarize(records: &[SalesRecord]) -> DatasetSummary {
    let stores: BTreeSet<&str> = records
        .iter()
        .map(|r| r.store.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let departments: BTreeSet<&str> = records
        .iter()
        .map(|r| r.dept.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    let (date_min, date_max) = date_range(records);

    let avg_sales = if records.is_empty() {
        0.0
    } else {
        records.iter().map(|r| r.weekly_sales).sum::<f64>() / records.len() as f64
    };

    DatasetSummary {
        rows: records.len(),
        stores: stores.len(),
        departments: departments.len(),
        date_min,
        date_max,
        avg_sales,
    }
}

/// First and last calendar date, as `YYYY-MM-DD`.
///
/// Only when no date parses does this fall back to the lexical range of the
/// raw strings.
fn date_range(records: &[SalesRecord]) -> (Option<String>, Option<String>) {
    let parsed: BTreeSet<NaiveDate> = records.iter().filter_map(|r| parse_date(&r.date)).collect();
    if !parsed.is_empty() {
        let fmt = |d: &NaiveDate| d.format("%Y-%m-%d").to_string();
        return (parsed.first().map(fmt), parsed.last().map(fmt));
    }

    let raw: BTreeSet<&str> = records
        .iter()
        .map(|r| r.date.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    (
        raw.first().map(|d| d.to_string()),
        raw.last().map(|d| d.to_string()),
    )
}

fn resolve_columns(headers: &[String]) -> Result<SalesColumns, AppError> {
    let header_map: HashMap<String, &String> = headers
        .iter()
        .map(|h| (normalize_header_name(h), h))
        .collect();

    let date = find_column(&header_map, &DATE_NAMES)
        .ok_or_else(|| AppError::usage("Missing required column: `Date`"))?;
    let sales = find_column(&header_map, &SALES_NAMES)
        .ok_or_else(|| AppError::usage("Missing required column: `Weekly_Sales`"))?;

    Ok(SalesColumns {
        store: find_column(&header_map, &STORE_NAMES),
        dept: find_column(&header_map, &DEPT_NAMES),
        date,
        sales,
        holiday: find_column(&header_map, &HOLIDAY_NAMES),
    })
}

fn find_column(header_map: &HashMap<String, &String>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| header_map.get(*name).map(|h| (*h).clone()))
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. `Weekly_Sales`, `weekly sales` and `WeeklySales` are all
    // treated as the same column.
    name.trim()
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !matches!(c, '_' | ' ' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn coerce_record(raw: &RawRecord, columns: &SalesColumns) -> Result<SalesRecord, String> {
    let text = |col: &Option<String>| -> String {
        col.as_deref()
            .and_then(|c| raw.get(c))
            .unwrap_or_default()
            .to_string()
    };

    let sales_raw = raw
        .get(&columns.sales)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing `{}` value.", columns.sales))?;
    let weekly_sales = parse_f64(sales_raw)
        .ok_or_else(|| format!("Invalid `{}` value '{sales_raw}'.", columns.sales))?;

    let holiday_raw = text(&columns.holiday);
    let is_holiday = parse_bool(&holiday_raw).ok_or_else(|| {
        format!(
            "Invalid `{}` value '{holiday_raw}'.",
            columns.holiday.as_deref().unwrap_or("IsHoliday")
        )
    })?;

    Ok(SalesRecord {
        store: text(&columns.store),
        dept: text(&columns.dept),
        date: raw.get(&columns.date).unwrap_or_default().to_string(),
        weekly_sales,
        is_holiday,
    })
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "f" | "0" | "no" | "n" => Some(false),
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        _ => None,
    }
}

/// Parse a sales date.
///
/// ISO dates (`YYYY-MM-DD`) are the norm, but spreadsheet exports often use
/// `DD/MM/YYYY` or `DD-MM-YYYY`. A small fixed set of formats is accepted so
/// parsing stays deterministic.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s.trim(), fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Store,Dept,Date,Weekly_Sales,IsHoliday\n\
        1,1,2010-02-05,24924.50,FALSE\n\
        1,2,2010-02-05,50605.27,FALSE\n\
        2,1,2010-02-12,46039.49,TRUE\n";

    #[test]
    fn record_count_is_line_count_minus_header() {
        let table = parse_records(SAMPLE).unwrap();
        let lines = SAMPLE.lines().filter(|l| !l.trim().is_empty()).count();
        assert_eq!(table.records.len(), lines - 1);
        assert_eq!(table.headers, vec!["Store", "Dept", "Date", "Weekly_Sales", "IsHoliday"]);
        assert_eq!(table.records[0].get("Weekly_Sales"), Some("24924.50"));
        assert_eq!(table.records[2].line, 4);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let text = "Store,Date,Weekly_Sales\n\n1,2010-02-05,10\n   \n2,2010-02-05,20\n";
        let table = parse_records(text).unwrap();
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn header_is_the_first_non_blank_row() {
        let text = "   \n\nStore,Dept,Date,Weekly_Sales,IsHoliday\n1,1,2010-02-05,10,FALSE\n";
        let table = parse_records(text).unwrap();
        assert_eq!(table.headers, vec!["Store", "Dept", "Date", "Weekly_Sales", "IsHoliday"]);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].line, 4);

        let ingest = ingest_text(text, "padded.csv").unwrap();
        assert_eq!(ingest.rows_used, 1);
        assert_eq!(ingest.records[0].weekly_sales, 10.0);
    }

    #[test]
    fn only_blank_lines_means_no_header() {
        let table = parse_records("  \n\n \n").unwrap();
        assert!(table.headers.is_empty());
        assert_eq!(ingest_text("  \n", "blank.csv").unwrap_err().exit_code(), 3);
    }

    #[test]
    fn date_range_follows_the_calendar_not_the_text() {
        let text = "Store,Dept,Date,Weekly_Sales,IsHoliday\n\
            1,1,31/12/2010,10,FALSE\n\
            1,1,05/02/2011,10,FALSE\n\
            1,1,15/06/2010,10,FALSE\n";
        let ingest = ingest_text(text, "dmy.csv").unwrap();
        assert_eq!(ingest.summary.date_min.as_deref(), Some("2010-06-15"));
        assert_eq!(ingest.summary.date_max.as_deref(), Some("2011-02-05"));
    }

    #[test]
    fn unparseable_dates_fall_back_to_text_order() {
        let text = "Date,Weekly_Sales\nweek b,1\nweek a,2\n";
        let ingest = ingest_text(text, "labels.csv").unwrap();
        assert_eq!(ingest.summary.date_min.as_deref(), Some("week a"));
        assert_eq!(ingest.summary.date_max.as_deref(), Some("week b"));
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let text = "Store,Date,Weekly_Sales,Note\n1,2010-02-05,10,\"big, sale\"\n";
        let table = parse_records(text).unwrap();
        assert_eq!(table.records[0].get("Note"), Some("big, sale"));
        assert_eq!(table.records[0].get("Weekly_Sales"), Some("10"));
    }

    #[test]
    fn short_rows_lack_trailing_keys() {
        let text = "Store,Date,Weekly_Sales,IsHoliday\n1,2010-02-05,10\n";
        let table = parse_records(text).unwrap();
        assert_eq!(table.records[0].get("IsHoliday"), None);

        let ingest = ingest_text(text, "short.csv").unwrap();
        assert!(!ingest.records[0].is_holiday);
    }

    #[test]
    fn empty_text_has_no_records() {
        let table = parse_records("").unwrap();
        assert!(table.headers.is_empty());
        assert!(table.records.is_empty());

        let err = ingest_text("", "empty.csv").unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn ingest_coerces_and_summarizes() {
        let ingest = ingest_text(SAMPLE, "train.csv").unwrap();
        assert_eq!(ingest.rows_read, 3);
        assert_eq!(ingest.rows_used, 3);
        assert!(ingest.row_errors.is_empty());

        let first = &ingest.records[0];
        assert_eq!(first.store, "1");
        assert_eq!(first.dept, "1");
        assert_eq!(first.date, "2010-02-05");
        assert!((first.weekly_sales - 24924.5).abs() < 1e-9);
        assert!(ingest.records[2].is_holiday);

        let s = &ingest.summary;
        assert_eq!(s.rows, 3);
        assert_eq!(s.stores, 2);
        assert_eq!(s.departments, 2);
        assert_eq!(s.date_min.as_deref(), Some("2010-02-05"));
        assert_eq!(s.date_max.as_deref(), Some("2010-02-12"));
    }

    #[test]
    fn header_matching_ignores_case_underscores_and_bom() {
        let text = "\u{feff}store,dept,date,weekly sales,isHoliday\n3,4,2011-01-07,99.5,1\n";
        let ingest = ingest_text(text, "lower.csv").unwrap();
        assert_eq!(ingest.records[0].store, "3");
        assert_eq!(ingest.records[0].weekly_sales, 99.5);
        assert!(ingest.records[0].is_holiday);
    }

    #[test]
    fn missing_sales_column_is_a_usage_error() {
        let err = ingest_text("Store,Date\n1,2010-02-05\n", "bad.csv").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("Weekly_Sales"));
    }

    #[test]
    fn bad_rows_are_reported_with_line_numbers() {
        let text = "Store,Date,Weekly_Sales\n1,2010-02-05,10\n1,2010-02-12,abc\n";
        let ingest = ingest_text(text, "partial.csv").unwrap();
        assert_eq!(ingest.rows_read, 2);
        assert_eq!(ingest.rows_used, 1);
        assert_eq!(ingest.row_errors.len(), 1);
        assert_eq!(ingest.row_errors[0].line, 3);
        assert!(ingest.row_errors[0].message.contains("abc"));
    }

    #[test]
    fn load_sales_file_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("salescast_ingest_{}.csv", std::process::id()));
        std::fs::write(&path, SAMPLE).unwrap();
        let ingest = load_sales_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(ingest.rows_used, 3);
        assert!(ingest.source_name.starts_with("salescast_ingest_"));
    }

    #[test]
    fn parse_date_accepts_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2010, 2, 5).unwrap();
        assert_eq!(parse_date("2010-02-05"), Some(expected));
        assert_eq!(parse_date("05/02/2010"), Some(expected));
        assert_eq!(parse_date("not a date"), None);
    }
}
