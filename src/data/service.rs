//! HTTP client for the external forecasting service.
//!
//! The service owns its response schemas; this client only uploads the sales
//! file with the requested scope and decodes whatever JSON comes back.
//! There are no retries: a failed call surfaces as an `AppError` whose message
//! is meant to be shown to the user as-is.

use std::path::Path;
use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::domain::{ForecastScope, ResidualSeries, ScatterPoint, TrainOptions, TrainResult, WeeklyAggregate};
use crate::error::AppError;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

const ENV_API_URL: &str = "SALESCAST_API_URL";
const ENV_TIMEOUT: &str = "SALESCAST_TIMEOUT_SECS";

/// Connection settings for the forecasting service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ServiceConfig {
    /// Resolve settings from the environment (`.env` honoured).
    ///
    /// `override_url` (the `--api-url` flag) wins over `SALESCAST_API_URL`.
    pub fn from_env(override_url: Option<&str>) -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let base_url = match override_url {
            Some(url) => url.to_string(),
            None => std::env::var(ENV_API_URL).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = normalize_base_url(&base_url)?;

        let timeout = match std::env::var(ENV_TIMEOUT) {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| {
                    AppError::usage(format!("Invalid {ENV_TIMEOUT} '{raw}': expected whole seconds."))
                })?;
                Duration::from_secs(secs)
            }
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self { base_url, timeout })
    }
}

fn normalize_base_url(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(AppError::usage(format!(
            "Invalid forecasting service URL '{raw}': expected http:// or https://."
        )));
    }
    Ok(trimmed.to_string())
}

/// Check the training options before any request is issued.
pub fn validate(options: &TrainOptions) -> Result<(), AppError> {
    match options.scope {
        ForecastScope::Store if options.store_id.is_none() => Err(AppError::usage("Please enter a store id.")),
        ForecastScope::Department if options.dept_id.is_none() => {
            Err(AppError::usage("Please enter a department id."))
        }
        _ if options.horizon == 0 => Err(AppError::usage("Forecast horizon must be > 0.")),
        _ => Ok(()),
    }
}

/// Form fields sent alongside the uploaded file, in wire order.
pub fn form_fields(options: &TrainOptions) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("scope", options.scope.as_str().to_string()),
        ("horizon", options.horizon.to_string()),
    ];
    if let Some(id) = options.store_id {
        fields.push(("store_id", id.to_string()));
    }
    if let Some(id) = options.dept_id {
        fields.push(("dept_id", id.to_string()));
    }
    fields
}

pub struct ForecastClient {
    client: Client,
    config: ServiceConfig,
}

impl ForecastClient {
    pub fn new(config: ServiceConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::runtime(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    pub fn from_env(override_url: Option<&str>) -> Result<Self, AppError> {
        Self::new(ServiceConfig::from_env(override_url)?)
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url)
    }

    /// Upload a sales file and train with the given scope.
    pub fn train(&self, path: &Path, options: &TrainOptions) -> Result<TrainResult, AppError> {
        validate(options)?;

        let bytes = std::fs::read(path)
            .map_err(|e| AppError::usage(format!("Failed to read '{}': {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sales.csv".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/csv")
            .map_err(|e| AppError::runtime(format!("Failed to build upload: {e}")))?;
        let form = form_fields(options)
            .into_iter()
            .fold(Form::new().part("file", part), |form, (name, value)| form.text(name, value));

        let url = self.url("train");
        tracing::info!(%url, scope = options.scope.as_str(), horizon = options.horizon, "training");

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| AppError::runtime(format!("Training request failed: {e}")))?;

        read_json(resp, "Training failed")
    }

    /// Re-fetch the results of the most recent training run.
    pub fn fetch_train_results(&self) -> Result<TrainResult, AppError> {
        let url = self.url("train");
        tracing::info!(%url, "fetching last training results");
        let resp = self
            .client
            .post(&url)
            .send()
            .map_err(|e| AppError::runtime(format!("Training request failed: {e}")))?;
        read_json(resp, "Training failed")
    }

    /// Residual diagnostics for one store/department series.
    pub fn fetch_residuals(&self, store: u32, dept: u32) -> Result<ResidualSeries, AppError> {
        self.get_json("residuals", &series_query(Some(store), Some(dept)), "Failed to fetch residuals")
    }

    /// Actual vs predicted scatter points.
    pub fn fetch_scatter(&self, store: Option<u32>, dept: Option<u32>) -> Result<Vec<ScatterPoint>, AppError> {
        self.get_json("scatter", &series_query(store, dept), "Failed to fetch scatter data")
    }

    /// Weekly sales totals by store and/or department.
    pub fn fetch_weekly(&self, store: Option<u32>, dept: Option<u32>) -> Result<Vec<WeeklyAggregate>, AppError> {
        self.get_json("weekly", &series_query(store, dept), "Failed to fetch weekly sales")
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        fallback: &str,
    ) -> Result<T, AppError> {
        let url = self.url(path);
        tracing::debug!(%url, ?query, "GET");
        let resp = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| AppError::runtime(format!("{fallback}: {e}")))?;
        read_json(resp, fallback)
    }
}

fn series_query(store: Option<u32>, dept: Option<u32>) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(store) = store {
        query.push(("store", store.to_string()));
    }
    if let Some(dept) = dept {
        query.push(("dept", dept.to_string()));
    }
    query
}

/// Decode a JSON body, or turn a non-2xx response into an error.
///
/// The error message is the response body when it has one, else `fallback`.
fn read_json<T: DeserializeOwned>(resp: Response, fallback: &str) -> Result<T, AppError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        tracing::debug!(%status, "forecasting service returned an error");
        return Err(AppError::runtime(error_message(&body, fallback)));
    }

    resp.json::<T>()
        .map_err(|e| AppError::runtime(format!("Failed to parse service response: {e}")))
}

fn error_message(body: &str, fallback: &str) -> String {
    let body = body.trim();
    if body.is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Answer exactly one HTTP request with a canned response; returns the base URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request_complete(&request) {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            let response = format!(
                "{status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).ok();
        });
        format!("http://{addr}")
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") else {
            return false;
        };
        let head = String::from_utf8_lossy(&request[..end]).to_ascii_lowercase();
        let length = head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            if key.trim() == "content-length" { value.trim().parse::<usize>().ok() } else { None }
        });
        match length {
            Some(n) => request.len() >= end + 4 + n,
            None => !head.contains("chunked"),
        }
    }

    fn client_for(base_url: String) -> ForecastClient {
        ForecastClient::new(ServiceConfig {
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn upload_file(tag: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("salescast_{tag}_{}.csv", std::process::id()));
        std::fs::write(&path, "Store,Date,Weekly_Sales\n1,2010-02-05,10\n").unwrap();
        path
    }

    #[test]
    fn store_scope_requires_store_id() {
        let options = TrainOptions {
            scope: ForecastScope::Store,
            ..TrainOptions::default()
        };
        let err = validate(&options).unwrap_err();
        assert_eq!(err.message(), "Please enter a store id.");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn department_scope_requires_dept_id() {
        let options = TrainOptions {
            scope: ForecastScope::Department,
            store_id: Some(1),
            ..TrainOptions::default()
        };
        assert_eq!(validate(&options).unwrap_err().message(), "Please enter a department id.");

        let ok = TrainOptions {
            scope: ForecastScope::Department,
            dept_id: Some(3),
            ..TrainOptions::default()
        };
        assert!(validate(&ok).is_ok());
    }

    #[test]
    fn form_fields_include_ids_only_when_set() {
        let options = TrainOptions {
            scope: ForecastScope::Store,
            store_id: Some(4),
            dept_id: None,
            horizon: 12,
        };
        assert_eq!(
            form_fields(&options),
            vec![
                ("scope", "store".to_string()),
                ("horizon", "12".to_string()),
                ("store_id", "4".to_string()),
            ]
        );
    }

    #[test]
    fn base_url_is_normalized() {
        assert_eq!(normalize_base_url("http://host:8000/").unwrap(), "http://host:8000");
        assert!(normalize_base_url("host:8000").is_err());
    }

    #[test]
    fn error_message_prefers_body_text() {
        assert_eq!(error_message("  ", "Training failed"), "Training failed");
        assert_eq!(error_message("bad csv\n", "Training failed"), "bad csv");
    }

    #[test]
    fn invalid_options_fail_before_any_request() {
        // The file does not exist: validation must reject first.
        let client = ForecastClient::new(ServiceConfig::default()).unwrap();
        let options = TrainOptions {
            scope: ForecastScope::Store,
            ..TrainOptions::default()
        };
        let err = client.train(Path::new("/nonexistent/sales.csv"), &options).unwrap_err();
        assert_eq!(err.message(), "Please enter a store id.");
    }

    #[test]
    fn unreachable_service_surfaces_runtime_error() {
        let path = std::env::temp_dir().join(format!("salescast_upload_{}.csv", std::process::id()));
        std::fs::write(&path, "Store,Date,Weekly_Sales\n1,2010-02-05,10\n").unwrap();

        let config = ServiceConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(5),
        };
        let client = ForecastClient::new(config).unwrap();
        let err = client.train(&path, &TrainOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.exit_code(), 4);
        assert!(err.message().starts_with("Training request failed"));
    }

    #[test]
    fn read_endpoints_report_their_own_failure() {
        let config = ServiceConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(5),
        };
        let client = ForecastClient::new(config).unwrap();

        let err = client.fetch_train_results().unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(err.message().starts_with("Training request failed"));
        assert!(client.fetch_scatter(Some(1), None).unwrap_err().message().starts_with("Failed to fetch scatter data"));
        assert!(client.fetch_weekly(None, None).unwrap_err().message().starts_with("Failed to fetch weekly sales"));
        assert!(client.fetch_residuals(1, 1).unwrap_err().message().starts_with("Failed to fetch residuals"));
    }

    #[test]
    fn server_error_body_becomes_the_message() {
        let path = upload_file("rejected");
        let client = client_for(serve_once("HTTP/1.1 500 Internal Server Error", "bad csv"));
        let err = client.train(&path, &TrainOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.message(), "bad csv");
    }

    #[test]
    fn server_error_without_body_says_training_failed() {
        let path = upload_file("empty_error");
        let client = client_for(serve_once("HTTP/1.1 500 Internal Server Error", ""));
        let err = client.train(&path, &TrainOptions::default()).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.message(), "Training failed");
    }

    #[test]
    fn weekly_rows_decode_from_service_json() {
        let client = client_for(serve_once(
            "HTTP/1.1 200 OK",
            r#"[{"date":"2010-02-05","weekly_sales":10.5},{"date":"2010-02-12","sales":7}]"#,
        ));
        let rows = client.fetch_weekly(Some(1), None).unwrap();
        assert_eq!(
            rows,
            vec![
                WeeklyAggregate { date: "2010-02-05".into(), sales: 10.5 },
                WeeklyAggregate { date: "2010-02-12".into(), sales: 7.0 },
            ]
        );
    }

    #[test]
    fn series_query_skips_missing_ids() {
        assert_eq!(series_query(None, Some(2)), vec![("dept", "2".to_string())]);
        assert!(series_query(None, None).is_empty());
    }
}
