//! Tracing setup.
//!
//! Events go to stderr so report output on stdout stays clean. The filter is
//! read from `SALESCAST_LOG`, then `RUST_LOG`, and defaults to `warn`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "SALESCAST_LOG";
const DEFAULT_FILTER: &str = "warn";

pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(filter_from_env())
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

fn filter_from_env() -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}
