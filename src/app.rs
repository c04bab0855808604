//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the sales file
//! - runs the mock generator or the remote training call
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;

use crate::cli::{Command, DashArgs, PlotArgs, PredictArgs, ShowArgs, TrainArgs};
use crate::dashboard::Dashboard;
use crate::data::ForecastClient;
use crate::domain::{RunConfig, TrainOptions};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `salescast` binary.
pub fn run() -> Result<(), AppError> {
    // We want `salescast` and `salescast -f sales.csv` to behave like
    // `salescast dash ...`. Clap requires a subcommand name, so argv is
    // rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Train(args) => handle_train(args),
        Command::Show(args) => handle_show(args),
        Command::Dash(args) => handle_dash(args),
    }
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_local(&config)?;

    println!("{}", crate::report::format_ingest_summary(&run.ingest));
    print_dashboard(&run.dashboard, &args.plot);

    // Optional exports.
    if let Some(path) = &config.export_predictions {
        crate::io::export::write_predictions_csv(path, &run.rows)?;
        println!("Wrote predictions: {}", path.display());
    }
    if let Some(path) = &config.save_dashboard {
        crate::io::dashboard_file::write_dashboard_json(path, &run.dashboard, Some(&run.ingest.source_name))?;
        println!("Saved dashboard: {}", path.display());
    }

    Ok(())
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let options = train_options(&args);
    crate::data::service::validate(&options)?;

    let client = ForecastClient::from_env(args.service.api_url.as_deref())?;
    let summary = pipeline::local_summary(&args.file);

    println!("=== salescast - Remote Training ===");
    println!("Service: {}", client.base_url());
    println!(
        "File: {} | scope: {} | horizon: {}\n",
        args.file.display(),
        options.scope.display_name(),
        options.horizon
    );

    let dashboard = pipeline::run_remote(&client, &args.file, &options, summary)?;
    print_dashboard(&dashboard, &args.plot);

    if let Some(path) = &args.save {
        let source_file = args.file.file_name().map(|n| n.to_string_lossy().into_owned());
        crate::io::dashboard_file::write_dashboard_json(path, &dashboard, source_file.as_deref())?;
        println!("Saved dashboard: {}", path.display());
    }

    Ok(())
}

fn handle_show(args: ShowArgs) -> Result<(), AppError> {
    let saved = crate::io::dashboard_file::read_dashboard_json(&args.dashboard)?;

    println!("=== salescast - Saved Dashboard ===");
    println!(
        "File: {} | generated: {}\n",
        saved.source_file.as_deref().unwrap_or("-"),
        saved.generated
    );
    print_dashboard(&saved.dashboard, &args.plot);
    Ok(())
}

fn handle_dash(args: DashArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

fn print_dashboard(dashboard: &Dashboard, plot: &PlotArgs) {
    println!("{}", crate::report::format_dashboard(dashboard));
    if plot.enabled() {
        let chart = crate::plot::render_sales_plot(dashboard.history(), &dashboard.forecast, plot.width, plot.height);
        println!("{chart}");
    }
}

pub fn run_config_from_args(args: &PredictArgs) -> RunConfig {
    RunConfig {
        csv_path: args.file.clone(),
        seed: args.seed,
        store_limit: args.stores,
        dept_limit: args.depts,
        export_predictions: args.export.clone(),
        save_dashboard: args.save.clone(),
    }
}

fn train_options(args: &TrainArgs) -> TrainOptions {
    TrainOptions::for_scope(
        args.service.scope,
        args.service.store_id,
        args.service.dept_id,
        args.service.horizon,
    )
}

/// Rewrite argv so `salescast` defaults to `salescast dash`.
///
/// Rules:
/// - `salescast`                       -> `salescast dash`
/// - `salescast -f sales.csv ...`      -> `salescast dash -f sales.csv ...`
/// - `salescast --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("dash".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    // If the first token is a flag, treat it as "dash flags".
    if arg1.starts_with('-') {
        argv.insert(1, "dash".to_string());
    }

    argv
}
