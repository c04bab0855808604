use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    salescast::logging::init();

    match salescast::app::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(exit_code = err.exit_code(), "exiting with error");
            eprintln!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
