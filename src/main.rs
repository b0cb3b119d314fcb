use tries::cli::Args;
use tries::config::SessionConfig;
use tries::domain::SelectionResult;
use tries::run_session;
use tries::script::{commands_for, render_script};

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    init_logging();

    // Convert to config
    let config: SessionConfig = args.into();

    if let Err(e) = fs::create_dir_all(&config.base_path) {
        tracing::warn!(base = %config.base_path.display(), "cannot create base directory: {}", e);
    }

    let result = match run_session(&config) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            SelectionResult::Cancelled
        }
    };
    tracing::info!(?result, "session finished");

    match emit(&config, &result) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr, filtered by `TRY_LOG`. Off unless asked for, so the
/// picker's own stderr drawing stays intact.
fn init_logging() {
    let filter = EnvFilter::try_from_env("TRY_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Prints the outcome on stdout: JSON with `--json`, otherwise a shell script.
fn emit(config: &SessionConfig, result: &SelectionResult) -> io::Result<ExitCode> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if config.json {
        let json = serde_json::to_string(result).map_err(io::Error::other)?;
        writeln!(out, "{}", json)?;
    } else if result.is_cancelled() {
        writeln!(out, "Cancelled.")?;
    } else {
        let cwd = std::env::current_dir().unwrap_or_default();
        write!(out, "{}", render_script(&commands_for(result, &cwd)))?;
    }
    out.flush()?;

    Ok(if result.is_cancelled() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
