use std::env;
use std::fs;
use std::process::ExitCode;

use log::{LevelFilter, info};

use parvus::Engine;

/// Log level comes from PARVUS_LOG (error/warn/info/debug/trace), off by
/// default so diagnostics never mix into script output.
fn log_level() -> LevelFilter {
    match env::var("PARVUS_LOG").as_deref() {
        Ok("error") => LevelFilter::Error,
        Ok("warn") => LevelFilter::Warn,
        Ok("info") => LevelFilter::Info,
        Ok("debug") => LevelFilter::Debug,
        Ok("trace") => LevelFilter::Trace,
        _ => LevelFilter::Off,
    }
}

fn main() -> ExitCode {
    if let Err(e) = parvus::logger::init(log_level()) {
        eprintln!("Failed to initialize logger: {e}");
        return ExitCode::FAILURE;
    }

    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "parvus".to_string());
    let (Some(path), None) = (args.next(), args.next()) else {
        eprintln!("Usage: {program} <script.js>");
        return ExitCode::from(2);
    };

    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let start = std::time::Instant::now();
    let mut engine = Engine::new();
    match engine.eval(&source) {
        Ok(_) => {
            info!(target: "engine", "Script finished in {:?}", start.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}
