//! FMT Align Binary
//!
//! Extracts FMT trajectory points from an event file, once at the nominal
//! alignment or once per offset of an alignment scan.
//!
//! # Usage
//! ```bash
//! FMT_ALIGN_CALIBRATION=geometry.toml fmt-align events.jsonl --var dZ --inter 0.2 0.1
//! ```

use fmt_align_cli::{parse_from, run, RunContext, USAGE};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_from(std::env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            if !e.use_stderr() {
                // --help
                return Ok(ExitCode::SUCCESS);
            }
            println!();
            print!("{}", USAGE);
            return Ok(ExitCode::FAILURE);
        }
    };

    let context = RunContext::from_env()?;
    let report = run(&args, &context)?;
    print!("{}", report.render(args.verbosity()));

    Ok(ExitCode::SUCCESS)
}
