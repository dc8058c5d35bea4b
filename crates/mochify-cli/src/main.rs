//! Mochify CLI: run mocha test bundles in headless Chromium
//!
//! ## Usage
//!
//! ```bash
//! mochify                          # run test/**/*.js with the spec reporter
//! mochify -R json test/unit/*.js   # JSON results on stdout
//! mochify --bundle "esbuild --bundle --sourcemap=inline" test/*.js
//! ```

use clap::Parser;
use mochify_cli::{execute, logging, Cli, CliConfig, CliError, CliResult};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<i32> {
    let cli = Cli::parse();
    let config = CliConfig::resolve(&cli)?;
    logging::init_logging(config.verbosity, config.color.should_color());

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create async runtime: {e}")))?;
    rt.block_on(execute(&config))
}
