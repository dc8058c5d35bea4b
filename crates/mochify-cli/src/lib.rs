//! Mochify CLI library
//!
//! Resolves spec patterns into a bundle, launches Chromium and runs the
//! bundle through [`mochify::run`], printing results with the selected
//! reporter.
//!
//! ## Usage
//!
//! ```bash
//! mochify                              # run test/**/*.js
//! mochify --reporter dot test/*.js     # dot reporter
//! mochify --bundle "browserify -d"     # bundle specs with a command
//! browserify test/*.js | mochify -     # read the bundle from stdin
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Error types are self-documenting

mod bundle;
mod commands;
mod config;
mod error;
pub mod logging;
mod runner;
mod spec;

pub use bundle::{resolve_bundle, split_args};
pub use commands::{Cli, ColorArg, ReporterArg};
pub use config::{
    CliConfig, ColorChoice, FileConfig, SpecPatterns, Verbosity, DEFAULT_CONFIG_FILE,
    DEFAULT_SPEC,
};
pub use error::{CliError, CliResult};
pub use runner::{
    browser_config, execute, load_bundle, load_framework, run_bundle, DEFAULT_FRAMEWORK,
};
pub use spec::{resolve_spec, Spec};
