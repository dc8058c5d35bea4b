//! CLI argument definitions using clap

use clap::{Parser, ValueEnum};
use mochify::ReporterKind;
use std::path::PathBuf;

use crate::config::ColorChoice;

/// Mochify: run mocha test bundles in headless Chromium
#[derive(Parser, Debug)]
#[command(name = "mochify")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Spec file patterns, or `-` to read the bundle from stdin
    #[arg(value_name = "SPEC")]
    pub spec: Vec<String>,

    /// Reporter printing the results
    #[arg(short = 'R', long, value_enum)]
    pub reporter: Option<ReporterArg>,

    /// Mocha interface (bdd, tdd, qunit, exports)
    #[arg(short = 'U', long)]
    pub ui: Option<String>,

    /// Per-test timeout in milliseconds
    #[arg(short, long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Bundler command; spec files are appended and stdout is the bundle
    #[arg(long, value_name = "CMD")]
    pub bundle: Option<String>,

    /// Framework script injected before the agent (defaults to node_modules/mocha/mocha.js)
    #[arg(long, value_name = "PATH")]
    pub framework: Option<PathBuf>,

    /// Page to open instead of about:blank
    #[arg(long)]
    pub url: Option<String>,

    /// Chromium executable
    #[arg(long, value_name = "PATH", env = "MOCHIFY_CHROMIUM")]
    pub chromium_path: Option<String>,

    /// Disable the Chromium sandbox (containers, CI)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Config file (defaults to .mochifyrc.json when present)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write collected coverage data to this file
    #[arg(long, value_name = "FILE")]
    pub coverage_out: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress log output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorArg,
}

/// Reporter argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReporterArg {
    /// Hierarchical suites and tests
    Spec,
    /// One character per test
    Dot,
    /// Single JSON document
    Json,
}

impl From<ReporterArg> for ReporterKind {
    fn from(arg: ReporterArg) -> Self {
        match arg {
            ReporterArg::Spec => Self::Spec,
            ReporterArg::Dot => Self::Dot,
            ReporterArg::Json => Self::Json,
        }
    }
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}
