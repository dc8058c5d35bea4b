//! CLI configuration
//!
//! Values come from `.mochifyrc.json` (or `--config`) first, then command
//! line flags override them.

use crate::commands::Cli;
use crate::error::{CliError, CliResult};
use mochify::ReporterKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = ".mochifyrc.json";

/// Spec pattern used when neither the command line nor the config names one
pub const DEFAULT_SPEC: &str = "test/**/*.js";

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - errors only
    Quiet,
    /// Normal - warnings and errors
    #[default]
    Normal,
    /// Verbose - run progress
    Verbose,
    /// Debug - every drained batch
    Debug,
}

impl Verbosity {
    /// Derive the level from `-q` and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Default tracing filter directive
    #[must_use]
    pub const fn filter(self) -> &'static str {
        match self {
            Self::Quiet => "error",
            Self::Normal => "warn",
            Self::Verbose => "info",
            Self::Debug => "debug",
        }
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::colors_enabled(),
        }
    }
}

/// One pattern or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecPatterns {
    /// Single pattern
    One(String),
    /// Several patterns
    Many(Vec<String>),
}

impl SpecPatterns {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(pattern) => vec![pattern],
            Self::Many(patterns) => patterns,
        }
    }
}

/// Contents of a `.mochifyrc.json` file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
    /// Spec patterns
    pub spec: Option<SpecPatterns>,
    /// Reporter name
    pub reporter: Option<String>,
    /// Mocha interface
    pub ui: Option<String>,
    /// Per-test timeout in milliseconds
    pub timeout: Option<u64>,
    /// Bundler command
    pub bundle: Option<String>,
    /// Framework script path
    pub framework: Option<PathBuf>,
    /// Page URL
    pub url: Option<String>,
    /// Chromium executable
    pub chromium_path: Option<String>,
    /// Chromium sandbox
    pub sandbox: Option<bool>,
    /// Headless browser
    pub headless: Option<bool>,
    /// Coverage output file
    pub coverage_out: Option<PathBuf>,
}

impl FileConfig {
    /// Parse a config document
    pub fn parse(json: &str) -> CliResult<Self> {
        serde_json::from_str(json).map_err(|e| CliError::config(e.to_string()))
    }

    /// Load `path`, or `.mochifyrc.json` when no path is given.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => {
                tracing::debug!(path = %path.display(), "loaded config file");
                Self::parse(&json).map_err(|e| match e {
                    CliError::Config { message } => {
                        CliError::config(format!("{}: {message}", path.display()))
                    }
                    other => other,
                })
            }
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(CliError::config(format!("{}: {e}", path.display()))),
        }
    }
}

/// Resolved CLI configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
    /// Spec patterns (`-` reads the bundle from stdin)
    pub spec: Vec<String>,
    /// Reporter
    pub reporter: ReporterKind,
    /// Mocha interface
    pub ui: String,
    /// Per-test timeout in milliseconds
    pub timeout_ms: u64,
    /// Bundler command
    pub bundle: Option<String>,
    /// Framework script path
    pub framework: Option<PathBuf>,
    /// Page URL
    pub url: Option<String>,
    /// Chromium executable
    pub chromium_path: Option<String>,
    /// Chromium sandbox
    pub sandbox: bool,
    /// Headless browser
    pub headless: bool,
    /// Coverage output file
    pub coverage_out: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
            spec: vec![DEFAULT_SPEC.to_string()],
            reporter: ReporterKind::Spec,
            ui: "bdd".to_string(),
            timeout_ms: 2000,
            bundle: None,
            framework: None,
            url: None,
            chromium_path: None,
            sandbox: true,
            headless: true,
            coverage_out: None,
        }
    }
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }

    /// Set reporter
    #[must_use]
    pub const fn with_reporter(mut self, reporter: ReporterKind) -> Self {
        self.reporter = reporter;
        self
    }

    /// Set spec patterns
    #[must_use]
    pub fn with_spec(mut self, spec: Vec<String>) -> Self {
        self.spec = spec;
        self
    }

    /// Apply values from a config file
    pub fn merge_file(mut self, file: FileConfig) -> CliResult<Self> {
        if let Some(spec) = file.spec {
            self.spec = spec.into_vec();
        }
        if let Some(reporter) = file.reporter {
            self.reporter = reporter
                .parse()
                .map_err(|_| CliError::config(format!("unknown reporter {reporter:?}")))?;
        }
        if let Some(ui) = file.ui {
            self.ui = ui;
        }
        if let Some(timeout) = file.timeout {
            self.timeout_ms = timeout;
        }
        self.bundle = file.bundle.or(self.bundle);
        self.framework = file.framework.or(self.framework);
        self.url = file.url.or(self.url);
        self.chromium_path = file.chromium_path.or(self.chromium_path);
        if let Some(sandbox) = file.sandbox {
            self.sandbox = sandbox;
        }
        if let Some(headless) = file.headless {
            self.headless = headless;
        }
        self.coverage_out = file.coverage_out.or(self.coverage_out);
        Ok(self)
    }

    /// Apply command line flags; only flags that were given override
    #[must_use]
    pub fn merge_cli(mut self, cli: &Cli) -> Self {
        self.verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
        self.color = cli.color.into();
        if !cli.spec.is_empty() {
            self.spec.clone_from(&cli.spec);
        }
        if let Some(reporter) = cli.reporter {
            self.reporter = reporter.into();
        }
        if let Some(ref ui) = cli.ui {
            self.ui.clone_from(ui);
        }
        if let Some(timeout) = cli.timeout {
            self.timeout_ms = timeout;
        }
        if cli.bundle.is_some() {
            self.bundle.clone_from(&cli.bundle);
        }
        if cli.framework.is_some() {
            self.framework.clone_from(&cli.framework);
        }
        if cli.url.is_some() {
            self.url.clone_from(&cli.url);
        }
        if cli.chromium_path.is_some() {
            self.chromium_path.clone_from(&cli.chromium_path);
        }
        if cli.no_sandbox {
            self.sandbox = false;
        }
        if cli.headed {
            self.headless = false;
        }
        if cli.coverage_out.is_some() {
            self.coverage_out.clone_from(&cli.coverage_out);
        }
        self
    }

    /// Load the config file named by `cli` (or the default one) and apply flags
    pub fn resolve(cli: &Cli) -> CliResult<Self> {
        let file = FileConfig::load(cli.config.as_deref())?;
        Ok(Self::new().merge_file(file)?.merge_cli(cli))
    }
}
