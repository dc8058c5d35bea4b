//! Drives one mochify run from a resolved [`CliConfig`].

use crate::bundle::resolve_bundle;
use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::spec::{resolve_spec, Spec};
use mochify::{
    run, BrowserConfig, ChromiumDriver, CoverageSlot, MochifyDriver, RunOptions, Runner,
    StdConsole,
};
use std::path::{Path, PathBuf};

/// Mocha build looked up when no framework script is configured
pub const DEFAULT_FRAMEWORK: &str = "node_modules/mocha/mocha.js";

/// Resolve specs and bundle, launch Chromium, run, and return the exit code
pub async fn execute(config: &CliConfig) -> CliResult<i32> {
    let bundle = load_bundle(config).await?;
    let framework = load_framework(config.framework.as_deref()).await?;

    let mut driver = ChromiumDriver::launch(browser_config(config)).await?;
    let result = run_bundle(config, &mut driver, &bundle, framework).await;
    let ended = driver.end().await;
    let code = result?;
    ended?;
    Ok(code)
}

/// Bundle for the configured specs.
///
/// A pattern list that matches nothing is an error unless a bundle command
/// is configured, since the command may produce the bundle on its own.
pub async fn load_bundle(config: &CliConfig) -> CliResult<String> {
    let spec = resolve_spec(&config.spec)?;
    if matches!(spec, Spec::Files(ref files) if files.is_empty()) && config.bundle.is_none() {
        return Err(CliError::bundle(format!(
            "no spec files match {}",
            config.spec.join(", ")
        )));
    }
    tracing::info!(files = spec.files().len(), "resolved specs");
    resolve_bundle(config.bundle.as_deref(), &spec).await
}

/// Framework source: the configured file, else [`DEFAULT_FRAMEWORK`] when present
pub async fn load_framework(path: Option<&Path>) -> CliResult<Option<String>> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_FRAMEWORK), false),
    };
    match tokio::fs::read_to_string(&path).await {
        Ok(source) => {
            tracing::debug!(path = %path.display(), "loaded framework script");
            Ok(Some(source))
        }
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("no framework script; the page must provide mocha");
            Ok(None)
        }
        Err(e) => Err(CliError::config(format!(
            "framework {}: {e}",
            path.display()
        ))),
    }
}

/// Browser settings derived from the CLI config
#[must_use]
pub fn browser_config(config: &CliConfig) -> BrowserConfig {
    let mut browser = BrowserConfig::default().with_headless(config.headless);
    if !config.sandbox {
        browser = browser.with_no_sandbox();
    }
    if let Some(ref path) = config.chromium_path {
        browser = browser.with_chromium_path(path);
    }
    if let Some(ref url) = config.url {
        browser = browser.with_url(url);
    }
    browser
}

/// Run `bundle` behind `driver` with the configured reporter, then write coverage
pub async fn run_bundle<D>(
    config: &CliConfig,
    driver: &mut D,
    bundle: &str,
    framework: Option<String>,
) -> CliResult<i32>
where
    D: MochifyDriver + ?Sized,
{
    let colors = config.color.should_color();
    let mut runner = Runner::new(config.reporter.build(std::io::stdout(), colors));
    let mut console = StdConsole::new().with_colors(colors);

    let coverage = CoverageSlot::global();
    let mut options = RunOptions::new()
        .with_ui(config.ui.clone())
        .with_timeout_ms(config.timeout_ms)
        .with_coverage(coverage.clone());
    if let Some(framework) = framework {
        options = options.with_framework_script(framework);
    }

    let code = run(driver, &mut runner, &mut console, bundle, &options).await?;
    tracing::info!(code, reporter = config.reporter.name(), "run finished");

    if let Some(ref path) = config.coverage_out {
        write_coverage(&coverage, path).await?;
    }
    Ok(code)
}

async fn write_coverage(coverage: &CoverageSlot, path: &Path) -> CliResult<()> {
    let Some(data) = coverage.take() else {
        tracing::warn!(path = %path.display(), "no coverage data was collected");
        return Ok(());
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, serde_json::to_vec(&data)?).await?;
    tracing::info!(path = %path.display(), "wrote coverage");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;
    use mochify::{Agent, AgentDriver, ReporterKind};
    use serde_json::json;
    use std::fs;

    fn quiet_config() -> CliConfig {
        CliConfig::new()
            .with_color(ColorChoice::Never)
            .with_reporter(ReporterKind::Json)
    }

    mod bundle_tests {
        use super::*;

        #[tokio::test]
        async fn test_no_matching_specs_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            let config =
                quiet_config().with_spec(vec![format!("{}/*.js", dir.path().display())]);
            let err = load_bundle(&config).await.unwrap_err();
            assert!(err.to_string().contains("no spec files match"));
        }

        #[tokio::test]
        async fn test_matching_specs_are_concatenated() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("one.js"), "it('one');").unwrap();
            fs::write(dir.path().join("two.js"), "it('two');").unwrap();
            let config =
                quiet_config().with_spec(vec![format!("{}/*.js", dir.path().display())]);
            assert_eq!(load_bundle(&config).await.unwrap(), "it('one');it('two');");
        }
    }

    mod framework_tests {
        use super::*;

        #[tokio::test]
        async fn test_explicit_framework_must_exist() {
            let dir = tempfile::tempdir().unwrap();
            let err = load_framework(Some(&dir.path().join("mocha.js")))
                .await
                .unwrap_err();
            assert!(matches!(err, CliError::Config { .. }));
        }

        #[tokio::test]
        async fn test_explicit_framework_is_read() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("mocha.js");
            fs::write(&path, "window.mocha = {};").unwrap();
            let source = load_framework(Some(&path)).await.unwrap();
            assert_eq!(source.as_deref(), Some("window.mocha = {};"));
        }
    }

    mod browser_config_tests {
        use super::*;

        #[test]
        fn test_flags_reach_browser_config() {
            let mut config = quiet_config();
            config.sandbox = false;
            config.headless = false;
            config.url = Some("http://localhost:8080/".into());
            config.chromium_path = Some("/usr/bin/chromium".into());
            let browser = browser_config(&config);
            assert!(!browser.sandbox);
            assert!(!browser.headless);
            assert_eq!(browser.page_url(), "http://localhost:8080/");
            assert_eq!(browser.chromium_path.as_deref(), Some("/usr/bin/chromium"));
        }
    }

    mod run_tests {
        use super::*;

        #[tokio::test]
        async fn test_run_bundle_injects_framework_and_writes_coverage() {
            let dir = tempfile::tempdir().unwrap();
            let out = dir.path().join("coverage/out.json");
            let mut config = quiet_config();
            config.coverage_out = Some(out.clone());
            config.ui = "tdd".into();

            let mut driver = AgentDriver::new(Agent::new(), |agent, bundle| {
                assert_eq!(bundle, "suite('x');");
                agent.finish(1, Some(json!({"lib.js": {"s": {"0": 1}}})));
            });
            let code = run_bundle(
                &config,
                &mut driver,
                "suite('x');",
                Some("window.mocha = {};".into()),
            )
            .await
            .unwrap();

            assert_eq!(code, 1);
            assert_eq!(driver.scripts()[0], "window.mocha = {};");
            assert!(driver.scripts()[1].contains("mocha.ui(\"tdd\")"));
            let written: serde_json::Value =
                serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
            assert_eq!(written["lib.js"]["s"]["0"], 1);
        }
    }
}
