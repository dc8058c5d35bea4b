//! Headless Chromium driver over the Chrome `DevTools` Protocol.
//!
//! With the `browser` feature, [`ChromiumDriver`] launches Chromium through
//! chromiumoxide and evaluates scripts in a single page. Without it, launching
//! fails with a message naming the feature.

use crate::result::{MochifyError, MochifyResult};

/// Browser configuration
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode
    pub headless: bool,
    /// Viewport width
    pub viewport_width: u32,
    /// Viewport height
    pub viewport_height: u32,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Page to open before injecting (None = `about:blank`)
    pub url: Option<String>,
    /// Sandbox mode (disable for containers)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            viewport_width: 800,
            viewport_height: 600,
            chromium_path: None,
            url: None,
            sandbox: true,
        }
    }
}

impl BrowserConfig {
    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set chromium path
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Open `url` instead of a blank page
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Disable sandbox (for containers/CI)
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// URL of the page the bundle runs in
    #[must_use]
    pub fn page_url(&self) -> &str {
        self.url.as_deref().unwrap_or("about:blank")
    }
}

#[cfg(feature = "browser")]
mod cdp {
    use super::{BrowserConfig, MochifyError, MochifyResult};
    use crate::driver::MochifyDriver;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
    use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
    use chromiumoxide::page::Page as CdpPage;
    use futures::StreamExt;
    use serde_json::Value;

    /// Driver owning a Chromium process and one page
    #[derive(Debug)]
    pub struct ChromiumDriver {
        browser: Option<CdpBrowser>,
        page: Option<CdpPage>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl ChromiumDriver {
        /// Launch Chromium and open the configured page
        ///
        /// # Errors
        ///
        /// Returns error if the browser cannot be launched or the page
        /// cannot be opened
        pub async fn launch(config: BrowserConfig) -> MochifyResult<Self> {
            let mut builder =
                CdpConfig::builder().window_size(config.viewport_width, config.viewport_height);

            if !config.headless {
                builder = builder.with_head();
            }

            if !config.sandbox {
                builder = builder.no_sandbox();
            }

            if let Some(ref path) = config.chromium_path {
                builder = builder.chrome_executable(path);
            }

            let cdp_config = builder
                .build()
                .map_err(|message| MochifyError::BrowserLaunchError { message })?;

            let (browser, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(|e| {
                MochifyError::BrowserLaunchError {
                    message: e.to_string(),
                }
            })?;

            let handle = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let url = config.page_url().to_string();
            let page = browser
                .new_page(url.as_str())
                .await
                .map_err(|e| MochifyError::NavigationError {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
            tracing::info!(url = %url, headless = config.headless, "browser page ready");

            Ok(Self {
                browser: Some(browser),
                page: Some(page),
                handle,
            })
        }
    }

    #[async_trait]
    impl MochifyDriver for ChromiumDriver {
        async fn evaluate(&mut self, script: &str) -> MochifyResult<Value> {
            let page = self.page.as_ref().ok_or(MochifyError::DriverClosed)?;
            let params = EvaluateParams::builder()
                .expression(script)
                .return_by_value(true)
                .build()
                .map_err(MochifyError::evaluation)?;
            let result = page
                .evaluate_expression(params)
                .await
                .map_err(|e| MochifyError::evaluation(e.to_string()))?;
            Ok(result.value().cloned().unwrap_or(Value::Null))
        }

        async fn end(&mut self) -> MochifyResult<()> {
            if let Some(page) = self.page.take() {
                if let Err(err) = page.close().await {
                    tracing::debug!(error = %err, "page already closed");
                }
            }
            if let Some(mut browser) = self.browser.take() {
                browser.close().await.map_err(|e| MochifyError::PageError {
                    message: e.to_string(),
                })?;
                if let Err(err) = browser.wait().await {
                    tracing::debug!(error = %err, "browser exit status unavailable");
                }
            }
            self.handle.abort();
            Ok(())
        }
    }
}

#[cfg(not(feature = "browser"))]
mod unavailable {
    use super::{BrowserConfig, MochifyError, MochifyResult};
    use crate::driver::MochifyDriver;
    use async_trait::async_trait;
    use serde_json::Value;

    /// Placeholder driver; launching requires the `browser` feature
    #[derive(Debug)]
    pub struct ChromiumDriver {
        _private: (),
    }

    impl ChromiumDriver {
        /// Always fails: browser support is compiled out
        ///
        /// # Errors
        ///
        /// Always returns [`MochifyError::BrowserLaunchError`]
        pub async fn launch(config: BrowserConfig) -> MochifyResult<Self> {
            let _ = config;
            Err(MochifyError::BrowserLaunchError {
                message: "Browser feature not enabled. Enable 'browser' feature for real CDP support."
                    .to_string(),
            })
        }
    }

    #[async_trait]
    impl MochifyDriver for ChromiumDriver {
        async fn evaluate(&mut self, _script: &str) -> MochifyResult<Value> {
            Err(MochifyError::DriverClosed)
        }

        async fn end(&mut self) -> MochifyResult<()> {
            Ok(())
        }
    }
}

#[cfg(feature = "browser")]
pub use cdp::ChromiumDriver;

#[cfg(not(feature = "browser"))]
pub use unavailable::ChromiumDriver;
