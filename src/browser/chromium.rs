//! Headless Chromium backend (cargo feature `chromium`)
//!
//! Drives Chrome/Chromium over the DevTools protocol with chromiumoxide.

use crate::browser::{Browser, BrowserError, BrowserLauncher, Navigation, Page};
use crate::config::BrowserConfig;
use async_trait::async_trait;
use chromiumoxide::browser::BrowserConfig as CdpBrowserConfig;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use url::Url;

/// Polling interval while waiting for `document.readyState`
const READY_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Upper bound on readiness polling
const READY_MAX_WAIT: Duration = Duration::from_secs(10);

const LINKS_SCRIPT: &str = r#"
Array.from(document.querySelectorAll('a[href]'))
  .filter(a => !a.hasAttribute('download'))
  .map(a => a.href)
  .filter(href => href.startsWith('http://') || href.startsWith('https://'))
"#;

/// Launches Chrome/Chromium with the configured executable and head mode
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    config: BrowserConfig,
    timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(config: BrowserConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }

    fn cdp_config(&self) -> Result<CdpBrowserConfig, BrowserError> {
        let mut builder = CdpBrowserConfig::builder()
            .request_timeout(self.timeout)
            .window_size(1280, 1024)
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio");

        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }

        builder.build().map_err(BrowserError::Launch)
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn Browser>, BrowserError> {
        let config = self.cdp_config()?;

        tracing::info!("Launching Chromium (headless: {})", self.config.headless);
        let (browser, mut handler) = chromiumoxide::Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("Browser handler event error: {}", e);
                }
            }
            tracing::debug!("Browser handler task completed");
        });

        Ok(Box::new(ChromiumBrowser {
            browser,
            handler: Some(handler_task),
        }))
    }
}

/// A running Chromium process
pub struct ChromiumBrowser {
    browser: chromiumoxide::Browser,
    handler: Option<JoinHandle<()>>,
}

#[async_trait]
impl Browser for ChromiumBrowser {
    async fn new_page(&self) -> Result<Box<dyn Page>, BrowserError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowserError::Closed(e.to_string()))?;
        Ok(Box::new(ChromiumPage { page }))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| BrowserError::Closed(e.to_string()));

        if let Err(e) = self.browser.wait().await {
            tracing::debug!("Waiting for browser exit failed: {}", e);
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        closed
    }
}

/// One Chromium tab
pub struct ChromiumPage {
    page: chromiumoxide::Page,
}

impl ChromiumPage {
    async fn ready_state(&self) -> Option<String> {
        self.page
            .evaluate("document.readyState")
            .await
            .ok()
            .and_then(|result| result.into_value::<String>().ok())
    }
}

#[async_trait]
impl Page for ChromiumPage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<Navigation, BrowserError> {
        tracing::debug!("Navigating to {}", url);

        let navigated = tokio::time::timeout(timeout, async {
            self.page.goto(url).await?;
            self.page.wait_for_navigation().await?;
            self.page.url().await
        })
        .await;

        let current = match navigated {
            Ok(Ok(current)) => current,
            Ok(Err(e)) => return Err(BrowserError::navigation(url, e.to_string())),
            Err(_) => {
                return Err(BrowserError::Timeout {
                    url: url.to_string(),
                })
            }
        };

        let final_url = current
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .or_else(|| Url::parse(url).ok())
            .ok_or_else(|| BrowserError::navigation(url, "page has no URL after navigation"))?;

        Ok(Navigation {
            final_url,
            status: None,
        })
    }

    async fn wait_for_stable_load(&mut self) -> Result<(), BrowserError> {
        let started = std::time::Instant::now();
        while started.elapsed() < READY_MAX_WAIT {
            if self.ready_state().await.as_deref() == Some("complete") {
                return Ok(());
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        tracing::debug!("document.readyState not complete after {:?}", READY_MAX_WAIT);
        Ok(())
    }

    async fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let params = EvaluateParams::builder()
            .expression(script)
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Evaluation)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;

        Ok(result
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn extract_links(&mut self) -> Result<Vec<String>, BrowserError> {
        let value = self.evaluate(LINKS_SCRIPT).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| BrowserError::Closed(e.to_string()))
    }
}
