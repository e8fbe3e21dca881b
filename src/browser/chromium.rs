use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt as _;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::BrowserSession;
use crate::config::Settings;

/// Chrome driven over CDP, reusing the persisted profile so the portal
/// session cookie survives between runs.
pub struct ChromiumSession {
    browser: Mutex<Browser>,
    page: Page,
    handler: Mutex<Option<JoinHandle<()>>>,
}

impl ChromiumSession {
    pub async fn launch(settings: &Settings) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&settings.scratch_dir).with_context(|| {
            format!("create scratch dir: {}", settings.scratch_dir.display())
        })?;
        let scratch_dir = std::path::absolute(&settings.scratch_dir)
            .with_context(|| format!("absolute scratch dir: {}", settings.scratch_dir.display()))?;

        let mut builder = BrowserConfig::builder()
            .user_data_dir(&settings.user_data_dir)
            .request_timeout(Duration::from_secs(settings.browser.request_timeout_secs))
            .arg("--start-maximized");
        if !settings.browser.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = &settings.browser.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder
            .build()
            .map_err(|err| anyhow::anyhow!("build browser config: {err}"))?;

        let (browser, mut handler) = Browser::launch(config).await.context("launch chrome")?;
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    tracing::debug!(?err, "cdp handler stopped");
                    break;
                }
            }
        });

        let download_behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::Allow)
            .download_path(scratch_dir.to_string_lossy().to_string())
            .build()
            .map_err(|err| anyhow::anyhow!("build download behavior: {err}"))?;
        browser
            .execute(download_behavior)
            .await
            .context("route downloads to scratch dir")?;

        let page = browser.new_page("about:blank").await.context("open tab")?;
        tracing::info!(
            profile = %settings.user_data_dir.display(),
            scratch = %scratch_dir.display(),
            "browser ready"
        );

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler: Mutex::new(Some(handler)),
        })
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&self, url: &str) -> anyhow::Result<()> {
        let response = self
            .page
            .execute(NavigateParams::new(url))
            .await
            .with_context(|| format!("Page.navigate {url}"))?;
        // Download links always end in net::ERR_ABORTED.
        if let Some(error_text) = response.result.error_text.as_deref() {
            tracing::debug!(url, error_text, "navigation reported an error");
        }
        Ok(())
    }

    async fn wait_until_loaded(&self, timeout: Duration) -> anyhow::Result<()> {
        match tokio::time::timeout(timeout, self.page.wait_for_navigation()).await {
            Ok(result) => {
                result.context("wait for navigation")?;
            }
            Err(_) => {
                tracing::debug!(?timeout, "page load wait timed out; continuing");
            }
        }
        Ok(())
    }

    async fn current_url(&self) -> anyhow::Result<Option<String>> {
        self.page.url().await.context("read current url")
    }

    async fn content(&self) -> anyhow::Result<String> {
        self.page.content().await.context("read page content")
    }

    async fn click(&self, selector: &str) -> anyhow::Result<bool> {
        let element = match self.page.find_element(selector).await {
            Ok(element) => element,
            Err(err) => {
                tracing::debug!(selector, ?err, "no element to click");
                return Ok(false);
            }
        };
        element
            .click()
            .await
            .with_context(|| format!("click: {selector}"))?;
        Ok(true)
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.browser
            .lock()
            .await
            .close()
            .await
            .context("close browser")?;
        if let Some(handler) = self.handler.lock().await.take() {
            handler.await.context("join cdp handler")?;
        }
        Ok(())
    }
}
