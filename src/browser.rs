use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

pub mod chromium;

pub use chromium::ChromiumSession;

/// The one browser tab the whole run drives.
///
/// Downloads are triggered by navigating to the attachment link; the browser
/// writes the file into its download directory on its own schedule.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn navigate(&self, url: &str) -> anyhow::Result<()>;

    /// Waits for the current navigation to finish. Running out of time is not
    /// an error; callers carry on with whatever has rendered.
    async fn wait_until_loaded(&self, timeout: Duration) -> anyhow::Result<()>;

    async fn current_url(&self) -> anyhow::Result<Option<String>>;

    async fn content(&self) -> anyhow::Result<String>;

    /// Clicks the first element matching `selector`. Returns `false` when
    /// nothing matches.
    async fn click(&self, selector: &str) -> anyhow::Result<bool>;

    async fn close(&self) -> anyhow::Result<()>;
}

/// Page-level helpers on top of a [`BrowserSession`].
pub struct Portal<'a> {
    session: &'a dyn BrowserSession,
    settle: Duration,
}

impl<'a> Portal<'a> {
    pub fn new(session: &'a dyn BrowserSession, settle: Duration) -> Self {
        Self { session, settle }
    }

    pub fn session(&self) -> &'a dyn BrowserSession {
        self.session
    }

    pub async fn open(&self, url: &str, timeout: Duration) -> anyhow::Result<()> {
        tracing::debug!(url, "open page");
        self.session
            .navigate(url)
            .await
            .with_context(|| format!("navigate: {url}"))?;
        self.session
            .wait_until_loaded(timeout)
            .await
            .with_context(|| format!("wait for page: {url}"))?;
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
        Ok(())
    }

    pub async fn open_markup(&self, url: &str, timeout: Duration) -> anyhow::Result<String> {
        self.open(url, timeout).await?;
        self.session
            .content()
            .await
            .with_context(|| format!("read rendered page: {url}"))
    }

    /// Fires the navigation that starts a download without waiting for a load
    /// event; download responses never produce one.
    pub async fn trigger_download(&self, url: &str) -> anyhow::Result<()> {
        tracing::debug!(url, "trigger download");
        self.session
            .navigate(url)
            .await
            .with_context(|| format!("navigate to download: {url}"))
    }
}
