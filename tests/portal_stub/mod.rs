use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use coursefetch::browser::BrowserSession;
use coursefetch::config::Settings;

pub const PORTAL: &str = "https://portal.example.ac.jp/ct/";

pub fn url(path: &str) -> String {
    format!("{PORTAL}{path}")
}

/// In-memory stand-in for the browser: serves canned pages and "downloads"
/// by writing files into the scratch directory.
pub struct PortalStub {
    scratch_dir: PathBuf,
    pages: HashMap<String, String>,
    downloads: HashMap<String, String>,
    ledger_path: Option<PathBuf>,
    current: Mutex<Option<String>>,
    state: Mutex<StubState>,
}

#[derive(Debug, Default)]
pub struct StubState {
    pub navigations: Vec<String>,
    pub clicks: Vec<String>,
    /// Ledger entries on disk at the moment of each download.
    pub ledger_sizes_at_download: Vec<usize>,
}

impl PortalStub {
    pub fn new(scratch_dir: &Path) -> Self {
        Self {
            scratch_dir: scratch_dir.to_owned(),
            pages: HashMap::new(),
            downloads: HashMap::new(),
            ledger_path: None,
            current: Mutex::new(None),
            state: Mutex::new(StubState::default()),
        }
    }

    pub fn page(mut self, path: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url(path), html.into());
        self
    }

    pub fn download(mut self, path: &str, file_name: &str) -> Self {
        self.downloads.insert(url(path), file_name.to_owned());
        self
    }

    pub fn watch_ledger(mut self, ledger_path: &Path) -> Self {
        self.ledger_path = Some(ledger_path.to_owned());
        self
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&StubState) -> R) -> R {
        f(&*self.state.lock().expect("stub state lock"))
    }

    fn ledger_size(&self) -> anyhow::Result<usize> {
        let Some(path) = &self.ledger_path else {
            return Ok(0);
        };
        if !path.exists() {
            return Ok(0);
        }
        let entries: Vec<serde_json::Value> =
            serde_json::from_slice(&std::fs::read(path)?).context("parse ledger")?;
        Ok(entries.len())
    }
}

#[async_trait]
impl BrowserSession for PortalStub {
    async fn navigate(&self, url: &str) -> anyhow::Result<()> {
        if let Some(file_name) = self.downloads.get(url) {
            let size = self.ledger_size()?;
            std::fs::write(self.scratch_dir.join(file_name), b"attachment")?;
            let mut state = self.state.lock().expect("stub state lock");
            state.navigations.push(url.to_owned());
            state.ledger_sizes_at_download.push(size);
            return Ok(());
        }

        self.state
            .lock()
            .expect("stub state lock")
            .navigations
            .push(url.to_owned());
        *self.current.lock().expect("current lock") = Some(url.to_owned());
        Ok(())
    }

    async fn wait_until_loaded(&self, _timeout: Duration) -> anyhow::Result<()> {
        Ok(())
    }

    async fn current_url(&self) -> anyhow::Result<Option<String>> {
        Ok(self.current.lock().expect("current lock").clone())
    }

    async fn content(&self) -> anyhow::Result<String> {
        let current = self.current.lock().expect("current lock").clone();
        Ok(current
            .and_then(|url| self.pages.get(&url).cloned())
            .unwrap_or_else(|| "<html><body></body></html>".to_owned()))
    }

    async fn click(&self, selector: &str) -> anyhow::Result<bool> {
        self.state
            .lock()
            .expect("stub state lock")
            .clicks
            .push(selector.to_owned());
        Ok(false)
    }

    async fn close(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Writes a config file under `root` and loads it.
pub fn settings(root: &Path, refresh_courses: bool) -> anyhow::Result<Settings> {
    let config_path = root.join("coursefetch.yaml");
    std::fs::write(
        &config_path,
        format!(
            r#"portal_url: "{PORTAL}"
user_data_dir: profile
scratch_dir: scratch
save_dir: materials
refresh_courses: {refresh_courses}
download:
  attempts: 3
  interval_ms: 1
page_load:
  home_timeout_secs: 1
  course_timeout_secs: 1
  content_timeout_secs: 1
  settle_ms: 0
"#
        ),
    )?;
    let settings = Settings::load(&config_path)?;
    std::fs::create_dir_all(&settings.scratch_dir)?;
    Ok(settings)
}

pub fn unread_index(paths: &[&str]) -> String {
    let items = paths
        .iter()
        .map(|path| format!(r#"<li class="GRIread"><a href="{path}">{path}</a></li>"#))
        .collect::<String>();
    format!(
        r#"<html><body><div class="contentbody-right"><table><tr><td>index</td></tr>
<tr><td><ul>{items}<li class="GRIopen"><a href="page_seen">seen</a></li></ul></td></tr>
</table></div></body></html>"#
    )
}

pub fn content_page(title: &str, attachments: &[(&str, &str)]) -> String {
    let blocks = attachments
        .iter()
        .map(|(href, header)| {
            format!(
                r#"<div class="inlineattachment"><div class="inlineaf-description"><a href="{href}">{header}</a></div></div>"#
            )
        })
        .collect::<String>();
    format!(
        r#"<html><body><div class="contentbody-left"><h1 class="pagetitle">{title}</h1>{blocks}</div></body></html>"#
    )
}
