use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use url::Url;

/// Run configuration loaded from a YAML file at process entry.
///
/// Relative paths in the file are resolved against the directory holding it,
/// so a config can sit next to its ledger and snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the portal; relative links in markup resolve against it.
    pub portal_url: Url,
    #[serde(default = "default_home_path")]
    pub home_path: String,
    /// Persisted browser profile (keeps the portal login).
    pub user_data_dir: PathBuf,
    /// Where the browser drops downloads before they are moved.
    pub scratch_dir: PathBuf,
    /// Root of the `<save_dir>/<course>/<file>` tree.
    pub save_dir: PathBuf,
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_course_snapshot_path")]
    pub course_snapshot_path: PathBuf,
    #[serde(default = "default_watch_list_path")]
    pub watch_list_path: PathBuf,
    /// Scrape the course list from the portal instead of loading the snapshot.
    #[serde(default = "default_true")]
    pub refresh_courses: bool,
    #[serde(default)]
    pub download: PollPolicy,
    #[serde(default)]
    pub page_load: PageLoadConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

/// Bound on how long a browser download is waited for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    pub attempts: u32,
    pub interval_ms: u64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            interval_ms: 2000,
        }
    }
}

impl PollPolicy {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageLoadConfig {
    pub home_timeout_secs: u64,
    pub course_timeout_secs: u64,
    pub content_timeout_secs: u64,
    /// Fixed pause after every page-load wait.
    pub settle_ms: u64,
}

impl Default for PageLoadConfig {
    fn default() -> Self {
        Self {
            home_timeout_secs: 30,
            course_timeout_secs: 10,
            content_timeout_secs: 30,
            settle_ms: 1000,
        }
    }
}

impl PageLoadConfig {
    pub fn home_timeout(&self) -> Duration {
        Duration::from_secs(self.home_timeout_secs)
    }

    pub fn course_timeout(&self) -> Duration {
        Duration::from_secs(self.course_timeout_secs)
    }

    pub fn content_timeout(&self) -> Duration {
        Duration::from_secs(self.content_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// The portal's SSO refuses headless Chrome, so this stays off by default.
    pub headless: bool,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_executable: None,
            request_timeout_secs: 10,
        }
    }
}

fn default_home_path() -> String {
    "home".to_owned()
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("fileHistory.json")
}

fn default_course_snapshot_path() -> PathBuf {
    PathBuf::from("courseList.json")
}

fn default_watch_list_path() -> PathBuf {
    PathBuf::from("downloadContentList.json")
}

fn default_true() -> bool {
    true
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config: {}", path.display()))?;
        let mut settings: Settings = serde_yaml::from_str(&text)
            .with_context(|| format!("parse config: {}", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        settings.resolve_paths(base_dir);
        settings.validate()?;

        tracing::debug!(config = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn home_url(&self) -> anyhow::Result<Url> {
        self.portal_url
            .join(&self.home_path)
            .with_context(|| format!("join home path onto portal url: {}", self.home_path))
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        for path in [
            &mut self.user_data_dir,
            &mut self.scratch_dir,
            &mut self.save_dir,
            &mut self.ledger_path,
            &mut self.course_snapshot_path,
            &mut self.watch_list_path,
        ] {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.portal_url.scheme() != "http" && self.portal_url.scheme() != "https" {
            anyhow::bail!("portal_url must be http/https: {}", self.portal_url);
        }
        if self.download.attempts == 0 {
            anyhow::bail!("download.attempts must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
portal_url: "https://portal.example.ac.jp/ct/"
user_data_dir: profile
scratch_dir: /tmp/downloads
save_dir: materials
"#;

    #[test]
    fn load_applies_defaults_and_resolves_relative_paths() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("coursefetch.yaml");
        std::fs::write(&path, MINIMAL)?;

        let settings = Settings::load(&path)?;

        assert!(settings.refresh_courses);
        assert_eq!(settings.download, PollPolicy::default());
        assert_eq!(settings.user_data_dir, temp.path().join("profile"));
        assert_eq!(settings.scratch_dir, PathBuf::from("/tmp/downloads"));
        assert_eq!(settings.ledger_path, temp.path().join("fileHistory.json"));
        assert_eq!(
            settings.home_url()?.as_str(),
            "https://portal.example.ac.jp/ct/home"
        );
        Ok(())
    }

    #[test]
    fn load_rejects_zero_poll_attempts() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("coursefetch.yaml");
        std::fs::write(&path, format!("{MINIMAL}download:\n  attempts: 0\n  interval_ms: 10\n"))?;

        let err = Settings::load(&path).expect_err("zero attempts must be rejected");
        assert!(format!("{err:#}").contains("attempts"));
        Ok(())
    }
}
