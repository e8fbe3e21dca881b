use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::browser::Portal;
use crate::config::PollPolicy;
use crate::markup::AttachmentBlock;
use crate::schedule::UNKNOWN;

/// Description recorded for attachments that have none.
pub const NO_DESCRIPTION: &str = "Nothing";
/// Path recorded before the download has been attempted.
pub const NOT_DOWNLOADED: &str = "Not downloaded";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.+\.[a-z]+) - (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})")
        .expect("valid attachment header regex")
});

/// Bookkeeping for one attachment, and the ledger record it becomes.
///
/// `path` and `success` are written only by
/// [`FileDescriptor::download_and_place`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub link: String,
    /// `YYYY-MM-DD HH:MM:SS`, or `Unknown`.
    pub upload_date: String,
    pub course_name: String,
    pub content_name: String,
    pub page_title: String,
    pub description: String,
    #[serde(default = "not_downloaded")]
    path: String,
    #[serde(rename = "can_download", default)]
    success: bool,
}

fn not_downloaded() -> String {
    NOT_DOWNLOADED.to_owned()
}

/// Where a download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Moved into the course directory.
    Moved(PathBuf),
    /// Seen in the scratch directory but could not be moved out of it.
    LeftInScratch(PathBuf),
    /// Never appeared within the poll budget.
    Missing,
}

impl FileDescriptor {
    pub fn from_block(
        block: &AttachmentBlock,
        course_name: &str,
        content_name: &str,
        page_title: &str,
    ) -> Self {
        let (description, header) = match block.text.rsplit_once('\n') {
            Some((description, header)) => (description.to_owned(), header),
            None => (NO_DESCRIPTION.to_owned(), block.text.as_str()),
        };
        let (name, upload_date) = parse_header(header);

        Self {
            name,
            link: block.link.clone(),
            upload_date,
            course_name: course_name.to_owned(),
            content_name: content_name.to_owned(),
            page_title: page_title.to_owned(),
            description,
            path: not_downloaded(),
            success: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn success(&self) -> bool {
        self.success
    }

    /// Triggers the browser download and moves the file from `scratch_dir` to
    /// `<save_dir>/<course_name>/<name>` once it shows up.
    ///
    /// Only a failure to talk to the browser is an error. A file that never
    /// appears or cannot be moved is recorded on the descriptor and logged.
    pub async fn download_and_place(
        &mut self,
        portal: &Portal<'_>,
        save_dir: &Path,
        scratch_dir: &Path,
        policy: &PollPolicy,
    ) -> anyhow::Result<Placement> {
        portal.trigger_download(&self.link).await?;

        let course_dir = save_dir.join(&self.course_name);
        if let Err(err) = std::fs::create_dir_all(&course_dir) {
            tracing::warn!(dir = %course_dir.display(), ?err, "could not create course directory");
        }

        let scratch_path = scratch_dir.join(&self.name);
        let dest_path = course_dir.join(&self.name);

        let placement = match poll_for_file(policy, || scratch_path.is_file()).await {
            Some(attempt) => {
                tracing::info!(
                    file = %self.name,
                    page = %self.page_title,
                    course = %self.course_name,
                    attempt,
                    "downloaded"
                );
                self.success = true;
                match move_file(&scratch_path, &dest_path) {
                    Ok(()) => {
                        tracing::info!(file = %self.name, dest = %dest_path.display(), "moved");
                        Placement::Moved(dest_path)
                    }
                    Err(err) => {
                        tracing::warn!(
                            file = %self.name,
                            page = %self.page_title,
                            course = %self.course_name,
                            from = %scratch_path.display(),
                            to = %dest_path.display(),
                            ?err,
                            "could not move download; leaving it in the scratch directory"
                        );
                        Placement::LeftInScratch(scratch_path)
                    }
                }
            }
            None => {
                tracing::warn!(
                    file = %self.name,
                    page = %self.page_title,
                    course = %self.course_name,
                    attempts = policy.attempts,
                    "download never appeared"
                );
                Placement::Missing
            }
        };

        self.path = match &placement {
            Placement::Moved(path) | Placement::LeftInScratch(path) => {
                path.to_string_lossy().into_owned()
            }
            Placement::Missing => UNKNOWN.to_owned(),
        };
        Ok(placement)
    }
}

/// Renames `from` to `to`, copying then deleting when they sit on different
/// filesystems.
fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    match std::fs::rename(from, to) {
        Err(err) if err.kind() == std::io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                "rename crosses devices; copying"
            );
            std::fs::copy(from, to)?;
            std::fs::remove_file(from)
        }
        result => result,
    }
}

/// Splits `"<file name> - <YYYY-MM-DD HH:MM:SS>"`. Anything else yields
/// `Unknown` for both.
pub fn parse_header(header: &str) -> (String, String) {
    match HEADER_RE.captures(header.trim()) {
        Some(caps) => (caps[1].to_owned(), caps[2].to_owned()),
        None => (UNKNOWN.to_owned(), UNKNOWN.to_owned()),
    }
}

/// Sleeps one interval, then probes, up to `policy.attempts` times. Returns the
/// attempt number of the first successful probe.
pub async fn poll_for_file<F>(policy: &PollPolicy, mut probe: F) -> Option<u32>
where
    F: FnMut() -> bool,
{
    for attempt in 1..=policy.attempts {
        tokio::time::sleep(policy.interval()).await;
        if probe() {
            return Some(attempt);
        }
    }
    None
}
