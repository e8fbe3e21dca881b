use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::browser::Portal;
use crate::config::Settings;
use crate::course::{ContentEntry, CourseEntry};
use crate::course_list::CourseDirectory;
use crate::file_history::FileHistory;
use crate::file_metadata::{FileDescriptor, Placement};
use crate::markup::MarkupExtractor;

/// One watch-list record: a course and one of its contents, by (partial) name.
///
/// Files land under the resolved course name, not the name typed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadTarget {
    pub course_name: String,
    pub content_name: String,
}

/// How a target run ended. Only `Processed` touched the file history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOutcome {
    CourseUnresolved,
    ContentUnresolved,
    NoUnread,
    Processed {
        /// Unread pages whose attachments were recorded.
        pages: usize,
        files: usize,
        downloaded: usize,
    },
}

#[derive(Debug, Default)]
struct PageTally {
    files: usize,
    downloaded: usize,
}

impl DownloadTarget {
    /// Resolves the target against `directory`, then downloads the
    /// attachments of every unread page in the content.
    pub async fn run(
        &self,
        portal: &Portal<'_>,
        markup: &dyn MarkupExtractor,
        directory: &CourseDirectory,
        settings: &Settings,
    ) -> anyhow::Result<TargetOutcome> {
        let Some(course) = directory.search_course(&self.course_name) else {
            tracing::info!(course = %self.course_name, "skipping target: course not resolved");
            return Ok(TargetOutcome::CourseUnresolved);
        };
        let Some(content) = course.search_content(&self.content_name) else {
            tracing::info!(
                course = %course.name,
                content = %self.content_name,
                "skipping target: content not resolved"
            );
            return Ok(TargetOutcome::ContentUnresolved);
        };

        let html = portal
            .open_markup(&content.link, settings.page_load.content_timeout())
            .await?;
        let unread_links = markup.unread_links(&html);
        if unread_links.is_empty() {
            tracing::info!(course = %course.name, content = %content.name, "no unread pages");
            return Ok(TargetOutcome::NoUnread);
        }
        tracing::info!(
            course = %course.name,
            content = %content.name,
            unread = unread_links.len(),
            "found unread pages"
        );

        let mut pages = 0;
        let mut totals = PageTally::default();
        for link in &unread_links {
            let Some(tally) = download_page(portal, markup, settings, course, content, link)
                .await
                .with_context(|| format!("download attachments of {link}"))?
            else {
                continue;
            };
            pages += 1;
            totals.files += tally.files;
            totals.downloaded += tally.downloaded;
        }

        Ok(TargetOutcome::Processed {
            pages,
            files: totals.files,
            downloaded: totals.downloaded,
        })
    }
}

/// Downloads every attachment on one content page and saves the file history
/// once the page is done. `None` when the page has nothing to download.
async fn download_page(
    portal: &Portal<'_>,
    markup: &dyn MarkupExtractor,
    settings: &Settings,
    course: &CourseEntry,
    content: &ContentEntry,
    link: &str,
) -> anyhow::Result<Option<PageTally>> {
    let html = portal
        .open_markup(link, settings.page_load.content_timeout())
        .await?;
    let Some(page) = markup.content_page(&html) else {
        tracing::warn!(url = link, course = %course.name, "page has no content body");
        return Ok(None);
    };
    if page.attachments.is_empty() {
        tracing::info!(page = %page.title, course = %course.name, "no attachments");
        return Ok(None);
    }

    let mut history = FileHistory::load(&settings.ledger_path)?;
    let mut tally = PageTally::default();
    for block in &page.attachments {
        let mut file = FileDescriptor::from_block(block, &course.name, &content.name, &page.title);
        if history.contains_link(&file.link) {
            tracing::info!(file = %file.name, "already in file history; downloading again");
        }

        let placement = file
            .download_and_place(
                portal,
                &settings.save_dir,
                &settings.scratch_dir,
                &settings.download,
            )
            .await?;
        tally.files += 1;
        if placement != Placement::Missing {
            tally.downloaded += 1;
        }
        history.append(file);
    }
    history.save(&settings.ledger_path)?;

    Ok(Some(tally))
}

/// The watch-list, processed in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadTargetList {
    targets: Vec<DownloadTarget>,
}

impl DownloadTargetList {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let Some(targets) = crate::store::read_json::<Vec<DownloadTarget>>(path)
            .with_context(|| format!("load watch-list: {}", path.display()))?
        else {
            if path.exists() {
                tracing::warn!(path = %path.display(), "watch-list is empty");
                return Ok(Self::default());
            }
            anyhow::bail!("watch-list not found: {}", path.display());
        };
        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[DownloadTarget] {
        &self.targets
    }

    pub async fn run_all(
        &self,
        portal: &Portal<'_>,
        markup: &dyn MarkupExtractor,
        directory: &CourseDirectory,
        settings: &Settings,
    ) -> anyhow::Result<Vec<TargetOutcome>> {
        let mut outcomes = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            tracing::info!(
                course = %target.course_name,
                content = %target.content_name,
                "checking target"
            );
            let outcome = target
                .run(portal, markup, directory, settings)
                .await
                .with_context(|| {
                    format!("target {} / {}", target.course_name, target.content_name)
                })?;
            outcomes.push(outcome);
        }

        let (files, downloaded) = outcomes.iter().fold((0, 0), |acc, outcome| match outcome {
            TargetOutcome::Processed {
                files, downloaded, ..
            } => (acc.0 + files, acc.1 + downloaded),
            _ => acc,
        });
        let unresolved = outcomes
            .iter()
            .filter(|outcome| {
                matches!(
                    outcome,
                    TargetOutcome::CourseUnresolved | TargetOutcome::ContentUnresolved
                )
            })
            .count();
        tracing::info!(
            targets = outcomes.len(),
            unresolved,
            files,
            downloaded,
            "watch-list done"
        );
        Ok(outcomes)
    }
}
