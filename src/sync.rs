use anyhow::Context as _;

use crate::browser::{BrowserSession, ChromiumSession, Portal};
use crate::cli::SyncArgs;
use crate::config::Settings;
use crate::course_list::CourseDirectory;
use crate::download::{DownloadTargetList, TargetOutcome};
use crate::markup::{MarkupExtractor, PortalMarkup};

pub async fn run(args: SyncArgs) -> anyhow::Result<()> {
    let mut settings = Settings::load(&args.config.config).context("load settings")?;
    if let Some(refresh) = args.refresh_override() {
        settings.refresh_courses = refresh;
    }
    let markup = PortalMarkup::new(settings.portal_url.clone()).context("build markup extractor")?;

    let session = ChromiumSession::launch(&settings).await?;
    let result = execute(&session, &markup, &settings).await;
    if let Err(err) = session.close().await {
        tracing::warn!(?err, "closing the browser failed");
    }

    result.map(|_| ())
}

/// The whole run against an already-open session: obtain the course
/// directory, then work through the watch-list.
pub async fn execute(
    session: &dyn BrowserSession,
    markup: &dyn MarkupExtractor,
    settings: &Settings,
) -> anyhow::Result<Vec<TargetOutcome>> {
    let portal = Portal::new(session, settings.page_load.settle());
    let directory = course_directory(&portal, markup, settings).await?;

    let targets =
        DownloadTargetList::load(&settings.watch_list_path).context("load watch-list")?;
    targets.run_all(&portal, markup, &directory, settings).await
}

async fn course_directory(
    portal: &Portal<'_>,
    markup: &dyn MarkupExtractor,
    settings: &Settings,
) -> anyhow::Result<CourseDirectory> {
    if !settings.refresh_courses {
        return CourseDirectory::load(&settings.course_snapshot_path);
    }

    let directory = CourseDirectory::refresh_from_live(portal, markup, settings)
        .await
        .context("refresh course list")?;
    if directory.is_empty() {
        tracing::warn!("live course list is empty; falling back to the saved snapshot");
        return CourseDirectory::load(&settings.course_snapshot_path);
    }
    directory.save(&settings.course_snapshot_path)?;
    Ok(directory)
}
