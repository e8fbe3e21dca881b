use anyhow::Context as _;

use crate::browser::{BrowserSession, ChromiumSession, Portal};
use crate::cli::{CoursesFindArgs, CoursesRefreshArgs};
use crate::config::Settings;
use crate::course_list::CourseDirectory;
use crate::markup::PortalMarkup;

pub async fn refresh(args: CoursesRefreshArgs) -> anyhow::Result<()> {
    let settings = Settings::load(&args.config.config).context("load settings")?;
    let markup = PortalMarkup::new(settings.portal_url.clone()).context("build markup extractor")?;

    let session = ChromiumSession::launch(&settings).await?;
    let portal = Portal::new(&session, settings.page_load.settle());
    let result = CourseDirectory::refresh_from_live(&portal, &markup, &settings).await;
    if let Err(err) = session.close().await {
        tracing::warn!(?err, "closing the browser failed");
    }

    result?.save(&settings.course_snapshot_path)
}

/// Prints what a watch-list entry would resolve to, without a browser.
pub fn find(args: CoursesFindArgs) -> anyhow::Result<()> {
    let settings = Settings::load(&args.config.config).context("load settings")?;
    let directory = CourseDirectory::load(&settings.course_snapshot_path)?;

    let course = directory
        .search_course(&args.course)
        .ok_or_else(|| anyhow::anyhow!("course not resolved: {}", args.course))?;
    println!(
        "{}\t{} {} {} {}\t{}",
        course.name, course.year, course.semester, course.day, course.period, course.link
    );

    if let Some(query) = args.content.as_deref() {
        let content = course
            .search_content(query)
            .ok_or_else(|| anyhow::anyhow!("content not resolved in {}: {query}", course.name))?;
        println!("{}\t{}\t{}", content.name, content.update_date, content.link);
    }

    Ok(())
}
