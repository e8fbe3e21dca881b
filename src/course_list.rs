use std::path::Path;

use anyhow::Context as _;

use crate::browser::Portal;
use crate::config::Settings;
use crate::course::CourseEntry;
use crate::lookup;
use crate::markup::MarkupExtractor;

/// Every course found on the portal home page, in table order.
///
/// Names are not unique; [`CourseDirectory::search_course`] reports duplicates
/// as ambiguous rather than picking one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDirectory {
    courses: Vec<CourseEntry>,
}

impl CourseDirectory {
    pub fn new(courses: Vec<CourseEntry>) -> Self {
        Self { courses }
    }

    pub fn courses(&self) -> &[CourseEntry] {
        &self.courses
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn search_course(&self, query: &str) -> Option<&CourseEntry> {
        lookup::search(&self.courses, query, "course")
    }

    /// Loads a saved snapshot. A missing or blank file is an empty directory.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let courses: Vec<CourseEntry> = crate::store::read_json(path)
            .with_context(|| format!("load course snapshot: {}", path.display()))?
            .unwrap_or_default();
        tracing::debug!(path = %path.display(), courses = courses.len(), "loaded course snapshot");
        Ok(Self { courses })
    }

    /// Overwrites the snapshot. An empty directory is never written, so a
    /// failed scrape cannot clobber a good snapshot.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if self.courses.is_empty() {
            tracing::warn!(path = %path.display(), "course list is empty; nothing to save");
            return Ok(());
        }
        crate::store::write_json_atomic(path, &self.courses)
            .with_context(|| format!("save course snapshot: {}", path.display()))?;
        tracing::info!(path = %path.display(), courses = self.courses.len(), "saved course snapshot");
        Ok(())
    }

    /// Scrapes the course table from the portal home page, then every
    /// course's content list.
    pub async fn refresh_from_live(
        portal: &Portal<'_>,
        markup: &dyn MarkupExtractor,
        settings: &Settings,
    ) -> anyhow::Result<Self> {
        let home_url = settings.home_url()?;
        portal
            .open(home_url.as_str(), settings.page_load.home_timeout())
            .await?;

        // A different landing page usually means the profile's login expired
        // and the portal is asking for a one-time password.
        let current_url = portal.session().current_url().await?;
        if current_url.as_deref() != Some(home_url.as_str()) {
            tracing::warn!(
                expected = %home_url,
                current = current_url.as_deref().unwrap_or("<none>"),
                "did not land on the portal home page"
            );
        }

        if portal.session().click(markup.list_layout_toggle()).await? {
            tracing::debug!("switched course view to list layout");
            portal
                .session()
                .wait_until_loaded(settings.page_load.home_timeout())
                .await?;
        }

        let html = portal.session().content().await.context("read home page")?;
        let Some(rows) = markup.course_rows(&html) else {
            tracing::warn!(url = %home_url, "no course table on the home page");
            return Ok(Self::default());
        };

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            let mut course = CourseEntry::from_row(row);
            course
                .fetch_contents(portal, markup, &settings.page_load)
                .await
                .with_context(|| format!("fetch contents of {}", course.name))?;
            courses.push(course);
        }

        tracing::info!(courses = courses.len(), "discovered courses");
        Ok(Self { courses })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::ContentEntry;
    use crate::schedule::Semester;

    fn course(name: &str, contents: Vec<ContentEntry>) -> CourseEntry {
        CourseEntry {
            name: name.to_owned(),
            link: format!("https://portal.example.ac.jp/ct/{name}"),
            year: "2024".to_owned(),
            semester: Semester::Spring,
            day: "月曜".to_owned(),
            period: "1限".to_owned(),
            instructor: "Lovelace".to_owned(),
            contents,
        }
    }

    #[test]
    fn save_then_load_round_trips() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("courseList.json");
        let directory = CourseDirectory::new(vec![
            course(
                "Algorithms",
                vec![ContentEntry::new(
                    "Lecture Notes".to_owned(),
                    "https://portal.example.ac.jp/ct/page_1".to_owned(),
                    "2024-04-01 09:00".to_owned(),
                )],
            ),
            course("Databases", Vec::new()),
        ]);

        directory.save(&path)?;
        let loaded = CourseDirectory::load(&path)?;

        assert_eq!(loaded, directory);
        Ok(())
    }

    #[test]
    fn saving_empty_directory_leaves_file_untouched() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let path = temp.path().join("courseList.json");
        std::fs::write(&path, "[]  ")?;

        CourseDirectory::default().save(&path)?;
        assert_eq!(std::fs::read_to_string(&path)?, "[]  ");

        let missing = temp.path().join("never-written.json");
        CourseDirectory::default().save(&missing)?;
        assert!(!missing.exists());
        Ok(())
    }

    #[test]
    fn load_of_missing_snapshot_is_empty() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let directory = CourseDirectory::load(&temp.path().join("courseList.json"))?;
        assert!(directory.is_empty());
        Ok(())
    }

    #[test]
    fn search_course_uses_exact_then_partial_policy() {
        let directory = CourseDirectory::new(vec![
            course("Algorithms", Vec::new()),
            course("Algorithms Lab", Vec::new()),
            course("Operating Systems", Vec::new()),
        ]);
        assert_eq!(
            directory.search_course("Algorithms").map(|c| c.name.as_str()),
            Some("Algorithms")
        );
        assert_eq!(
            directory.search_course("Operating").map(|c| c.name.as_str()),
            Some("Operating Systems")
        );
        assert!(directory.search_course("Algo").is_none());
        assert!(directory.search_course("Networks").is_none());
    }
}
