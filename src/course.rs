use serde::{Deserialize, Deserializer, Serialize};

use crate::browser::Portal;
use crate::config::PageLoadConfig;
use crate::lookup::{self, Named};
use crate::markup::{CourseRow, MarkupExtractor};
use crate::schedule::{Schedule, Semester};

/// One content card on a course page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub name: String,
    pub link: String,
    /// `YYYY-MM-DD HH:MM`, as shown on the card.
    pub update_date: String,
}

impl ContentEntry {
    pub fn new(name: String, link: String, update_date: String) -> Self {
        Self {
            name,
            link,
            update_date,
        }
    }
}

impl Named for ContentEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseEntry {
    /// Used as a directory name, so trailing whitespace is dropped.
    #[serde(deserialize_with = "trim_end")]
    pub name: String,
    pub link: String,
    pub year: String,
    pub semester: Semester,
    pub day: String,
    pub period: String,
    #[serde(rename = "professor")]
    pub instructor: String,
    /// Empty until [`CourseEntry::fetch_contents`] runs.
    #[serde(rename = "content_list", default)]
    pub contents: Vec<ContentEntry>,
}

impl CourseEntry {
    pub fn from_row(row: CourseRow) -> Self {
        let Schedule {
            semester,
            day,
            period,
        } = Schedule::parse(&row.schedule);

        Self {
            name: row.name.trim_end().to_owned(),
            link: row.link,
            year: row.year,
            semester,
            day,
            period,
            instructor: row.instructor,
            contents: Vec::new(),
        }
    }

    /// Loads this course's page and replaces the content list with its cards.
    pub async fn fetch_contents(
        &mut self,
        portal: &Portal<'_>,
        markup: &dyn MarkupExtractor,
        page_load: &PageLoadConfig,
    ) -> anyhow::Result<()> {
        let html = portal
            .open_markup(&self.link, page_load.course_timeout())
            .await?;

        self.contents = match markup.content_cards(&html) {
            Some(cards) => cards,
            None => {
                tracing::warn!(course = %self.name, "course page has no content list");
                Vec::new()
            }
        };
        tracing::debug!(course = %self.name, contents = self.contents.len(), "fetched contents");
        Ok(())
    }

    pub fn search_content(&self, query: &str) -> Option<&ContentEntry> {
        lookup::search(&self.contents, query, "content")
    }
}

impl Named for CourseEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

fn trim_end<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(name.trim_end().to_owned())
}
