//! Turns rendered portal pages into plain records.
//!
//! Everything selector-specific lives here; the rest of the crate only sees
//! [`MarkupExtractor`].

use anyhow::Context as _;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::course::ContentEntry;

/// One row of the home page course table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseRow {
    pub name: String,
    pub link: String,
    pub year: String,
    pub schedule: String,
    pub instructor: String,
}

/// The anchor describing one downloadable attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBlock {
    pub link: String,
    /// The anchor's text lines: an optional description, then
    /// `<file name> - <upload time>`.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPage {
    pub title: String,
    pub attachments: Vec<AttachmentBlock>,
}

pub trait MarkupExtractor: Send + Sync {
    /// `None` when the page has no course table at all.
    fn course_rows(&self, html: &str) -> Option<Vec<CourseRow>>;

    /// `None` when the page has no content list.
    fn content_cards(&self, html: &str) -> Option<Vec<ContentEntry>>;

    /// `None` when the page has no content body.
    fn content_page(&self, html: &str) -> Option<ContentPage>;

    /// Links of the pages still marked unread on a content's index page.
    fn unread_links(&self, html: &str) -> Vec<String>;

    /// Control on the home page that switches the course view to a table.
    fn list_layout_toggle(&self) -> &str;
}

/// Present only while the weekly view is showing.
const LIST_LAYOUT_TOGGLE: &str =
    "div.my-infolist-mycourses.my-infolist-mycourses-weekly ul > li:nth-child(2) > a";

/// Selectors for the portal's markup.
pub struct PortalMarkup {
    base_url: Url,
    course_table: Selector,
    row: Selector,
    cell: Selector,
    course_title: Selector,
    anchor: Selector,
    content_list: Selector,
    content_card: Selector,
    content_card_title: Selector,
    span: Selector,
    content_body: Selector,
    page_title: Selector,
    attachment: Selector,
    attachment_anchor: Selector,
    unread_anchor: Selector,
}

impl PortalMarkup {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        Ok(Self {
            base_url,
            course_table: selector("table.stdlist.courselist")?,
            row: selector("tr")?,
            cell: selector("td")?,
            course_title: selector("span.courselist-title")?,
            anchor: selector("a")?,
            content_list: selector("div.top-contents-list-body")?,
            content_card: selector("div.contents-card")?,
            content_card_title: selector("div.contents-card-title")?,
            span: selector("span")?,
            content_body: selector("div.contentbody-left")?,
            page_title: selector("h1.pagetitle")?,
            attachment: selector("div.inlineattachment")?,
            attachment_anchor: selector("div.inlineaf-description a")?,
            unread_anchor: selector("div.contentbody-right li.GRIread a")?,
        })
    }

    fn absolutize(&self, href: &str) -> String {
        match self.base_url.join(href) {
            Ok(url) => url.to_string(),
            Err(err) => {
                tracing::debug!(href, ?err, "keeping unresolvable link as-is");
                href.to_owned()
            }
        }
    }

    fn href(&self, element: ElementRef<'_>) -> Option<String> {
        element
            .value()
            .attr("href")
            .map(|href| self.absolutize(href.trim()))
    }

    fn course_row(&self, row: ElementRef<'_>) -> Option<CourseRow> {
        let cells = row.select(&self.cell).collect::<Vec<_>>();
        let [title_cell, year_cell, schedule_cell, instructor_cell, ..] = cells.as_slice() else {
            tracing::debug!(cells = cells.len(), "skipping short course row");
            return None;
        };

        let title = title_cell.select(&self.course_title).next()?;
        let link = title.select(&self.anchor).next().and_then(|a| self.href(a))?;

        Some(CourseRow {
            name: stripped_text(title),
            link,
            year: stripped_text(*year_cell),
            schedule: stripped_text(*schedule_cell),
            instructor: stripped_text(*instructor_cell),
        })
    }

    fn content_card(&self, card: ElementRef<'_>) -> Option<ContentEntry> {
        let header = card.select(&self.content_card_title).next()?;
        let anchor = header.select(&self.anchor).next()?;
        let update_date = header
            .select(&self.span)
            .next()
            .map(stripped_text)
            .unwrap_or_default();
        Some(ContentEntry::new(
            stripped_text(anchor),
            self.href(anchor)?,
            update_date,
        ))
    }
}

impl MarkupExtractor for PortalMarkup {
    fn course_rows(&self, html: &str) -> Option<Vec<CourseRow>> {
        let document = Html::parse_document(html);
        let table = document.select(&self.course_table).next()?;
        let rows = table
            .select(&self.row)
            .skip(1)
            .filter_map(|row| self.course_row(row))
            .collect();
        Some(rows)
    }

    fn content_cards(&self, html: &str) -> Option<Vec<ContentEntry>> {
        let document = Html::parse_document(html);
        let list = document.select(&self.content_list).next()?;
        let cards = list
            .select(&self.content_card)
            .filter_map(|card| self.content_card(card))
            .collect();
        Some(cards)
    }

    fn content_page(&self, html: &str) -> Option<ContentPage> {
        let document = Html::parse_document(html);
        let body = document.select(&self.content_body).next()?;
        let title = body
            .select(&self.page_title)
            .next()
            .map(stripped_text)
            .unwrap_or_default();

        let attachments = body
            .select(&self.attachment)
            .filter_map(|block| {
                let anchor = block.select(&self.attachment_anchor).next()?;
                let link = self.href(anchor)?;
                let text = anchor
                    .text()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                Some(AttachmentBlock { link, text })
            })
            .collect();

        Some(ContentPage { title, attachments })
    }

    fn unread_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.unread_anchor)
            .filter_map(|anchor| self.href(anchor))
            .collect()
    }

    fn list_layout_toggle(&self) -> &str {
        LIST_LAYOUT_TOGGLE
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css)
        .map_err(|err| anyhow::anyhow!("{err}"))
        .with_context(|| format!("parse selector: {css}"))
}

/// Text of an element with each text node trimmed, like BeautifulSoup's
/// `get_text(strip=True)`.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}
