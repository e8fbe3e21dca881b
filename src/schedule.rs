use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Placeholder for any schedule field the cell does not mention.
pub const UNKNOWN: &str = "Unknown";

static SEMESTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"前期|後期|通年").expect("valid semester regex"));
static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[日月火水木金土]曜").expect("valid day regex"));
static PERIOD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[1-5]限").expect("valid period regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Semester {
    #[serde(rename = "前期")]
    Spring,
    #[serde(rename = "後期")]
    Fall,
    #[serde(rename = "通年")]
    FullYear,
    #[default]
    Unknown,
}

impl Semester {
    fn from_token(token: &str) -> Self {
        match token {
            "前期" => Self::Spring,
            "後期" => Self::Fall,
            "通年" => Self::FullYear,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Spring => "前期",
            Self::Fall => "後期",
            Self::FullYear => "通年",
            Self::Unknown => UNKNOWN,
        }
    }
}

impl std::fmt::Display for Semester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Term, weekday and period taken from a course's schedule cell.
///
/// Each field is searched for independently across the whole cell, so a
/// missing token never shifts the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub semester: Semester,
    /// e.g. `月曜`
    pub day: String,
    /// e.g. `3限`
    pub period: String,
}

impl Schedule {
    pub fn parse(cell: &str) -> Self {
        let semester = SEMESTER_RE
            .find(cell)
            .map(|m| Semester::from_token(m.as_str()))
            .unwrap_or_default();

        Self {
            semester,
            day: first_match(&DAY_RE, cell),
            period: first_match(&PERIOD_RE, cell),
        }
    }
}

fn first_match(re: &Regex, haystack: &str) -> String {
    re.find(haystack)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nbsp_separated_cell() {
        let schedule = Schedule::parse("前期\u{a0}\u{a0}月曜\u{a0}\u{a0}2限");
        assert_eq!(schedule.semester, Semester::Spring);
        assert_eq!(schedule.day, "月曜");
        assert_eq!(schedule.period, "2限");
    }

    #[test]
    fn fields_are_matched_independently_of_position() {
        let schedule = Schedule::parse("3限 金曜 通年");
        assert_eq!(schedule.semester, Semester::FullYear);
        assert_eq!(schedule.day, "金曜");
        assert_eq!(schedule.period, "3限");
    }

    #[test]
    fn missing_tokens_become_unknown() {
        let schedule = Schedule::parse("後期 集中");
        assert_eq!(schedule.semester, Semester::Fall);
        assert_eq!(schedule.day, UNKNOWN);
        assert_eq!(schedule.period, UNKNOWN);
    }

    #[test]
    fn empty_and_out_of_range_cells_are_total() {
        for cell in ["", "   ", "6限", "曜", "前 期"] {
            let schedule = Schedule::parse(cell);
            assert_eq!(schedule.semester, Semester::Unknown, "cell {cell:?}");
            assert_eq!(schedule.day, UNKNOWN, "cell {cell:?}");
            assert_eq!(schedule.period, UNKNOWN, "cell {cell:?}");
        }
    }

    #[test]
    fn semester_serializes_as_portal_token() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Semester::Fall)?, "\"後期\"");
        assert_eq!(
            serde_json::from_str::<Semester>("\"Unknown\"")?,
            Semester::Unknown
        );
        Ok(())
    }
}
