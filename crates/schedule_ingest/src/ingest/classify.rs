//! Course cell classification

use super::config::{ClassifierConfig, LayoutConfig};
use super::time::PixelGrid;
use super::types::{CourseType, NormalizedCourse, RawAnchor, RawCourseCell, WeekParity};
use chrono::{NaiveTime, Weekday};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use tracing::debug;

static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*[\r\n]+[ \t]*").unwrap());
static PLUS_SPACE_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+ ]{2,}").unwrap());

const LINK_KIND_TOKEN: &str = "type";

/// Maps a block's `left` offset to the day column it sits in.
///
/// A day column is split in two halves: the odd-week half starts at the
/// listed offset, the even-week half `half_column_width_px` further right.
#[derive(Debug, Clone)]
pub struct DayColumnTable {
    columns: HashMap<i32, Weekday>,
    half_column_width_px: i32,
}

impl DayColumnTable {
    pub fn from_layout(layout: &LayoutConfig) -> Self {
        Self {
            columns: layout
                .day_columns
                .iter()
                .map(|column| (column.left_px, column.day))
                .collect(),
            half_column_width_px: layout.half_column_width_px,
        }
    }

    /// Exact match on a listed offset
    pub fn direct(&self, left: i32) -> Option<Weekday> {
        self.columns.get(&left).copied()
    }

    /// Exact match, then a retry one half column to the left
    pub fn day_of(&self, left: i32) -> Option<Weekday> {
        self.direct(left)
            .or_else(|| self.direct(left - self.half_column_width_px))
    }
}

/// Turns raw course cells into [`NormalizedCourse`] values.
///
/// Never fails: unknown input falls back to `INFO`, empty strings or `None`.
#[derive(Debug, Clone)]
pub struct CourseClassifier {
    grid: PixelGrid,
    days: DayColumnTable,
    every_week_width_px: i32,
    course_types: HashMap<String, CourseType>,
    teacher_link_kind: String,
    room_link_kind: String,
    note_marker: String,
}

impl CourseClassifier {
    pub fn new(layout: &LayoutConfig, classifier: &ClassifierConfig) -> Self {
        Self {
            grid: layout.grid,
            days: DayColumnTable::from_layout(layout),
            every_week_width_px: layout.every_week_width_px,
            course_types: classifier
                .course_types
                .iter()
                .map(|(abbrev, kind)| (abbrev.trim().to_lowercase(), *kind))
                .collect(),
            teacher_link_kind: classifier.teacher_link_kind.clone(),
            room_link_kind: classifier.room_link_kind.clone(),
            note_marker: classifier.note_marker.clone(),
        }
    }

    pub fn classify(&self, cell: &RawCourseCell, anchor: NaiveTime) -> NormalizedCourse {
        let top = i64::from(cell.top);
        let starts_at = self.grid.to_time(top, anchor, false);
        let ends_at = self.grid.to_time(top + i64::from(cell.height), anchor, true);

        let (name, course_type) = self.name_and_type(&cell.text);

        let day_of_week = self.days.day_of(cell.left);
        if day_of_week.is_none() {
            debug!(left = cell.left, name = %name, "No day column matches course cell");
        }

        NormalizedCourse {
            starts_at,
            ends_at,
            name,
            course_type,
            teachers: self.join_links(&cell.anchors, &self.teacher_link_kind),
            day_of_week,
            week_parity: self.week_parity(cell, day_of_week),
            classrooms: self.join_links(&cell.anchors, &self.room_link_kind),
            additional_info: self.additional_info(&cell.text),
        }
    }

    /// Reads "name, abbreviation" from the first line of the cell
    fn name_and_type(&self, text: &str) -> (String, CourseType) {
        let first_line = text.lines().next().unwrap_or_default();
        let tokens: Vec<&str> = first_line.split(',').collect();

        if tokens.len() == 1 {
            return (tokens[0].trim().to_string(), CourseType::Info);
        }

        let abbreviation = tokens[1].trim().to_lowercase();
        let course_type = match self.course_types.get(&abbreviation) {
            Some(kind) => *kind,
            None => {
                debug!(abbreviation = %abbreviation, "Unknown course type abbreviation");
                CourseType::Info
            }
        };

        (tokens[0].trim().to_string(), course_type)
    }

    fn week_parity(&self, cell: &RawCourseCell, day: Option<Weekday>) -> WeekParity {
        if cell.width == self.every_week_width_px {
            WeekParity::Every
        } else if day.is_some() && self.days.direct(cell.left) == day {
            WeekParity::Odd
        } else {
            WeekParity::Even
        }
    }

    /// Sorted, de-duplicated texts of every link of one kind, joined with ", "
    fn join_links(&self, anchors: &BTreeSet<RawAnchor>, kind: &str) -> String {
        anchors
            .iter()
            .filter(|anchor| link_kind(&anchor.address) == Some(kind))
            .map(|anchor| anchor.text.trim())
            .filter(|text| !text.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Everything from the note marker on, flattened to one line
    fn additional_info(&self, text: &str) -> Option<String> {
        if self.note_marker.is_empty() {
            return None;
        }

        let start = text.find(&self.note_marker)?;
        let note = text[start..].trim();
        let note = LINE_BREAK_REGEX.replace_all(note, " ");
        let note = PLUS_SPACE_RUN_REGEX.replace_all(&note, " ");

        Some(note.trim().to_string())
    }
}

/// Returns the query value following `type` in a link, up to the next `&`.
///
/// For `plan.php?type=10&id=3` this is `=10`.
pub fn link_kind(address: &str) -> Option<&str> {
    let start = address.find(LINK_KIND_TOKEN)? + LINK_KIND_TOKEN.len();
    let rest = &address[start..];
    Some(rest.split('&').next().unwrap_or(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CourseClassifier {
        CourseClassifier::new(&LayoutConfig::default(), &ClassifierConfig::default())
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn anchor(text: &str, address: &str) -> RawAnchor {
        RawAnchor {
            text: text.to_string(),
            address: address.to_string(),
        }
    }

    fn cell(text: &str, top: i32, left: i32, width: i32, height: i32) -> RawCourseCell {
        RawCourseCell {
            text: text.to_string(),
            anchors: BTreeSet::new(),
            top,
            left,
            width,
            height,
        }
    }

    #[test]
    fn test_golden_cell() {
        let course = classifier().classify(&cell("course 1", 259, 254, 154, 135), time(8, 30));

        assert_eq!(course.starts_at, time(8, 30));
        assert_eq!(course.ends_at, time(11, 45));
        assert_eq!(course.course_type, CourseType::Info);
        assert_eq!(course.name, "course 1");
        assert_eq!(course.day_of_week, Some(Weekday::Mon));
        assert_eq!(course.week_parity, WeekParity::Every);
        assert_eq!(course.teachers, "");
        assert_eq!(course.classrooms, "");
        assert_eq!(course.additional_info, None);
    }

    #[test]
    fn test_huge_geometry_still_classifies() {
        let course = classifier().classify(
            &cell("Broken, wyk", 2_147_483_000, 254, 154, 2_147_483_000),
            time(8, 0),
        );
        assert_eq!(course.name, "Broken");
        assert_eq!(course.day_of_week, Some(Weekday::Mon));

        let max = classifier().classify(&cell("Max", i32::MAX, 254, 154, i32::MAX), time(8, 0));
        assert_eq!(max.name, "Max");
    }

    #[test]
    fn test_name_and_known_type() {
        let course = classifier().classify(&cell("Analiza matematyczna , WYK", 259, 409, 154, 90), time(8, 0));
        assert_eq!(course.name, "Analiza matematyczna");
        assert_eq!(course.course_type, CourseType::Lecture);
        assert_eq!(course.day_of_week, Some(Weekday::Tue));
    }

    #[test]
    fn test_unknown_type_degrades_to_info() {
        let course = classifier().classify(&cell("Fizyka, xyz", 259, 254, 154, 90), time(8, 0));
        assert_eq!(course.name, "Fizyka");
        assert_eq!(course.course_type, CourseType::Info);
    }

    #[test]
    fn test_only_first_line_is_named() {
        let course = classifier().classify(&cell("Fizyka, lab\nGrupa 2, proj", 259, 254, 154, 90), time(8, 0));
        assert_eq!(course.name, "Fizyka");
        assert_eq!(course.course_type, CourseType::Lab);
    }

    #[test]
    fn test_odd_half_of_column() {
        let course = classifier().classify(&cell("Fizyka, lab", 259, 564, 76, 90), time(8, 0));
        assert_eq!(course.day_of_week, Some(Weekday::Wed));
        assert_eq!(course.week_parity, WeekParity::Odd);
    }

    #[test]
    fn test_even_half_of_column() {
        let course = classifier().classify(&cell("Fizyka, lab", 259, 564 + 78, 76, 90), time(8, 0));
        assert_eq!(course.day_of_week, Some(Weekday::Wed));
        assert_eq!(course.week_parity, WeekParity::Even);
    }

    #[test]
    fn test_unmatched_column_has_no_day() {
        let course = classifier().classify(&cell("Fizyka, lab", 259, 300, 76, 90), time(8, 0));
        assert_eq!(course.day_of_week, None);
        assert_eq!(course.week_parity, WeekParity::Even);

        let every = classifier().classify(&cell("Fizyka, lab", 259, 300, 154, 90), time(8, 0));
        assert_eq!(every.week_parity, WeekParity::Every);
    }

    #[test]
    fn test_links_split_into_teachers_and_rooms() {
        let mut raw = cell("Analiza, wyk", 259, 254, 154, 90);
        raw.anchors = [
            anchor("Nowak A.", "plan.php?type=10&id=2"),
            anchor("Kowalski J.", "plan.php?type=10&id=1"),
            anchor("CEK 101", "plan.php?type=20&id=7"),
            anchor("Grupa 3", "plan.php?type=0&id=9"),
            anchor("Strona", "https://example.org"),
        ]
        .into_iter()
        .collect();

        let course = classifier().classify(&raw, time(8, 0));
        assert_eq!(course.teachers, "Kowalski J., Nowak A.");
        assert_eq!(course.classrooms, "CEK 101");
    }

    #[test]
    fn test_link_kind() {
        assert_eq!(link_kind("plan.php?type=10&id=1"), Some("=10"));
        assert_eq!(link_kind("plan.php?id=1&type=20"), Some("=20"));
        assert_eq!(link_kind("plan.php?id=1"), None);
    }

    #[test]
    fn test_additional_info_is_flattened() {
        let course = classifier().classify(
            &cell("Fizyka, lab\nuwagi: zajęcia ++ od\n  10 marca  +  sala B", 259, 254, 154, 90),
            time(8, 0),
        );
        assert_eq!(
            course.additional_info.as_deref(),
            Some("uwagi: zajęcia od 10 marca sala B")
        );
    }
}
