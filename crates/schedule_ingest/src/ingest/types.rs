//! Types for scraped and normalized timetable data

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// A time header cell of the grid, e.g. "08:30-09:15"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawTimeInterval {
    pub start: String,
    pub end: String,
}

/// A hyperlink embedded in a course cell (teacher, room, group...)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RawAnchor {
    pub text: String,
    /// Raw `href`, usually a query-string URL such as `plan.php?type=10&id=42`
    pub address: String,
}

/// One absolutely-positioned block of the timetable grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawCourseCell {
    /// Cell text with every anchor removed, `<br>` rendered as a newline
    pub text: String,
    pub anchors: BTreeSet<RawAnchor>,
    pub top: i32,
    pub left: i32,
    /// From the `cw` attribute
    pub width: i32,
    /// From the `ch` attribute
    pub height: i32,
}

impl RawCourseCell {
    /// Returns false for cells that cannot describe a course
    pub fn is_plausible(&self) -> bool {
        !self.text.is_empty() && self.top > 0 && self.left > 0 && self.width > 0 && self.height > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseType {
    Lecture,
    Lab,
    Project,
    Practical,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekParity {
    Odd,
    Even,
    Every,
}

/// A course occurrence produced by one ingestion run.
///
/// Equality and hashing cover every field, so two runs over an unchanged page
/// produce equal values. Carries no identifier; see [`StoredCourse`] for the
/// persisted form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedCourse {
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    pub name: String,
    pub course_type: CourseType,
    pub teachers: String,
    /// `None` when the cell's column matched no known day
    pub day_of_week: Option<Weekday>,
    pub week_parity: WeekParity,
    pub classrooms: String,
    pub additional_info: Option<String>,
}

impl NormalizedCourse {
    /// Key used to print courses in timetable order
    fn display_order(&self) -> (u32, NaiveTime, NaiveTime, &str) {
        let day = self
            .day_of_week
            .map(|d| d.num_days_from_monday())
            .unwrap_or(u32::MAX);
        (day, self.starts_at, self.ends_at, self.name.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub u64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleId(pub u64);

impl fmt::Display for ScheduleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A course as it is held by the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredCourse {
    pub id: CourseId,
    #[serde(flatten)]
    pub course: NormalizedCourse,
}

/// A timetable source registered with the schedule service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    /// Absolute URL, or a path relative to the configured base URL
    pub url: String,
}

/// The set of courses computed for one schedule in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleCourseSet(HashSet<NormalizedCourse>);

impl ScheduleCourseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a course, returning false if an equal one was already present
    pub fn insert(&mut self, course: NormalizedCourse) -> bool {
        self.0.insert(course)
    }

    pub fn contains(&self, course: &NormalizedCourse) -> bool {
        self.0.contains(course)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedCourse> {
        self.0.iter()
    }

    /// Courses ordered by day, start, end and name
    pub fn sorted(&self) -> Vec<&NormalizedCourse> {
        let mut courses: Vec<_> = self.0.iter().collect();
        courses.sort_by(|a, b| a.display_order().cmp(&b.display_order()));
        courses
    }

    pub fn into_inner(self) -> HashSet<NormalizedCourse> {
        self.0
    }

    /// Counts used for logging a finished run
    pub fn summary(&self) -> CourseSetSummary {
        let mut by_type = BTreeMap::new();
        let mut by_day = [0; 7];
        let mut unplaced = 0;

        for course in &self.0 {
            *by_type.entry(course.course_type).or_insert(0) += 1;
            match course.day_of_week {
                Some(day) => by_day[day.num_days_from_monday() as usize] += 1,
                None => unplaced += 1,
            }
        }

        CourseSetSummary {
            total: self.0.len(),
            by_type,
            by_day,
            unplaced,
        }
    }
}

impl FromIterator<NormalizedCourse> for ScheduleCourseSet {
    fn from_iter<I: IntoIterator<Item = NormalizedCourse>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ScheduleCourseSet {
    type Item = NormalizedCourse;
    type IntoIter = std::collections::hash_set::IntoIter<NormalizedCourse>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Aggregate counts over a course set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSetSummary {
    pub total: usize,
    pub by_type: BTreeMap<CourseType, usize>,
    /// Indexed by days from Monday
    pub by_day: [usize; 7],
    /// Courses whose day of week could not be determined
    pub unplaced: usize,
}

impl CourseSetSummary {
    pub fn on_day(&self, day: Weekday) -> usize {
        self.by_day[day.num_days_from_monday() as usize]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn course(name: &str, day: Weekday, start: (u32, u32), end: (u32, u32)) -> NormalizedCourse {
        NormalizedCourse {
            starts_at: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            name: name.to_string(),
            course_type: CourseType::Lecture,
            teachers: "Jan Kowalski".to_string(),
            day_of_week: Some(day),
            week_parity: WeekParity::Every,
            classrooms: "CEK 101".to_string(),
            additional_info: None,
        }
    }

    #[test]
    fn test_course_set_collapses_equal_values() {
        let mut set = ScheduleCourseSet::new();
        assert!(set.insert(course("Analiza", Weekday::Mon, (8, 30), (10, 0))));
        assert!(!set.insert(course("Analiza", Weekday::Mon, (8, 30), (10, 0))));
        assert!(set.insert(course("Analiza", Weekday::Tue, (8, 30), (10, 0))));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_sorted_orders_by_day_then_start() {
        let set: ScheduleCourseSet = vec![
            course("C", Weekday::Tue, (8, 0), (9, 0)),
            course("B", Weekday::Mon, (10, 0), (11, 0)),
            course("A", Weekday::Mon, (8, 0), (9, 0)),
        ]
        .into_iter()
        .collect();

        let names: Vec<&str> = set.sorted().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_summary_counts_types_days_and_unplaced() {
        let mut lab = course("Fizyka", Weekday::Wed, (12, 0), (13, 30));
        lab.course_type = CourseType::Lab;
        lab.day_of_week = None;

        let set: ScheduleCourseSet = vec![
            course("Analiza", Weekday::Mon, (8, 30), (10, 0)),
            course("Algebra", Weekday::Mon, (10, 15), (11, 45)),
            course("Chemia", Weekday::Fri, (8, 30), (10, 0)),
            lab,
        ]
        .into_iter()
        .collect();
        let summary = set.summary();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.unplaced, 1);
        assert_eq!(summary.by_type.get(&CourseType::Lab), Some(&1));
        assert_eq!(summary.by_type.get(&CourseType::Lecture), Some(&3));
        assert_eq!(summary.on_day(Weekday::Mon), 2);
        assert_eq!(summary.on_day(Weekday::Fri), 1);
        assert_eq!(summary.on_day(Weekday::Wed), 0);
        assert_eq!(summary.by_day, [2, 0, 0, 0, 1, 0, 0]);
    }

    #[test]
    fn test_course_serializes_enums_in_upper_case() {
        let json = serde_json::to_value(course("Analiza", Weekday::Mon, (8, 30), (10, 0))).unwrap();
        assert_eq!(json["course_type"], "LECTURE");
        assert_eq!(json["week_parity"], "EVERY");
        assert_eq!(json["starts_at"], "08:30:00");
    }
}
