//! Configuration for the timetable layout, classification tables and fetching

use super::error::IngestError;
use super::time::PixelGrid;
use super::types::CourseType;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Top-level ingestion configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub layout: LayoutConfig,
    pub classifier: ClassifierConfig,
    pub fetch: FetchConfig,
}

/// Pixel layout of the timetable page.
///
/// These values only hold for the one page layout the scraper targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Class carried by the "HH:MM-HH:MM" header cells
    pub time_cell_class: String,
    /// Class carried by every course block
    pub course_cell_class: String,
    pub grid: PixelGrid,
    /// Left offsets of the odd-week (or whole) half of each day column
    pub day_columns: Vec<DayColumn>,
    /// Offset between the odd-week and even-week halves of a day column
    pub half_column_width_px: i32,
    /// Cell width of a course held every week
    pub every_week_width_px: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayColumn {
    pub left_px: i32,
    pub day: Weekday,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let day_columns = [
            (254, Weekday::Mon),
            (409, Weekday::Tue),
            (564, Weekday::Wed),
            (719, Weekday::Thu),
            (874, Weekday::Fri),
            (1029, Weekday::Sat),
            (1184, Weekday::Sun),
        ]
        .into_iter()
        .map(|(left_px, day)| DayColumn { left_px, day })
        .collect();

        Self {
            time_cell_class: "cd".to_string(),
            course_cell_class: "coursediv".to_string(),
            grid: PixelGrid::default(),
            day_columns,
            half_column_width_px: 78,
            every_week_width_px: 154,
        }
    }
}

/// Lookup tables used to classify a course cell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Course type abbreviation (as printed after the comma) to type
    pub course_types: HashMap<String, CourseType>,
    /// Value following `type` in a teacher link's query string
    pub teacher_link_kind: String,
    /// Value following `type` in a room link's query string
    pub room_link_kind: String,
    /// Text that starts the free-form note of a cell
    pub note_marker: String,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let course_types = [
            ("wyk", CourseType::Lecture),
            ("lab", CourseType::Lab),
            ("proj", CourseType::Project),
            ("ćw", CourseType::Practical),
            ("cw", CourseType::Practical),
            ("sem", CourseType::Info),
        ]
        .into_iter()
        .map(|(abbrev, kind)| (abbrev.to_string(), kind))
        .collect();

        Self {
            course_types,
            teacher_link_kind: "=10".to_string(),
            room_link_kind: "=20".to_string(),
            note_marker: "uwagi:".to_string(),
        }
    }
}

/// HTTP settings for fetching timetable pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Base URL used to resolve relative schedule URLs
    pub base_url: Option<String>,
    pub user_agent: String,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    /// Upper bound on schedules fetched at the same time
    pub max_concurrent_fetches: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            connect_timeout_secs: 10,
            timeout_secs: 30,
            max_concurrent_fetches: 4,
        }
    }
}

impl IngestConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Sections or fields missing from the file keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, IngestError> {
        let content = fs::read_to_string(path).map_err(|e| IngestError::Config {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let config: IngestConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make pixel conversion or lookups meaningless
    pub fn validate(&self) -> Result<(), IngestError> {
        let layout = &self.layout;

        if layout.grid.one_hour_cell_height_px <= 0 {
            return Err(IngestError::Config {
                message: "layout.grid.one_hour_cell_height_px must be positive".to_string(),
            });
        }

        if layout.day_columns.is_empty() {
            return Err(IngestError::Config {
                message: "layout.day_columns must not be empty".to_string(),
            });
        }

        if layout.time_cell_class.trim().is_empty() || layout.course_cell_class.trim().is_empty() {
            return Err(IngestError::Config {
                message: "layout marker classes must not be empty".to_string(),
            });
        }

        if self.fetch.max_concurrent_fetches == 0 {
            return Err(IngestError::Config {
                message: "fetch.max_concurrent_fetches must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}
