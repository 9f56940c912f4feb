//! Schedule ingestion pipeline: page scraping, classification and reconciliation

mod classify;
mod client;
mod config;
mod error;
mod reconcile;
mod scrape;
mod style;
mod time;
mod types;

pub use classify::{link_kind, CourseClassifier, DayColumnTable};
pub use client::ScheduleClient;
pub(crate) use client::generate_correlation_id;
pub use config::{ClassifierConfig, DayColumn, FetchConfig, IngestConfig, LayoutConfig};
pub use error::IngestError;
pub use reconcile::{diff, CourseDelta};
pub use scrape::{LayoutScraper, ScrapedLayout};
pub use style::{element_style, numeric_attribute, parse_style, pixel_property};
pub use time::{resolve_anchor_hour, PixelGrid};
pub use types::*;

#[cfg(test)]
pub(crate) use types::tests as tests_support;

use scraper::Html;
use tracing::{debug, info};

/// Scraper and classifier built once from the configuration and shared
/// between runs.
#[derive(Debug)]
pub struct SchedulePipeline {
    scraper: LayoutScraper,
    classifier: CourseClassifier,
}

impl SchedulePipeline {
    pub fn new(config: &IngestConfig) -> Result<Self, IngestError> {
        Ok(Self {
            scraper: LayoutScraper::new(&config.layout)?,
            classifier: CourseClassifier::new(&config.layout, &config.classifier),
        })
    }

    /// Parses a timetable page into its course set.
    ///
    /// # Returns
    /// * `Ok(ScheduleCourseSet)` - At least one course
    /// * `Err(IngestError::NoScheduleAnchorTime)` - The page has no time header
    /// * `Err(IngestError::EmptyCourseSet)` - No course cell survived
    pub fn parse_html(&self, html: &str) -> Result<ScheduleCourseSet, IngestError> {
        let document = Html::parse_document(html);
        let layout = self.scraper.scrape(&document);

        debug!(
            intervals = layout.intervals.len(),
            cells = layout.cells.len(),
            "Scraped timetable layout"
        );

        self.classify_layout(&layout)
    }

    /// Classifies already scraped cells against the page's anchor hour
    pub fn classify_layout(&self, layout: &ScrapedLayout) -> Result<ScheduleCourseSet, IngestError> {
        let anchor = resolve_anchor_hour(&layout.intervals)?;

        let courses: ScheduleCourseSet = layout
            .cells
            .iter()
            .map(|cell| self.classifier.classify(cell, anchor))
            .collect();

        if courses.is_empty() {
            return Err(IngestError::EmptyCourseSet);
        }

        let summary = courses.summary();
        info!(
            anchor = %anchor,
            courses = summary.total,
            unplaced = summary.unplaced,
            "Classified schedule courses"
        );

        Ok(courses)
    }
}
