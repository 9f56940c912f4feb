//! Scrapes a pixel-positioned timetable page into typed course records and
//! reconciles them against previously stored courses.
//!
//! The pipeline runs leaf first:
//! 1. [`ingest::parse_style`] and friends read geometry from inline styles
//! 2. [`ingest::LayoutScraper`] collects raw time headers and course cells
//! 3. [`ingest::resolve_anchor_hour`] and [`ingest::PixelGrid`] turn pixels into times
//! 4. [`ingest::CourseClassifier`] produces [`ingest::NormalizedCourse`] values
//! 5. [`ingest::diff`] computes the creations and deletions
//!
//! [`service::IngestionService`] wires the stages to the fetching, storage and
//! publishing collaborators.

pub mod events;
pub mod ingest;
pub mod service;
pub mod store;
