//! Extraction of raw time headers and course blocks from a timetable page.

use super::config::LayoutConfig;
use super::error::IngestError;
use super::style::{element_style, numeric_attribute, pixel_property};
use super::types::{RawAnchor, RawCourseCell, RawTimeInterval};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;
use tracing::debug;

// Static selectors and patterns - compiled once
static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static TIME_INTERVAL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+:\d+-\d+:\d+$").unwrap());
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Header text is always "HH:MM-HH:MM"
const TIME_INTERVAL_LEN: usize = 11;

/// Everything the classifier needs from one page
#[derive(Debug, Clone, Default)]
pub struct ScrapedLayout {
    pub intervals: HashSet<RawTimeInterval>,
    pub cells: HashSet<RawCourseCell>,
}

/// Walks a timetable document using the configured marker classes
#[derive(Debug)]
pub struct LayoutScraper {
    time_selector: Selector,
    course_selector: Selector,
}

impl LayoutScraper {
    pub fn new(layout: &LayoutConfig) -> Result<Self, IngestError> {
        Ok(Self {
            time_selector: class_selector(&layout.time_cell_class)?,
            course_selector: class_selector(&layout.course_cell_class)?,
        })
    }

    pub fn scrape(&self, document: &Html) -> ScrapedLayout {
        ScrapedLayout {
            intervals: self.scrape_time_intervals(document),
            cells: self.scrape_course_cells(document),
        }
    }

    /// Collects every header cell whose text looks like "HH:MM-HH:MM"
    pub fn scrape_time_intervals(&self, document: &Html) -> HashSet<RawTimeInterval> {
        document
            .select(&self.time_selector)
            .filter_map(|el| parse_time_interval(&el.text().collect::<String>()))
            .collect()
    }

    /// Collects every plausible course block; implausible ones are dropped
    pub fn scrape_course_cells(&self, document: &Html) -> HashSet<RawCourseCell> {
        let mut cells = HashSet::new();
        let mut dropped = 0usize;

        for element in document.select(&self.course_selector) {
            let cell = parse_course_cell(&element);
            if cell.is_plausible() {
                cells.insert(cell);
            } else {
                debug!(
                    top = cell.top,
                    left = cell.left,
                    width = cell.width,
                    height = cell.height,
                    "Dropping implausible course cell"
                );
                dropped += 1;
            }
        }

        if dropped > 0 {
            debug!(dropped, kept = cells.len(), "Finished scraping course cells");
        }

        cells
    }
}

fn class_selector(class: &str) -> Result<Selector, IngestError> {
    let selector = format!(".{}", class.trim());
    Selector::parse(&selector).map_err(|e| IngestError::InvalidSelector {
        message: format!("{:?}", e),
        selector: selector.clone(),
    })
}

/// Splits a header cell's text into start and end.
///
/// Only exact "HH:MM-HH:MM" strings are accepted.
fn parse_time_interval(text: &str) -> Option<RawTimeInterval> {
    let text = text.trim();
    if text.chars().count() != TIME_INTERVAL_LEN || !TIME_INTERVAL_REGEX.is_match(text) {
        return None;
    }

    let (start, end) = text.split_once('-')?;
    Some(RawTimeInterval {
        start: start.to_string(),
        end: end.to_string(),
    })
}

/// Reads geometry, links and remaining text of one course block
fn parse_course_cell(element: &ElementRef) -> RawCourseCell {
    let style = element_style(element);

    let anchors: BTreeSet<RawAnchor> = element
        .select(&ANCHOR_SELECTOR)
        .map(|a| RawAnchor {
            text: normalize_whitespace(&a.text().collect::<String>()),
            address: a.value().attr("href").unwrap_or_default().to_string(),
        })
        .collect();

    let mut text = String::new();
    push_text_without_anchors(element, &mut text);

    RawCourseCell {
        text: tidy_lines(&text),
        anchors,
        top: pixel_property(&style, "top"),
        left: pixel_property(&style, "left"),
        width: numeric_attribute(element, "cw"),
        height: numeric_attribute(element, "ch"),
    }
}

/// Appends the element's text, skipping `<a>` subtrees and turning `<br>` into newlines
fn push_text_without_anchors(element: &ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(&WHITESPACE_REGEX.replace_all(text, " "));
        } else if let Some(child_element) = ElementRef::wrap(child) {
            match child_element.value().name() {
                "a" => {}
                "br" => out.push('\n'),
                _ => push_text_without_anchors(&child_element, out),
            }
        }
    }
}

/// Trims every line and drops the empty ones
fn tidy_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}
