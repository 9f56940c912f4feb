//! Inline style and numeric attribute extraction.
//!
//! The timetable page positions every block with `style="top:259px;left:254px;..."`
//! and stores its size in the non-standard `cw`/`ch` attributes. None of the
//! accessors here fail: anything unreadable comes back as an empty map or `0`.

use scraper::ElementRef;
use std::collections::HashMap;

/// Parses an inline style string into property name/value pairs.
///
/// The string is split on `:`, and each pair of neighbouring tokens is read as
/// `(name, value)`: the name is the last `;` segment of the left token and the
/// value the first `;` segment of the right token. This tolerates trailing
/// semicolons and stray separators.
pub fn parse_style(style: &str) -> HashMap<String, String> {
    let tokens: Vec<&str> = style.split(':').collect();
    let mut properties = HashMap::new();

    for pair in tokens.windows(2) {
        let name = pair[0].rsplit(';').next().unwrap_or_default().trim();
        let value = pair[1].split(';').next().unwrap_or_default().trim();

        if !name.is_empty() {
            properties.insert(name.to_string(), value.to_string());
        }
    }

    properties
}

/// Reads and parses the `style` attribute of an element
pub fn element_style(element: &ElementRef) -> HashMap<String, String> {
    element
        .value()
        .attr("style")
        .map(parse_style)
        .unwrap_or_default()
}

/// Reads a pixel-valued property such as `top` or `left`.
///
/// Returns `0` when the property is absent or its numeric part doesn't parse.
pub fn pixel_property(properties: &HashMap<String, String>, name: &str) -> i32 {
    let Some(value) = properties.get(name) else {
        return 0;
    };

    let number = match value.find("px") {
        Some(end) => &value[..end],
        None => value.as_str(),
    };

    number.trim().parse().unwrap_or(0)
}

/// Reads a plain integer attribute such as `cw` or `ch`, `0` if absent or non-numeric
pub fn numeric_attribute(element: &ElementRef, name: &str) -> i32 {
    element
        .value()
        .attr(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
