//! Converts grid geometry into clock times.

use super::error::IngestError;
use super::types::RawTimeInterval;
use chrono::{Duration, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MINUTES_PER_QUARTER: i64 = 15;
const QUARTERS_PER_HOUR: i64 = 4;
const QUARTERS_PER_DAY: i64 = 24 * QUARTERS_PER_HOUR;

/// Returns the grid's anchor hour: the earliest start among the time header cells.
///
/// Header cells whose start isn't a valid `HH:MM` are skipped. Fails with
/// [`IngestError::NoScheduleAnchorTime`] when nothing is left.
pub fn resolve_anchor_hour<'a, I>(intervals: I) -> Result<NaiveTime, IngestError>
where
    I: IntoIterator<Item = &'a RawTimeInterval>,
{
    intervals
        .into_iter()
        .filter_map(|interval| match NaiveTime::parse_from_str(interval.start.trim(), "%H:%M") {
            Ok(time) => Some(time),
            Err(e) => {
                debug!(start = %interval.start, error = %e, "Skipping unparsable time header");
                None
            }
        })
        .min()
        .ok_or(IngestError::NoScheduleAnchorTime)
}

/// Pixel geometry of the timetable grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PixelGrid {
    /// `top` of a block starting exactly at the anchor hour
    pub first_cell_top_px: i32,
    pub one_hour_cell_height_px: i32,
    /// Added to a block's bottom edge before converting it to an end time
    pub cell_border_px: i32,
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self {
            first_cell_top_px: 259,
            one_hour_cell_height_px: 45,
            cell_border_px: 1,
        }
    }
}

impl PixelGrid {
    /// Converts a vertical pixel offset into a time of day.
    ///
    /// The offset from the first row is rounded *up* to the next quarter hour
    /// and added to `anchor`. Times past midnight wrap around.
    ///
    /// `top` is an `i64` so a block's bottom edge (`top + height`) can be
    /// computed from any pair of page attributes.
    pub fn to_time(&self, top: i64, anchor: NaiveTime, add_cell_border: bool) -> NaiveTime {
        let mut top = top;
        if add_cell_border {
            top += i64::from(self.cell_border_px);
        }

        let difference = top - i64::from(self.first_cell_top_px);
        let quarter_hours = ceil_div(
            difference * QUARTERS_PER_HOUR,
            i64::from(self.one_hour_cell_height_px.max(1)),
        );

        // Whole days don't move the clock.
        let quarter_hours = quarter_hours.rem_euclid(QUARTERS_PER_DAY);
        let (time, _) =
            anchor.overflowing_add_signed(Duration::minutes(quarter_hours * MINUTES_PER_QUARTER));
        time
    }
}

/// Integer division rounding towards positive infinity, `divisor` > 0
fn ceil_div(dividend: i64, divisor: i64) -> i64 {
    -((-dividend).div_euclid(divisor))
}
