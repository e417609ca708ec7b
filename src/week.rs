//! Week window value type
//!
//! A `WeekWindow` pins one harvest run to a Monday..Sunday ISO week for a
//! single music style. Every persisted document of the run carries the
//! derived `clouder_week` id (`STYLE_YEAR_WEEK`, upper-cased) as part of its
//! key, which is what makes re-runs idempotent.

use std::fmt;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde_json::json;

use crate::error::{Error, Result};
use crate::store::Document;

/// Recognized styles, keyed by the upstream catalog genre id
pub const STYLES: &[(u32, &str)] = &[(1, "dnb"), (90, "techno")];

/// Categories created for every week regardless of style
const BASE_PLAYLISTS: &[&str] = &["new", "old", "not", "trash"];

/// Style-specific category sets; styles absent here get no dedicated set
const STYLE_PLAYLISTS: &[(&str, &[&str])] = &[
    (
        "dnb",
        &["melodic", "eastern", "hard", "shadowy", "party", "redrum", "alt"],
    ),
    ("techno", &["mid", "eastern", "house", "low", "up", "alt"]),
];

/// One harvest run's week window, immutable after construction
#[derive(Debug, Clone)]
pub struct WeekWindow {
    week: u32,
    year: i32,
    style_id: u32,
    style_name: &'static str,
    week_start: NaiveDate,
    week_end: NaiveDate,
}

impl WeekWindow {
    /// Build the window for `(week, year, style_id)`
    ///
    /// Fails with [`Error::InvalidStyle`] for an unknown style id and with
    /// [`Error::WeekOutOfRange`] when the computed week start spills outside
    /// `year` (week 53 in a 52-week year).
    pub fn new(week: u32, year: i32, style_id: u32) -> Result<Self> {
        let style_name = STYLES
            .iter()
            .find(|(id, _)| *id == style_id)
            .map(|(_, name)| *name)
            .ok_or(Error::InvalidStyle(style_id))?;

        let (week_start, week_end) = Self::start_end_dates(year, week)?;

        Ok(Self {
            week,
            year,
            style_id,
            style_name,
            week_start,
            week_end,
        })
    }

    /// Week start/end per the first-Monday rule: take the first Monday on or
    /// after Jan 1, add `week - 1` whole weeks, span through the Sunday.
    fn start_end_dates(year: i32, week: u32) -> Result<(NaiveDate, NaiveDate)> {
        let jan_first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or(Error::WeekOutOfRange { week, year })?;

        let mut first_monday = jan_first;
        if jan_first.weekday() != Weekday::Mon {
            let days_ahead = 7 - jan_first.weekday().num_days_from_monday();
            first_monday = jan_first + Duration::days(i64::from(days_ahead));
        }

        let week_start = first_monday + Duration::weeks(i64::from(week) - 1);
        let week_end = week_start + Duration::days(6);

        if week_start.year() != year {
            return Err(Error::WeekOutOfRange { week, year });
        }

        Ok((week_start, week_end))
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn style_id(&self) -> u32 {
        self.style_id
    }

    pub fn style_name(&self) -> &'static str {
        self.style_name
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn week_end(&self) -> NaiveDate {
        self.week_end
    }

    /// Lookback boundary separating "new" from "old" releases
    pub fn sp_window_start(&self) -> NaiveDate {
        self.week_start - Duration::days(7)
    }

    /// Natural key of the run, e.g. `DNB_2025_7`
    pub fn clouder_week(&self) -> String {
        format!("{}_{}_{}", self.style_name, self.year, self.week).to_uppercase()
    }

    /// Playlist categories for this window, as (group, names) pairs
    ///
    /// The `base` group is fixed; the `category` group is the style's own set,
    /// empty when the style has no dedicated playlists.
    pub fn playlist_groups(&self) -> [(&'static str, &'static [&'static str]); 2] {
        let category = STYLE_PLAYLISTS
            .iter()
            .find(|(style, _)| *style == self.style_name)
            .map(|(_, names)| *names)
            .unwrap_or(&[]);
        [("base", BASE_PLAYLISTS), ("category", category)]
    }

    /// Display name for one category playlist,
    /// `STYLE :: YEAR :: WW :: CATEGORY`
    pub fn playlist_display_name(&self, category: &str) -> String {
        format!(
            "{} :: {} :: {:02} :: {}",
            self.style_name.to_uppercase(),
            self.year,
            self.week,
            category.to_uppercase()
        )
    }

    /// Derived fields persisted into the `clouder_weeks` collection
    pub fn to_document(&self) -> Document {
        let [(_, base), (_, category)] = self.playlist_groups();
        json!({
            "week": self.week,
            "year": self.year,
            "style": self.style_name,
            "style_id": self.style_id,
            "week_start": self.week_start.to_string(),
            "week_end": self.week_end.to_string(),
            "id": self.clouder_week(),
            "base_playlists": base,
            "cat_playlists": category,
        })
    }
}

impl fmt::Display for WeekWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clouder_week())
    }
}
