//! Billing period types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A billing period, normally one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Period name (e.g., "March 2026").
    pub name: String,
    /// Start date of the period.
    pub start_date: NaiveDate,
    /// End date of the period (inclusive).
    pub end_date: NaiveDate,
    /// Month key in `YYYY-MM` form.
    pub month_key: String,
}

impl Period {
    /// Builds the calendar-month period for `year`/`month`.
    ///
    /// Returns `None` for an invalid month.
    #[must_use]
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let start_date = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        let end_date = next_month.pred_opt()?;

        Some(Self {
            name: start_date.format("%B %Y").to_string(),
            start_date,
            end_date,
            month_key: format!("{year:04}-{month:02}"),
        })
    }

    /// Returns true if the given date falls within this period.
    #[must_use]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Returns true if this period overlaps the window `[from, until]`.
    /// An absent bound leaves that side of the window open.
    #[must_use]
    pub fn overlaps(&self, from: Option<NaiveDate>, until: Option<NaiveDate>) -> bool {
        let starts_before_window_ends = until.is_none_or(|until| self.start_date <= until);
        let ends_after_window_starts = from.is_none_or(|from| self.end_date >= from);
        starts_before_window_ends && ends_after_window_starts
    }
}
