//! Calendar-aware age calculation.
//!
//! Chrono has no year/month/day diff, so the borrowing rules are done by hand:
//! a negative day count borrows from the month preceding `today` (whose length
//! chrono supplies, leap years included), a negative month count borrows from
//! the years.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Difference between two dates in whole calendar units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub years: i32,
    pub months: u32,
    pub days: u32,
}

impl Age {
    pub fn between(birth: NaiveDate, today: NaiveDate) -> Self {
        let mut years = today.year() - birth.year();
        let mut months = today.month() as i32 - birth.month() as i32;
        let mut days = today.day() as i32 - birth.day() as i32;

        if days < 0 {
            months -= 1;
            let (prev_year, prev_month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            days += days_in_month(prev_year, prev_month) as i32;
        }

        if months < 0 {
            years -= 1;
            months += 12;
        }

        Age {
            years,
            months: months as u32,
            days: days as u32,
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} year{}, {} month{}, {} day{}",
            self.years,
            plural(self.years as i64),
            self.months,
            plural(self.months as i64),
            self.days,
            plural(self.days as i64)
        )
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Length of a month, taken from chrono by stepping back from the first day
/// of the following month.
fn days_in_month(year: i32, month: u32) -> u32 {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}
