use anyhow::{anyhow, Result};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub day_name: String,
    pub date: String,
    pub day: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    fn offset(self, date: NaiveDate) -> i64 {
        match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday() as i64,
            WeekStart::Monday => date.weekday().num_days_from_monday() as i64,
        }
    }

    /// Short weekday headings in grid order.
    pub fn headings(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"],
            WeekStart::Monday => ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        }
    }
}

/// Whole weeks covering the month that contains `any_day`.
pub fn month_grid(any_day: NaiveDate, week_start: WeekStart) -> Vec<CalendarDay> {
    let first = any_day.with_day(1).unwrap_or(any_day);
    let last = last_day_of_month(first);
    let start = first - Duration::days(week_start.offset(first));
    let end = last + Duration::days(6 - week_start.offset(last));

    let mut days = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        days.push(CalendarDay {
            day_name: cursor.format("%a").to_string(),
            date: day_key(cursor),
            day: cursor.format("%d").to_string(),
        });
        match cursor.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    days
}

pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(input: &str) -> Result<NaiveDate> {
    let raw = input.trim();
    NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid month (use YYYY-MM): {}", raw))
}

pub fn parse_day(input: &str) -> Result<NaiveDate> {
    let raw = input.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow!("invalid date (use YYYY-MM-DD): {}", raw))
}

fn last_day_of_month(first: NaiveDate) -> NaiveDate {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.and_then(|d| d.pred_opt()).unwrap_or(first)
}
