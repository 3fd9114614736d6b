use crate::models::LeaveEntry;
use crate::stats::entries_by_date;
use chrono::{Datelike, Duration, NaiveDate};

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `delta` months away from the month of `month`.
pub fn shift_month(month: NaiveDate, delta: i32) -> NaiveDate {
    let index = month.year() * 12 + month.month0() as i32 + delta;
    NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        .unwrap_or_else(|| month_start(month))
}

pub fn days_in_month(month: NaiveDate) -> u32 {
    let start = month_start(month);
    let next = shift_month(start, 1);
    (next - start).num_days() as u32
}

/// Parses a `YYYY-MM` query value into the first day of that month.
pub fn parse_month(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d").ok()
}

pub fn month_key(month: NaiveDate) -> String {
    month.format("%Y-%m").to_string()
}

#[derive(Debug)]
pub struct CalendarDay<'a> {
    pub date: NaiveDate,
    pub is_today: bool,
    pub entries: Vec<&'a LeaveEntry>,
}

/// Monday-first month grid. `leading_blanks` empty cells precede day 1.
#[derive(Debug)]
pub struct CalendarMonth<'a> {
    pub month: NaiveDate,
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay<'a>>,
}

impl<'a> CalendarMonth<'a> {
    pub fn build(month: NaiveDate, entries: &'a [LeaveEntry], today: NaiveDate) -> Self {
        let month = month_start(month);
        let mut by_date = entries_by_date(entries);

        let days = (0..days_in_month(month))
            .map(|offset| {
                let date = month + Duration::days(i64::from(offset));
                CalendarDay {
                    date,
                    is_today: date == today,
                    entries: by_date.remove(&date).unwrap_or_default(),
                }
            })
            .collect();

        Self {
            month,
            leading_blanks: month.weekday().num_days_from_monday(),
            days,
        }
    }

    pub fn title(&self) -> String {
        self.month.format("%B %Y").to_string()
    }
}
