use crate::models::{
    CategorySummary, DistributionPoint, HOURS_PER_DAY, LeaveEntry, LeaveType, MonthlyPoint,
    StatsResponse,
};
use chrono::{Datelike, Local, NaiveDate};
use std::collections::BTreeMap;

/// Months covered by the dashboard histogram.
pub const HISTOGRAM_MONTHS: u32 = 6;

/// Hours per known category. Every category is present, unused ones at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotals(BTreeMap<LeaveType, f64>);

impl CategoryTotals {
    pub fn hours(&self, leave_type: LeaveType) -> f64 {
        self.0.get(&leave_type).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LeaveType, f64)> + '_ {
        self.0.iter().map(|(leave_type, hours)| (*leave_type, *hours))
    }
}

pub fn total_hours_by_category(entries: &[LeaveEntry]) -> CategoryTotals {
    let mut totals: BTreeMap<LeaveType, f64> =
        LeaveType::ALL.iter().map(|leave_type| (*leave_type, 0.0)).collect();

    for entry in entries {
        if let Some(leave_type) = entry.leave_type.known() {
            *totals.entry(leave_type).or_default() += entry.hours;
        }
    }

    CategoryTotals(totals)
}

pub fn summary(
    leave_type: LeaveType,
    total_hours: f64,
    hours_per_day: f64,
    max_days: u32,
) -> CategorySummary {
    let max = f64::from(max_days);
    let mut result = CategorySummary {
        leave_type,
        label: leave_type.config().label,
        max_days,
        total_hours,
        used_days: 0,
        used_hours: 0.0,
        remaining_days: max,
        percent_used: 0.0,
    };

    if total_hours == 0.0 || hours_per_day <= 0.0 {
        return result;
    }

    let days = total_hours / hours_per_day;
    result.used_days = days.floor().max(0.0) as u64;
    result.used_hours = total_hours % hours_per_day;
    result.remaining_days = max - days;
    if max > 0.0 {
        result.percent_used = days / max * 100.0;
    }
    result
}

/// Summaries for every category in display order, using the static table.
pub fn category_summaries(entries: &[LeaveEntry]) -> Vec<CategorySummary> {
    let totals = total_hours_by_category(entries);
    LeaveType::ALL
        .iter()
        .map(|leave_type| {
            summary(
                *leave_type,
                totals.hours(*leave_type),
                HOURS_PER_DAY,
                leave_type.config().max_days,
            )
        })
        .collect()
}

/// `window_months` consecutive month buckets ending at the month of
/// `reference`, oldest first.
pub fn monthly_histogram(
    entries: &[LeaveEntry],
    window_months: u32,
    reference: NaiveDate,
) -> Vec<MonthlyPoint> {
    let window = i64::from(window_months);
    let last = month_index(reference);
    let first = last - window + 1;

    let mut buckets: Vec<MonthlyPoint> = (first..=last)
        .map(|index| {
            let (year, month) = from_month_index(index);
            MonthlyPoint {
                year,
                month,
                label: month_label(year, month),
                total_hours: 0.0,
            }
        })
        .collect();

    for entry in entries {
        let index = month_index(entry.date);
        if (first..=last).contains(&index) {
            buckets[(index - first) as usize].total_hours += entry.hours;
        }
    }

    buckets
}

pub fn entries_by_date(entries: &[LeaveEntry]) -> BTreeMap<NaiveDate, Vec<&LeaveEntry>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<&LeaveEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.date).or_default().push(entry);
    }
    grouped
}

pub fn build_stats(entries: &[LeaveEntry]) -> StatsResponse {
    build_stats_at(Local::now().date_naive(), entries)
}

pub fn build_stats_at(today: NaiveDate, entries: &[LeaveEntry]) -> StatsResponse {
    // LeaveType orders by declaration, so map iteration follows display order.
    let distribution = total_hours_by_category(entries)
        .iter()
        .map(|(leave_type, hours)| {
            let config = leave_type.config();
            DistributionPoint {
                leave_type,
                label: config.label,
                color: config.color,
                hours,
            }
        })
        .collect();

    StatsResponse {
        summaries: category_summaries(entries),
        distribution,
        monthly_usage: monthly_histogram(entries, HISTOGRAM_MONTHS, today),
    }
}

/// "3 days & 4 hours" style rendering of a used-hours figure.
pub fn format_used(total_hours: f64, hours_per_day: f64) -> String {
    if total_hours == 0.0 || hours_per_day <= 0.0 {
        return "0 days & 0 hours".to_string();
    }

    let days = (total_hours / hours_per_day).floor();
    let hours = total_hours % hours_per_day;
    format!(
        "{} {} & {} {}",
        format_number(days),
        if days == 1.0 { "day" } else { "days" },
        format_number(hours),
        if hours == 1.0 { "hour" } else { "hours" },
    )
}

/// Whole numbers without a fractional part, anything else as-is.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn month_index(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

fn from_month_index(index: i64) -> (i32, u32) {
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|date| date.format("%b %y").to_string())
        .unwrap_or_else(|| format!("{year}-{month:02}"))
}
