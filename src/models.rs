use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

/// Conversion factor between recorded hours and allowance days.
pub const HOURS_PER_DAY: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LeaveType {
    ZOR,
    DOK,
    THU,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategoryConfig {
    pub label: &'static str,
    pub max_days: u32,
    pub color: &'static str,
    pub description: &'static str,
}

const ZOR_CONFIG: CategoryConfig = CategoryConfig {
    label: "Zorgverlof (Care Leave)",
    max_days: 56,
    color: "#3b82f6",
    description: "Max 56 days",
};

const DOK_CONFIG: CategoryConfig = CategoryConfig {
    label: "Doktersbezoek (Doctor Visit)",
    max_days: 10,
    color: "#22c55e",
    description: "Max 10 days",
};

const THU_CONFIG: CategoryConfig = CategoryConfig {
    label: "Thuiswerk (Work From Home)",
    max_days: 120,
    color: "#8b5cf6",
    description: "Max 120 days",
};

impl LeaveType {
    /// Display order used by summary cards, charts and the form selector.
    pub const ALL: [LeaveType; 3] = [LeaveType::ZOR, LeaveType::DOK, LeaveType::THU];

    pub const fn code(self) -> &'static str {
        match self {
            LeaveType::ZOR => "ZOR",
            LeaveType::DOK => "DOK",
            LeaveType::THU => "THU",
        }
    }

    pub const fn config(self) -> &'static CategoryConfig {
        match self {
            LeaveType::ZOR => &ZOR_CONFIG,
            LeaveType::DOK => &DOK_CONFIG,
            LeaveType::THU => &THU_CONFIG,
        }
    }
}

impl fmt::Display for LeaveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for LeaveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ZOR" => Ok(LeaveType::ZOR),
            "DOK" => Ok(LeaveType::DOK),
            "THU" => Ok(LeaveType::THU),
            other => Err(format!("unknown leave type '{other}'")),
        }
    }
}

/// Category as recorded on an entry.
///
/// Codes this build does not know are kept verbatim so that a data file
/// written by another version survives a load/save cycle unchanged. They are
/// skipped by category totals but still show up in date and month groupings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryType {
    Known(LeaveType),
    Unrecognized(String),
}

impl EntryType {
    pub fn known(&self) -> Option<LeaveType> {
        match self {
            EntryType::Known(leave_type) => Some(*leave_type),
            EntryType::Unrecognized(_) => None,
        }
    }

    pub fn code(&self) -> &str {
        match self {
            EntryType::Known(leave_type) => leave_type.code(),
            EntryType::Unrecognized(code) => code,
        }
    }
}

impl From<LeaveType> for EntryType {
    fn from(leave_type: LeaveType) -> Self {
        EntryType::Known(leave_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveEntry {
    pub id: String,
    pub date: NaiveDate,
    pub hours: f64,
    #[serde(rename = "type", alias = "category")]
    pub leave_type: EntryType,
    #[serde(default)]
    pub note: String,
}

/// A validated entry that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveEntry {
    pub date: NaiveDate,
    pub hours: f64,
    pub leave_type: EntryType,
    pub note: String,
}

impl NewLeaveEntry {
    pub fn with_id(self, id: String) -> LeaveEntry {
        LeaveEntry {
            id,
            date: self.date,
            hours: self.hours,
            leave_type: self.leave_type,
            note: self.note,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Form body posted by the HTML entry form. Every field arrives as text and
/// is checked by the handler before it reaches the store.
#[derive(Debug, Deserialize)]
pub struct EntryForm {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub hours: String,
    #[serde(rename = "type", default)]
    pub leave_type: String,
    #[serde(default)]
    pub note: String,
}

/// JSON body for creating or replacing an entry. Fields are loose so that a
/// missing or mistyped value is reported by validation, not by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct EntryPayload {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub hours: Option<serde_json::Value>,
    #[serde(rename = "type", alias = "category", default)]
    pub leave_type: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ThemePayload {
    pub theme: Theme,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub view: Option<String>,
    pub month: Option<String>,
    pub edit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CalendarQuery {
    pub month: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    pub label: &'static str,
    pub max_days: u32,
    pub total_hours: f64,
    pub used_days: u64,
    pub used_hours: f64,
    pub remaining_days: f64,
    pub percent_used: f64,
}

impl CategorySummary {
    /// Percentage for a progress bar; `percent_used` itself may exceed 100.
    pub fn progress_percent(&self) -> f64 {
        self.percent_used.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DistributionPoint {
    #[serde(rename = "type")]
    pub leave_type: LeaveType,
    pub label: &'static str,
    pub color: &'static str,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub label: String,
    pub total_hours: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub summaries: Vec<CategorySummary>,
    pub distribution: Vec<DistributionPoint>,
    pub monthly_usage: Vec<MonthlyPoint>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub month: String,
    pub days: BTreeMap<NaiveDate, Vec<LeaveEntry>>,
}
