use crate::calendar::{CalendarMonth, month_key, shift_month};
use crate::models::{
    CategorySummary, DistributionPoint, EntryForm, EntryType, HOURS_PER_DAY, LeaveEntry,
    LeaveType, MonthlyPoint, StatsResponse, Theme,
};
use crate::stats::{format_number, format_used};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

const UNKNOWN_COLOR: &str = "#6b7280";
const WEEK_DAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryView {
    #[default]
    List,
    Calendar,
}

impl HistoryView {
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("calendar") => HistoryView::Calendar,
            _ => HistoryView::List,
        }
    }
}

/// Values shown in the add/edit form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    pub editing_id: Option<String>,
    pub date: String,
    pub hours: String,
    pub leave_type: String,
    pub note: String,
    pub error: Option<String>,
}

impl FormState {
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            editing_id: None,
            date: today.to_string(),
            hours: "8".to_string(),
            leave_type: LeaveType::THU.code().to_string(),
            note: String::new(),
            error: None,
        }
    }

    pub fn editing(entry: &LeaveEntry) -> Self {
        Self {
            editing_id: Some(entry.id.clone()),
            date: entry.date.to_string(),
            hours: format_number(entry.hours),
            leave_type: entry.leave_type.code().to_string(),
            note: entry.note.clone(),
            error: None,
        }
    }

    /// Echoes a rejected submission back with its error message.
    pub fn rejected(form: &EntryForm, editing_id: Option<String>, error: impl Into<String>) -> Self {
        Self {
            editing_id,
            date: form.date.clone(),
            hours: form.hours.clone(),
            leave_type: form.leave_type.clone(),
            note: form.note.clone(),
            error: Some(error.into()),
        }
    }
}

pub struct Page<'a> {
    pub theme: Theme,
    pub today: NaiveDate,
    pub entries: &'a [LeaveEntry],
    pub stats: &'a StatsResponse,
    pub form: FormState,
    pub view: HistoryView,
    pub month: NaiveDate,
}

pub fn render_index(page: &Page<'_>) -> String {
    let history = match page.view {
        HistoryView::List => render_history_list(page.entries),
        HistoryView::Calendar => render_calendar(&CalendarMonth::build(
            page.month,
            page.entries,
            page.today,
        )),
    };

    INDEX_HTML
        .replace("{{THEME}}", page.theme.as_str())
        .replace("{{THEME_TOGGLE}}", theme_toggle_label(page.theme))
        .replace("{{SUMMARY_CARDS}}", &render_summary_cards(&page.stats.summaries))
        .replace("{{FORM}}", &render_form(&page.form))
        .replace("{{DASHBOARD}}", &render_dashboard(page.stats))
        .replace("{{VIEW_TOGGLE}}", &render_view_toggle(page.view, page.month))
        .replace("{{HISTORY}}", &history)
}

/// Escapes text for HTML bodies and attribute values. Braces are escaped so
/// user text can never complete a template placeholder.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '{' => escaped.push_str("&#123;"),
            '}' => escaped.push_str("&#125;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn theme_toggle_label(theme: Theme) -> &'static str {
    match theme {
        Theme::Light => "&#9790; Dark mode",
        Theme::Dark => "&#9728; Light mode",
    }
}

fn type_color(leave_type: &EntryType) -> &'static str {
    leave_type
        .known()
        .map(|known| known.config().color)
        .unwrap_or(UNKNOWN_COLOR)
}

fn render_summary_cards(summaries: &[CategorySummary]) -> String {
    let mut html = String::new();
    for summary in summaries {
        let config = summary.leave_type.config();
        let _ = write!(
            html,
            r#"<article class="card summary">
  <div class="card-head">
    <div>
      <p class="code">{code}</p>
      <h3>{label}</h3>
    </div>
    <span class="pill" style="background:{color}">{description}</span>
  </div>
  <p class="muted">Used:</p>
  <p class="figure">{used}</p>
  <p class="muted">Remaining:</p>
  <p class="figure">{remaining:.2} days</p>
  <div class="bar"><div class="bar-fill" style="width:{progress:.2}%;background:{color}"></div></div>
  <p class="pct">{percent:.1}% used</p>
</article>
"#,
            code = summary.leave_type.code(),
            label = escape_html(config.label),
            color = config.color,
            description = escape_html(config.description),
            used = escape_html(&format_used(summary.total_hours, HOURS_PER_DAY)),
            remaining = summary.remaining_days,
            progress = summary.progress_percent(),
            percent = summary.percent_used,
        );
    }
    html
}

fn render_form(form: &FormState) -> String {
    let (title, action, submit) = match &form.editing_id {
        Some(id) => (
            "Edit Entry",
            format!("/entries/{}", urlencoding::encode(id)),
            "Update Entry",
        ),
        None => ("Add New Entry", "/entries".to_string(), "Add Entry"),
    };

    let mut options = String::new();
    for leave_type in LeaveType::ALL {
        let selected = if form.leave_type == leave_type.code() {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            options,
            r#"<option value="{code}"{selected}>{label}</option>"#,
            code = leave_type.code(),
            label = escape_html(leave_type.config().label),
        );
    }
    let code = form.leave_type.trim();
    if !code.is_empty() && code.parse::<LeaveType>().is_err() {
        let _ = write!(
            options,
            r#"<option value="{code}" selected>{code}</option>"#,
            code = escape_html(code),
        );
    }

    let error = form
        .error
        .as_deref()
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape_html(message)))
        .unwrap_or_default();
    let cancel = if form.editing_id.is_some() {
        r#"<a class="button secondary" href="/">Cancel</a>"#
    } else {
        ""
    };

    format!(
        r#"<section class="card">
  <h2>{title}</h2>
  <form method="post" action="{action}" class="entry-form">
    <label>Date<input type="date" name="date" value="{date}" required /></label>
    <label>Hours<input type="number" name="hours" value="{hours}" min="0" step="0.5" required /></label>
    <label>Type<select name="type">{options}</select></label>
    <label class="wide">Note<input type="text" name="note" value="{note}" placeholder="e.g., Son is sick" /></label>
    <div class="form-actions">
      {error}
      <div class="buttons">{cancel}<button type="submit">{submit}</button></div>
    </div>
  </form>
</section>"#,
        date = escape_html(&form.date),
        hours = escape_html(&form.hours),
        note = escape_html(&form.note),
    )
}

fn render_dashboard(stats: &StatsResponse) -> String {
    format!(
        r#"<section class="card">
  <h2>Dashboard</h2>
  <div class="dashboard">
    <div class="chart">
      <h3>Leave Type Distribution</h3>
      {distribution}
    </div>
    <div class="chart">
      <h3>Monthly Usage (Last {months} Months)</h3>
      {monthly}
    </div>
  </div>
</section>"#,
        distribution = render_distribution(&stats.distribution),
        months = stats.monthly_usage.len(),
        monthly = render_monthly(&stats.monthly_usage),
    )
}

fn render_distribution(points: &[DistributionPoint]) -> String {
    let total: f64 = points.iter().map(|point| point.hours.max(0.0)).sum();

    let gradient = if total > 0.0 {
        let mut stops = Vec::with_capacity(points.len());
        let mut start = 0.0;
        for point in points {
            let end = start + point.hours.max(0.0) / total * 100.0;
            stops.push(format!("{} {start:.2}% {end:.2}%", point.color));
            start = end;
        }
        format!("conic-gradient({})", stops.join(", "))
    } else {
        format!("conic-gradient({UNKNOWN_COLOR} 0% 100%)")
    };

    let mut legend = String::new();
    for point in points {
        let _ = write!(
            legend,
            r#"<li><span class="dot" style="background:{color}"></span>{label}<span class="legend-value">{hours} h</span></li>"#,
            color = point.color,
            label = escape_html(point.label),
            hours = format_number(point.hours),
        );
    }

    let center = if total > 0.0 {
        format!("{} h", format_number(total))
    } else {
        "No data yet".to_string()
    };

    format!(
        r#"<div class="ring" style="background:{gradient}"><div class="ring-hole">{center}</div></div>
      <ul class="legend">{legend}</ul>"#
    )
}

fn render_monthly(points: &[MonthlyPoint]) -> String {
    let max = points
        .iter()
        .map(|point| point.total_hours)
        .fold(0.0_f64, f64::max);

    let mut bars = String::new();
    for point in points {
        let height = if max > 0.0 {
            (point.total_hours / max * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let _ = write!(
            bars,
            r#"<div class="bar-col" title="{label}: {hours} hours"><span class="bar-value">{hours}</span><div class="bar-track"><div class="bar-v" style="height:{height:.2}%"></div></div><span class="bar-label">{label}</span></div>"#,
            label = escape_html(&point.label),
            hours = format_number(point.total_hours),
        );
    }

    format!(r#"<div class="bars">{bars}</div>"#)
}

fn render_view_toggle(view: HistoryView, month: NaiveDate) -> String {
    let active = |target: HistoryView| if view == target { " active" } else { "" };
    format!(
        r#"<nav class="toggle"><a class="toggle-btn{list}" href="/?view=list">List</a><a class="toggle-btn{calendar}" href="/?view=calendar&amp;month={month}">Calendar</a></nav>"#,
        list = active(HistoryView::List),
        calendar = active(HistoryView::Calendar),
        month = month_key(month),
    )
}

fn render_history_list(entries: &[LeaveEntry]) -> String {
    if entries.is_empty() {
        return r#"<div class="card empty"><p class="muted">No entries yet. Add one using the form above.</p></div>"#
            .to_string();
    }

    let mut rows = String::new();
    for entry in entries {
        let id = urlencoding::encode(&entry.id);
        let _ = write!(
            rows,
            r#"<tr>
  <td>{date}</td>
  <td><span class="pill" style="background:{color}">{code}</span></td>
  <td>{hours}</td>
  <td class="note">{note}</td>
  <td class="actions">
    <a href="/?edit={id}">Edit</a>
    <form method="post" action="/entries/{id}/delete" onsubmit="return confirm('Are you sure you want to delete this entry?');"><button type="submit" class="link danger">Delete</button></form>
  </td>
</tr>
"#,
            date = entry.date,
            color = type_color(&entry.leave_type),
            code = escape_html(entry.leave_type.code()),
            hours = format_number(entry.hours),
            note = escape_html(&entry.note),
        );
    }

    format!(
        r#"<div class="card table-wrap">
  <table>
    <thead><tr><th>Date</th><th>Type</th><th>Hours</th><th>Note</th><th><span class="sr-only">Actions</span></th></tr></thead>
    <tbody>
{rows}    </tbody>
  </table>
</div>"#
    )
}

fn render_calendar(grid: &CalendarMonth<'_>) -> String {
    let prev = month_key(shift_month(grid.month, -1));
    let next = month_key(shift_month(grid.month, 1));

    let mut cells = String::new();
    for day in WEEK_DAYS {
        let _ = write!(cells, r#"<div class="weekday">{day}</div>"#);
    }
    for _ in 0..grid.leading_blanks {
        cells.push_str(r#"<div class="day blank"></div>"#);
    }
    for day in &grid.days {
        let mut items = String::new();
        for entry in &day.entries {
            let code = entry.leave_type.code();
            let text = if entry.note.is_empty() {
                code
            } else {
                entry.note.as_str()
            };
            let _ = write!(
                items,
                r#"<div class="day-entry" title="{title}"><span class="dot" style="background:{color}"></span><span class="truncate">{text}</span></div>"#,
                title = escape_html(&format!(
                    "{code}: {} ({}h)",
                    entry.note,
                    format_number(entry.hours)
                )),
                color = type_color(&entry.leave_type),
                text = escape_html(text),
            );
        }
        let _ = write!(
            cells,
            r#"<div class="day"><span class="day-num{today}">{num}</span>{items}</div>"#,
            today = if day.is_today { " today" } else { "" },
            num = day.date.day(),
        );
    }

    format!(
        r#"<div class="card calendar">
  <div class="calendar-head">
    <a class="button secondary" href="/?view=calendar&amp;month={prev}">&lt; Prev</a>
    <h3>{title}</h3>
    <a class="button secondary" href="/?view=calendar&amp;month={next}">Next &gt;</a>
  </div>
  <div class="grid">{cells}</div>
</div>"#,
        title = grid.title(),
    )
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en" class="{{THEME}}">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>NoWorkabel</title>
  <style>
    :root {
      --bg: #f3f4f6;
      --card: #ffffff;
      --ink: #111827;
      --muted: #6b7280;
      --line: #e5e7eb;
      --accent: #4f46e5;
      --track: #e5e7eb;
      --shadow: 0 10px 30px rgba(17, 24, 39, 0.08);
    }

    html.dark {
      --bg: #111827;
      --card: #1f2937;
      --ink: #f3f4f6;
      --muted: #9ca3af;
      --line: #374151;
      --accent: #818cf8;
      --track: #374151;
      --shadow: 0 10px 30px rgba(0, 0, 0, 0.4);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: system-ui, -apple-system, "Segoe UI", sans-serif;
    }

    .container {
      width: min(1200px, 100%);
      margin: 0 auto;
      padding: 32px 18px 48px;
      display: grid;
      gap: 28px;
    }

    header {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    h1 {
      margin: 0;
      color: var(--accent);
      font-size: 2.2rem;
    }

    h2 {
      margin: 0 0 18px;
    }

    h3 {
      margin: 0;
    }

    .card {
      background: var(--card);
      border-radius: 16px;
      box-shadow: var(--shadow);
      padding: 24px;
    }

    .summaries {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(260px, 1fr));
      gap: 24px;
    }

    .card-head {
      display: flex;
      justify-content: space-between;
      align-items: flex-start;
      gap: 12px;
    }

    .code,
    .muted {
      color: var(--muted);
      font-size: 0.85rem;
      margin: 12px 0 2px;
    }

    .code {
      margin: 0;
    }

    .figure {
      font-size: 1.5rem;
      font-weight: 600;
      margin: 0;
    }

    .pill {
      color: #fff;
      font-size: 0.75rem;
      font-weight: 600;
      border-radius: 999px;
      padding: 3px 10px;
      white-space: nowrap;
    }

    .bar {
      margin-top: 20px;
      height: 10px;
      border-radius: 999px;
      background: var(--track);
      overflow: hidden;
    }

    .bar-fill {
      height: 100%;
      border-radius: 999px;
    }

    .pct {
      text-align: right;
      font-size: 0.75rem;
      color: var(--muted);
      margin: 6px 0 0;
    }

    .entry-form {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(180px, 1fr));
      gap: 18px;
      align-items: end;
    }

    .entry-form label {
      display: grid;
      gap: 6px;
      font-size: 0.85rem;
      color: var(--muted);
    }

    .entry-form .wide {
      grid-column: span 2;
    }

    input,
    select {
      font: inherit;
      padding: 8px 10px;
      border-radius: 8px;
      border: 1px solid var(--line);
      background: var(--bg);
      color: var(--ink);
    }

    .form-actions {
      grid-column: 1 / -1;
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    .buttons {
      margin-left: auto;
      display: flex;
      gap: 12px;
    }

    button,
    .button {
      font: inherit;
      border: none;
      border-radius: 8px;
      padding: 8px 16px;
      background: var(--accent);
      color: #fff;
      cursor: pointer;
      text-decoration: none;
    }

    .button.secondary {
      background: var(--track);
      color: var(--ink);
    }

    .error {
      color: #ef4444;
      margin: 0;
    }

    .dashboard {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
      gap: 32px;
    }

    .chart h3 {
      margin-bottom: 16px;
    }

    .ring {
      width: 200px;
      height: 200px;
      border-radius: 50%;
      margin: 0 auto;
      display: grid;
      place-items: center;
    }

    .ring-hole {
      width: 120px;
      height: 120px;
      border-radius: 50%;
      background: var(--card);
      display: grid;
      place-items: center;
      font-weight: 600;
    }

    .legend {
      list-style: none;
      padding: 0;
      margin: 16px 0 0;
      display: grid;
      gap: 6px;
    }

    .legend li {
      display: flex;
      align-items: center;
      gap: 8px;
    }

    .legend-value {
      margin-left: auto;
      color: var(--muted);
    }

    .dot {
      width: 10px;
      height: 10px;
      border-radius: 50%;
      flex: none;
    }

    .bars {
      display: flex;
      align-items: flex-end;
      gap: 12px;
      height: 240px;
    }

    .bar-col {
      flex: 1;
      display: flex;
      flex-direction: column;
      align-items: center;
      height: 100%;
      gap: 6px;
    }

    .bar-track {
      flex: 1;
      width: 100%;
      display: flex;
      align-items: flex-end;
    }

    .bar-v {
      width: 100%;
      background: rgba(99, 102, 241, 0.6);
      border: 1px solid rgba(99, 102, 241, 1);
      border-radius: 6px 6px 0 0;
    }

    .bar-value,
    .bar-label {
      font-size: 0.75rem;
      color: var(--muted);
    }

    .history-head {
      display: flex;
      justify-content: space-between;
      align-items: center;
      margin-bottom: 16px;
    }

    .toggle {
      display: flex;
      padding: 4px;
      border-radius: 10px;
      background: var(--track);
    }

    .toggle-btn {
      padding: 4px 12px;
      border-radius: 8px;
      color: var(--muted);
      text-decoration: none;
    }

    .toggle-btn.active {
      background: var(--card);
      color: var(--accent);
    }

    .table-wrap {
      padding: 0;
      overflow-x: auto;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th,
    td {
      text-align: left;
      padding: 12px 20px;
      border-bottom: 1px solid var(--line);
      font-size: 0.9rem;
    }

    th {
      font-size: 0.75rem;
      text-transform: uppercase;
      color: var(--muted);
    }

    .note {
      max-width: 320px;
      overflow: hidden;
      text-overflow: ellipsis;
      white-space: nowrap;
    }

    .actions {
      display: flex;
      gap: 14px;
      justify-content: flex-end;
    }

    .actions form {
      margin: 0;
    }

    .actions a,
    .link {
      background: none;
      padding: 0;
      color: var(--accent);
      text-decoration: none;
    }

    .link.danger {
      color: #ef4444;
    }

    .empty {
      text-align: center;
    }

    .calendar-head {
      display: flex;
      justify-content: space-between;
      align-items: center;
      margin-bottom: 16px;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
    }

    .weekday {
      text-align: center;
      font-size: 0.75rem;
      font-weight: 600;
      color: var(--muted);
      padding: 8px;
      border-bottom: 1px solid var(--line);
    }

    .day {
      min-height: 100px;
      padding: 8px;
      border-right: 1px solid var(--line);
      border-bottom: 1px solid var(--line);
      display: grid;
      align-content: start;
      gap: 4px;
    }

    .day-num.today {
      background: var(--accent);
      color: #fff;
      border-radius: 50%;
      width: 24px;
      height: 24px;
      display: grid;
      place-items: center;
    }

    .day-entry {
      display: flex;
      align-items: center;
      gap: 4px;
      font-size: 0.75rem;
      min-width: 0;
    }

    .truncate {
      overflow: hidden;
      text-overflow: ellipsis;
      white-space: nowrap;
    }

    .sr-only {
      position: absolute;
      width: 1px;
      height: 1px;
      overflow: hidden;
      clip: rect(0, 0, 0, 0);
    }

    @media (max-width: 640px) {
      .entry-form .wide {
        grid-column: auto;
      }
    }
  </style>
</head>
<body>
  <div class="container">
    <header>
      <h1>NoWorkabel</h1>
      <form method="post" action="/theme/toggle">
        <button type="submit" class="button secondary">{{THEME_TOGGLE}}</button>
      </form>
    </header>

    <section class="summaries">
{{SUMMARY_CARDS}}
    </section>

    {{FORM}}

    {{DASHBOARD}}

    <section>
      <div class="history-head">
        <h2>History</h2>
        {{VIEW_TOGGLE}}
      </div>
      {{HISTORY}}
    </section>
  </div>
</body>
</html>
"#;
