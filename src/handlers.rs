use crate::calendar::{month_key, month_start, parse_month};
use crate::errors::AppError;
use crate::models::{
    CalendarQuery, CalendarResponse, EntryForm, EntryPayload, EntryType, IndexQuery, LeaveEntry,
    LeaveType, NewLeaveEntry, StatsResponse, ThemePayload, ThemeResponse,
};
use crate::state::AppState;
use crate::stats::{build_stats_at, entries_by_date};
use crate::ui::{FormState, HistoryView, Page, render_index};
use axum::{
    Form, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Datelike, Local, NaiveDate};
use serde_json::Value;
use std::collections::BTreeMap;

pub async fn index(State(state): State<AppState>, Query(query): Query<IndexQuery>) -> Html<String> {
    let form = {
        let ledger = state.ledger.lock().await;
        query
            .edit
            .as_deref()
            .and_then(|id| ledger.store.get(id))
            .map(FormState::editing)
            .unwrap_or_else(|| FormState::blank(today()))
    };

    Html(render_page(&state, &query, form).await)
}

pub async fn submit_entry(State(state): State<AppState>, Form(form): Form<EntryForm>) -> Response {
    match validate_form(&form, None) {
        Ok(entry) => {
            state.add_entry(entry).await;
            Redirect::to("/").into_response()
        }
        Err(err) => {
            let page = render_page(
                &state,
                &IndexQuery::default(),
                FormState::rejected(&form, None, err.message.clone()),
            )
            .await;
            (err.status, Html(page)).into_response()
        }
    }
}

pub async fn submit_update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<EntryForm>,
) -> Response {
    let current = current_type(&state, &id).await;
    match validate_form(&form, current.as_ref()) {
        Ok(entry) => {
            state.update_entry(entry.with_id(id)).await;
            Redirect::to("/").into_response()
        }
        Err(err) => {
            let page = render_page(
                &state,
                &IndexQuery::default(),
                FormState::rejected(&form, Some(id), err.message.clone()),
            )
            .await;
            (err.status, Html(page)).into_response()
        }
    }
}

pub async fn submit_delete(State(state): State<AppState>, Path(id): Path<String>) -> Redirect {
    state.remove_entry(&id).await;
    Redirect::to("/")
}

pub async fn toggle_theme(State(state): State<AppState>) -> Redirect {
    state.toggle_theme().await;
    Redirect::to("/")
}

pub async fn list_entries(State(state): State<AppState>) -> Json<Vec<LeaveEntry>> {
    let ledger = state.ledger.lock().await;
    Json(ledger.store.all().to_vec())
}

pub async fn create_entry(
    State(state): State<AppState>,
    payload: Result<Json<EntryPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<LeaveEntry>), AppError> {
    let entry = validate_payload(json_body(payload)?, None)?;
    let created = state.add_entry(entry).await;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<EntryPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let payload = json_body(payload)?;
    let current = current_type(&state, &id).await;
    let entry = validate_payload(payload, current.as_ref())?;
    state.update_entry(entry.with_id(id)).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_entry(State(state): State<AppState>, Path(id): Path<String>) -> StatusCode {
    state.remove_entry(&id).await;
    StatusCode::NO_CONTENT
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let ledger = state.ledger.lock().await;
    Ok(Json(build_stats_at(today(), ledger.store.all())))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>, AppError> {
    let month = match query.month.as_deref() {
        Some(value) => {
            parse_month(value).ok_or_else(|| AppError::bad_request("month must be YYYY-MM"))?
        }
        None => month_start(today()),
    };

    let ledger = state.ledger.lock().await;
    let days: BTreeMap<NaiveDate, Vec<LeaveEntry>> = entries_by_date(ledger.store.all())
        .into_iter()
        .filter(|(date, _)| date.year() == month.year() && date.month() == month.month())
        .map(|(date, entries)| (date, entries.into_iter().cloned().collect()))
        .collect();

    Ok(Json(CalendarResponse {
        month: month_key(month),
        days,
    }))
}

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    let theme = state.ledger.lock().await.theme;
    Json(ThemeResponse { theme })
}

pub async fn put_theme(
    State(state): State<AppState>,
    Json(payload): Json<ThemePayload>,
) -> Json<ThemeResponse> {
    let theme = state.set_theme(payload.theme).await;
    Json(ThemeResponse { theme })
}

/// Checks a submitted form. `current` is the type of the entry being edited;
/// an unrecognized code is accepted only when it is that entry's own code.
pub fn validate_form(
    form: &EntryForm,
    current: Option<&EntryType>,
) -> Result<NewLeaveEntry, AppError> {
    let hours = form
        .hours
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::invalid_entry())?;
    let leave_type = resolve_type(&form.leave_type, current)?;
    validate_fields(&form.date, hours, leave_type, &form.note)
}

pub fn validate_payload(
    payload: EntryPayload,
    current: Option<&EntryType>,
) -> Result<NewLeaveEntry, AppError> {
    let hours = match payload.hours {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(AppError::invalid_entry)?;
    let leave_type = resolve_type(payload.leave_type.as_deref().unwrap_or_default(), current)?;
    validate_fields(
        payload.date.as_deref().unwrap_or_default(),
        hours,
        leave_type,
        payload.note.as_deref().unwrap_or_default(),
    )
}

fn resolve_type(code: &str, current: Option<&EntryType>) -> Result<EntryType, AppError> {
    match code.parse::<LeaveType>() {
        Ok(leave_type) => Ok(EntryType::Known(leave_type)),
        Err(message) => match current {
            Some(EntryType::Unrecognized(existing)) if existing == code.trim() => {
                Ok(EntryType::Unrecognized(existing.clone()))
            }
            _ => Err(AppError::bad_request(message)),
        },
    }
}

fn json_body(payload: Result<Json<EntryPayload>, JsonRejection>) -> Result<EntryPayload, AppError> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(rejection) => Err(AppError::bad_request(rejection.body_text())),
    }
}

async fn current_type(state: &AppState, id: &str) -> Option<EntryType> {
    let ledger = state.ledger.lock().await;
    ledger.store.get(id).map(|entry| entry.leave_type.clone())
}

fn validate_fields(
    date: &str,
    hours: f64,
    leave_type: EntryType,
    note: &str,
) -> Result<NewLeaveEntry, AppError> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::invalid_entry())?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(AppError::invalid_entry());
    }

    Ok(NewLeaveEntry {
        date,
        hours,
        leave_type,
        note: note.trim().to_string(),
    })
}

async fn render_page(state: &AppState, query: &IndexQuery, form: FormState) -> String {
    let today = today();
    let ledger = state.ledger.lock().await;
    let entries = ledger.store.all();
    let stats = build_stats_at(today, entries);

    render_index(&Page {
        theme: ledger.theme,
        today,
        entries,
        stats: &stats,
        form,
        view: HistoryView::from_query(query.view.as_deref()),
        month: query
            .month
            .as_deref()
            .and_then(parse_month)
            .unwrap_or_else(|| month_start(today)),
    })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
