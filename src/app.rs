use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/entries", post(handlers::submit_entry))
        .route("/entries/:id", post(handlers::submit_update))
        .route("/entries/:id/delete", post(handlers::submit_delete))
        .route("/theme/toggle", post(handlers::toggle_theme))
        .route(
            "/api/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route(
            "/api/entries/:id",
            put(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/theme", get(handlers::get_theme).put(handlers::put_theme))
        .with_state(state)
}
