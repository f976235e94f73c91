mod detail;
mod edit;
mod form;
pub(crate) mod new;
pub mod rsvp;
pub mod save;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;

use crate::{AppResult, AppState, models::Event};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{uuid}", get(detail::detail))
        .route("/{uuid}/edit", get(edit::edit_page).post(edit::edit))
        .route("/{uuid}/delete", post(edit::delete))
        .route("/{uuid}/rsvp", post(rsvp::submit))
}

pub(crate) async fn load_event(db: &SqlitePool, event_uuid: &str) -> AppResult<Option<Event>> {
    Ok(sqlx::query_as("SELECT * FROM events WHERE uuid=?")
        .bind(event_uuid)
        .fetch_optional(db)
        .await?)
}
