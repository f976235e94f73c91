mod detail;
mod edit;
mod list;
mod membership;
mod new;
mod templates;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;

use crate::{AppResult, AppState, events, models::Guild};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list))
        .route("/new", get(new::new_guild_page).post(new::new_guild))
        .route("/{id}", get(detail::detail))
        .route("/{id}/edit", get(edit::edit_page).post(edit::edit))
        .route("/{id}/delete", post(edit::delete))
        .route("/{id}/join", post(membership::join))
        .route("/{id}/leave", post(membership::leave))
        .route("/{id}/m/{mid}/approve", post(membership::approve))
        .route("/{id}/m/{mid}/reject", post(membership::reject))
        .route("/{id}/m/{mid}/role", post(membership::update_role))
        .route(
            "/{id}/templates/new",
            get(templates::new_template_page).post(templates::new_template),
        )
        .route(
            "/{id}/events/new",
            get(events::new::new_event_page).post(events::new::new_event),
        )
}

pub(crate) async fn load_guild(db: &SqlitePool, guild_id: i64) -> AppResult<Option<Guild>> {
    Ok(sqlx::query_as("SELECT * FROM guilds WHERE id=?")
        .bind(guild_id)
        .fetch_optional(db)
        .await?)
}
