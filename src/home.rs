use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower_sessions::Session;

use crate::{
    AppResult, Markdown, include_res,
    models::{Event, Guild},
    session::acting_profile,
};

#[debug_handler]
pub async fn home(State(db_pool): State<SqlitePool>, session: Session) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let my_guilds: Vec<Guild> = sqlx::query_as(
        "SELECT * FROM guilds
         WHERE owner_id=?
            OR id IN (SELECT guild_id FROM memberships WHERE profile_id=? AND status='APPROVED')
         ORDER BY name",
    )
    .bind(profile.id)
    .bind(profile.id)
    .fetch_all(&db_pool)
    .await?;

    let upcoming: Vec<Event> = sqlx::query_as(
        "SELECT e.* FROM events e
         JOIN guilds g ON g.id = e.guild_id
         WHERE (g.owner_id=?
             OR e.guild_id IN (SELECT guild_id FROM memberships WHERE profile_id=? AND status='APPROVED'))
           AND e.start_time >= ?
         ORDER BY e.start_time
         LIMIT 5",
    )
    .bind(profile.id)
    .bind(profile.id)
    .bind(OffsetDateTime::now_utc())
    .fetch_all(&db_pool)
    .await?;

    let mut guild_items = String::new();
    for guild in &my_guilds {
        guild_items += &format!(
            "<li><a href=\"/g/{}\">{}</a></li>\n",
            guild.id, guild.name
        );
    }
    if guild_items.is_empty() {
        guild_items = "<li>No guilds yet — <a href=\"/g\">find one</a>.</li>".to_owned();
    }

    let mut event_items = String::new();
    for event in &upcoming {
        event_items += &format!(
            "<li><a href=\"/e/{}\">{}</a> <small>{}</small></li>\n",
            event.uuid,
            event.title,
            event.when_label()
        );
    }
    if event_items.is_empty() {
        event_items = "<li>Nothing scheduled.</li>".to_owned();
    }

    let body = include_res!(str, "/pages/home.html")
        .replace("{display_name}", &profile.display_name)
        .replace("{guilds}", &guild_items)
        .replace("{events}", &event_items);

    Ok(Html(body).into_response())
}

#[debug_handler]
pub async fn about() -> impl IntoResponse {
    Markdown(include_res!(str, "/pages/about.md"))
}
