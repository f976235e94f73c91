use axum::{
    debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, include_res, models::Guild, session::acting_profile};

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    if acting_profile(&session, &db_pool).await?.is_none() {
        return Ok(Redirect::to("/login?return_url=/g").into_response());
    }

    let guilds: Vec<Guild> = sqlx::query_as("SELECT * FROM guilds ORDER BY name")
        .fetch_all(&db_pool)
        .await?;

    let mut items = String::new();
    for guild in &guilds {
        items += &format!(
            "<li><a href=\"/g/{}\">{}</a></li>\n",
            guild.id, guild.name
        );
    }
    if items.is_empty() {
        items = "<li>No guilds yet.</li>".to_owned();
    }

    let body = include_res!(str, "/pages/guilds/index.html").replace("{guilds}", &items);

    Ok(Html(body).into_response())
}
