use axum::{
    Form, debug_handler,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, include_res, session::acting_profile};

#[derive(Debug, Deserialize)]
pub(crate) struct NewGuildForm {
    name: String,
    description: String,
}

#[debug_handler]
pub(crate) async fn new_guild_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    if acting_profile(&session, &db_pool).await?.is_none() {
        return Ok(Redirect::to("/login?return_url=/g/new").into_response());
    }

    Ok(Html(include_res!(str, "/pages/guilds/form.html")
        .replace("{heading}", "New guild")
        .replace("{action}", "/g/new")
        .replace("{name}", "")
        .replace("{description}", ""))
    .into_response())
}

#[debug_handler]
pub(crate) async fn new_guild(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(NewGuildForm { name, description }): Form<NewGuildForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Invalid("guild name can't be empty".to_owned()));
    }

    let taken: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM guilds WHERE name=?")
        .bind(name)
        .fetch_optional(&db_pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Invalid(format!("a guild named {name:?} already exists")));
    }

    let (guild_id,): (i64,) = sqlx::query_as(
        "INSERT INTO guilds (name, description, owner_id) VALUES (?, ?, ?) RETURNING id",
    )
    .bind(name)
    .bind(&description)
    .bind(profile.id)
    .fetch_one(&db_pool)
    .await?;

    tracing::info!("guild {name:?} created by profile {}", profile.id);

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}
