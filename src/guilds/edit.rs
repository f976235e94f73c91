use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, include_res, models::Guild, res, session::acting_profile};

#[derive(Debug, Deserialize)]
pub(crate) struct EditGuildForm {
    name: String,
    description: String,
}

// Owner-only pages scope their queries to owner_id, so anyone else just
// gets the sorry page instead of learning the guild exists to be edited.

#[debug_handler]
pub(crate) async fn edit_page(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/g/{guild_id}/edit")).into_response());
    };

    let Some(guild) = sqlx::query_as::<_, Guild>("SELECT * FROM guilds WHERE id=? AND owner_id=?")
        .bind(guild_id)
        .bind(profile.id)
        .fetch_optional(&db_pool)
        .await?
    else {
        return Ok(res::sorry("guild"));
    };

    Ok(Html(include_res!(str, "/pages/guilds/form.html")
        .replace("{heading}", "Edit guild")
        .replace("{action}", &format!("/g/{}/edit", guild.id))
        .replace("{name}", &guild.name)
        .replace("{description}", &guild.description))
    .into_response())
}

#[debug_handler]
pub(crate) async fn edit(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(EditGuildForm { name, description }): Form<EditGuildForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Invalid("guild name can't be empty".to_owned()));
    }

    let taken: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM guilds WHERE name=? AND id<>?")
        .bind(name)
        .bind(guild_id)
        .fetch_optional(&db_pool)
        .await?;
    if taken.is_some() {
        return Err(AppError::Invalid(format!("a guild named {name:?} already exists")));
    }

    let res_ = sqlx::query("UPDATE guilds SET name=?, description=? WHERE id=? AND owner_id=?")
        .bind(name)
        .bind(&description)
        .bind(guild_id)
        .bind(profile.id)
        .execute(&db_pool)
        .await?;

    if res_.rows_affected() == 0 {
        return Ok(res::sorry("guild"));
    }

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}

/// Deleting a guild cascades to its memberships, templates, events and
/// their RSVPs.
#[debug_handler]
pub(crate) async fn delete(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let res_ = sqlx::query("DELETE FROM guilds WHERE id=? AND owner_id=?")
        .bind(guild_id)
        .bind(profile.id)
        .execute(&db_pool)
        .await?;

    if res_.rows_affected() == 0 {
        return Ok(res::sorry("guild"));
    }

    tracing::info!("guild {guild_id} deleted by profile {}", profile.id);

    Ok(Redirect::to("/g").into_response())
}
