use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, include_res, guilds::load_guild, policy, res, session::acting_profile,
};

#[derive(Debug, Deserialize)]
pub(crate) struct NewTemplateForm {
    name: String,
    default_minutes: i64,
    default_roles: String,
}

#[debug_handler]
pub(crate) async fn new_template_page(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(
            Redirect::to(&format!("/login?return_url=/g/{guild_id}/templates/new"))
                .into_response(),
        );
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    if !policy::can_manage_event(&db_pool, &guild, profile.id).await? {
        return Err(AppError::Denied(
            "only the owner or an officer can manage templates".to_owned(),
        ));
    }

    Ok(Html(include_res!(str, "/pages/guilds/template_form.html")
        .replace("{guild_name}", &guild.name)
        .replace("{guild_id}", &guild.id.to_string()))
    .into_response())
}

#[debug_handler]
pub(crate) async fn new_template(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(NewTemplateForm {
        name,
        default_minutes,
        default_roles,
    }): Form<NewTemplateForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    if !policy::can_manage_event(&db_pool, &guild, profile.id).await? {
        return Err(AppError::Denied(
            "only the owner or an officer can manage templates".to_owned(),
        ));
    }

    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Invalid("template name can't be empty".to_owned()));
    }
    if default_minutes <= 0 {
        return Err(AppError::Invalid(
            "default duration must be positive".to_owned(),
        ));
    }

    // one template per (guild, name) — saving again just refreshes it
    sqlx::query(
        "INSERT INTO event_templates (guild_id, name, default_time, default_roles)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(guild_id, name)
         DO UPDATE SET default_time=excluded.default_time, default_roles=excluded.default_roles",
    )
    .bind(guild.id)
    .bind(name)
    .bind(default_minutes * 60)
    .bind(&default_roles)
    .execute(&db_pool)
    .await?;

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}
