use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppError, AppResult, include_res,
    guilds::load_guild,
    models::{EventTemplate, fmt_input_timestamp},
    policy, res,
    session::acting_profile,
};

use super::{
    form::{EventForm, template_options},
    load_event, save,
};

#[debug_handler]
pub(crate) async fn edit_page(
    Path(event_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/e/{event_id}/edit")).into_response());
    };

    let Some(event) = load_event(&db_pool, &event_id.to_string()).await? else {
        return Ok(res::sorry("event"));
    };
    let Some(guild) = load_guild(&db_pool, event.guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    if !policy::can_manage_event(&db_pool, &guild, profile.id).await? {
        return Err(AppError::Denied(
            "you aren't allowed to edit this event".to_owned(),
        ));
    }

    let templates: Vec<EventTemplate> =
        sqlx::query_as("SELECT * FROM event_templates WHERE guild_id=? ORDER BY name")
            .bind(guild.id)
            .fetch_all(&db_pool)
            .await?;

    let body = include_res!(str, "/pages/events/form.html")
        .replace("{heading}", &format!("Edit {}", event.title))
        .replace("{action}", &format!("/e/{}/edit", event.uuid))
        .replace("{title}", &event.title)
        .replace("{description}", &event.description)
        .replace("{start_time}", &fmt_input_timestamp(event.start_time))
        .replace("{end_time}", &fmt_input_timestamp(event.end_time))
        .replace(
            "{max_participants}",
            &event
                .max_participants
                .map(|n| n.to_string())
                .unwrap_or_default(),
        )
        .replace("{required_roles}", &event.required_roles)
        .replace("{template_options}", &template_options(&templates, None));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn edit(
    Path(event_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(form): Form<EventForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(event) = load_event(&db_pool, &event_id.to_string()).await? else {
        return Ok(res::sorry("event"));
    };
    let Some(guild) = load_guild(&db_pool, event.guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    let draft = form.into_draft()?;
    save::update_event(&db_pool, &guild, &event.uuid, profile.id, draft).await?;

    Ok(Redirect::to(&format!("/g/{}", guild.id)).into_response())
}

#[debug_handler]
pub(crate) async fn delete(
    Path(event_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(event) = load_event(&db_pool, &event_id.to_string()).await? else {
        return Ok(res::sorry("event"));
    };
    let Some(guild) = load_guild(&db_pool, event.guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    save::delete_event(&db_pool, &guild, &event.uuid, profile.id).await?;

    tracing::info!("event {} deleted from guild {}", event.uuid, guild.id);

    Ok(Redirect::to(&format!("/g/{}", guild.id)).into_response())
}
