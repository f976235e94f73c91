use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppError, AppResult, include_res,
    guilds::load_guild,
    models::EventTemplate,
    policy, res,
    session::acting_profile,
};

use super::{
    form::{EventForm, template_options},
    save,
};

#[debug_handler]
pub(crate) async fn new_event_page(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(
            Redirect::to(&format!("/login?return_url=/g/{guild_id}/events/new")).into_response(),
        );
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    if !policy::can_create_event(&db_pool, &guild, profile.id).await? {
        return Err(AppError::Denied(
            "you must be a guild member to schedule events".to_owned(),
        ));
    }

    let templates: Vec<EventTemplate> =
        sqlx::query_as("SELECT * FROM event_templates WHERE guild_id=? ORDER BY name")
            .bind(guild.id)
            .fetch_all(&db_pool)
            .await?;

    let body = include_res!(str, "/pages/events/form.html")
        .replace("{heading}", &format!("Schedule event in {}", guild.name))
        .replace("{action}", &format!("/g/{}/events/new", guild.id))
        .replace("{title}", "")
        .replace("{description}", "")
        .replace("{start_time}", "")
        .replace("{end_time}", "")
        .replace("{max_participants}", "")
        .replace("{required_roles}", "")
        .replace("{template_options}", &template_options(&templates, None));

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn new_event(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(form): Form<EventForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    let draft = form.into_draft()?;
    let uuid = save::create_event(&db_pool, &guild, profile.id, draft).await?;

    tracing::info!("event {uuid} scheduled in guild {}", guild.id);

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}
