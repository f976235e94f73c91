//! RSVP workflow: one row per (event, profile), last write wins.

use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppResult,
    events::load_event,
    guilds::load_guild,
    models::{Guild, Rsvp, RsvpResponse},
    policy::{self, PolicyError, PolicyResult},
    res,
    session::acting_profile,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RsvpCounts {
    pub yes: i64,
    pub no: i64,
    pub maybe: i64,
}

/// Only guild members (or the owner) may respond. The unique
/// (event_uuid, profile_id) index turns repeat submissions into updates, so
/// a response can be changed any number of times without growing rows.
pub async fn submit_rsvp(
    db: &SqlitePool,
    guild: &Guild,
    event_uuid: &str,
    profile_id: i64,
    response: &str,
    role_signed_up: &str,
) -> PolicyResult<()> {
    let Some(response) = RsvpResponse::parse(response) else {
        return Err(PolicyError::InvalidArgument(format!(
            "unknown response {response:?}"
        )));
    };

    let allowed = policy::is_owner(guild, profile_id)
        || policy::is_officer(db, guild.id, profile_id).await?
        || policy::is_approved_member(db, guild.id, profile_id).await?;
    if !allowed {
        return Err(PolicyError::PermissionDenied("only guild members can RSVP"));
    }

    sqlx::query(
        "INSERT INTO rsvps (event_uuid, profile_id, response, role_signed_up)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(event_uuid, profile_id)
         DO UPDATE SET response=excluded.response, role_signed_up=excluded.role_signed_up",
    )
    .bind(event_uuid)
    .bind(profile_id)
    .bind(response.as_str())
    .bind(role_signed_up)
    .execute(db)
    .await?;

    Ok(())
}

/// None means the profile hasn't responded.
pub async fn response_of(
    db: &SqlitePool,
    event_uuid: &str,
    profile_id: i64,
) -> PolicyResult<Option<Rsvp>> {
    Ok(
        sqlx::query_as("SELECT * FROM rsvps WHERE event_uuid=? AND profile_id=?")
            .bind(event_uuid)
            .bind(profile_id)
            .fetch_optional(db)
            .await?,
    )
}

/// Recomputed on demand; nothing caches these.
pub async fn counts(db: &SqlitePool, event_uuid: &str) -> PolicyResult<RsvpCounts> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT response, COUNT(*) FROM rsvps WHERE event_uuid=? GROUP BY response")
            .bind(event_uuid)
            .fetch_all(db)
            .await?;

    let mut counts = RsvpCounts::default();
    for (response, n) in rows {
        match response.as_str() {
            "YES" => counts.yes = n,
            "NO" => counts.no = n,
            "MAYBE" => counts.maybe = n,
            _ => {}
        }
    }
    Ok(counts)
}

#[derive(Debug, Deserialize)]
pub(crate) struct RsvpForm {
    response: String,
    #[serde(default)]
    role_signed_up: String,
}

#[debug_handler]
pub(crate) async fn submit(
    Path(event_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(RsvpForm {
        response,
        role_signed_up,
    }): Form<RsvpForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/e/{event_id}")).into_response());
    };

    let Some(event) = load_event(&db_pool, &event_id.to_string()).await? else {
        return Ok(res::sorry("event"));
    };
    let Some(guild) = load_guild(&db_pool, event.guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    submit_rsvp(
        &db_pool,
        &guild,
        &event.uuid,
        profile.id,
        &response,
        &role_signed_up,
    )
    .await?;

    Ok(Redirect::to(&format!("/e/{event_id}")).into_response())
}
