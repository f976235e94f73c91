//! Event persistence plus template materialization.
//!
//! An event write and its optional save-as-template upsert share one
//! transaction: a template failure rolls the event back rather than leaving
//! half the submission applied.

use sqlx::SqlitePool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    models::{EventTemplate, Guild},
    policy::{self, PolicyError, PolicyResult},
};

#[derive(Debug, Clone)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub max_participants: Option<i64>,
    pub required_roles: String,
    pub template_id: Option<i64>,
    pub save_as_template: bool,
}

impl EventDraft {
    fn validate(&self) -> PolicyResult<()> {
        if self.end_time <= self.start_time {
            return Err(PolicyError::InvalidArgument(
                "end time must be after start time".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Any approved member (or the owner) may schedule an event.
pub async fn create_event(
    db: &SqlitePool,
    guild: &Guild,
    acting_profile_id: i64,
    mut draft: EventDraft,
) -> PolicyResult<String> {
    if !policy::can_create_event(db, guild, acting_profile_id).await? {
        return Err(PolicyError::PermissionDenied(
            "you must be a guild member to schedule events",
        ));
    }
    draft.validate()?;

    let mut tx = db.begin().await?;

    seed_from_template(&mut tx, guild, &mut draft).await?;
    if draft.title.trim().is_empty() {
        return Err(PolicyError::InvalidArgument("title can't be empty".to_owned()));
    }

    let uuid = Uuid::new_v4().to_string();
    sqlx::query(
        "INSERT INTO events
         (uuid, guild_id, title, description, start_time, end_time, max_participants, required_roles)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&uuid)
    .bind(guild.id)
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(draft.start_time)
    .bind(draft.end_time)
    .bind(draft.max_participants)
    .bind(&draft.required_roles)
    .execute(&mut *tx)
    .await?;

    materialize_template(&mut tx, guild, &draft).await?;

    tx.commit().await?;
    Ok(uuid)
}

/// Editing an existing event is stricter than creating one: owner or
/// officer only.
pub async fn update_event(
    db: &SqlitePool,
    guild: &Guild,
    event_uuid: &str,
    acting_profile_id: i64,
    mut draft: EventDraft,
) -> PolicyResult<()> {
    if !policy::can_manage_event(db, guild, acting_profile_id).await? {
        return Err(PolicyError::PermissionDenied(
            "you aren't allowed to edit this event",
        ));
    }
    draft.validate()?;

    let mut tx = db.begin().await?;

    seed_from_template(&mut tx, guild, &mut draft).await?;
    if draft.title.trim().is_empty() {
        return Err(PolicyError::InvalidArgument("title can't be empty".to_owned()));
    }

    let res = sqlx::query(
        "UPDATE events
         SET title=?, description=?, start_time=?, end_time=?, max_participants=?, required_roles=?
         WHERE uuid=? AND guild_id=?",
    )
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(draft.start_time)
    .bind(draft.end_time)
    .bind(draft.max_participants)
    .bind(&draft.required_roles)
    .bind(event_uuid)
    .bind(guild.id)
    .execute(&mut *tx)
    .await?;

    if res.rows_affected() == 0 {
        return Err(PolicyError::NotFound);
    }

    materialize_template(&mut tx, guild, &draft).await?;

    tx.commit().await?;
    Ok(())
}

pub async fn delete_event(
    db: &SqlitePool,
    guild: &Guild,
    event_uuid: &str,
    acting_profile_id: i64,
) -> PolicyResult<()> {
    if !policy::can_manage_event(db, guild, acting_profile_id).await? {
        return Err(PolicyError::PermissionDenied(
            "you aren't allowed to edit this event",
        ));
    }

    let res = sqlx::query("DELETE FROM events WHERE uuid=? AND guild_id=?")
        .bind(event_uuid)
        .bind(guild.id)
        .execute(db)
        .await?;

    if res.rows_affected() == 0 {
        return Err(PolicyError::NotFound);
    }
    Ok(())
}

/// A selected template wins over whatever the form submitted for title and
/// role slots.
async fn seed_from_template(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    guild: &Guild,
    draft: &mut EventDraft,
) -> PolicyResult<()> {
    let Some(template_id) = draft.template_id else {
        return Ok(());
    };

    let Some(template) = sqlx::query_as::<_, EventTemplate>(
        "SELECT * FROM event_templates WHERE id=? AND guild_id=?",
    )
    .bind(template_id)
    .bind(guild.id)
    .fetch_optional(&mut **tx)
    .await?
    else {
        return Err(PolicyError::NotFound);
    };

    draft.title = template.name;
    draft.required_roles = template.default_roles;
    Ok(())
}

/// Upsert keyed on (guild, title): saving an event under an existing
/// template name refreshes that template's duration and role slots.
async fn materialize_template(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    guild: &Guild,
    draft: &EventDraft,
) -> PolicyResult<()> {
    if !draft.save_as_template {
        return Ok(());
    }

    let default_time = (draft.end_time - draft.start_time).whole_seconds();
    sqlx::query(
        "INSERT INTO event_templates (guild_id, name, default_time, default_roles)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(guild_id, name)
         DO UPDATE SET default_time=excluded.default_time, default_roles=excluded.default_roles",
    )
    .bind(guild.id)
    .bind(&draft.title)
    .bind(default_time)
    .bind(&draft.required_roles)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
