//! Membership and permission rules for guilds.
//!
//! Every handler that mutates guild state goes through here instead of
//! repeating its own role checks. All functions take the acting profile
//! explicitly; nothing reads the session.

use sqlx::SqlitePool;
use thiserror::Error;
use time::OffsetDateTime;

use crate::models::{Guild, Role, STATUS_APPROVED, STATUS_PENDING};

pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("permission denied: {0}")]
    PermissionDenied(&'static str),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

/// True iff `profile_id` is the guild's owner. Ownership is independent of
/// membership rows; a LEADER member is not the owner.
pub fn is_owner(guild: &Guild, profile_id: i64) -> bool {
    guild.owner_id == profile_id
}

pub async fn is_officer(db: &SqlitePool, guild_id: i64, profile_id: i64) -> PolicyResult<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        "SELECT 1 FROM memberships
         WHERE guild_id=? AND profile_id=? AND status=? AND role IN ('LEADER','OFFICER')",
    )
    .bind(guild_id)
    .bind(profile_id)
    .bind(STATUS_APPROVED)
    .fetch_optional(db)
    .await?;
    Ok(row.is_some())
}

pub async fn is_approved_member(
    db: &SqlitePool,
    guild_id: i64,
    profile_id: i64,
) -> PolicyResult<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM memberships WHERE guild_id=? AND profile_id=? AND status=?")
            .bind(guild_id)
            .bind(profile_id)
            .bind(STATUS_APPROVED)
            .fetch_optional(db)
            .await?;
    Ok(row.is_some())
}

/// Any approved member (or the owner) may schedule events.
pub async fn can_create_event(
    db: &SqlitePool,
    guild: &Guild,
    profile_id: i64,
) -> PolicyResult<bool> {
    Ok(is_owner(guild, profile_id) || is_approved_member(db, guild.id, profile_id).await?)
}

/// Editing or deleting events, managing templates and moderating members
/// takes the owner or an officer.
pub async fn can_manage_event(
    db: &SqlitePool,
    guild: &Guild,
    profile_id: i64,
) -> PolicyResult<bool> {
    Ok(is_owner(guild, profile_id) || is_officer(db, guild.id, profile_id).await?)
}

/// Create or reset a membership to PENDING. Idempotent: the unique
/// (guild_id, profile_id) index resolves concurrent joins to one row, and a
/// repeat call updates that row instead of erroring. joined_at is kept from
/// the first request.
pub async fn request_join(db: &SqlitePool, guild_id: i64, profile_id: i64) -> PolicyResult<()> {
    sqlx::query(
        "INSERT INTO memberships (guild_id, profile_id, role, status, joined_at)
         VALUES (?, ?, 'TRIAL', 'PENDING', ?)
         ON CONFLICT(guild_id, profile_id) DO UPDATE SET status='PENDING', role='TRIAL'",
    )
    .bind(guild_id)
    .bind(profile_id)
    .bind(OffsetDateTime::now_utc())
    .execute(db)
    .await?;
    Ok(())
}

/// Delete the membership row if present; leaving a guild you never joined is
/// not an error.
pub async fn leave(db: &SqlitePool, guild_id: i64, profile_id: i64) -> PolicyResult<()> {
    sqlx::query("DELETE FROM memberships WHERE guild_id=? AND profile_id=?")
        .bind(guild_id)
        .bind(profile_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Approve a PENDING membership: status APPROVED, role MEMBER (overwriting
/// whatever role the row held). Owner or officer only.
pub async fn approve_membership(
    db: &SqlitePool,
    guild: &Guild,
    membership_id: i64,
    acting_profile_id: i64,
) -> PolicyResult<()> {
    if !can_manage_event(db, guild, acting_profile_id).await? {
        return Err(PolicyError::PermissionDenied(
            "only the owner or an officer can approve members",
        ));
    }

    let res = sqlx::query(
        "UPDATE memberships SET status=?, role='MEMBER'
         WHERE id=? AND guild_id=? AND status=?",
    )
    .bind(STATUS_APPROVED)
    .bind(membership_id)
    .bind(guild.id)
    .bind(STATUS_PENDING)
    .execute(db)
    .await?;

    if res.rows_affected() == 0 {
        return Err(PolicyError::NotFound);
    }
    Ok(())
}

/// Reject a PENDING membership by deleting the row outright, so rejected
/// requests never linger in member queries. A later request_join starts
/// over with a fresh PENDING row.
pub async fn reject_membership(
    db: &SqlitePool,
    guild: &Guild,
    membership_id: i64,
    acting_profile_id: i64,
) -> PolicyResult<()> {
    if !can_manage_event(db, guild, acting_profile_id).await? {
        return Err(PolicyError::PermissionDenied(
            "only the owner or an officer can reject members",
        ));
    }

    let res = sqlx::query("DELETE FROM memberships WHERE id=? AND guild_id=? AND status=?")
        .bind(membership_id)
        .bind(guild.id)
        .bind(STATUS_PENDING)
        .execute(db)
        .await?;

    if res.rows_affected() == 0 {
        return Err(PolicyError::NotFound);
    }
    Ok(())
}

/// Change an APPROVED member's role. Owner only — officers can approve and
/// reject, but handing out ranks is the owner's call.
pub async fn update_role(
    db: &SqlitePool,
    guild: &Guild,
    membership_id: i64,
    new_role: &str,
    acting_profile_id: i64,
) -> PolicyResult<()> {
    if !is_owner(guild, acting_profile_id) {
        return Err(PolicyError::PermissionDenied(
            "only the guild owner can change roles",
        ));
    }

    let Some(role) = Role::parse(new_role) else {
        return Err(PolicyError::InvalidArgument(format!(
            "unknown role {new_role:?}"
        )));
    };

    let res = sqlx::query("UPDATE memberships SET role=? WHERE id=? AND guild_id=? AND status=?")
        .bind(role.as_str())
        .bind(membership_id)
        .bind(guild.id)
        .bind(STATUS_APPROVED)
        .execute(db)
        .await?;

    if res.rows_affected() == 0 {
        return Err(PolicyError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guild(owner_id: i64) -> Guild {
        Guild {
            id: 1,
            name: "Test".into(),
            description: String::new(),
            owner_id,
        }
    }

    #[test]
    fn ownership_is_exact() {
        let g = guild(7);
        assert!(is_owner(&g, 7));
        assert!(!is_owner(&g, 8));
    }
}
