//! Shared fixtures for the integration tests: an in-memory SQLite pool with
//! the real migrations applied, and helpers that go through the same code
//! paths the handlers use.

use std::str::FromStr;

use guildhall::events::save::EventDraft;
use guildhall::models::{Guild, Membership};
use guildhall::policy;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use time::macros::datetime;

pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub async fn create_profile(db: &SqlitePool, display_name: &str) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("INSERT INTO profiles (subject, display_name) VALUES (?, ?) RETURNING id")
            .bind(format!("test:{display_name}"))
            .bind(display_name)
            .fetch_one(db)
            .await
            .unwrap();
    id
}

pub async fn create_guild(db: &SqlitePool, name: &str, owner_id: i64) -> Guild {
    sqlx::query_as("INSERT INTO guilds (name, description, owner_id) VALUES (?, '', ?) RETURNING *")
        .bind(name)
        .bind(owner_id)
        .fetch_one(db)
        .await
        .unwrap()
}

pub async fn membership_of(db: &SqlitePool, guild_id: i64, profile_id: i64) -> Option<Membership> {
    sqlx::query_as("SELECT * FROM memberships WHERE guild_id=? AND profile_id=?")
        .bind(guild_id)
        .bind(profile_id)
        .fetch_optional(db)
        .await
        .unwrap()
}

/// Runs the real join + approve workflow (approval acted by the owner) and
/// returns the membership id.
pub async fn join_and_approve(db: &SqlitePool, guild: &Guild, profile_id: i64) -> i64 {
    policy::request_join(db, guild.id, profile_id).await.unwrap();
    let membership = membership_of(db, guild.id, profile_id).await.unwrap();
    policy::approve_membership(db, guild, membership.id, guild.owner_id)
        .await
        .unwrap();
    membership.id
}

pub fn draft(title: &str) -> EventDraft {
    EventDraft {
        title: title.to_owned(),
        description: String::new(),
        start_time: datetime!(2026-03-01 19:00 UTC),
        end_time: datetime!(2026-03-01 21:30 UTC),
        max_participants: None,
        required_roles: "Tank,Healer,DPS".to_owned(),
        template_id: None,
        save_as_template: false,
    }
}
