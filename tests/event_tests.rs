mod common;

use common::{create_guild, create_profile, draft, join_and_approve, membership_of, test_pool};
use guildhall::events::{rsvp, save};
use guildhall::models::{Event, EventTemplate};
use guildhall::policy::{self, PolicyError};
use time::macros::datetime;

async fn event_count(db: &sqlx::SqlitePool, guild_id: i64) -> i64 {
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE guild_id=?")
        .bind(guild_id)
        .fetch_one(db)
        .await
        .unwrap();
    n
}

#[tokio::test]
async fn creating_an_event_requires_membership() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let stranger = create_profile(&db, "stranger").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let err = save::create_event(&db, &guild, stranger, draft("Raid Night"))
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::PermissionDenied(_)));
    assert_eq!(event_count(&db, guild.id).await, 0);

    // the owner needs no membership row
    save::create_event(&db, &guild, owner, draft("Raid Night"))
        .await
        .unwrap();
    assert_eq!(event_count(&db, guild.id).await, 1);
}

#[tokio::test]
async fn end_before_start_is_rejected_before_any_write() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let mut bad = draft("Raid Night");
    bad.end_time = bad.start_time;
    bad.save_as_template = true;

    let err = save::create_event(&db, &guild, owner, bad).await.unwrap_err();
    assert!(matches!(err, PolicyError::InvalidArgument(_)));
    assert_eq!(event_count(&db, guild.id).await, 0);

    let (templates,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM event_templates")
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(templates, 0);
}

#[tokio::test]
async fn save_as_template_records_the_duration() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let mut d = draft("Raid Night");
    d.start_time = datetime!(2026-03-01 19:00 UTC);
    d.end_time = datetime!(2026-03-01 21:30 UTC);
    d.save_as_template = true;
    save::create_event(&db, &guild, owner, d).await.unwrap();

    let templates: Vec<EventTemplate> =
        sqlx::query_as("SELECT * FROM event_templates WHERE guild_id=?")
            .bind(guild.id)
            .fetch_all(&db)
            .await
            .unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].name, "Raid Night");
    assert_eq!(templates[0].default_time, 2 * 3600 + 30 * 60);
    assert_eq!(templates[0].default_roles, "Tank,Healer,DPS");
}

#[tokio::test]
async fn save_as_template_upserts_by_name() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let mut first = draft("Raid Night");
    first.save_as_template = true;
    save::create_event(&db, &guild, owner, first).await.unwrap();

    let mut second = draft("Raid Night");
    second.end_time = datetime!(2026-03-01 20:00 UTC);
    second.required_roles = "Tank,DPS".to_owned();
    second.save_as_template = true;
    save::create_event(&db, &guild, owner, second).await.unwrap();

    let templates: Vec<EventTemplate> =
        sqlx::query_as("SELECT * FROM event_templates WHERE guild_id=?")
            .bind(guild.id)
            .fetch_all(&db)
            .await
            .unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates[0].default_time, 3600);
    assert_eq!(templates[0].default_roles, "Tank,DPS");
}

#[tokio::test]
async fn a_selected_template_overrides_the_submission() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let (template_id,): (i64,) = sqlx::query_as(
        "INSERT INTO event_templates (guild_id, name, default_time, default_roles)
         VALUES (?, 'Raid Night', 7200, 'Tank,Healer') RETURNING id",
    )
    .bind(guild.id)
    .fetch_one(&db)
    .await
    .unwrap();

    let mut d = draft("My Own Title");
    d.template_id = Some(template_id);
    d.required_roles = "DPS".to_owned();
    let uuid = save::create_event(&db, &guild, owner, d).await.unwrap();

    let event: Event = sqlx::query_as("SELECT * FROM events WHERE uuid=?")
        .bind(&uuid)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(event.title, "Raid Night");
    assert_eq!(event.required_roles, "Tank,Healer");
}

#[tokio::test]
async fn another_guilds_template_is_not_found_and_nothing_persists() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;
    let other = create_guild(&db, "Briar Keep", owner).await;

    let (template_id,): (i64,) = sqlx::query_as(
        "INSERT INTO event_templates (guild_id, name, default_time, default_roles)
         VALUES (?, 'Raid Night', 7200, '') RETURNING id",
    )
    .bind(other.id)
    .fetch_one(&db)
    .await
    .unwrap();

    let mut d = draft("Raid Night");
    d.template_id = Some(template_id);
    let err = save::create_event(&db, &guild, owner, d).await.unwrap_err();
    assert!(matches!(err, PolicyError::NotFound));
    assert_eq!(event_count(&db, guild.id).await, 0);
}

#[tokio::test]
async fn editing_takes_an_officer() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let member = create_profile(&db, "member").await;
    let officer = create_profile(&db, "officer").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    join_and_approve(&db, &guild, member).await;
    let officer_mid = join_and_approve(&db, &guild, officer).await;
    policy::update_role(&db, &guild, officer_mid, "OFFICER", owner)
        .await
        .unwrap();

    // plain members may create...
    let uuid = save::create_event(&db, &guild, member, draft("Raid Night"))
        .await
        .unwrap();

    // ...but not edit or delete
    let err = save::update_event(&db, &guild, &uuid, member, draft("Hijacked"))
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::PermissionDenied(_)));
    let err = save::delete_event(&db, &guild, &uuid, member).await.unwrap_err();
    assert!(matches!(err, PolicyError::PermissionDenied(_)));

    let mut renamed = draft("Raid Night II");
    renamed.description = "bring consumables".to_owned();
    save::update_event(&db, &guild, &uuid, officer, renamed)
        .await
        .unwrap();
    let event: Event = sqlx::query_as("SELECT * FROM events WHERE uuid=?")
        .bind(&uuid)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(event.title, "Raid Night II");

    save::delete_event(&db, &guild, &uuid, owner).await.unwrap();
    assert_eq!(event_count(&db, guild.id).await, 0);
}

#[tokio::test]
async fn rsvp_is_members_only_and_last_write_wins() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let member = create_profile(&db, "member").await;
    let stranger = create_profile(&db, "stranger").await;
    let guild = create_guild(&db, "Ash Court", owner).await;
    join_and_approve(&db, &guild, member).await;

    let uuid = save::create_event(&db, &guild, owner, draft("Raid Night"))
        .await
        .unwrap();

    let err = rsvp::submit_rsvp(&db, &guild, &uuid, stranger, "YES", "Tank")
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::PermissionDenied(_)));
    assert!(rsvp::response_of(&db, &uuid, stranger).await.unwrap().is_none());

    rsvp::submit_rsvp(&db, &guild, &uuid, member, "YES", "Tank")
        .await
        .unwrap();
    rsvp::submit_rsvp(&db, &guild, &uuid, member, "MAYBE", "Healer")
        .await
        .unwrap();

    let (rows,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM rsvps WHERE event_uuid=? AND profile_id=?")
            .bind(&uuid)
            .bind(member)
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(rows, 1);

    let mine = rsvp::response_of(&db, &uuid, member).await.unwrap().unwrap();
    assert_eq!(mine.response, "MAYBE");
    assert_eq!(mine.role_signed_up, "Healer");

    let err = rsvp::submit_rsvp(&db, &guild, &uuid, member, "PERHAPS", "")
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidArgument(_)));
}

#[tokio::test]
async fn rsvp_counts_group_by_response() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let mut members = Vec::new();
    for name in ["a", "b", "c"] {
        let p = create_profile(&db, name).await;
        join_and_approve(&db, &guild, p).await;
        members.push(p);
    }

    let uuid = save::create_event(&db, &guild, owner, draft("Raid Night"))
        .await
        .unwrap();

    rsvp::submit_rsvp(&db, &guild, &uuid, members[0], "YES", "").await.unwrap();
    rsvp::submit_rsvp(&db, &guild, &uuid, members[1], "YES", "").await.unwrap();
    rsvp::submit_rsvp(&db, &guild, &uuid, members[2], "NO", "").await.unwrap();

    let counts = rsvp::counts(&db, &uuid).await.unwrap();
    assert_eq!((counts.yes, counts.no, counts.maybe), (2, 1, 0));
}

#[tokio::test]
async fn full_join_approve_rsvp_scenario() {
    let db = test_pool().await;
    let p1 = create_profile(&db, "p1").await;
    let p2 = create_profile(&db, "p2").await;
    let guild = create_guild(&db, "Ash Court", p1).await;

    policy::request_join(&db, guild.id, p2).await.unwrap();
    let membership = membership_of(&db, guild.id, p2).await.unwrap();
    assert_eq!(membership.status, "PENDING");

    policy::approve_membership(&db, &guild, membership.id, p1)
        .await
        .unwrap();
    let membership = membership_of(&db, guild.id, p2).await.unwrap();
    assert_eq!(membership.status, "APPROVED");
    assert_eq!(membership.role, "MEMBER");
    assert!(policy::is_approved_member(&db, guild.id, p2).await.unwrap());
    assert!(!policy::is_officer(&db, guild.id, p2).await.unwrap());

    let uuid = save::create_event(&db, &guild, p1, draft("Raid Night"))
        .await
        .unwrap();
    rsvp::submit_rsvp(&db, &guild, &uuid, p2, "YES", "DPS").await.unwrap();

    let mine = rsvp::response_of(&db, &uuid, p2).await.unwrap().unwrap();
    assert_eq!(mine.response, "YES");
    assert_eq!(mine.role_signed_up, "DPS");
}

#[tokio::test]
async fn deleting_a_guild_cascades_all_the_way_down() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let member = create_profile(&db, "member").await;
    let guild = create_guild(&db, "Ash Court", owner).await;
    join_and_approve(&db, &guild, member).await;

    let mut d = draft("Raid Night");
    d.save_as_template = true;
    let uuid = save::create_event(&db, &guild, owner, d).await.unwrap();
    rsvp::submit_rsvp(&db, &guild, &uuid, member, "YES", "").await.unwrap();

    sqlx::query("DELETE FROM guilds WHERE id=?")
        .bind(guild.id)
        .execute(&db)
        .await
        .unwrap();

    for table in ["memberships", "event_templates", "events", "rsvps"] {
        let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&db)
            .await
            .unwrap();
        assert_eq!(n, 0, "{table} not emptied by cascade");
    }
}

#[tokio::test]
async fn deleting_a_profile_cascades_memberships_and_rsvps_only() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let member = create_profile(&db, "member").await;
    let guild = create_guild(&db, "Ash Court", owner).await;
    join_and_approve(&db, &guild, member).await;

    let uuid = save::create_event(&db, &guild, owner, draft("Raid Night"))
        .await
        .unwrap();
    rsvp::submit_rsvp(&db, &guild, &uuid, member, "YES", "").await.unwrap();

    sqlx::query("DELETE FROM profiles WHERE id=?")
        .bind(member)
        .execute(&db)
        .await
        .unwrap();

    assert!(membership_of(&db, guild.id, member).await.is_none());
    assert!(rsvp::response_of(&db, &uuid, member).await.unwrap().is_none());
    assert_eq!(event_count(&db, guild.id).await, 1);

    // the store refuses to orphan guilds: owners are deleted only after
    // their guilds are gone
    assert!(
        sqlx::query("DELETE FROM profiles WHERE id=?")
            .bind(owner)
            .execute(&db)
            .await
            .is_err()
    );
}
