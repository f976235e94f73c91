mod common;

use common::{create_guild, create_profile, join_and_approve, membership_of, test_pool};
use guildhall::policy::{self, PolicyError};

#[tokio::test]
async fn ownership_ignores_membership_rows() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let leader = create_profile(&db, "leader").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    // a LEADER member still isn't the owner
    let mid = join_and_approve(&db, &guild, leader).await;
    policy::update_role(&db, &guild, mid, "LEADER", owner)
        .await
        .unwrap();

    assert!(policy::is_owner(&guild, owner));
    assert!(!policy::is_owner(&guild, leader));
    assert!(policy::is_officer(&db, guild.id, leader).await.unwrap());
    assert!(!policy::is_officer(&db, guild.id, owner).await.unwrap());
}

#[tokio::test]
async fn request_join_is_idempotent() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let joiner = create_profile(&db, "joiner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    policy::request_join(&db, guild.id, joiner).await.unwrap();
    policy::request_join(&db, guild.id, joiner).await.unwrap();

    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM memberships WHERE guild_id=? AND profile_id=?")
            .bind(guild.id)
            .bind(joiner)
            .fetch_one(&db)
            .await
            .unwrap();
    assert_eq!(count, 1);
    assert_eq!(
        membership_of(&db, guild.id, joiner).await.unwrap().status,
        "PENDING"
    );
}

#[tokio::test]
async fn rejoin_after_approval_resets_to_pending() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let joiner = create_profile(&db, "joiner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    join_and_approve(&db, &guild, joiner).await;
    policy::request_join(&db, guild.id, joiner).await.unwrap();

    let membership = membership_of(&db, guild.id, joiner).await.unwrap();
    assert_eq!(membership.status, "PENDING");
    assert!(!policy::is_approved_member(&db, guild.id, joiner).await.unwrap());
}

#[tokio::test]
async fn approve_sets_member_role_and_requires_rank() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let joiner = create_profile(&db, "joiner").await;
    let bystander = create_profile(&db, "bystander").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    policy::request_join(&db, guild.id, joiner).await.unwrap();
    let membership = membership_of(&db, guild.id, joiner).await.unwrap();

    // a stranger can't approve
    let err = policy::approve_membership(&db, &guild, membership.id, bystander)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::PermissionDenied(_)));
    assert_eq!(
        membership_of(&db, guild.id, joiner).await.unwrap().status,
        "PENDING"
    );

    policy::approve_membership(&db, &guild, membership.id, owner)
        .await
        .unwrap();
    let membership = membership_of(&db, guild.id, joiner).await.unwrap();
    assert_eq!(membership.status, "APPROVED");
    assert_eq!(membership.role, "MEMBER");
    assert!(policy::is_approved_member(&db, guild.id, joiner).await.unwrap());
    assert!(!policy::is_officer(&db, guild.id, joiner).await.unwrap());
}

#[tokio::test]
async fn officers_can_approve() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let officer = create_profile(&db, "officer").await;
    let joiner = create_profile(&db, "joiner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let officer_mid = join_and_approve(&db, &guild, officer).await;
    policy::update_role(&db, &guild, officer_mid, "OFFICER", owner)
        .await
        .unwrap();

    policy::request_join(&db, guild.id, joiner).await.unwrap();
    let membership = membership_of(&db, guild.id, joiner).await.unwrap();
    policy::approve_membership(&db, &guild, membership.id, officer)
        .await
        .unwrap();

    assert!(policy::is_approved_member(&db, guild.id, joiner).await.unwrap());
}

#[tokio::test]
async fn approving_a_non_pending_membership_fails_unchanged() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let joiner = create_profile(&db, "joiner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let mid = join_and_approve(&db, &guild, joiner).await;
    policy::update_role(&db, &guild, mid, "OFFICER", owner)
        .await
        .unwrap();

    let err = policy::approve_membership(&db, &guild, mid, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::NotFound));

    // the row kept its role; a second approve didn't demote the officer
    let membership = membership_of(&db, guild.id, joiner).await.unwrap();
    assert_eq!(membership.status, "APPROVED");
    assert_eq!(membership.role, "OFFICER");
}

#[tokio::test]
async fn reject_deletes_the_row() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let joiner = create_profile(&db, "joiner").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    policy::request_join(&db, guild.id, joiner).await.unwrap();
    let membership = membership_of(&db, guild.id, joiner).await.unwrap();
    policy::reject_membership(&db, &guild, membership.id, owner)
        .await
        .unwrap();

    assert!(membership_of(&db, guild.id, joiner).await.is_none());
    assert!(!policy::is_approved_member(&db, guild.id, joiner).await.unwrap());
    assert!(!policy::is_officer(&db, guild.id, joiner).await.unwrap());

    // rejecting an approved member is not a thing
    let mid = join_and_approve(&db, &guild, joiner).await;
    let err = policy::reject_membership(&db, &guild, mid, owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::NotFound));
}

#[tokio::test]
async fn only_the_owner_updates_roles() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let officer = create_profile(&db, "officer").await;
    let member = create_profile(&db, "member").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let officer_mid = join_and_approve(&db, &guild, officer).await;
    policy::update_role(&db, &guild, officer_mid, "OFFICER", owner)
        .await
        .unwrap();
    let member_mid = join_and_approve(&db, &guild, member).await;

    // officers may approve but not promote
    let err = policy::update_role(&db, &guild, member_mid, "OFFICER", officer)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::PermissionDenied(_)));
    assert_eq!(membership_of(&db, guild.id, member).await.unwrap().role, "MEMBER");

    policy::update_role(&db, &guild, member_mid, "OFFICER", owner)
        .await
        .unwrap();
    assert!(policy::is_officer(&db, guild.id, member).await.unwrap());
}

#[tokio::test]
async fn update_role_validates_input_and_target() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let member = create_profile(&db, "member").await;
    let pending = create_profile(&db, "pending").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    let member_mid = join_and_approve(&db, &guild, member).await;

    let err = policy::update_role(&db, &guild, member_mid, "GRAND_POOBAH", owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::InvalidArgument(_)));
    assert_eq!(membership_of(&db, guild.id, member).await.unwrap().role, "MEMBER");

    // a PENDING membership has no role to update
    policy::request_join(&db, guild.id, pending).await.unwrap();
    let pending_mid = membership_of(&db, guild.id, pending).await.unwrap().id;
    let err = policy::update_role(&db, &guild, pending_mid, "MEMBER", owner)
        .await
        .unwrap_err();
    assert!(matches!(err, PolicyError::NotFound));
}

#[tokio::test]
async fn leave_is_a_noop_when_absent() {
    let db = test_pool().await;
    let owner = create_profile(&db, "owner").await;
    let member = create_profile(&db, "member").await;
    let guild = create_guild(&db, "Ash Court", owner).await;

    policy::leave(&db, guild.id, member).await.unwrap();

    join_and_approve(&db, &guild, member).await;
    policy::leave(&db, guild.id, member).await.unwrap();
    assert!(membership_of(&db, guild.id, member).await.is_none());
}
