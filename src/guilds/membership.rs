use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, guilds::load_guild, policy, res, session::acting_profile};

#[debug_handler]
pub(crate) async fn join(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/g/{guild_id}")).into_response());
    };

    if load_guild(&db_pool, guild_id).await?.is_none() {
        return Ok(res::sorry("guild"));
    }

    policy::request_join(&db_pool, guild_id, profile.id).await?;

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn leave(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    policy::leave(&db_pool, guild_id, profile.id).await?;

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn approve(
    Path((guild_id, membership_id)): Path<(i64, i64)>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    policy::approve_membership(&db_pool, &guild, membership_id, profile.id).await?;

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}

#[debug_handler]
pub(crate) async fn reject(
    Path((guild_id, membership_id)): Path<(i64, i64)>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    policy::reject_membership(&db_pool, &guild, membership_id, profile.id).await?;

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateRoleForm {
    role: String,
}

#[debug_handler]
pub(crate) async fn update_role(
    Path((guild_id, membership_id)): Path<(i64, i64)>,
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(UpdateRoleForm { role }): Form<UpdateRoleForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    policy::update_role(&db_pool, &guild, membership_id, &role, profile.id).await?;

    Ok(Redirect::to(&format!("/g/{guild_id}")).into_response())
}
