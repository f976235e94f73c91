use axum::{
    Form, debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, include_res, models::ExternalAccount, session::acting_profile};

#[derive(Debug, Deserialize)]
pub(crate) struct ProfileForm {
    display_name: String,
    rank: String,
    main_game: String,
    preferred_roles: String,
    status: String,
}

#[debug_handler]
pub(crate) async fn edit_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login?return_url=/p/edit").into_response());
    };

    let body = include_res!(str, "/pages/profiles/form.html")
        .replace("{display_name}", &profile.display_name)
        .replace("{rank}", &profile.rank)
        .replace("{main_game}", &profile.main_game)
        .replace("{preferred_roles}", &profile.preferred_roles)
        .replace(
            "{active_selected}",
            if profile.status == "ACTIVE" { "selected" } else { "" },
        )
        .replace(
            "{inactive_selected}",
            if profile.status == "INACTIVE" { "selected" } else { "" },
        );

    Ok(Html(body).into_response())
}

#[debug_handler]
pub(crate) async fn edit(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(form): Form<ProfileForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    if form.display_name.trim().is_empty() {
        return Err(AppError::Invalid("display name can't be empty".to_owned()));
    }
    if form.status != "ACTIVE" && form.status != "INACTIVE" {
        return Err(AppError::Invalid(format!("unknown status {:?}", form.status)));
    }

    sqlx::query(
        "UPDATE profiles SET display_name=?, rank=?, main_game=?, preferred_roles=?, status=?
         WHERE id=?",
    )
    .bind(form.display_name.trim())
    .bind(&form.rank)
    .bind(&form.main_game)
    .bind(&form.preferred_roles)
    .bind(&form.status)
    .bind(profile.id)
    .execute(&db_pool)
    .await?;

    Ok(Redirect::to("/p").into_response())
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExternalAccountForm {
    kind: String,
    value: String,
}

#[debug_handler]
pub(crate) async fn add_external(
    State(db_pool): State<SqlitePool>,
    session: Session,

    Form(ExternalAccountForm { kind, value }): Form<ExternalAccountForm>,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    if kind.trim().is_empty() || value.trim().is_empty() {
        return Err(AppError::Invalid(
            "external account needs a kind and a value".to_owned(),
        ));
    }

    sqlx::query("INSERT INTO external_accounts (profile_id, kind, value) VALUES (?, ?, ?)")
        .bind(profile.id)
        .bind(kind.trim())
        .bind(value.trim())
        .execute(&db_pool)
        .await?;

    Ok(Redirect::to("/p").into_response())
}

#[debug_handler]
pub(crate) async fn delete_external(
    Path(account_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let Some(acct) = sqlx::query_as::<_, ExternalAccount>(
        "SELECT * FROM external_accounts WHERE id=?",
    )
    .bind(account_id)
    .fetch_optional(&db_pool)
    .await?
    else {
        return Err(AppError::NotFound("no such external account".to_owned()));
    };

    if acct.profile_id != profile.id {
        return Err(AppError::Denied("you can't delete that".to_owned()));
    }

    sqlx::query("DELETE FROM external_accounts WHERE id=?")
        .bind(account_id)
        .execute(&db_pool)
        .await?;

    Ok(Redirect::to("/p").into_response())
}
