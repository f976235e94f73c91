use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    AppResult, include_res,
    models::{ExternalAccount, Profile},
    res,
    session::acting_profile,
};

#[debug_handler]
pub(crate) async fn my_profile(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login?return_url=/p").into_response());
    };

    render(&db_pool, &profile, true).await
}

#[debug_handler]
pub(crate) async fn profile(
    Path(profile_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(viewer) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/p/{profile_id}")).into_response());
    };

    let Some(profile) = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id=?")
        .bind(profile_id)
        .fetch_optional(&db_pool)
        .await?
    else {
        return Ok(res::sorry("profile"));
    };

    render(&db_pool, &profile, viewer.id == profile.id).await
}

async fn render(db_pool: &SqlitePool, profile: &Profile, own: bool) -> AppResult<Response> {
    let accounts: Vec<ExternalAccount> =
        sqlx::query_as("SELECT * FROM external_accounts WHERE profile_id=? ORDER BY kind")
            .bind(profile.id)
            .fetch_all(db_pool)
            .await?;

    let mut account_items = String::new();
    for acct in &accounts {
        account_items += &format!("<li>{}: {}", acct.kind, acct.value);
        if own {
            account_items += &format!(
                " <form method=\"post\" action=\"/p/external/{}/delete\" class=\"inline\"><button>remove</button></form>",
                acct.id
            );
        }
        account_items += "</li>\n";
    }

    let controls = if own {
        include_res!(str, "/pages/profiles/controls.html").to_owned()
    } else {
        String::new()
    };

    let body = include_res!(str, "/pages/profiles/profile.html")
        .replace("{display_name}", &profile.display_name)
        .replace("{rank}", &profile.rank)
        .replace("{main_game}", &profile.main_game)
        .replace("{preferred_roles}", &profile.preferred_roles)
        .replace("{status}", &profile.status)
        .replace("{external_accounts}", &account_items)
        .replace("{controls}", &controls);

    Ok(Html(body).into_response())
}
