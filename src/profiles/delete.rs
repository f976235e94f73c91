use axum::{
    debug_handler,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppError, AppResult, session::acting_profile};

/// Deleting a profile takes its memberships, RSVPs and external accounts
/// with it. Owned guilds block the delete: communities aren't destroyed as
/// a side effect of one account closing.
#[debug_handler]
pub(crate) async fn delete(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(profile) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to("/login").into_response());
    };

    let (owned,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM guilds WHERE owner_id=?")
        .bind(profile.id)
        .fetch_one(&db_pool)
        .await?;

    if owned > 0 {
        return Err(AppError::Invalid(
            "you still own guilds — delete them first".to_owned(),
        ));
    }

    sqlx::query("DELETE FROM profiles WHERE id=?")
        .bind(profile.id)
        .execute(&db_pool)
        .await?;

    tracing::info!("profile {} deleted", profile.id);

    session.clear().await;
    Ok(Redirect::to("/").into_response())
}
