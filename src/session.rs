use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{AppResult, models::Profile};

pub const PROFILE_ID: &str = "profile_id";
pub const CSRF_STATE: &str = "csrf_state";
pub const PKCE_VERIFIER: &str = "pkce_verifier";
pub const RETURN_URL: &str = "return_url";

/// The logged-in profile, or None when the session is anonymous or the
/// profile has been deleted since login.
pub async fn acting_profile(session: &Session, db: &SqlitePool) -> AppResult<Option<Profile>> {
    let Some(profile_id) = session.get::<i64>(PROFILE_ID).await? else {
        return Ok(None);
    };

    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id=?")
        .bind(profile_id)
        .fetch_optional(db)
        .await?;

    Ok(profile)
}
