use axum::{Router, routing::get};
use rand::seq::IndexedRandom;
use sqlx::SqlitePool;

mod clients;
mod lockin;
mod login;
mod logout;

pub use clients::{ClientProvider, Clients};

use crate::{AppResult, AppState, models::Profile};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", get(login::login_page))
        .route("/login/{provider}", get(login::login))
        .route("/lockin/{provider}", get(lockin::lockin))
        .route("/logout", get(logout::logout))
}

/// Look up the profile for an OAuth subject, creating it on first login
/// with a throwaway display name the user can edit later.
pub(crate) async fn find_or_create_profile(db: &SqlitePool, subject: &str) -> AppResult<Profile> {
    if let Some(profile) = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE subject=?")
        .bind(subject)
        .fetch_optional(db)
        .await?
    {
        return Ok(profile);
    }

    let adjectives = [
        "Quick", "Lazy", "Mysterious", "Jolly", "Brave", "Silent", "Witty", "Fierce",
        "Clever", "Gentle", "Wild", "Calm", "Bold", "Shy", "Proud", "Happy", "Sad",
        "Eager", "Fancy", "Rusty", "Golden", "Silver", "Bright", "Dark", "Lucky",
    ];

    let nouns = [
        "Fox", "Bear", "Eagle", "Wolf", "Dragon", "Tiger", "Lion", "Owl", "Rabbit",
        "Falcon", "Hawk", "Shark", "Panda", "Kitten", "Puppy", "Phoenix", "Griffin",
        "Unicorn", "Turtle", "Dolphin", "Whale", "Elephant", "Giraffe", "Zebra",
    ];

    let display_name = format!(
        "{} {}",
        adjectives.choose(&mut rand::rng()).unwrap(),
        nouns.choose(&mut rand::rng()).unwrap()
    );

    tracing::info!("creating profile {display_name:?} for {subject}");

    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (subject, display_name) VALUES (?, ?) RETURNING *",
    )
    .bind(subject)
    .bind(&display_name)
    .fetch_one(db)
    .await?;

    Ok(profile)
}
