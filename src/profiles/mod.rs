mod delete;
mod edit;
mod page;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(page::my_profile))
        .route("/edit", get(edit::edit_page).post(edit::edit))
        .route("/delete", post(delete::delete))
        .route("/external", post(edit::add_external))
        .route("/external/{id}/delete", post(edit::delete_external))
        .route("/{id}", get(page::profile))
}
