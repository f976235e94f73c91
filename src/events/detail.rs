use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use tower_sessions::Session;
use uuid::Uuid;

use crate::{
    AppResult, include_res, markdown_to_html,
    guilds::load_guild,
    policy, res,
    session::acting_profile,
};

use super::{load_event, rsvp};

#[debug_handler]
pub(crate) async fn detail(
    Path(event_id): Path<Uuid>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(viewer) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/e/{event_id}")).into_response());
    };

    let Some(event) = load_event(&db_pool, &event_id.to_string()).await? else {
        return Ok(res::sorry("event"));
    };
    let Some(guild) = load_guild(&db_pool, event.guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    let counts = rsvp::counts(&db_pool, &event.uuid).await?;
    let my_rsvp = rsvp::response_of(&db_pool, &event.uuid, viewer.id).await?;

    let can_manage = policy::can_manage_event(&db_pool, &guild, viewer.id).await?;
    let is_member = policy::is_owner(&guild, viewer.id)
        || policy::is_approved_member(&db_pool, guild.id, viewer.id).await?;

    let rsvp_section = if is_member {
        let (current, current_role) = match &my_rsvp {
            Some(r) => (r.response.as_str(), r.role_signed_up.as_str()),
            None => ("", ""),
        };
        let mut options = String::new();
        for choice in ["YES", "NO", "MAYBE"] {
            options += &format!(
                "<option value=\"{choice}\" {}>{choice}</option>",
                if choice == current { "selected" } else { "" },
            );
        }
        include_res!(str, "/pages/events/rsvp_form.html")
            .replace("{event_uuid}", &event.uuid)
            .replace("{options}", &options)
            .replace("{role_signed_up}", current_role)
    } else {
        "<p>Only guild members can RSVP.</p>".to_owned()
    };

    let manage = if can_manage {
        format!(
            "<a href=\"/e/{0}/edit\">edit</a> \
             <form method=\"post\" action=\"/e/{0}/delete\" class=\"inline\"><button>delete</button></form>",
            event.uuid
        )
    } else {
        String::new()
    };

    let max_participants = event
        .max_participants
        .map(|n| n.to_string())
        .unwrap_or_else(|| "no cap".to_owned());

    let body = include_res!(str, "/pages/events/detail.html")
        .replace("{title}", &event.title)
        .replace("{guild_id}", &guild.id.to_string())
        .replace("{guild_name}", &guild.name)
        .replace("{when}", &event.when_label())
        .replace("{description}", &markdown_to_html(&event.description))
        .replace("{required_roles}", &event.required_roles)
        .replace("{max_participants}", &max_participants)
        .replace("{count_yes}", &counts.yes.to_string())
        .replace("{count_no}", &counts.no.to_string())
        .replace("{count_maybe}", &counts.maybe.to_string())
        .replace("{rsvp_section}", &rsvp_section)
        .replace("{manage}", &manage);

    Ok(Html(body).into_response())
}
