use axum::{
    debug_handler,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use sqlx::SqlitePool;
use time::OffsetDateTime;
use tower_sessions::Session;

use crate::{
    AppResult, include_res, markdown_to_html,
    events::rsvp,
    guilds::load_guild,
    models::{Event, EventTemplate, Role, STATUS_APPROVED, STATUS_PENDING},
    policy, res,
    session::acting_profile,
};

#[debug_handler]
pub(crate) async fn detail(
    Path(guild_id): Path<i64>,
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Response> {
    let Some(viewer) = acting_profile(&session, &db_pool).await? else {
        return Ok(Redirect::to(&format!("/login?return_url=/g/{guild_id}")).into_response());
    };

    let Some(guild) = load_guild(&db_pool, guild_id).await? else {
        return Ok(res::sorry("guild"));
    };

    let can_manage = policy::can_manage_event(&db_pool, &guild, viewer.id).await?;
    let is_approved = policy::is_approved_member(&db_pool, guild.id, viewer.id).await?;
    let is_owner = policy::is_owner(&guild, viewer.id);

    let is_pending: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM memberships WHERE guild_id=? AND profile_id=? AND status=?")
            .bind(guild.id)
            .bind(viewer.id)
            .bind(STATUS_PENDING)
            .fetch_optional(&db_pool)
            .await?;
    let is_pending = is_pending.is_some();

    let upcoming: Vec<Event> = sqlx::query_as(
        "SELECT * FROM events WHERE guild_id=? AND start_time >= ? ORDER BY start_time",
    )
    .bind(guild.id)
    .bind(OffsetDateTime::now_utc())
    .fetch_all(&db_pool)
    .await?;

    let mut event_items = String::new();
    for event in &upcoming {
        let counts = rsvp::counts(&db_pool, &event.uuid).await?;
        event_items += &format!(
            "<li><a href=\"/e/{}\">{}</a> <small>{}</small> \
             <small>yes {} / no {} / maybe {}</small></li>\n",
            event.uuid,
            event.title,
            event.when_label(),
            counts.yes,
            counts.no,
            counts.maybe,
        );
    }
    if event_items.is_empty() {
        event_items = "<li>No upcoming events.</li>".to_owned();
    }

    // LEADER first, then the rest by rank, ties by name — same ordering the
    // member roster has always used.
    let approved: Vec<(i64, String, i64, String)> = sqlx::query_as(
        "SELECT m.id, m.role, p.id, p.display_name
         FROM memberships m JOIN profiles p ON p.id = m.profile_id
         WHERE m.guild_id=? AND m.status=?
         ORDER BY CASE m.role
                    WHEN 'LEADER' THEN 0
                    WHEN 'OFFICER' THEN 1
                    WHEN 'MEMBER' THEN 2
                    WHEN 'RECRUIT' THEN 3
                    WHEN 'TRIAL' THEN 4
                    ELSE 5
                  END, p.display_name",
    )
    .bind(guild.id)
    .bind(STATUS_APPROVED)
    .fetch_all(&db_pool)
    .await?;

    let mut member_items = String::new();
    for (membership_id, role, profile_id, display_name) in &approved {
        member_items += &format!(
            "<li><a href=\"/p/{profile_id}\">{display_name}</a> <small>{role}</small>"
        );
        if is_owner {
            let mut options = String::new();
            for choice in Role::ALL {
                options += &format!(
                    "<option value=\"{0}\" {1}>{0}</option>",
                    choice.as_str(),
                    if choice.as_str() == role { "selected" } else { "" },
                );
            }
            member_items += &format!(
                " <form method=\"post\" action=\"/g/{}/m/{membership_id}/role\" class=\"inline\">\
                 <select name=\"role\">{options}</select><button>set role</button></form>",
                guild.id
            );
        }
        member_items += "</li>\n";
    }
    if member_items.is_empty() {
        member_items = "<li>Nobody yet.</li>".to_owned();
    }

    let mut moderation = String::new();
    if can_manage {
        let pending: Vec<(i64, i64, String)> = sqlx::query_as(
            "SELECT m.id, p.id, p.display_name
             FROM memberships m JOIN profiles p ON p.id = m.profile_id
             WHERE m.guild_id=? AND m.status=?
             ORDER BY m.joined_at",
        )
        .bind(guild.id)
        .bind(STATUS_PENDING)
        .fetch_all(&db_pool)
        .await?;

        let mut pending_items = String::new();
        for (membership_id, profile_id, display_name) in &pending {
            pending_items += &format!(
                "<li><a href=\"/p/{profile_id}\">{display_name}</a> \
                 <form method=\"post\" action=\"/g/{0}/m/{membership_id}/approve\" class=\"inline\"><button>approve</button></form> \
                 <form method=\"post\" action=\"/g/{0}/m/{membership_id}/reject\" class=\"inline\"><button>reject</button></form></li>\n",
                guild.id
            );
        }
        if pending_items.is_empty() {
            pending_items = "<li>No pending requests.</li>".to_owned();
        }

        let templates: Vec<EventTemplate> =
            sqlx::query_as("SELECT * FROM event_templates WHERE guild_id=? ORDER BY name")
                .bind(guild.id)
                .fetch_all(&db_pool)
                .await?;
        let mut template_items = String::new();
        for tpl in &templates {
            template_items += &format!(
                "<li>{} <small>{} / {}</small></li>\n",
                tpl.name,
                tpl.duration_label(),
                tpl.default_roles
            );
        }
        if template_items.is_empty() {
            template_items = "<li>No templates.</li>".to_owned();
        }

        moderation = include_res!(str, "/pages/guilds/moderation.html")
            .replace("{guild_id}", &guild.id.to_string())
            .replace("{pending_members}", &pending_items)
            .replace("{templates}", &template_items);
    }

    let membership_controls = if is_owner {
        String::new()
    } else if is_approved {
        format!(
            "<form method=\"post\" action=\"/g/{}/leave\"><button>Leave guild</button></form>",
            guild.id
        )
    } else if is_pending {
        "<p>Join request pending.</p>".to_owned()
    } else {
        format!(
            "<form method=\"post\" action=\"/g/{}/join\"><button>Request to join</button></form>",
            guild.id
        )
    };

    let owner_controls = if is_owner {
        format!(
            "<a href=\"/g/{0}/edit\">edit</a> \
             <form method=\"post\" action=\"/g/{0}/delete\" class=\"inline\"><button>delete guild</button></form>",
            guild.id
        )
    } else {
        String::new()
    };

    let schedule_link = if is_owner || is_approved {
        format!("<a href=\"/g/{}/events/new\">Schedule an event</a>", guild.id)
    } else {
        String::new()
    };

    let body = include_res!(str, "/pages/guilds/detail.html")
        .replace("{name}", &guild.name)
        .replace("{description}", &markdown_to_html(&guild.description))
        .replace("{events}", &event_items)
        .replace("{members}", &member_items)
        .replace("{moderation}", &moderation)
        .replace("{membership_controls}", &membership_controls)
        .replace("{owner_controls}", &owner_controls)
        .replace("{schedule_link}", &schedule_link);

    Ok(Html(body).into_response())
}
