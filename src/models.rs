use sqlx::FromRow;
use time::{OffsetDateTime, macros::format_description};

#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub id: i64,
    pub subject: String,

    pub display_name: String,
    pub rank: String,
    pub main_game: String,
    pub preferred_roles: String,
    pub status: String,

    // unique: subject
}

#[derive(Debug, Clone, FromRow)]
pub struct ExternalAccount {
    pub id: i64,
    pub profile_id: i64,

    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Guild {
    pub id: i64,

    pub name: String,
    pub description: String,
    pub owner_id: i64,

    // unique: name
}

#[derive(Debug, Clone, FromRow)]
pub struct Membership {
    pub id: i64,
    pub guild_id: i64,
    pub profile_id: i64,

    pub role: String,
    pub status: String,
    pub joined_at: OffsetDateTime,

    // unique: guild_id, profile_id
}

#[derive(Debug, Clone, FromRow)]
pub struct EventTemplate {
    pub id: i64,
    pub guild_id: i64,

    pub name: String,
    /// Default duration in whole seconds.
    pub default_time: i64,
    pub default_roles: String,

    // unique: guild_id, name
}

#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub uuid: String,
    pub guild_id: i64,

    pub title: String,
    pub description: String,
    pub start_time: OffsetDateTime,
    pub end_time: OffsetDateTime,
    pub max_participants: Option<i64>,
    pub required_roles: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct Rsvp {
    pub id: i64,
    pub event_uuid: String,
    pub profile_id: i64,

    pub response: String,
    pub role_signed_up: String,

    // unique: event_uuid, profile_id
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Officer,
    Member,
    Recruit,
    Trial,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Leader,
        Role::Officer,
        Role::Member,
        Role::Recruit,
        Role::Trial,
    ];

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "LEADER" => Some(Role::Leader),
            "OFFICER" => Some(Role::Officer),
            "MEMBER" => Some(Role::Member),
            "RECRUIT" => Some(Role::Recruit),
            "TRIAL" => Some(Role::Trial),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leader => "LEADER",
            Role::Officer => "OFFICER",
            Role::Member => "MEMBER",
            Role::Recruit => "RECRUIT",
            Role::Trial => "TRIAL",
        }
    }

    /// Display/sort precedence, LEADER first.
    pub fn precedence(&self) -> u8 {
        match self {
            Role::Leader => 0,
            Role::Officer => 1,
            Role::Member => 2,
            Role::Recruit => 3,
            Role::Trial => 4,
        }
    }
}

pub const STATUS_PENDING: &str = "PENDING";
pub const STATUS_APPROVED: &str = "APPROVED";
pub const STATUS_REJECTED: &str = "REJECTED";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpResponse {
    Yes,
    No,
    Maybe,
}

impl RsvpResponse {
    pub fn parse(s: &str) -> Option<RsvpResponse> {
        match s {
            "YES" => Some(RsvpResponse::Yes),
            "NO" => Some(RsvpResponse::No),
            "MAYBE" => Some(RsvpResponse::Maybe),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RsvpResponse::Yes => "YES",
            RsvpResponse::No => "NO",
            RsvpResponse::Maybe => "MAYBE",
        }
    }
}

pub fn fmt_timestamp(t: OffsetDateTime) -> String {
    t.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute] UTC"
    ))
    .unwrap_or_default()
}

/// Value for an `<input type="datetime-local">`.
pub fn fmt_input_timestamp(t: OffsetDateTime) -> String {
    t.format(format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .unwrap_or_default()
}

impl Event {
    pub fn when_label(&self) -> String {
        format!(
            "{} — {}",
            fmt_timestamp(self.start_time),
            fmt_timestamp(self.end_time)
        )
    }
}

impl EventTemplate {
    pub fn duration_label(&self) -> String {
        let hours = self.default_time / 3600;
        let minutes = (self.default_time % 3600) / 60;
        format!("{hours}h {minutes:02}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("GRAND_POOBAH"), None);
        assert_eq!(Role::parse("leader"), None);
    }

    #[test]
    fn leader_outranks_everyone() {
        let mut sorted = Role::ALL;
        sorted.sort_by_key(Role::precedence);
        assert_eq!(sorted[0], Role::Leader);
        assert_eq!(sorted[4], Role::Trial);
    }

    #[test]
    fn rsvp_response_parses() {
        assert_eq!(RsvpResponse::parse("YES"), Some(RsvpResponse::Yes));
        assert_eq!(RsvpResponse::parse("PERHAPS"), None);
    }
}
