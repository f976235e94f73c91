use serde::Deserialize;
use time::{OffsetDateTime, PrimitiveDateTime, macros::format_description};

use crate::{AppError, AppResult, models::EventTemplate};

use super::save::EventDraft;

/// What the event form posts. Numeric-ish fields arrive as strings so the
/// browser can submit them empty.
#[derive(Debug, Deserialize)]
pub(crate) struct EventForm {
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    pub(crate) start_time: String,
    pub(crate) end_time: String,
    #[serde(default)]
    pub(crate) max_participants: String,
    #[serde(default)]
    pub(crate) required_roles: String,
    #[serde(default)]
    pub(crate) template: String,
    #[serde(default)]
    pub(crate) save_as_template: bool,
}

impl EventForm {
    pub(crate) fn into_draft(self) -> AppResult<EventDraft> {
        let max_participants = match self.max_participants.trim() {
            "" => None,
            s => Some(
                s.parse::<i64>()
                    .map_err(|_| AppError::Invalid(format!("bad participant cap {s:?}")))?,
            ),
        };

        let template_id = match self.template.trim() {
            "" => None,
            s => Some(
                s.parse::<i64>()
                    .map_err(|_| AppError::Invalid(format!("bad template id {s:?}")))?,
            ),
        };

        Ok(EventDraft {
            title: self.title,
            description: self.description,
            start_time: parse_datetime_local(&self.start_time)?,
            end_time: parse_datetime_local(&self.end_time)?,
            max_participants,
            required_roles: self.required_roles,
            template_id,
            save_as_template: self.save_as_template,
        })
    }
}

/// `<input type="datetime-local">` values, with or without seconds.
/// Treated as UTC: the app keeps all scheduling in UTC.
pub(crate) fn parse_datetime_local(s: &str) -> AppResult<OffsetDateTime> {
    let s = s.trim();
    let parsed = PrimitiveDateTime::parse(s, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
        .or_else(|_| {
            PrimitiveDateTime::parse(
                s,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
        })
        .map_err(|_| AppError::Invalid(format!("bad timestamp {s:?}")))?;
    Ok(parsed.assume_utc())
}

pub(crate) fn template_options(templates: &[EventTemplate], selected: Option<i64>) -> String {
    let mut options = "<option value=\"\">— no template —</option>".to_owned();
    for tpl in templates {
        options += &format!(
            "<option value=\"{}\" {}>{} ({})</option>",
            tpl.id,
            if selected == Some(tpl.id) { "selected" } else { "" },
            tpl.name,
            tpl.duration_label(),
        );
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn parses_datetime_local_with_and_without_seconds() {
        assert_eq!(
            parse_datetime_local("2026-03-01T19:30").unwrap(),
            datetime!(2026-03-01 19:30 UTC)
        );
        assert_eq!(
            parse_datetime_local("2026-03-01T19:30:15").unwrap(),
            datetime!(2026-03-01 19:30:15 UTC)
        );
        assert!(parse_datetime_local("next tuesday").is_err());
    }
}
