//! Renders notification decisions into transport-neutral messages.

use chrono::{Local, TimeZone};

use crate::types::{Classification, NotificationDecision, NotificationMessage, Priority};

const TIMESTAMP_FORMAT: &str = "%b %d, %Y at %I:%M %p";
const WATCHED_TAGS: &[&str] = &["warning", "bell"];
const UNWATCHED_TAGS: &[&str] = &["video_game"];

/// Formats a decision using the local time zone.
pub fn format_decision(decision: &NotificationDecision) -> NotificationMessage {
    format_decision_in(decision, &Local)
}

pub fn format_decision_in<Tz>(decision: &NotificationDecision, tz: &Tz) -> NotificationMessage
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let (title, priority, tags) = match decision.classification {
        Classification::Watched => ("Watched Friend Online", Priority::Urgent, WATCHED_TAGS),
        Classification::Unwatched => ("Friend Online", Priority::Default, UNWATCHED_TAGS),
    };

    let body = format!(
        "{} is now online playing {} ({}). Last status update: {}.",
        decision.display_name,
        decision.game_name,
        decision.platform.label(),
        decision
            .updated_at
            .with_timezone(tz)
            .format(TIMESTAMP_FORMAT),
    );

    NotificationMessage {
        title: title.to_string(),
        body,
        priority,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        icon: decision.user_icon_url.clone(),
        image: decision.game_icon_url.clone(),
    }
}
