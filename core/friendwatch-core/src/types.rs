//! Core types shared by the differ, formatter, store and orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Reported game name for a friend who is online without a disclosed game.
pub const UNDISCLOSED_GAME: &str = "Undisclosed Game";

// ═══════════════════════════════════════════════════════════════════════════════
// Presence Types
// ═══════════════════════════════════════════════════════════════════════════════

/// Console a presence record was reported from. Only used for message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    #[default]
    Unknown,
    Switch,
    Switch2,
}

impl Platform {
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Platform::Switch,
            2 => Platform::Switch2,
            _ => Platform::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Switch => "NS1",
            Platform::Switch2 => "NS2",
            Platform::Unknown => "unknown console",
        }
    }
}

/// One friend's presence as reported by a single fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendPresence {
    pub id: String,
    pub display_name: String,
    pub is_online: bool,
    /// `Some` only while online.
    #[serde(default)]
    pub game_name: Option<String>,
    #[serde(default)]
    pub game_icon_url: Option<String>,
    #[serde(default)]
    pub user_icon_url: Option<String>,
    #[serde(default)]
    pub platform: Platform,
    /// When the source produced this record, not when it was fetched.
    pub updated_at: DateTime<Utc>,
}

impl FriendPresence {
    /// Game used for change detection.
    ///
    /// Online friends always have one (falling back to [`UNDISCLOSED_GAME`]),
    /// offline friends never do.
    pub fn effective_game(&self) -> Option<&str> {
        if !self.is_online {
            return None;
        }
        match self.game_name.as_deref() {
            Some(name) if !name.trim().is_empty() => Some(name),
            _ => Some(UNDISCLOSED_GAME),
        }
    }
}

/// All friends returned by one fetch, in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    friends: Vec<FriendPresence>,
}

impl Snapshot {
    pub fn new(friends: Vec<FriendPresence>) -> Self {
        Snapshot { friends }
    }

    pub fn is_empty(&self) -> bool {
        self.friends.is_empty()
    }

    pub fn len(&self) -> usize {
        self.friends.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FriendPresence> {
        self.friends.iter()
    }

    /// Builds an id lookup. Later duplicates win, matching a full replace.
    pub fn by_id(&self) -> HashMap<&str, &FriendPresence> {
        self.friends.iter().map(|f| (f.id.as_str(), f)).collect()
    }

    pub fn get(&self, id: &str) -> Option<&FriendPresence> {
        self.friends.iter().rev().find(|f| f.id == id)
    }
}

impl FromIterator<FriendPresence> for Snapshot {
    fn from_iter<I: IntoIterator<Item = FriendPresence>>(iter: I) -> Self {
        Snapshot::new(iter.into_iter().collect())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Watermark
// ═══════════════════════════════════════════════════════════════════════════════

/// Everything updated at or before this instant has already been processed.
///
/// [`LastCheck::BEGINNING`] covers nothing, so every update counts as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LastCheck(Option<DateTime<Utc>>);

impl LastCheck {
    pub const BEGINNING: LastCheck = LastCheck(None);

    pub fn at(instant: DateTime<Utc>) -> Self {
        LastCheck(Some(instant))
    }

    pub fn instant(self) -> Option<DateTime<Utc>> {
        self.0
    }

    pub fn is_beginning(self) -> bool {
        self.0.is_none()
    }

    /// Returns true when `updated_at` has already been processed.
    pub fn covers(self, updated_at: DateTime<Utc>) -> bool {
        self.0.is_some_and(|mark| updated_at <= mark)
    }

    /// Never moves the watermark backwards, even if the clock did.
    pub fn advance_to(self, now: DateTime<Utc>) -> Self {
        match self.0 {
            Some(mark) if mark > now => self,
            _ => LastCheck(Some(now)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Watch Policy
// ═══════════════════════════════════════════════════════════════════════════════

/// Which friends get the higher-priority treatment, and what to call them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchConfig {
    /// Friend ids or display names, matched exactly.
    pub watched: BTreeSet<String>,
    /// Suppress notifications for anyone not in `watched`.
    pub watched_only: bool,
    /// Friend id → preferred display name.
    pub aliases: BTreeMap<String, String>,
}

impl WatchConfig {
    pub fn display_name<'a>(&'a self, friend: &'a FriendPresence) -> &'a str {
        self.aliases
            .get(&friend.id)
            .map(String::as_str)
            .unwrap_or(&friend.display_name)
    }

    pub fn classify(&self, friend: &FriendPresence) -> Classification {
        let watched = self.watched.contains(&friend.id)
            || self.watched.contains(self.display_name(friend))
            || self.watched.contains(&friend.display_name);
        if watched {
            Classification::Watched
        } else {
            Classification::Unwatched
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Watched,
    Unwatched,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Decisions and Messages
// ═══════════════════════════════════════════════════════════════════════════════

/// A friend came online or switched games and should be notified about.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationDecision {
    pub friend_id: String,
    /// Already alias-resolved.
    pub display_name: String,
    pub game_name: String,
    pub platform: Platform,
    pub updated_at: DateTime<Utc>,
    pub user_icon_url: Option<String>,
    pub game_icon_url: Option<String>,
    pub classification: Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Min,
    Default,
    Urgent,
}

impl Priority {
    /// ntfy's numeric scale (1 = min, 3 = default, 5 = urgent).
    pub fn ntfy_level(self) -> u8 {
        match self {
            Priority::Min => 1,
            Priority::Default => 3,
            Priority::Urgent => 5,
        }
    }
}

/// Rendered notification, independent of the transport carrying it.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
}
