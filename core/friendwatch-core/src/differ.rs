//! Presence diffing: decides which friends are worth a notification.
//!
//! ```text
//! updated_at <= last_check            → skip (already processed)
//! offline                             → log only, never notified
//! online, same game as cached entry   → skip (no renotify on flapping presence)
//! online, new game or newly online    → Watched / Unwatched decision
//! Unwatched while watched_only        → suppressed
//! ```
//!
//! Friends missing from the current fetch are not compared at all, and a
//! friend with no cached entry counts as previously offline.

use crate::types::{
    Classification, FriendPresence, LastCheck, NotificationDecision, Snapshot, WatchConfig,
};

/// Compares two snapshots and returns decisions in the current snapshot's order.
pub fn diff(
    previous: &Snapshot,
    current: &Snapshot,
    last_check: LastCheck,
    watch: &WatchConfig,
) -> Vec<NotificationDecision> {
    let previous = previous.by_id();

    current
        .iter()
        .filter_map(|friend| decide(friend, previous.get(friend.id.as_str()).copied(), last_check, watch))
        .collect()
}

fn decide(
    friend: &FriendPresence,
    cached: Option<&FriendPresence>,
    last_check: LastCheck,
    watch: &WatchConfig,
) -> Option<NotificationDecision> {
    if last_check.covers(friend.updated_at) {
        return None;
    }

    let name = watch.display_name(friend);
    let previous_game = cached.and_then(FriendPresence::effective_game);

    let Some(game) = friend.effective_game() else {
        if previous_game.is_some() {
            tracing::info!(friend = %name, "Went offline");
        } else {
            tracing::debug!(friend = %name, "Still offline");
        }
        return None;
    };

    if previous_game == Some(game) {
        tracing::info!(
            friend = %name,
            game = %game,
            "Online, but playing the same game as before"
        );
        return None;
    }

    let classification = watch.classify(friend);
    match classification {
        Classification::Watched => {
            tracing::info!(friend = %name, game = %game, "Watched friend went online");
        }
        Classification::Unwatched if watch.watched_only => {
            tracing::info!(
                friend = %name,
                game = %game,
                "Online, but watchedonly is set, not notifying"
            );
            return None;
        }
        Classification::Unwatched => {
            tracing::info!(friend = %name, game = %game, "Went online");
        }
    }

    Some(NotificationDecision {
        friend_id: friend.id.clone(),
        display_name: name.to_string(),
        game_name: game.to_string(),
        platform: friend.platform,
        updated_at: friend.updated_at,
        user_icon_url: friend.user_icon_url.clone(),
        game_icon_url: friend.game_icon_url.clone(),
        classification,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Platform, UNDISCLOSED_GAME};
    use chrono::{DateTime, TimeZone, Utc};

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 10, hour, 0, 0).unwrap()
    }

    fn online(id: &str, game: Option<&str>, at: DateTime<Utc>) -> FriendPresence {
        FriendPresence {
            id: id.to_string(),
            display_name: format!("Friend{id}"),
            is_online: true,
            game_name: game.map(str::to_string),
            game_icon_url: Some(format!("https://img.example/{id}.png")),
            user_icon_url: None,
            platform: Platform::Switch,
            updated_at: at,
        }
    }

    fn offline(id: &str, at: DateTime<Utc>) -> FriendPresence {
        FriendPresence {
            is_online: false,
            game_name: None,
            game_icon_url: None,
            ..online(id, None, at)
        }
    }

    fn snap(friends: Vec<FriendPresence>) -> Snapshot {
        Snapshot::new(friends)
    }

    fn watching(ids: &[&str], watched_only: bool) -> WatchConfig {
        WatchConfig {
            watched: ids.iter().map(|s| s.to_string()).collect(),
            watched_only,
            ..WatchConfig::default()
        }
    }

    #[test]
    fn test_new_friend_online_is_unwatched_decision() {
        let current = snap(vec![online("1", Some("Zelda"), t(10))]);

        let decisions = diff(
            &Snapshot::default(),
            &current,
            LastCheck::BEGINNING,
            &WatchConfig::default(),
        );

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].game_name, "Zelda");
        assert_eq!(decisions[0].classification, Classification::Unwatched);
        assert_eq!(decisions[0].friend_id, "1");
    }

    #[test]
    fn test_same_game_is_not_renotified_even_when_updated() {
        let previous = snap(vec![online("1", Some("Zelda"), t(10))]);
        let current = snap(vec![online("1", Some("Zelda"), t(11))]);

        let decisions = diff(
            &previous,
            &current,
            LastCheck::at(t(10)),
            &WatchConfig::default(),
        );

        assert!(decisions.is_empty());
    }

    #[test]
    fn test_watched_friend_coming_online() {
        let previous = snap(vec![offline("1", t(9))]);
        let current = snap(vec![online("1", Some("Mario"), t(10))]);

        let decisions = diff(&previous, &current, LastCheck::at(t(9)), &watching(&["1"], false));

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].classification, Classification::Watched);
        assert_eq!(decisions[0].game_name, "Mario");
    }

    #[test]
    fn test_watched_only_suppresses_unwatched() {
        let current = snap(vec![online("2", Some("X"), t(10))]);

        let decisions = diff(
            &Snapshot::default(),
            &current,
            LastCheck::BEGINNING,
            &watching(&[], true),
        );

        assert!(decisions.is_empty());
    }

    #[test]
    fn test_watched_only_keeps_watched() {
        let current = snap(vec![
            online("1", Some("X"), t(10)),
            online("2", Some("Y"), t(10)),
        ]);

        let decisions = diff(
            &Snapshot::default(),
            &current,
            LastCheck::BEGINNING,
            &watching(&["1"], true),
        );

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].friend_id, "1");
    }

    #[test]
    fn test_updates_at_or_before_watermark_are_skipped() {
        let current = snap(vec![
            online("1", Some("Zelda"), t(9)),
            online("2", Some("Zelda"), t(10)),
            online("3", Some("Zelda"), t(11)),
        ]);

        let decisions = diff(
            &Snapshot::default(),
            &current,
            LastCheck::at(t(10)),
            &WatchConfig::default(),
        );

        let ids: Vec<_> = decisions.iter().map(|d| d.friend_id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
    }

    #[test]
    fn test_going_offline_never_notifies() {
        let previous = snap(vec![online("1", Some("Zelda"), t(9)), offline("2", t(9))]);
        let current = snap(vec![offline("1", t(10)), offline("2", t(10)), offline("3", t(10))]);

        let decisions = diff(
            &previous,
            &current,
            LastCheck::BEGINNING,
            &watching(&["1", "2", "3"], false),
        );

        assert!(decisions.is_empty());
    }

    #[test]
    fn test_game_change_is_reported() {
        let previous = snap(vec![online("1", Some("Zelda"), t(9))]);
        let current = snap(vec![online("1", Some("Mario Kart"), t(10))]);

        let decisions = diff(&previous, &current, LastCheck::at(t(9)), &WatchConfig::default());

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].game_name, "Mario Kart");
    }

    #[test]
    fn test_undisclosed_game_is_compared_like_any_game() {
        let current = snap(vec![online("1", None, t(10))]);

        let first = diff(&Snapshot::default(), &current, LastCheck::BEGINNING, &WatchConfig::default());
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].game_name, UNDISCLOSED_GAME);

        let again = snap(vec![online("1", None, t(11))]);
        let second = diff(&current, &again, LastCheck::at(t(10)), &WatchConfig::default());
        assert!(second.is_empty());
    }

    #[test]
    fn test_disappeared_friend_is_ignored() {
        let previous = snap(vec![online("1", Some("Zelda"), t(9)), online("2", Some("Zelda"), t(9))]);
        let current = snap(vec![online("2", Some("Zelda"), t(10))]);

        let decisions = diff(&previous, &current, LastCheck::at(t(9)), &WatchConfig::default());

        assert!(decisions.is_empty());
    }

    #[test]
    fn test_decisions_follow_source_order() {
        let current = snap(vec![
            online("c", Some("A"), t(10)),
            online("a", Some("B"), t(10)),
            online("b", Some("C"), t(10)),
        ]);

        let decisions = diff(&Snapshot::default(), &current, LastCheck::BEGINNING, &WatchConfig::default());

        let ids: Vec<_> = decisions.iter().map(|d| d.friend_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_decision_uses_alias_and_carries_metadata() {
        let mut watch = watching(&["Bestie"], false);
        watch.aliases.insert("1".to_string(), "Bestie".to_string());
        let current = snap(vec![online("1", Some("Zelda"), t(10))]);

        let decisions = diff(&Snapshot::default(), &current, LastCheck::BEGINNING, &watch);

        let decision = &decisions[0];
        assert_eq!(decision.display_name, "Bestie");
        assert_eq!(decision.classification, Classification::Watched);
        assert_eq!(decision.platform, Platform::Switch);
        assert_eq!(decision.updated_at, t(10));
        assert_eq!(
            decision.game_icon_url.as_deref(),
            Some("https://img.example/1.png")
        );
    }

    #[test]
    fn test_repeated_run_with_unchanged_data_is_idempotent() {
        let current = snap(vec![online("1", Some("Zelda"), t(10))]);
        let first = diff(&Snapshot::default(), &current, LastCheck::BEGINNING, &WatchConfig::default());
        assert_eq!(first.len(), 1);

        let second = diff(&current, &current, LastCheck::at(t(12)), &WatchConfig::default());
        assert!(second.is_empty());
    }
}
