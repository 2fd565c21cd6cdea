//! Run orchestration: fetch → load → diff → format → deliver → commit.
//!
//! A fetch failure aborts before anything touches the store. Delivery
//! failures are logged per message and never block the commit; otherwise
//! every later run would resend the same stale notifications.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::config::{Config, SendTest};
use crate::differ::diff;
use crate::error::Result;
use crate::format::format_decision;
use crate::notify::Notifier;
use crate::source::PresenceSource;
use crate::state::SnapshotStore;
use crate::types::{Classification, NotificationDecision, NotificationMessage, Platform};

/// Summary of one polling run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub friends_seen: usize,
    pub decisions: usize,
    pub delivered: usize,
    pub failed: usize,
    /// Decisions that were only logged because no transport is enabled.
    pub skipped: usize,
}

/// Performs one polling run.
///
/// `now` should be taken before the fetch. Anything updated while the run is
/// in flight is then re-evaluated next time instead of being lost.
pub fn run_once(
    config: &Config,
    source: &dyn PresenceSource,
    store: &SnapshotStore,
    notifier: Option<&dyn Notifier>,
    now: DateTime<Utc>,
) -> Result<RunReport> {
    let current = source.fetch()?;
    tracing::info!(friends = current.len(), source = %source.describe(), "Fetched friend presence");

    let (previous, last_check) = store.load_as_of(now)?;
    match last_check.instant() {
        Some(at) => tracing::info!(
            last_run = %at.with_timezone(&chrono::Local).format("%b %d, %Y at %I:%M %p"),
            "Last run time"
        ),
        None => tracing::info!("First run, every online friend counts as new"),
    }

    let decisions = diff(&previous, &current, last_check, &config.watch);
    let mut report = RunReport {
        friends_seen: current.len(),
        decisions: decisions.len(),
        ..RunReport::default()
    };

    for decision in &decisions {
        let message = format_decision(decision);
        match notifier {
            None => {
                tracing::info!(title = %message.title, body = %message.body, "Notifications disabled, not sending");
                report.skipped += 1;
            }
            Some(notifier) => match notifier.send(&message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        friend = %decision.display_name,
                        transport = notifier.name(),
                        "Error sending notification"
                    );
                    report.failed += 1;
                }
            },
        }
    }

    store.commit(&current, last_check.advance_to(now))?;

    if report.decisions == 0 {
        tracing::info!("No changes found");
    }
    tracing::info!(
        decisions = report.decisions,
        delivered = report.delivered,
        failed = report.failed,
        skipped = report.skipped,
        "Run complete"
    );
    Ok(report)
}

/// Sends synthetic notifications to check transport configuration.
///
/// Never fetches presence and never touches the snapshot store. Returns the
/// number of messages sent.
pub fn send_test<R: Rng + ?Sized>(
    kind: SendTest,
    notifier: &dyn Notifier,
    rng: &mut R,
) -> Result<usize> {
    let classifications = match kind {
        SendTest::Off => vec![],
        SendTest::Watched => vec![Classification::Watched],
        SendTest::Unwatched => vec![Classification::Unwatched],
        SendTest::Both => vec![Classification::Unwatched, Classification::Watched],
    };

    for &classification in &classifications {
        let message = test_message(classification, rng);
        tracing::info!(
            transport = notifier.name(),
            title = %message.title,
            "Sending test notification"
        );
        notifier.send(&message)?;
    }
    Ok(classifications.len())
}

fn test_message<R: Rng + ?Sized>(classification: Classification, rng: &mut R) -> NotificationMessage {
    let tag: u16 = rng.gen_range(1000..=9999);
    format_decision(&NotificationDecision {
        friend_id: format!("test-{tag}"),
        display_name: format!("Player#{tag}"),
        game_name: "TestGame".to_string(),
        platform: Platform::Unknown,
        updated_at: Utc::now(),
        user_icon_url: None,
        game_icon_url: None,
        classification,
    })
}
