//! Read-only view of the saved state.

use chrono::Local;
use friendwatch_core::{Result, SnapshotStore, StorageConfig};

pub fn run(storage: &StorageConfig) -> Result<()> {
    let store = SnapshotStore::new(storage);

    let Some((snapshot, last_check)) = store.peek()? else {
        println!(
            "No saved state in {} yet. The next run treats every online friend as new.",
            storage.root().display()
        );
        return Ok(());
    };

    match last_check.instant() {
        Some(at) => println!(
            "Last run time: {}",
            at.with_timezone(&Local).format("%b %d, %Y at %I:%M %p")
        ),
        None => println!("Last run time: never"),
    }

    println!("{} cached friends:", snapshot.len());
    for friend in snapshot.iter() {
        let status = match friend.effective_game() {
            Some(game) => format!("online, {} ({})", game, friend.platform.label()),
            None => "offline".to_string(),
        };
        println!("  {:<24} {:<20} {}", friend.display_name, friend.id, status);
    }
    Ok(())
}
