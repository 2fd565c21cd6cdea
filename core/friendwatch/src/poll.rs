//! The default run: one presence check against the saved state.

use std::path::Path;

use chrono::Utc;
use friendwatch_core::{
    notify, run_once, Config, NxapiSource, Result, SendTest, SnapshotStore, StorageConfig,
};

pub fn run(storage: &StorageConfig, config_path: &Path) -> Result<()> {
    let now = Utc::now();
    let config = Config::load(config_path)?;

    // A configured sendtest replaces the run entirely.
    if config.send_test != SendTest::Off {
        tracing::info!(
            sendtest = ?config.send_test,
            "sendtest is set in the configuration, sending test notifications instead of checking friends"
        );
        crate::test_send::send(&config, config.send_test)?;
        tracing::info!("Set sendtest back to off to resume normal runs");
        return Ok(());
    }

    let notifier = notify::from_config(&config.transport)?;
    if notifier.is_none() {
        tracing::warn!("No notification transport enabled, changes will only be logged");
    }

    let source = NxapiSource::new(config.windows_mode);
    let store = SnapshotStore::new(storage);

    run_once(&config, &source, &store, notifier.as_deref(), now)?;
    Ok(())
}
