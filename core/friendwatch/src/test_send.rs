//! Test notifications for checking transport configuration.
//!
//! Never touches the presence source or the saved state.

use std::path::Path;

use friendwatch_core::{notify, send_test, Config, Error, Result, SendTest};

pub fn run(config_path: &Path, kind: SendTest) -> Result<()> {
    let config = Config::load(config_path)?;
    send(&config, kind)
}

pub fn send(config: &Config, kind: SendTest) -> Result<()> {
    let notifier = notify::from_config(&config.transport)?.ok_or_else(|| {
        Error::ConfigInvalid("test notifications need ntfy or email to be enabled".to_string())
    })?;

    let sent = send_test(kind, &*notifier, &mut rand::thread_rng())?;
    tracing::info!(sent, transport = notifier.name(), "Test notifications sent");
    Ok(())
}
