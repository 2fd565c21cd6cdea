//! Notification transports.
//!
//! Delivery is best effort: implementations return [`Error::Delivery`] and the
//! orchestrator logs it and moves on to the next message.

mod email;
mod ntfy;

pub use email::EmailNotifier;
pub use ntfy::NtfyNotifier;

use crate::config::TransportConfig;
use crate::error::{Error, Result};
use crate::types::NotificationMessage;

/// Something that can deliver a rendered notification.
pub trait Notifier {
    /// Short transport name for logs and errors (e.g. "ntfy").
    fn name(&self) -> &'static str;

    fn send(&self, message: &NotificationMessage) -> Result<()>;
}

/// Builds the notifier selected by configuration. `None` when delivery is disabled.
pub fn from_config(transport: &TransportConfig) -> Result<Option<Box<dyn Notifier>>> {
    Ok(match transport {
        TransportConfig::Disabled => None,
        TransportConfig::Ntfy(settings) => Some(Box::new(NtfyNotifier::new(settings.clone())?)),
        TransportConfig::Email(settings) => Some(Box::new(EmailNotifier::new(settings.clone()))),
    })
}

pub(crate) fn delivery_error(transport: &'static str, details: impl ToString) -> Error {
    Error::Delivery {
        transport,
        details: details.to_string(),
    }
}
