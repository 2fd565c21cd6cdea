//! ntfy push delivery: one HTTP POST per message to `{server}/{topic}`.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};

use super::{delivery_error, Notifier};
use crate::config::NtfySettings;
use crate::error::Result;
use crate::types::NotificationMessage;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const TRANSPORT: &str = "ntfy";

pub struct NtfyNotifier {
    client: Client,
    settings: NtfySettings,
}

impl NtfyNotifier {
    pub fn new(settings: NtfySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("friendwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| delivery_error(TRANSPORT, format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, settings })
    }

    fn request(&self, message: &NotificationMessage) -> RequestBuilder {
        let mut request = self
            .client
            .post(self.settings.endpoint())
            .header("Title", &message.title)
            .header("Priority", message.priority.ntfy_level().to_string())
            .body(message.body.clone());

        if !message.tags.is_empty() {
            request = request.header("Tags", message.tags.join(","));
        }
        if let Some(icon) = &message.icon {
            request = request.header("Icon", icon);
        }
        if let Some(image) = &message.image {
            request = request.header("Attach", image);
        }
        if let Some(token) = &self.settings.token {
            request = request.bearer_auth(token);
        }
        request
    }
}

impl Notifier for NtfyNotifier {
    fn name(&self) -> &'static str {
        TRANSPORT
    }

    fn send(&self, message: &NotificationMessage) -> Result<()> {
        let response = self
            .request(message)
            .send()
            .map_err(|e| delivery_error(TRANSPORT, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(delivery_error(
                TRANSPORT,
                format!("{status}: {}", body.trim()),
            ));
        }

        tracing::info!(title = %message.title, "ntfy notification sent");
        Ok(())
    }
}
