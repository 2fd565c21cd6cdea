//! Email delivery through the local `sendmail` binary.

use std::io::Write;
use std::process::{Command, Stdio};

use chrono::Local;

use super::{delivery_error, Notifier};
use crate::config::EmailSettings;
use crate::error::Result;
use crate::types::{NotificationMessage, Priority};

const TRANSPORT: &str = "email";

pub struct EmailNotifier {
    settings: EmailSettings,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    /// Renders the RFC 5322 message handed to `sendmail -t`.
    fn render(&self, message: &NotificationMessage) -> String {
        let x_priority = match message.priority {
            Priority::Urgent => "1 (Highest)",
            Priority::Default => "3 (Normal)",
            Priority::Min => "5 (Lowest)",
        };

        let mut body = message.body.clone();
        if !message.tags.is_empty() {
            body.push_str(&format!("\n\nTags: {}", message.tags.join(", ")));
        }
        if let Some(icon) = &message.icon {
            body.push_str(&format!("\nProfile picture: {icon}"));
        }
        if let Some(image) = &message.image {
            body.push_str(&format!("\nGame artwork: {image}"));
        }

        format!(
            "From: {from}\r\nTo: {to}\r\nSubject: {subject}\r\nDate: {date}\r\nX-Priority: {x_priority}\r\nMIME-Version: 1.0\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Transfer-Encoding: 8bit\r\n\r\n{body}\r\n",
            from = self.settings.from,
            to = self.settings.to,
            subject = message.title,
            date = Local::now().to_rfc2822(),
        )
    }
}

impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        TRANSPORT
    }

    fn send(&self, message: &NotificationMessage) -> Result<()> {
        let sendmail = &self.settings.sendmail;
        let mut child = Command::new(sendmail)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| delivery_error(TRANSPORT, format!("{}: {e}", sendmail.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(self.render(message).as_bytes()) {
                drop(stdin);
                // Reap the child so a failed write never leaves a zombie behind.
                let _ = child.kill();
                let status = child
                    .wait()
                    .map(|status| status.to_string())
                    .unwrap_or_else(|wait_err| wait_err.to_string());
                return Err(delivery_error(
                    TRANSPORT,
                    format!("writing to sendmail: {e} (sendmail: {status})"),
                ));
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| delivery_error(TRANSPORT, e))?;
        if !output.status.success() {
            return Err(delivery_error(
                TRANSPORT,
                format!(
                    "sendmail exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        tracing::info!(title = %message.title, to = %self.settings.to, "Email notification sent");
        Ok(())
    }
}
