//! Presence source: the external `nxapi` CLI.
//!
//! `nxapi nso friends --json` prints the Nintendo Switch Online friend list.
//! Only the fields needed for change detection and message text are read:
//!
//! ```json
//! [{
//!   "id": 1234, "nsaId": "0123456789abcdef", "name": "Alice",
//!   "imageUri": "https://...",
//!   "presence": {
//!     "state": "ONLINE", "updatedAt": 1741381500, "platform": 2,
//!     "game": { "name": "Zelda", "imageUri": "https://..." }
//!   }
//! }]
//! ```
//!
//! Any failure here is fatal for the run; nothing may be committed.

use std::io::ErrorKind;
use std::process::Command;

use chrono::DateTime;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{FriendPresence, Platform, Snapshot};

const ONLINE_STATE: &str = "ONLINE";
const INSTALL_HINT: &str = "nxapi is not installed. Run \"npm install -g nxapi\" to install it.";

/// Anything that can produce the current friend presence list.
pub trait PresenceSource {
    /// Human-readable description for logs (e.g. the command line).
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<Snapshot>;
}

/// Runs `nxapi nso friends --json`, optionally through PowerShell.
#[derive(Debug, Clone)]
pub struct NxapiSource {
    program: String,
    args: Vec<String>,
}

impl NxapiSource {
    pub fn new(windows_mode: bool) -> Self {
        let mut args = vec!["nso".to_string(), "friends".to_string(), "--json".to_string()];
        let program = if windows_mode {
            args.insert(0, "nxapi".to_string());
            "powershell.exe".to_string()
        } else {
            "nxapi".to_string()
        };
        NxapiSource { program, args }
    }

    /// Uses an arbitrary command instead of nxapi. Output must be nxapi's JSON.
    pub fn with_command(program: impl Into<String>, args: Vec<String>) -> Self {
        NxapiSource {
            program: program.into(),
            args,
        }
    }
}

impl PresenceSource for NxapiSource {
    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn fetch(&self) -> Result<Snapshot> {
        let command = self.describe();
        tracing::debug!(command = %command, "Fetching friend presence");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    Error::SourceUnavailable {
                        command: command.clone(),
                        hint: INSTALL_HINT.to_string(),
                    }
                } else {
                    Error::SourceFailed {
                        command: command.clone(),
                        details: e.to_string(),
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::SourceFailed {
                command,
                details: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        parse_friends(&String::from_utf8_lossy(&output.stdout))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFriend {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    nsa_id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image_uri: Option<String>,
    presence: RawPresence,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPresence {
    #[serde(default)]
    state: String,
    updated_at: i64,
    #[serde(default)]
    platform: Option<i64>,
    #[serde(default)]
    game: Option<RawGame>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGame {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image_uri: Option<String>,
}

/// Parses nxapi's friend list JSON into a snapshot, keeping source order.
pub fn parse_friends(json: &str) -> Result<Snapshot> {
    if json.trim().is_empty() {
        return Err(Error::SourceEmpty);
    }

    let raw: Vec<RawFriend> = serde_json::from_str(json).map_err(|e| Error::SourceParse {
        details: e.to_string(),
    })?;
    if raw.is_empty() {
        return Err(Error::SourceEmpty);
    }

    Ok(raw.into_iter().filter_map(to_presence).collect())
}

fn to_presence(raw: RawFriend) -> Option<FriendPresence> {
    let Some(id) = raw.nsa_id.filter(|s| !s.is_empty()).or_else(|| raw.id.and_then(scalar_id)) else {
        tracing::warn!(friend = %raw.name, "Skipping friend without an id");
        return None;
    };

    let Some(updated_at) = DateTime::from_timestamp(raw.presence.updated_at, 0) else {
        tracing::warn!(friend = %raw.name, updated_at = raw.presence.updated_at, "Skipping friend with invalid updatedAt");
        return None;
    };

    let is_online = raw.presence.state == ONLINE_STATE;
    let game = if is_online {
        raw.presence.game.unwrap_or_default()
    } else {
        RawGame::default()
    };

    Some(FriendPresence {
        id,
        display_name: raw.name,
        is_online,
        game_name: game.name.filter(|n| !n.is_empty()),
        game_icon_url: game.image_uri.filter(|u| !u.is_empty()),
        user_icon_url: raw.image_uri.filter(|u| !u.is_empty()),
        platform: Platform::from_code(raw.presence.platform.unwrap_or(0)),
        updated_at,
    })
}

fn scalar_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
