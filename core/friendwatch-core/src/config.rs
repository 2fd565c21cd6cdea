//! YAML configuration loading and validation.
//!
//! The configuration is read once at startup and turned into an immutable
//! [`Config`] that is passed by reference to everything that needs it.
//!
//! ```yaml
//! watched:
//!   - 0123456789abcdef      # friend id (nsaId)
//!   - SomeFriend            # or display name
//! watchedonly: false
//! aliases:
//!   0123456789abcdef: Best Friend
//! windowsmode: false
//! sendtest: off             # off | watched | unwatched | both
//! ntfy:
//!   enabled: true
//!   server: https://ntfy.sh
//!   topic: my-friends
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs_err as fs;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::WatchConfig;

const DEFAULT_SENDMAIL: &str = "/usr/sbin/sendmail";

/// Diagnostic switch for sending synthetic notifications instead of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SendTest {
    #[default]
    Off,
    Watched,
    Unwatched,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtfySettings {
    pub server: String,
    pub topic: String,
    pub token: Option<String>,
}

impl NtfySettings {
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.server.trim_end_matches('/'), self.topic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub from: String,
    pub to: String,
    pub sendmail: PathBuf,
}

/// The delivery transport selected by configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransportConfig {
    /// Decisions are logged but nothing is delivered.
    #[default]
    Disabled,
    Ntfy(NtfySettings),
    Email(EmailSettings),
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub watch: WatchConfig,
    /// Run the presence tool through `powershell.exe`.
    pub windows_mode: bool,
    pub send_test: SendTest,
    pub transport: TransportConfig,
}

// ─────────────────────────────────────────────────────────────────────────────
// On-disk shape
// ─────────────────────────────────────────────────────────────────────────────

/// Ids in YAML are frequently written unquoted, so numbers are accepted too.
#[derive(Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(i64),
}

impl From<Scalar> for String {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    watched: Option<Vec<Scalar>>,
    #[serde(alias = "watched_only")]
    watchedonly: bool,
    aliases: Option<BTreeMap<Scalar, String>>,
    #[serde(alias = "windows_mode")]
    windowsmode: bool,
    #[serde(alias = "send_test")]
    sendtest: Option<SendTest>,
    ntfy: Option<RawNtfy>,
    email: Option<RawEmail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawNtfy {
    enabled: bool,
    server: String,
    topic: String,
    token: Option<String>,
    sendtest: Option<SendTest>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEmail {
    enabled: bool,
    from: String,
    to: String,
    sendmail: Option<PathBuf>,
}

impl Config {
    /// Reads and validates the configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(Error::io("Failed to read configuration", e)),
        };
        Self::from_yaml(&content, path)
    }

    /// Parses configuration text. `path` is only used for error messages.
    pub fn from_yaml(content: &str, path: &Path) -> Result<Self> {
        let raw: RawConfig = if content.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| Error::ConfigMalformed {
                path: path.to_path_buf(),
                details: e.to_string(),
            })?
        };
        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config> {
        let watched: BTreeSet<String> = self
            .watched
            .unwrap_or_default()
            .into_iter()
            .map(String::from)
            .filter(|entry| !entry.is_empty())
            .collect();

        let aliases: BTreeMap<String, String> = self
            .aliases
            .unwrap_or_default()
            .into_iter()
            .map(|(id, name)| (String::from(id), name))
            .collect();

        let ntfy_sendtest = self.ntfy.as_ref().and_then(|n| n.sendtest);
        let send_test = self.sendtest.or(ntfy_sendtest).unwrap_or_default();

        let ntfy = self.ntfy.filter(|n| n.enabled);
        let email = self.email.filter(|e| e.enabled);

        let transport = match (ntfy, email) {
            (Some(_), Some(_)) => {
                return Err(Error::ConfigInvalid(
                    "only one of ntfy and email can be enabled".to_string(),
                ))
            }
            (Some(ntfy), None) => TransportConfig::Ntfy(ntfy.validate()?),
            (None, Some(email)) => TransportConfig::Email(email.validate()?),
            (None, None) => TransportConfig::Disabled,
        };

        Ok(Config {
            watch: WatchConfig {
                watched,
                watched_only: self.watchedonly,
                aliases,
            },
            windows_mode: self.windowsmode,
            send_test,
            transport,
        })
    }
}

impl RawNtfy {
    fn validate(self) -> Result<NtfySettings> {
        let server = self.server.trim().to_string();
        if server.is_empty() {
            return Err(Error::ConfigInvalid("ntfy.server is required".to_string()));
        }
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(Error::ConfigInvalid(format!(
                "ntfy.server must be an http(s) URL, got {server}"
            )));
        }
        let topic = self.topic.trim().trim_matches('/').to_string();
        if topic.is_empty() {
            return Err(Error::ConfigInvalid("ntfy.topic is required".to_string()));
        }
        Ok(NtfySettings {
            server,
            topic,
            token: self.token.filter(|t| !t.trim().is_empty()),
        })
    }
}

impl RawEmail {
    fn validate(self) -> Result<EmailSettings> {
        if self.from.trim().is_empty() {
            return Err(Error::ConfigInvalid("email.from is required".to_string()));
        }
        if self.to.trim().is_empty() {
            return Err(Error::ConfigInvalid("email.to is required".to_string()));
        }
        Ok(EmailSettings {
            from: self.from.trim().to_string(),
            to: self.to.trim().to_string(),
            sendmail: self
                .sendmail
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SENDMAIL)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(yaml: &str) -> Result<Config> {
        Config::from_yaml(yaml, Path::new("config.yaml"))
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert!(config.watch.watched.is_empty());
        assert!(!config.watch.watched_only);
        assert!(!config.windows_mode);
        assert_eq!(config.send_test, SendTest::Off);
        assert_eq!(config.transport, TransportConfig::Disabled);
    }

    #[test]
    fn test_full_ntfy_config() {
        let config = parse(
            r#"
watched:
  - abc123
  - Some Friend
  - 42
watchedonly: true
aliases:
  abc123: Bestie
  42: The Answer
windowsmode: true
sendtest: watched
ntfy:
  enabled: true
  server: https://ntfy.sh/
  topic: friends
"#,
        )
        .unwrap();

        assert!(config.watch.watched.contains("abc123"));
        assert!(config.watch.watched.contains("Some Friend"));
        assert!(config.watch.watched.contains("42"));
        assert!(config.watch.watched_only);
        assert_eq!(config.watch.aliases.get("abc123").unwrap(), "Bestie");
        assert_eq!(config.watch.aliases.get("42").unwrap(), "The Answer");
        assert!(config.windows_mode);
        assert_eq!(config.send_test, SendTest::Watched);
        match config.transport {
            TransportConfig::Ntfy(ntfy) => {
                assert_eq!(ntfy.endpoint(), "https://ntfy.sh/friends");
                assert!(ntfy.token.is_none());
            }
            other => panic!("expected ntfy transport, got {other:?}"),
        }
    }

    #[test]
    fn test_null_watched_list_is_empty() {
        let config = parse("watched:\naliases:\n").unwrap();
        assert!(config.watch.watched.is_empty());
        assert!(config.watch.aliases.is_empty());
    }

    #[test]
    fn test_snake_case_aliases_are_accepted() {
        let config = parse("watched_only: true\nsend_test: both\n").unwrap();
        assert!(config.watch.watched_only);
        assert_eq!(config.send_test, SendTest::Both);
    }

    #[test]
    fn test_sendtest_under_ntfy_is_honoured() {
        let config = parse(
            "ntfy:\n  enabled: true\n  server: https://ntfy.sh\n  topic: t\n  sendtest: unwatched\n",
        )
        .unwrap();
        assert_eq!(config.send_test, SendTest::Unwatched);
    }

    #[test]
    fn test_disabled_ntfy_is_not_validated() {
        let config = parse("ntfy:\n  enabled: false\n").unwrap();
        assert_eq!(config.transport, TransportConfig::Disabled);
    }

    #[test]
    fn test_enabled_ntfy_requires_topic() {
        let err = parse("ntfy:\n  enabled: true\n  server: https://ntfy.sh\n").unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_enabled_ntfy_requires_http_server() {
        let err = parse("ntfy:\n  enabled: true\n  server: ntfy.sh\n  topic: t\n").unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_email_transport() {
        let config = parse(
            "email:\n  enabled: true\n  from: bot@example.com\n  to: me@example.com\n",
        )
        .unwrap();
        match config.transport {
            TransportConfig::Email(email) => {
                assert_eq!(email.to, "me@example.com");
                assert_eq!(email.sendmail, PathBuf::from(DEFAULT_SENDMAIL));
            }
            other => panic!("expected email transport, got {other:?}"),
        }
    }

    #[test]
    fn test_two_enabled_transports_is_an_error() {
        let err = parse(
            "ntfy:\n  enabled: true\n  server: https://ntfy.sh\n  topic: t\nemail:\n  enabled: true\n  from: a@b\n  to: c@d\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::ConfigInvalid(_)));
    }

    #[test]
    fn test_malformed_yaml_is_reported() {
        let err = parse("watched: [unterminated").unwrap_err();
        assert!(matches!(err, Error::ConfigMalformed { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempdir().unwrap();
        let err = Config::load(&temp.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigNotFound(_)));
    }

    #[test]
    fn test_load_from_disk() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "watched: [abc]\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.watch.watched.contains("abc"));
    }
}
