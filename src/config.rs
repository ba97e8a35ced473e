//! Configuration types.
//!
//! Everything is read from the environment once at startup and then handed to
//! the pipeline as plain data.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::channels::email::EmailConfig;
use crate::error::ConfigError;

/// Default sign-off used at the bottom of every reply.
pub const DEFAULT_SIGNATURE: &str = "The Restaurant Team";

/// Default directory for held (feedback) replies.
pub const DEFAULT_DRAFTS_DIR: &str = "./drafts";

/// Keyword vocabularies used by the classifier.
///
/// Reservation keywords are checked before feedback keywords; matching is a
/// case-insensitive substring test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSets {
    pub reservation: Vec<String>,
    pub feedback: Vec<String>,
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self {
            reservation: to_owned_list(&[
                "reservation",
                "reserve",
                "booking",
                "book a table",
                "book for",
                "table for",
                "party of",
            ]),
            feedback: to_owned_list(&[
                "feedback",
                "review",
                "complaint",
                "comment",
                "suggestion",
                "experience",
            ]),
        }
    }
}

impl KeywordSets {
    /// Load keyword sets from a JSON file of the form
    /// `{"reservation": [...], "feedback": [...]}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw).map_err(|reason| ConfigError::KeywordFile {
            path: path.display().to_string(),
            reason,
        })
    }

    /// Parse keyword sets from a JSON string.
    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Reply composition settings.
#[derive(Debug, Clone)]
pub struct ReplyConfig {
    /// Sign-off line placed after "Best regards,".
    pub signature: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            signature: DEFAULT_SIGNATURE.to_string(),
        }
    }
}

/// Full runtime configuration for the replier binary.
#[derive(Debug, Clone)]
pub struct ReplierConfig {
    pub email: EmailConfig,
    pub keywords: KeywordSets,
    pub reply: ReplyConfig,
    pub drafts_dir: PathBuf,
    /// `None` runs a single pass over the inbox and exits.
    pub poll_interval: Option<Duration>,
}

impl ReplierConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = EmailConfig::from_lookup(&lookup)?;

        let keywords = match lookup("REPLIER_KEYWORDS_FILE") {
            Some(path) => KeywordSets::from_json_file(Path::new(&path))?,
            None => KeywordSets::default(),
        };

        let reply = ReplyConfig {
            signature: lookup("REPLIER_SIGNATURE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SIGNATURE.to_string()),
        };

        let drafts_dir = lookup("REPLIER_DRAFTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DRAFTS_DIR));

        let poll_interval = match lookup("REPLIER_POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = parse_value("REPLIER_POLL_INTERVAL_SECS", &raw)?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "REPLIER_POLL_INTERVAL_SECS".into(),
                        message: "must be greater than zero".into(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            email,
            keywords,
            reply,
            drafts_dir,
            poll_interval,
        })
    }
}

/// Parse a typed value, mapping failures onto `ConfigError::InvalidValue`.
pub(crate) fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw:?}: {e}"),
    })
}

/// Mask a secret for log output, keeping only its first and last two chars.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 4 {
        return format!("… (len={})", chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}…{tail} (len={})", chars.len())
}
