//! Configuration for the touch tracker.
//!
//! [`TrackerConfig`] is constructed once, validated, and passed into the
//! tracker; there is no ambient or global settings lookup. It supports
//! serde deserialization so it can be embedded in a host application's
//! TOML config:
//!
//! ```toml
//! [tracker]
//! cookie_name = "campaigns"
//! ttl_ms = 2592000000
//! transport = "base64"
//! ```

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::constants::{DEFAULT_COOKIE_NAME, DEFAULT_TTL_MS};
use crate::error::{Error, Result};
use crate::wire::Transport;

/// Tracker configuration. Immutable after construction.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Name of the cookie holding the touch store.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Attribution window in milliseconds. Touches older than this are
    /// dropped on read and the cookie's `Max-Age` is derived from it.
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: i64,
    /// Transport wrapping for the encoded cookie value.
    #[serde(default)]
    pub transport: Transport,
}

fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

const fn default_ttl_ms() -> i64 {
    DEFAULT_TTL_MS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_ms: DEFAULT_TTL_MS,
            transport: Transport::default(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a TOML file with a top-level `[tracker]`
    /// table.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid
    /// TOML, or fails validation.
    pub fn load_from<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let config = file.tracker.unwrap_or_default();
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Validate the configuration, collecting all problems into one
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - The cookie name is empty or not a valid cookie token
    /// - The ttl is zero or negative
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.cookie_name.is_empty() {
            errors.push("cookie_name cannot be empty".to_string());
        } else if !self.cookie_name.chars().all(is_cookie_token_char) {
            errors.push(format!(
                "cookie_name '{}' contains characters not allowed in a cookie name",
                self.cookie_name
            ));
        }

        if self.ttl_ms <= 0 {
            errors.push(format!(
                "ttl_ms must be positive (got: {}); default is 30 days = 2592000000",
                self.ttl_ms
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::config(errors.join("; ")))
        }
    }

    /// The ttl expressed in whole seconds, as used for the cookie
    /// `Max-Age` attribute.
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_ms / 1000
    }
}

/// Top-level file shape: the tracker table is optional so an empty file
/// yields the defaults.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    tracker: Option<TrackerConfig>,
}

/// RFC 6265 cookie-name token characters.
fn is_cookie_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~')
}
