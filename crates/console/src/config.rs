//! Console configuration.
//!
//! Profiles are TOML files. Every field has a default, so an empty file (or no
//! file at all) yields a working interactive console.

use crate::console_service::{ConsoleMode, DEFAULT_PREFIX};
use crate::error::{ConsoleError, ConsoleResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What to do when the messaging stack reports a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisconnectAction {
    /// Mark offline and reconnect after `reconnect_delay_ms`.
    #[default]
    Prompt,
    /// Terminate the process immediately.
    Exit,
}

/// Top-level profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub console: ConsoleSettings,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    pub mode: ConsoleMode,
    /// Character every command line starts with.
    pub prefix: char,
    /// Line editor history file.
    pub history_file: Option<PathBuf>,
    /// Issue a login as the very first command.
    pub auto_connect: bool,
    /// Commands queued before the operator gets control.
    pub startup: Vec<String>,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            mode: ConsoleMode::Interactive,
            prefix: DEFAULT_PREFIX,
            history_file: None,
            auto_connect: false,
            startup: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Account phone number, used for status output.
    pub username: Option<String>,
    pub disconnect_action: DisconnectAction,
    pub reconnect_delay_ms: u64,
    /// Acknowledge inbound messages.
    pub send_receipts: bool,
    /// Mark acknowledged messages as read.
    pub send_read: bool,
    /// Announce availability after every login.
    pub announce_available: bool,
    /// Contacts subscribed to after every login.
    pub watch: Vec<String>,
    /// Contact that receives presence changes and the login notice.
    pub report_to: Option<String>,
    /// Message sent to `report_to` after every login.
    pub login_notice: Option<String>,
    /// Commands run through the dispatcher after every login.
    pub on_login: Vec<String>,
    pub aliases: BTreeMap<String, String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            username: None,
            disconnect_action: DisconnectAction::Prompt,
            reconnect_delay_ms: 1000,
            send_receipts: true,
            send_read: true,
            announce_available: true,
            watch: Vec::new(),
            report_to: None,
            login_notice: None,
            on_login: Vec::new(),
            aliases: BTreeMap::new(),
        }
    }
}

impl SessionSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

impl ConsoleConfig {
    /// Loads a profile from disk. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConsoleResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConsoleResult<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConsoleError::config)?;
        config.resolve_paths();
        config.validate()?;
        Ok(config)
    }

    /// Expands `~` in file paths. Run again after overriding a path.
    pub fn resolve_paths(&mut self) {
        if let Some(history) = self.console.history_file.take() {
            self.console.history_file = Some(expand_home(&history));
        }
    }

    pub fn save(&self, path: &Path) -> ConsoleResult<()> {
        let content = toml::to_string_pretty(self).map_err(ConsoleError::config)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConsoleResult<()> {
        let prefix = self.console.prefix;
        if prefix.is_alphanumeric() || prefix.is_whitespace() || prefix == '"' || prefix == '\'' {
            return Err(ConsoleError::config(format!(
                "command prefix '{prefix}' must be a punctuation character"
            )));
        }
        if self.session.watch.iter().any(|contact| contact.trim().is_empty()) {
            return Err(ConsoleError::config("watch list contains an empty contact"));
        }
        if matches!(&self.session.report_to, Some(contact) if contact.trim().is_empty()) {
            return Err(ConsoleError::config("report_to cannot be empty"));
        }
        Ok(())
    }
}

/// Replaces a leading `~` component with the home directory. Paths without
/// one, or with no known home, come back unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
