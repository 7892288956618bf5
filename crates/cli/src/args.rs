use chatline_console::{ConsoleConfig, ConsoleMode, DisconnectAction};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for the chatline console
#[derive(Parser, Debug, Clone)]
#[command(
    name = "chatline",
    about = "Interactive console for a messaging session",
    long_about = "chatline runs an operator console on top of a messaging session. Commands start with a prefix character (default '/'); type /help once the console is up. Profile values are read from a TOML file and can be overridden from the command line.",
    disable_version_flag = true
)]
pub struct CliArgs {
    /// Profile file (TOML)
    #[arg(short = 'c', long = "config", value_name = "FILE", env = "CHATLINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Account phone number
    #[arg(short = 'u', long = "username", value_name = "NUMBER")]
    pub username: Option<String>,

    /// Log in as soon as the console starts
    #[arg(short = 'l', long = "connect")]
    pub connect: bool,

    /// Auto-responder mode: no operator output
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Exit instead of reconnecting when the session drops
    #[arg(long = "exit-on-disconnect")]
    pub exit_on_disconnect: bool,

    /// Do not acknowledge inbound messages
    #[arg(long = "no-receipts")]
    pub no_receipts: bool,

    /// Command to run before interactive control (repeatable)
    #[arg(long = "cmd", value_name = "LINE")]
    pub commands: Vec<String>,

    /// Line editor history file
    #[arg(long = "history", value_name = "FILE")]
    pub history: Option<PathBuf>,

    /// The verbose log level
    #[arg(long = "verbose", value_enum, default_value = "info")]
    pub verbose: LogLevel,

    /// Show version information and exit
    #[arg(short = 'V', long = "version")]
    pub show_version: bool,
}

/// Log level enumeration
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `EnvFilter`.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl CliArgs {
    /// Command-line values win over the profile.
    pub fn apply_to(&self, config: &mut ConsoleConfig) {
        if let Some(username) = &self.username {
            config.session.username = Some(username.clone());
        }
        if self.connect {
            config.console.auto_connect = true;
        }
        if self.quiet {
            config.console.mode = ConsoleMode::Quiet;
        }
        if self.exit_on_disconnect {
            config.session.disconnect_action = DisconnectAction::Exit;
        }
        if self.no_receipts {
            config.session.send_receipts = false;
        }
        if let Some(history) = &self.history {
            config.console.history_file = Some(history.clone());
        }
        config.console.startup.extend(self.commands.iter().cloned());
    }
}
