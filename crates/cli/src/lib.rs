//! Chatline CLI Library
//!
//! Process bootstrap for the chatline console: argument parsing, profile
//! loading and the built-in loopback messaging stack.

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod args;
pub mod config;
pub mod loopback;

pub use args::{CliArgs, LogLevel};
pub use loopback::LoopbackStack;

/// Display version information
pub fn display_version() {
    println!("{}", get_version_info());
}

/// Get version information as a string (for testing)
pub fn get_version_info() -> String {
    format!(
        "chatline {}\nconsole library {}",
        VERSION,
        chatline_console::VERSION
    )
}
