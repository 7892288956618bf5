//! Chatline console library
//!
//! An interactive command console for driving a long-lived messaging session.
//! Commands are registered explicitly under `command_subcommand` identifiers,
//! operator lines are parsed and dispatched one at a time from a dedicated
//! input thread, and events from the messaging stack are handled by a single
//! console actor that owns the session.

pub mod actor;
pub mod config;
pub mod console;
pub mod console_service;
pub mod error;
pub mod session;

pub use actor::{ActorExit, ActorHandle, ConsoleActor, ConsoleMessage};
pub use config::{ConsoleConfig, ConsoleSettings, DisconnectAction, SessionSettings};
pub use console::{Console, RunningConsole};
pub use console_service::{
    BlockingGate, BufferWriter, CommandDispatcher, CommandOutcome, CommandRegistry, ConsoleMode,
    ConsoleOutput, DispatchResult, ScriptedSource,
};
pub use error::{CollaboratorError, ConsoleError, ConsoleResult, RegistrationError, UsageError};
pub use session::{Collaborator, EventSink, ProtocolEntity, ProtocolEvent, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
