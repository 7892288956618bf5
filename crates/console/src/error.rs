use thiserror::Error;

/// Result type for console operations.
pub type ConsoleResult<T> = Result<T, ConsoleError>;

/// Errors returned by the console runtime.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),
    #[error("invalid usage: {0}")]
    Usage(#[from] UsageError),
    #[error("collaborator failure: {0}")]
    Collaborator(#[from] CollaboratorError),
    #[error("console io failure: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("console channel closed")]
    Closed,
}

impl ConsoleError {
    pub fn config<E: ToString>(err: E) -> Self {
        ConsoleError::Config(err.to_string())
    }
}

/// Raised while building the command table. Fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("command identifier '{0}' contains more than one separator")]
    AmbiguousIdentifier(String),
    #[error("command identifier '{0}' has an empty command or subcommand part")]
    EmptyIdentifier(String),
    #[error("command '{0}' is registered twice")]
    Duplicate(String),
    #[error("command '{identifier}': required parameter '{parameter}' follows an optional one")]
    RequiredAfterOptional {
        identifier: String,
        parameter: String,
    },
}

/// Operator input that could not be turned into a handler call.
///
/// Reported on the console and never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("not a command, commands start with '{prefix}'")]
    NotACommand { prefix: char },
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("command '{0}' requires a subcommand")]
    MissingSubcommand(String),
    #[error("unknown subcommand '{subcommand}' for '{command}'")]
    UnknownSubcommand { command: String, subcommand: String },
    #[error("'{command}' expects {expected_min}..={expected_max} arguments, got {given}")]
    Arity {
        command: String,
        expected_min: usize,
        expected_max: usize,
        given: usize,
    },
    #[error("cannot parse input: {0}")]
    Tokenize(String),
}

/// Failures reported by, or about, the external messaging stack.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
    #[error("not connected")]
    NotConnected,
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
}

impl CollaboratorError {
    pub fn connect<E: ToString>(err: E) -> Self {
        CollaboratorError::Connect(err.to_string())
    }

    pub fn send<E: ToString>(err: E) -> Self {
        CollaboratorError::Send(err.to_string())
    }
}
