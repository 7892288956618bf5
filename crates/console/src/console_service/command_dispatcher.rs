use super::command_registry::CommandTable;
use super::console_command::{CommandDescriptor, CommandOutcome};
use super::line_parser::{LineParser, ParsedInput, ParsedLine};
use crate::error::UsageError;
use anyhow::anyhow;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// Result of feeding one line to the dispatcher.
#[derive(Debug)]
pub enum DispatchResult {
    /// Blank input; nothing ran.
    Ignored,
    /// The line could not be resolved to a handler call.
    Rejected(UsageError),
    /// The handler ran and returned an outcome.
    Completed(CommandOutcome),
    /// The handler returned an error or panicked.
    Failed(anyhow::Error),
}

impl DispatchResult {
    /// What the input loop should do next. Only a completed blocking command
    /// suspends input.
    pub fn outcome(&self) -> CommandOutcome {
        match self {
            DispatchResult::Completed(outcome) => *outcome,
            _ => CommandOutcome::Continue,
        }
    }
}

/// Resolves lines against a [`CommandTable`] and invokes handlers.
pub struct CommandDispatcher<T> {
    table: Arc<CommandTable<T>>,
    parser: LineParser,
}

impl<T> Clone for CommandDispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
            parser: self.parser,
        }
    }
}

impl<T> CommandDispatcher<T> {
    pub fn new(table: CommandTable<T>, parser: LineParser) -> Self {
        Self {
            table: Arc::new(table),
            parser,
        }
    }

    pub fn table(&self) -> &CommandTable<T> {
        &self.table
    }

    pub fn prefix(&self) -> char {
        self.parser.prefix()
    }

    /// Finds the descriptor for `input` and checks the argument count.
    pub fn resolve(&self, input: &ParsedInput) -> Result<&CommandDescriptor<T>, UsageError> {
        let descriptor = self
            .table
            .lookup(&input.command, input.subcommand.as_deref())
            .ok_or_else(|| match &input.subcommand {
                Some(sub) => UsageError::UnknownSubcommand {
                    command: input.command.clone(),
                    subcommand: sub.clone(),
                },
                None => UsageError::UnknownCommand(input.command.clone()),
            })?;

        let given = input.arguments.len();
        let expected_min = descriptor.required_count();
        let expected_max = descriptor.parameters.len();
        if given < expected_min || given > expected_max {
            return Err(UsageError::Arity {
                command: descriptor.usage(self.prefix()),
                expected_min,
                expected_max,
                given,
            });
        }
        Ok(descriptor)
    }

    /// The one line shown to the operator for a rejected input.
    pub fn usage_line(&self, err: &UsageError) -> String {
        match err {
            UsageError::MissingSubcommand(command)
            | UsageError::UnknownSubcommand { command, .. } => {
                let subcommands = self
                    .table
                    .get(command)
                    .map(|subs| subs.keys().flatten().cloned().collect::<Vec<_>>().join("|"))
                    .unwrap_or_default();
                format!("{}{command} <{subcommands}>", self.prefix())
            }
            UsageError::Arity { command, .. } => command.clone(),
            other => format!("{other}, see {}help", self.prefix()),
        }
    }

    /// Parses, validates and runs one line.
    pub fn execute(&self, target: &mut T, line: &str) -> DispatchResult {
        let input = match self.parser.parse(line, &self.table) {
            Ok(ParsedLine::Empty) => return DispatchResult::Ignored,
            Ok(ParsedLine::Command(input)) => input,
            Err(err) => return DispatchResult::Rejected(err),
        };
        self.execute_parsed(target, input)
    }

    pub fn execute_parsed(&self, target: &mut T, input: ParsedInput) -> DispatchResult {
        let descriptor = match self.resolve(&input) {
            Ok(descriptor) => descriptor,
            Err(err) => return DispatchResult::Rejected(err),
        };
        let arguments = bind_arguments(descriptor, input.arguments);
        let handler = Arc::clone(&descriptor.handler);

        debug!(
            target: "chatline::console",
            command = %input.command,
            subcommand = input.subcommand.as_deref().unwrap_or("none"),
            "dispatching command"
        );

        match panic::catch_unwind(AssertUnwindSafe(|| handler(target, arguments))) {
            Ok(Ok(outcome)) => DispatchResult::Completed(outcome),
            Ok(Err(err)) => DispatchResult::Failed(err),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                error!(
                    target: "chatline::console",
                    command = %input.command,
                    reason = %reason,
                    "command handler panicked"
                );
                DispatchResult::Failed(anyhow!("command '{}' panicked: {}", input.command, reason))
            }
        }
    }
}

/// Positional binding: supplied arguments first, then declared defaults for
/// the trailing parameters that were left out.
fn bind_arguments<T>(descriptor: &CommandDescriptor<T>, mut arguments: Vec<String>) -> Vec<String> {
    let supplied = arguments.len();
    arguments.extend(
        descriptor
            .parameters
            .iter()
            .skip(supplied)
            .filter_map(|param| param.default.clone()),
    );
    arguments
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic".to_string()
    }
}
