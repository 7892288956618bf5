use std::fmt;
use std::sync::Arc;

/// Marks a function as an operator command: description plus help ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCommandAttribute {
    pub description: String,
    pub order: i32,
}

impl ConsoleCommandAttribute {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            order: 0,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }
}

/// A named positional parameter, optionally carrying a default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub default: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some()
    }
}

/// What the input loop must do once a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Keep accepting input immediately.
    Continue,
    /// Stop reading input until the blocking gate is released.
    BlockUntilReleased,
}

impl CommandOutcome {
    pub fn blocks(self) -> bool {
        matches!(self, CommandOutcome::BlockUntilReleased)
    }
}

/// Handler bound to a command. Receives the target and one value per declared
/// parameter, with trailing defaults already filled in.
pub type CommandHandler<T> =
    Arc<dyn Fn(&mut T, Vec<String>) -> anyhow::Result<CommandOutcome> + Send + Sync>;

/// Subcommand key. `None` is the sentinel for a bare command.
pub type SubcommandKey = Option<String>;

/// Everything the dispatcher needs to know about one registered command.
pub struct CommandDescriptor<T> {
    pub command: String,
    pub subcommand: SubcommandKey,
    pub parameters: Vec<ParameterDescriptor>,
    pub optional_count: usize,
    pub description: String,
    pub order: i32,
    pub handler: CommandHandler<T>,
}

impl<T> CommandDescriptor<T> {
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.parameters.iter().map(|param| param.name.as_str())
    }

    pub fn required_count(&self) -> usize {
        self.parameters.len() - self.optional_count
    }

    /// Operator-facing form, e.g. `/message send <number> <content>`.
    pub fn usage(&self, prefix: char) -> String {
        let mut usage = format!("{prefix}{}", self.command);
        if let Some(sub) = &self.subcommand {
            usage.push(' ');
            usage.push_str(sub);
        }
        for param in &self.parameters {
            if param.is_optional() {
                usage.push_str(&format!(" [{}]", param.name));
            } else {
                usage.push_str(&format!(" <{}>", param.name));
            }
        }
        usage
    }
}

impl<T> Clone for CommandDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            command: self.command.clone(),
            subcommand: self.subcommand.clone(),
            parameters: self.parameters.clone(),
            optional_count: self.optional_count,
            description: self.description.clone(),
            order: self.order,
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<T> fmt::Debug for CommandDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("command", &self.command)
            .field("subcommand", &self.subcommand.as_deref().unwrap_or("none"))
            .field("parameters", &self.parameters)
            .field("optional_count", &self.optional_count)
            .field("description", &self.description)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}
