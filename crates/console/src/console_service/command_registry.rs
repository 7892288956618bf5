//! Explicit command registration.
//!
//! Commands are registered once, at console construction, under an identifier
//! such as `message_send`. The identifier is split on [`SEPARATOR`] into a
//! command and a subcommand; identifiers without a separator become bare
//! commands. The resulting [`CommandTable`] is read-only afterwards and can be
//! shared between threads without locking.

use super::console_command::{
    CommandDescriptor, CommandHandler, CommandOutcome, ConsoleCommandAttribute,
    ParameterDescriptor, SubcommandKey,
};
use crate::error::RegistrationError;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Separator between command and subcommand in a registration identifier.
pub const SEPARATOR: char = '_';

/// Subcommands of one command, keyed by name (`None` for a bare command).
pub type SubcommandTable<T> = BTreeMap<SubcommandKey, CommandDescriptor<T>>;

/// Immutable mapping from command name to its subcommands.
pub struct CommandTable<T> {
    commands: BTreeMap<String, SubcommandTable<T>>,
}

impl<T> CommandTable<T> {
    pub fn get(&self, command: &str) -> Option<&SubcommandTable<T>> {
        self.commands.get(command)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    /// True when the command only owns the sentinel subcommand, so every token
    /// after the command name is an argument.
    pub fn is_bare(&self, command: &str) -> bool {
        self.commands
            .get(command)
            .map(|subs| subs.len() == 1 && subs.contains_key(&None))
            .unwrap_or(false)
    }

    pub fn lookup(&self, command: &str, subcommand: Option<&str>) -> Option<&CommandDescriptor<T>> {
        let subs = self.commands.get(command)?;
        subs.get(&subcommand.map(str::to_string))
    }

    /// Top-level command names in lexical order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// All descriptors sorted by display order, then by name.
    pub fn descriptors(&self) -> Vec<&CommandDescriptor<T>> {
        in_display_order(&self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// One line of the help listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub order: i32,
    pub usage: String,
    pub description: String,
}

/// Collects command registrations and validates them up front.
pub struct CommandRegistry<T> {
    commands: BTreeMap<String, SubcommandTable<T>>,
}

impl<T> Default for CommandRegistry<T> {
    fn default() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }
}

impl<T> CommandRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(
        &mut self,
        identifier: &str,
        attribute: ConsoleCommandAttribute,
        parameters: Vec<ParameterDescriptor>,
        handler: CommandHandler<T>,
    ) -> Result<(), RegistrationError> {
        let (command, subcommand) = split_identifier(identifier)?;
        let optional_count = count_trailing_optional(identifier, &parameters)?;

        let subs = self.commands.entry(command.clone()).or_default();
        if subs.contains_key(&subcommand) {
            return Err(RegistrationError::Duplicate(identifier.to_string()));
        }

        let mixes_bare_and_sub = match &subcommand {
            None => !subs.is_empty(),
            Some(_) => subs.contains_key(&None),
        };
        if mixes_bare_and_sub {
            warn!(
                target: "chatline::console",
                command = %command,
                "command has both a bare form and subcommands; the bare form is unreachable"
            );
        }

        debug!(
            target: "chatline::console",
            command = %command,
            subcommand = subcommand.as_deref().unwrap_or("none"),
            parameters = parameters.len(),
            optional = optional_count,
            "command registered"
        );

        subs.insert(
            subcommand.clone(),
            CommandDescriptor {
                command,
                subcommand,
                parameters,
                optional_count,
                description: attribute.description,
                order: attribute.order,
                handler,
            },
        );
        Ok(())
    }

    /// Convenience wrapper that boxes a plain closure.
    pub fn register<F>(
        &mut self,
        identifier: &str,
        attribute: ConsoleCommandAttribute,
        parameters: Vec<ParameterDescriptor>,
        handler: F,
    ) -> Result<(), RegistrationError>
    where
        F: Fn(&mut T, Vec<String>) -> anyhow::Result<CommandOutcome> + Send + Sync + 'static,
    {
        self.register_command(identifier, attribute, parameters, Arc::new(handler))
    }

    /// Help listing for everything registered so far, in display order.
    pub fn help_entries(&self, prefix: char) -> Vec<HelpEntry> {
        in_display_order(&self.commands)
            .into_iter()
            .map(|descriptor| HelpEntry {
                order: descriptor.order,
                usage: descriptor.usage(prefix),
                description: descriptor.description.clone(),
            })
            .collect()
    }

    pub fn build(self) -> CommandTable<T> {
        CommandTable {
            commands: self.commands,
        }
    }
}

/// Every descriptor, sorted by display order, then command, then subcommand.
fn in_display_order<T>(
    commands: &BTreeMap<String, SubcommandTable<T>>,
) -> Vec<&CommandDescriptor<T>> {
    let mut all: Vec<&CommandDescriptor<T>> =
        commands.values().flat_map(BTreeMap::values).collect();
    all.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then_with(|| a.command.cmp(&b.command))
            .then_with(|| a.subcommand.cmp(&b.subcommand))
    });
    all
}

/// Splits `cmd_sub` into `("cmd", Some("sub"))` and `cmd` into `("cmd", None)`.
pub fn split_identifier(identifier: &str) -> Result<(String, SubcommandKey), RegistrationError> {
    let mut parts = identifier.split(SEPARATOR);
    let command = parts.next().unwrap_or_default();
    let subcommand = parts.next();
    if parts.next().is_some() {
        return Err(RegistrationError::AmbiguousIdentifier(identifier.to_string()));
    }
    if command.is_empty() || subcommand.map(str::is_empty).unwrap_or(false) {
        return Err(RegistrationError::EmptyIdentifier(identifier.to_string()));
    }
    Ok((command.to_string(), subcommand.map(str::to_string)))
}

fn count_trailing_optional(
    identifier: &str,
    parameters: &[ParameterDescriptor],
) -> Result<usize, RegistrationError> {
    let mut seen_optional = false;
    let mut optional = 0usize;
    for param in parameters {
        if param.is_optional() {
            seen_optional = true;
            optional += 1;
        } else if seen_optional {
            return Err(RegistrationError::RequiredAfterOptional {
                identifier: identifier.to_string(),
                parameter: param.name.clone(),
            });
        }
    }
    Ok(optional)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> impl Fn(&mut (), Vec<String>) -> anyhow::Result<CommandOutcome> + Send + Sync {
        |_, _| Ok(CommandOutcome::Continue)
    }

    #[test]
    fn single_part_identifier_uses_sentinel() {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register("disconnect", ConsoleCommandAttribute::new("Disconnect"), Vec::new(), noop())
            .unwrap();
        let table = registry.build();
        assert!(table.is_bare("disconnect"));
        assert!(table.lookup("disconnect", None).is_some());
    }

    #[test]
    fn two_part_identifier_groups_under_command() {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register("presence_available", ConsoleCommandAttribute::new("Available"), Vec::new(), noop())
            .unwrap();
        registry
            .register(
                "presence_subscribe",
                ConsoleCommandAttribute::new("Subscribe"),
                vec![ParameterDescriptor::new("contact")],
                noop(),
            )
            .unwrap();
        let table = registry.build();
        assert!(!table.is_bare("presence"));
        assert_eq!(table.get("presence").unwrap().len(), 2);
        assert_eq!(table.len(), 2);
        let subscribe = table.lookup("presence", Some("subscribe")).unwrap();
        assert_eq!(subscribe.parameter_names().collect::<Vec<_>>(), vec!["contact"]);
    }

    #[test]
    fn more_than_one_separator_fails_fast() {
        let mut registry = CommandRegistry::<()>::new();
        let err = registry
            .register("message_send_now", ConsoleCommandAttribute::new("x"), Vec::new(), noop())
            .unwrap_err();
        assert_eq!(err, RegistrationError::AmbiguousIdentifier("message_send_now".into()));
    }

    #[test]
    fn empty_parts_are_rejected() {
        assert!(matches!(split_identifier("_send"), Err(RegistrationError::EmptyIdentifier(_))));
        assert!(matches!(split_identifier("message_"), Err(RegistrationError::EmptyIdentifier(_))));
        assert!(matches!(split_identifier(""), Err(RegistrationError::EmptyIdentifier(_))));
    }

    #[test]
    fn optional_count_covers_trailing_defaults() {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register(
                "message_send",
                ConsoleCommandAttribute::new("Send"),
                vec![
                    ParameterDescriptor::new("number"),
                    ParameterDescriptor::new("content").with_default("hi"),
                ],
                noop(),
            )
            .unwrap();
        let table = registry.build();
        let desc = table.lookup("message", Some("send")).unwrap();
        assert_eq!(desc.optional_count, 1);
        assert!(desc.optional_count <= desc.parameters.len());
    }

    #[test]
    fn required_after_optional_is_rejected() {
        let mut registry = CommandRegistry::<()>::new();
        let err = registry
            .register(
                "message_send",
                ConsoleCommandAttribute::new("Send"),
                vec![
                    ParameterDescriptor::new("number").with_default("0"),
                    ParameterDescriptor::new("content"),
                ],
                noop(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistrationError::RequiredAfterOptional { .. }));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register("status", ConsoleCommandAttribute::new("Status"), Vec::new(), noop())
            .unwrap();
        let err = registry
            .register("status", ConsoleCommandAttribute::new("Status"), Vec::new(), noop())
            .unwrap_err();
        assert_eq!(err, RegistrationError::Duplicate("status".into()));
    }

    #[test]
    fn descriptors_follow_display_order() {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register("disconnect", ConsoleCommandAttribute::new("d").with_order(30), Vec::new(), noop())
            .unwrap();
        registry
            .register("L", ConsoleCommandAttribute::new("login").with_order(0), Vec::new(), noop())
            .unwrap();
        registry
            .register("message_send", ConsoleCommandAttribute::new("m").with_order(20), Vec::new(), noop())
            .unwrap();
        let table = registry.build();
        let order: Vec<&str> = table.descriptors().iter().map(|d| d.command.as_str()).collect();
        assert_eq!(order, vec!["L", "message", "disconnect"]);
    }

    #[test]
    fn help_entries_share_display_order() {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register("presence_subscribe", ConsoleCommandAttribute::new("sub").with_order(10), vec![ParameterDescriptor::new("contact")], noop())
            .unwrap();
        registry
            .register("presence_available", ConsoleCommandAttribute::new("avail").with_order(10), Vec::new(), noop())
            .unwrap();
        registry
            .register("L", ConsoleCommandAttribute::new("login").with_order(0), Vec::new(), noop())
            .unwrap();

        let usages: Vec<String> = registry.help_entries('!').into_iter().map(|e| e.usage).collect();
        assert_eq!(usages, vec!["!L", "!presence available", "!presence subscribe <contact>"]);

        let table = registry.build();
        let subs: Vec<Option<&str>> = table.descriptors().iter().map(|d| d.subcommand.as_deref()).collect();
        assert_eq!(subs, vec![None, Some("available"), Some("subscribe")]);
    }
}
