//! The operator command set of a messaging session.

use super::Session;
use crate::console_service::{
    CommandHandler, CommandOutcome, CommandRegistry, ConsoleCommandAttribute, HelpEntry,
    ParameterDescriptor,
};
use crate::error::RegistrationError;
use anyhow::anyhow;
use std::sync::Arc;

/// Registers every session command. `help` goes last so its listing covers
/// the whole table.
pub fn register_session_commands(
    registry: &mut CommandRegistry<Session>,
    prefix: char,
) -> Result<(), RegistrationError> {
    registry.register_command(
        "L",
        ConsoleCommandAttribute::new("Quick login").with_order(0),
        Vec::new(),
        login_handler(),
    )?;

    registry.register_command(
        "status",
        ConsoleCommandAttribute::new("Show session status").with_order(2),
        Vec::new(),
        status_handler(),
    )?;

    register_presence_commands(registry)?;

    registry.register_command(
        "message_send",
        ConsoleCommandAttribute::new("Send message").with_order(20),
        vec![
            ParameterDescriptor::new("number"),
            ParameterDescriptor::new("content"),
        ],
        message_send_handler(),
    )?;

    registry.register_command(
        "disconnect",
        ConsoleCommandAttribute::new("Disconnect").with_order(30),
        Vec::new(),
        disconnect_handler(),
    )?;

    register_help_command(registry, prefix)
}

fn register_presence_commands(
    registry: &mut CommandRegistry<Session>,
) -> Result<(), RegistrationError> {
    registry.register(
        "presence_available",
        ConsoleCommandAttribute::new("Set presence as available").with_order(10),
        Vec::new(),
        |session: &mut Session, _args| {
            session.presence_available();
            Ok(CommandOutcome::Continue)
        },
    )?;

    registry.register(
        "presence_unavailable",
        ConsoleCommandAttribute::new("Set presence as unavailable").with_order(11),
        Vec::new(),
        |session: &mut Session, _args| {
            session.presence_unavailable();
            Ok(CommandOutcome::Continue)
        },
    )?;

    registry.register(
        "presence_subscribe",
        ConsoleCommandAttribute::new("Subscribe to contact's presence updates").with_order(12),
        vec![ParameterDescriptor::new("contact")],
        |session: &mut Session, args| {
            let [contact] = expect_args(args, "presence subscribe")?;
            session.presence_subscribe(&contact);
            Ok(CommandOutcome::Continue)
        },
    )?;

    registry.register(
        "presence_unsubscribe",
        ConsoleCommandAttribute::new("Unsubscribe from contact's presence updates").with_order(13),
        vec![ParameterDescriptor::new("contact")],
        |session: &mut Session, args| {
            let [contact] = expect_args(args, "presence unsubscribe")?;
            session.presence_unsubscribe(&contact);
            Ok(CommandOutcome::Continue)
        },
    )
}

fn register_help_command(
    registry: &mut CommandRegistry<Session>,
    prefix: char,
) -> Result<(), RegistrationError> {
    let attribute = ConsoleCommandAttribute::new("Print this message").with_order(1);
    let mut entries = registry.help_entries(prefix);
    entries.push(HelpEntry {
        order: attribute.order,
        usage: format!("{prefix}help"),
        description: attribute.description.clone(),
    });
    entries.sort_by_key(|entry| entry.order);
    registry.register_command("help", attribute, Vec::new(), help_handler(entries))
}

fn login_handler() -> CommandHandler<Session> {
    Arc::new(|session: &mut Session, _args: Vec<String>| session.login())
}

fn status_handler() -> CommandHandler<Session> {
    Arc::new(|session: &mut Session, _args: Vec<String>| {
        session.output().info(session.status_lines().join("\n"));
        Ok(CommandOutcome::Continue)
    })
}

fn message_send_handler() -> CommandHandler<Session> {
    Arc::new(|session: &mut Session, args: Vec<String>| {
        let [number, content] = expect_args(args, "message send")?;
        session.message_send(&number, &content);
        Ok(CommandOutcome::Continue)
    })
}

fn disconnect_handler() -> CommandHandler<Session> {
    Arc::new(|session: &mut Session, _args: Vec<String>| {
        session.disconnect();
        Ok(CommandOutcome::Continue)
    })
}

fn help_handler(entries: Vec<HelpEntry>) -> CommandHandler<Session> {
    let width = entries.iter().map(|entry| entry.usage.len()).max().unwrap_or(0);
    let listing = entries
        .iter()
        .map(|entry| format!("{:<width$}  {}", entry.usage, entry.description))
        .collect::<Vec<_>>()
        .join("\n");
    Arc::new(move |session: &mut Session, _args: Vec<String>| {
        session.output().info(&listing);
        Ok(CommandOutcome::Continue)
    })
}

fn expect_args<const N: usize>(args: Vec<String>, command: &str) -> anyhow::Result<[String; N]> {
    let given = args.len();
    args.try_into()
        .map_err(|_| anyhow!("{command} expects {N} argument(s), got {given}"))
}
