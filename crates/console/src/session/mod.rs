//! The messaging session driven from the console.
//!
//! [`Session`] is the target every console command runs against. It is owned
//! by the console actor, so its connection flag is only ever touched from one
//! thread; the prompt reads a mirror of it through [`ConsoleOutput`].

pub mod collaborator;
pub mod commands;
pub mod entities;
mod events;
pub mod jid;

pub use collaborator::{Collaborator, EventSink};
pub use commands::register_session_commands;
pub use entities::{
    Ack, InboundMessage, InboundNotification, InboundPresence, InboundReceipt, MessageContent,
    ProtocolEntity, ProtocolEvent,
};
pub use events::SessionControl;
pub use jid::AliasBook;

use crate::actor::ConsoleMessage;
use crate::config::SessionSettings;
use crate::console_service::{BlockingGate, CommandOutcome, ConsoleOutput};
use crossbeam::channel::Sender;
use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

pub struct Session {
    settings: SessionSettings,
    aliases: AliasBook,
    collaborator: Arc<dyn Collaborator>,
    output: Arc<ConsoleOutput>,
    gate: Arc<BlockingGate>,
    mailbox: Sender<ConsoleMessage>,
    connected: bool,
    /// A `connect()` was issued and has not been answered yet.
    connecting: bool,
    /// An operator login is waiting for the gate to open.
    login_pending: bool,
    /// The operator asked for the current disconnect.
    disconnect_requested: bool,
    next_message: u64,
}

impl Session {
    pub fn new(
        settings: SessionSettings,
        collaborator: Arc<dyn Collaborator>,
        output: Arc<ConsoleOutput>,
        gate: Arc<BlockingGate>,
        mailbox: Sender<ConsoleMessage>,
    ) -> Self {
        let aliases = AliasBook::new(settings.aliases.clone());
        Self {
            settings,
            aliases,
            collaborator,
            output,
            gate,
            mailbox,
            connected: false,
            connecting: false,
            login_pending: false,
            disconnect_requested: false,
            next_message: 0,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn aliases(&self) -> &AliasBook {
        &self.aliases
    }

    pub fn output(&self) -> &ConsoleOutput {
        &self.output
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        self.output.set_connected(connected);
    }

    /// Guard for commands that need a live session.
    pub fn assert_connected(&self) -> bool {
        if self.connected {
            true
        } else {
            self.output.output("Not connected", Some("Error"), false);
            false
        }
    }

    /// Operator login. Blocks further input until the stack reports back.
    pub fn login(&mut self) -> anyhow::Result<CommandOutcome> {
        if self.connected {
            self.output.info("Already connected, disconnect first");
            return Ok(CommandOutcome::Continue);
        }
        if self.connecting {
            debug!(target: "chatline::session", "login joins the connect in flight");
        } else {
            self.start_connect()?;
        }
        self.login_pending = true;
        Ok(CommandOutcome::BlockUntilReleased)
    }

    /// Reconnect scheduled after an unsolicited disconnect. Nothing waits on it.
    pub fn reconnect(&mut self) {
        if self.connected {
            debug!(target: "chatline::session", "reconnect skipped, already connected");
            return;
        }
        if self.connecting {
            debug!(target: "chatline::session", "reconnect skipped, connect in flight");
            return;
        }
        if let Err(err) = self.start_connect() {
            self.output.error(format!("Reconnect failed: {err}"));
        }
    }

    /// Runs `connect()` on a worker thread so the caller stays responsive.
    fn start_connect(&mut self) -> anyhow::Result<()> {
        self.disconnect_requested = false;
        let collaborator = Arc::clone(&self.collaborator);
        let events = EventSink::new(self.mailbox.clone());
        info!(target: "chatline::session", "connecting");
        thread::Builder::new()
            .name("chatline-connect".into())
            .spawn(move || {
                if let Err(err) = collaborator.connect() {
                    warn!(target: "chatline::session", error = %err, "connect failed");
                    events.deliver(ProtocolEvent::LoginFailed {
                        reason: err.to_string(),
                    });
                }
            })?;
        self.connecting = true;
        Ok(())
    }

    pub fn presence_available(&mut self) {
        if self.assert_connected() {
            self.send(ProtocolEntity::AvailablePresence);
        }
    }

    pub fn presence_unavailable(&mut self) {
        if self.assert_connected() {
            self.send(ProtocolEntity::UnavailablePresence);
        }
    }

    pub fn presence_subscribe(&mut self, contact: &str) {
        if self.assert_connected() {
            let jid = self.aliases.alias_to_jid(contact);
            self.send(ProtocolEntity::SubscribePresence { jid });
        }
    }

    pub fn presence_unsubscribe(&mut self, contact: &str) {
        if self.assert_connected() {
            let jid = self.aliases.alias_to_jid(contact);
            self.send(ProtocolEntity::UnsubscribePresence { jid });
        }
    }

    /// Sends a text message. Returns the message id when it was handed to the
    /// stack.
    pub fn message_send(&mut self, number: &str, content: &str) -> Option<String> {
        if !self.assert_connected() {
            return None;
        }
        let id = self.next_message_id();
        let entity = ProtocolEntity::TextMessage {
            id: id.clone(),
            to: self.aliases.alias_to_jid(number),
            body: content.to_string(),
        };
        self.send(entity).then_some(id)
    }

    pub fn disconnect(&mut self) {
        if !self.assert_connected() {
            return;
        }
        self.disconnect_requested = true;
        if let Err(err) = self.collaborator.disconnect() {
            self.disconnect_requested = false;
            warn!(target: "chatline::session", error = %err, "disconnect failed");
            self.output.error(format!("Disconnect failed: {err}"));
        }
    }

    pub fn status_lines(&self) -> Vec<String> {
        vec![
            format!(
                "Account: {}",
                self.settings.username.as_deref().unwrap_or("<unset>")
            ),
            format!(
                "Session: {}",
                if self.connected { "connected" } else { "offline" }
            ),
            format!(
                "Transport: {}",
                if self.collaborator.is_connected() {
                    "connected"
                } else {
                    "offline"
                }
            ),
            format!(
                "Receipts: {}{}",
                if self.settings.send_receipts { "on" } else { "off" },
                if self.settings.send_receipts && self.settings.send_read {
                    " (read)"
                } else {
                    ""
                }
            ),
            format!("Watching: {} contact(s)", self.settings.watch.len()),
            format!("Aliases: {}", self.aliases.len()),
        ]
    }

    /// Hands an entity to the stack. Failures are reported on the console and
    /// never propagated.
    fn send(&self, entity: ProtocolEntity) -> bool {
        match self.collaborator.send_entity(entity) {
            Ok(()) => true,
            Err(err) => {
                warn!(target: "chatline::session", error = %err, "send failed");
                self.output.error(format!("Send failed: {err}"));
                false
            }
        }
    }

    fn next_message_id(&mut self) -> String {
        self.next_message += 1;
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        format!("{seconds:X}-{}", self.next_message)
    }
}
