use super::entities::{ProtocolEntity, ProtocolEvent};
use crate::actor::ConsoleMessage;
use crate::error::CollaboratorError;
use crossbeam::channel::Sender;
use tracing::debug;

/// The external messaging stack, seen from the console.
///
/// Every call must return promptly; long-running work (connecting, network
/// writes) belongs on the stack's own threads. Results arrive later through
/// the [`EventSink`] the stack was given.
pub trait Collaborator: Send + Sync {
    fn connect(&self) -> Result<(), CollaboratorError>;

    fn send_entity(&self, entity: ProtocolEntity) -> Result<(), CollaboratorError>;

    fn disconnect(&self) -> Result<(), CollaboratorError>;

    fn is_connected(&self) -> bool;
}

/// Handle the messaging stack uses to deliver events to the console.
///
/// Delivery is fire-and-forget: events are queued for the console actor and
/// handled on its thread, never on the caller's.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: Sender<ConsoleMessage>,
}

impl EventSink {
    pub(crate) fn new(sender: Sender<ConsoleMessage>) -> Self {
        Self { sender }
    }

    /// Returns `false` once the console has shut down.
    pub fn deliver(&self, event: ProtocolEvent) -> bool {
        let name = event.name();
        match self.sender.send(ConsoleMessage::Event(event)) {
            Ok(()) => true,
            Err(_) => {
                debug!(target: "chatline::session", event = name, "event dropped, console closed");
                false
            }
        }
    }
}
