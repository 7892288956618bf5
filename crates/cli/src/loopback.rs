//! In-process messaging stack.
//!
//! Lets the console run without a network: logins succeed after a short
//! delay, every text message is acknowledged, and messages addressed to the
//! account itself come straight back as inbound messages.

use chatline_console::session::entities::{Ack, InboundMessage, MessageContent};
use chatline_console::session::jid;
use chatline_console::{Collaborator, CollaboratorError, EventSink, ProtocolEntity, ProtocolEvent};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

pub const LOGIN_DELAY: Duration = Duration::from_millis(200);

pub struct LoopbackStack {
    events: EventSink,
    own_jid: Option<String>,
    connected: Arc<AtomicBool>,
    login_delay: Duration,
    inbound: AtomicU64,
}

impl LoopbackStack {
    pub fn new(events: EventSink, username: Option<&str>) -> Self {
        Self {
            events,
            own_jid: username.map(jid::normalize),
            connected: Arc::new(AtomicBool::new(false)),
            login_delay: LOGIN_DELAY,
            inbound: AtomicU64::new(0),
        }
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    fn echo(&self, id: &str, to: &str, body: &str) {
        let seq = self.inbound.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or_default();
        self.events.deliver(ProtocolEvent::Message(InboundMessage {
            id: format!("{id}-echo{seq}"),
            from: to.to_string(),
            participant: None,
            timestamp,
            content: MessageContent::Text(body.to_string()),
        }));
    }
}

impl Collaborator for LoopbackStack {
    fn connect(&self) -> Result<(), CollaboratorError> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(CollaboratorError::connect("already connected"));
        }
        let events = self.events.clone();
        let connected = Arc::clone(&self.connected);
        let delay = self.login_delay;
        thread::Builder::new()
            .name("loopback-login".into())
            .spawn(move || {
                thread::sleep(delay);
                connected.store(true, Ordering::SeqCst);
                info!(target: "chatline::loopback", "login accepted");
                events.deliver(ProtocolEvent::LoginSucceeded);
            })
            .map_err(|err| CollaboratorError::connect(err.to_string()))?;
        Ok(())
    }

    fn send_entity(&self, entity: ProtocolEntity) -> Result<(), CollaboratorError> {
        if !self.is_connected() {
            return Err(CollaboratorError::NotConnected);
        }
        match entity {
            ProtocolEntity::TextMessage { id, to, body } => {
                self.events.deliver(ProtocolEvent::Ack(Ack {
                    id: id.clone(),
                    class: "message".into(),
                }));
                if self.own_jid.as_deref() == Some(to.as_str()) {
                    self.echo(&id, &to, &body);
                }
            }
            other => debug!(target: "chatline::loopback", entity = ?other, "entity accepted"),
        }
        Ok(())
    }

    fn disconnect(&self) -> Result<(), CollaboratorError> {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return Err(CollaboratorError::NotConnected);
        }
        self.events.deliver(ProtocolEvent::Disconnected {
            reason: "requested".into(),
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
