use super::entities::{
    Ack, InboundMessage, InboundNotification, InboundPresence, InboundReceipt, MessageContent,
    ProtocolEntity, ProtocolEvent,
};
use super::Session;
use crate::actor::ConsoleMessage;
use crate::config::DisconnectAction;
use chrono::{Local, TimeZone};
use std::thread;
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "%d-%m-%Y %H:%M";

/// What the actor does after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionControl {
    Continue,
    /// The disconnect policy asks for the process to end.
    Terminate,
}

impl Session {
    pub fn handle_event(&mut self, event: ProtocolEvent) -> SessionControl {
        debug!(target: "chatline::session", event = event.name(), "event received");
        match event {
            ProtocolEvent::LoginSucceeded => self.on_login_succeeded(),
            ProtocolEvent::LoginFailed { reason } => self.on_login_failed(&reason),
            ProtocolEvent::Disconnected { reason } => return self.on_disconnected(&reason),
            ProtocolEvent::Message(message) => self.on_message(message),
            ProtocolEvent::Presence(presence) => self.on_presence(presence),
            ProtocolEvent::Receipt(receipt) => self.on_receipt(receipt),
            ProtocolEvent::Ack(ack) => self.on_ack(ack),
            ProtocolEvent::Notification(notification) => self.on_notification(notification),
        }
        SessionControl::Continue
    }

    fn release_pending_login(&mut self) {
        if self.login_pending {
            self.login_pending = false;
            self.gate.release();
        }
    }

    fn on_login_succeeded(&mut self) {
        info!(target: "chatline::session", "logged in");
        self.connecting = false;
        self.set_connected(true);
        self.output.output("Logged in!", Some("Auth"), false);
        self.release_pending_login();

        if self.settings.announce_available {
            self.send(ProtocolEntity::AvailablePresence);
        }
        for contact in &self.settings.watch {
            let jid = self.aliases.alias_to_jid(contact);
            self.send(ProtocolEntity::SubscribePresence { jid });
        }
        let notice = self
            .settings
            .report_to
            .clone()
            .zip(self.settings.login_notice.clone());
        if let Some((report_to, notice)) = notice {
            self.message_send(&report_to, &notice);
        }
    }

    fn on_login_failed(&mut self, reason: &str) {
        warn!(target: "chatline::session", reason, "login failed");
        self.connecting = false;
        self.set_connected(false);
        self.output
            .output(format!("Login failed, reason: {reason}"), Some("Auth"), true);
        self.release_pending_login();
    }

    fn on_disconnected(&mut self, reason: &str) -> SessionControl {
        let requested = self.disconnect_requested;
        self.disconnect_requested = false;
        self.connecting = false;
        self.set_connected(false);
        self.release_pending_login();
        info!(target: "chatline::session", reason, requested, "disconnected");

        match self.settings.disconnect_action {
            DisconnectAction::Exit => {
                self.output.output(reason, Some("Disconnected"), false);
                SessionControl::Terminate
            }
            DisconnectAction::Prompt => {
                self.output.output(reason, Some("Disconnected"), true);
                if !requested {
                    self.schedule_reconnect();
                }
                SessionControl::Continue
            }
        }
    }

    fn schedule_reconnect(&self) {
        let delay = self.settings.reconnect_delay();
        let mailbox = self.mailbox.clone();
        let spawned = thread::Builder::new()
            .name("chatline-reconnect".into())
            .spawn(move || {
                thread::sleep(delay);
                let _ = mailbox.send(ConsoleMessage::Reconnect);
            });
        if let Err(err) = spawned {
            warn!(target: "chatline::session", error = %err, "cannot schedule reconnect");
        }
    }

    fn on_message(&mut self, message: InboundMessage) {
        self.output.info(self.format_message(&message));

        if !self.settings.send_receipts {
            return;
        }
        let read = self.settings.send_read;
        let acknowledged = self.send(ProtocolEntity::MessageAck {
            id: message.id.clone(),
            to: message.from.clone(),
            participant: message.participant.clone(),
            read,
        });
        if acknowledged {
            let text = if read {
                "Sent delivered receipt and Read"
            } else {
                "Sent delivered receipt"
            };
            self.output.tagged(&format!("Message {}", message.id), text);
        }
    }

    pub(crate) fn format_message(&self, message: &InboundMessage) -> String {
        let from = self.aliases.jid_to_alias(&message.from);
        let sender = match &message.participant {
            Some(participant) => format!("{}/{from}", self.aliases.jid_to_alias(participant)),
            None => from.to_string(),
        };
        let date = Local
            .timestamp_opt(message.timestamp, 0)
            .single()
            .map(|date| date.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| message.timestamp.to_string());
        let body = match &message.content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Media {
                media_type,
                length,
                url,
                caption,
            } => {
                let mut body = format!("[media_type={media_type}, length={length}, url={url}]");
                if let Some(caption) = caption {
                    body.push(' ');
                    body.push_str(caption);
                }
                body
            }
            MessageContent::Other(kind) => format!("Unknown message type {kind}"),
        };
        format!("[{sender}({date})]:[{}]\t {body}", message.id)
    }

    fn on_presence(&mut self, presence: InboundPresence) {
        let online = matches!(presence.kind.as_deref(), None | Some("available"));
        let last_seen = match presence.last_seen.as_deref() {
            Some("deny") if !online => Local::now().timestamp().to_string(),
            Some(value) => value.to_string(),
            None => String::new(),
        };
        let line = format!(
            "{} {} {}",
            self.aliases.jid_to_alias(&presence.from),
            if online { "online" } else { "offline" },
            last_seen
        )
        .trim_end()
        .to_string();
        self.output.info(&line);

        if let Some(report_to) = self.settings.report_to.clone() {
            let target = self.aliases.alias_to_jid(&report_to);
            if self.connected && target != presence.from {
                self.message_send(&report_to, &line);
            }
        }
    }

    fn on_receipt(&mut self, receipt: InboundReceipt) {
        self.send(ProtocolEntity::ReceiptAck {
            id: receipt.id,
            to: receipt.from,
            kind: receipt.kind,
        });
    }

    fn on_ack(&mut self, ack: Ack) {
        if ack.class == "message" {
            self.output.output(&ack.id, Some("Sent"), true);
        } else {
            debug!(target: "chatline::session", id = %ack.id, class = %ack.class, "ack");
        }
    }

    fn on_notification(&mut self, notification: InboundNotification) {
        match notification.text.as_deref().filter(|text| !text.is_empty()) {
            Some(text) => self.output.tagged("Notification", text),
            None => self.output.output(
                format!(
                    "From :{}, Type: {}",
                    self.aliases.jid_to_alias(&notification.from),
                    notification.kind
                ),
                Some("Notification"),
                true,
            ),
        }
    }
}
