//! Protocol entities exchanged with the messaging stack.
//!
//! Only the shape the console needs is modelled here; encoding is the stack's
//! business.

/// Outbound entity handed to [`Collaborator::send_entity`](super::Collaborator::send_entity).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEntity {
    AvailablePresence,
    UnavailablePresence,
    SubscribePresence {
        jid: String,
    },
    UnsubscribePresence {
        jid: String,
    },
    TextMessage {
        id: String,
        to: String,
        body: String,
    },
    /// Delivery (and optionally read) receipt for an inbound message.
    MessageAck {
        id: String,
        to: String,
        participant: Option<String>,
        read: bool,
    },
    /// Acknowledges a receipt the stack delivered to us.
    ReceiptAck {
        id: String,
        to: String,
        kind: Option<String>,
    },
}

/// Body of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageContent {
    Text(String),
    Media {
        media_type: String,
        length: u64,
        url: String,
        caption: Option<String>,
    },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub from: String,
    /// Sender inside a group; `None` for one-to-one chats.
    pub participant: Option<String>,
    /// Unix seconds.
    pub timestamp: i64,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundPresence {
    pub from: String,
    /// `None` means available; anything else (e.g. `unavailable`) is offline.
    pub kind: Option<String>,
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundReceipt {
    pub id: String,
    pub from: String,
    pub kind: Option<String>,
}

/// Server acknowledgement of something we sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub id: String,
    pub class: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundNotification {
    pub from: String,
    pub kind: String,
    pub text: Option<String>,
}

/// Events the messaging stack delivers to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolEvent {
    LoginSucceeded,
    LoginFailed { reason: String },
    Disconnected { reason: String },
    Message(InboundMessage),
    Presence(InboundPresence),
    Receipt(InboundReceipt),
    Ack(Ack),
    Notification(InboundNotification),
}

impl ProtocolEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolEvent::LoginSucceeded => "login-succeeded",
            ProtocolEvent::LoginFailed { .. } => "login-failed",
            ProtocolEvent::Disconnected { .. } => "disconnected",
            ProtocolEvent::Message(_) => "message",
            ProtocolEvent::Presence(_) => "presence",
            ProtocolEvent::Receipt(_) => "receipt",
            ProtocolEvent::Ack(_) => "ack",
            ProtocolEvent::Notification(_) => "notification",
        }
    }
}
