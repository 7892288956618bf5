//! The console actor.
//!
//! One thread owns the [`Session`] and the dispatcher. Operator lines and
//! collaborator events both arrive as [`ConsoleMessage`]s on a single channel,
//! so session state is never touched concurrently.

use crate::console_service::{CommandDispatcher, CommandOutcome, CommandSink, DispatchResult};
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::{ProtocolEvent, Session, SessionControl};
use crossbeam::channel::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Mailbox item of the console actor.
#[derive(Debug)]
pub enum ConsoleMessage {
    /// One operator (or queued) line. The outcome is sent back on `reply`.
    Command {
        line: String,
        reply: Sender<CommandOutcome>,
    },
    Event(ProtocolEvent),
    /// Scheduled reconnect after an unsolicited disconnect.
    Reconnect,
    /// Input ended; stop the actor.
    Shutdown,
}

/// Why the actor stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorExit {
    /// The disconnect policy requires the process to end now.
    Terminate,
    /// Input ended or every sender went away.
    Shutdown,
}

pub struct ConsoleActor {
    session: Session,
    dispatcher: CommandDispatcher<Session>,
    mailbox: Receiver<ConsoleMessage>,
}

impl ConsoleActor {
    pub fn new(
        session: Session,
        dispatcher: CommandDispatcher<Session>,
        mailbox: Receiver<ConsoleMessage>,
    ) -> Self {
        Self {
            session,
            dispatcher,
            mailbox,
        }
    }

    pub fn run(mut self) -> ActorExit {
        while let Ok(message) = self.mailbox.recv() {
            match message {
                ConsoleMessage::Command { line, reply } => {
                    let outcome = self.run_line(&line);
                    if reply.send(outcome).is_err() {
                        debug!(target: "chatline::console", "command reply dropped");
                    }
                }
                ConsoleMessage::Event(event) => {
                    let logged_in = matches!(event, ProtocolEvent::LoginSucceeded);
                    if self.session.handle_event(event) == SessionControl::Terminate {
                        info!(target: "chatline::console", "disconnect policy requests exit");
                        return ActorExit::Terminate;
                    }
                    if logged_in {
                        self.run_login_commands();
                    }
                }
                ConsoleMessage::Reconnect => self.session.reconnect(),
                ConsoleMessage::Shutdown => {
                    debug!(target: "chatline::console", "shutdown requested");
                    break;
                }
            }
        }
        ActorExit::Shutdown
    }

    /// Dispatches one line and reports anything the operator needs to see.
    /// Never fails: usage problems and handler failures end up on the console.
    pub fn run_line(&mut self, line: &str) -> CommandOutcome {
        match self.dispatcher.execute(&mut self.session, line) {
            DispatchResult::Ignored => CommandOutcome::Continue,
            DispatchResult::Completed(outcome) => outcome,
            DispatchResult::Rejected(err) => {
                warn!(target: "chatline::console", error = %err, "invalid usage");
                let usage = self.dispatcher.usage_line(&err);
                self.session.output().output(usage, Some("Usage"), true);
                CommandOutcome::Continue
            }
            DispatchResult::Failed(err) => {
                warn!(target: "chatline::console", error = %err, "command failed");
                self.session.output().error(format!("{err:#}"));
                CommandOutcome::Continue
            }
        }
    }

    /// Lines configured to run after every login. They cannot block: nothing
    /// waits on the gate here.
    fn run_login_commands(&mut self) {
        let lines = self.session.settings().on_login.clone();
        for line in lines {
            debug!(target: "chatline::console", line = %line, "running login command");
            if self.run_line(&line).blocks() {
                warn!(target: "chatline::console", line = %line, "blocking command ignored after login");
            }
        }
    }

    pub fn spawn(self) -> ConsoleResult<JoinHandle<ActorExit>> {
        thread::Builder::new()
            .name("chatline-console".into())
            .spawn(move || self.run())
            .map_err(ConsoleError::Io)
    }
}

/// Input loop side of the actor: submits lines and waits for their outcome.
#[derive(Debug, Clone)]
pub struct ActorHandle {
    sender: Sender<ConsoleMessage>,
}

impl ActorHandle {
    pub fn new(sender: Sender<ConsoleMessage>) -> Self {
        Self { sender }
    }
}

impl CommandSink for ActorHandle {
    fn submit(&mut self, line: String) -> ConsoleResult<CommandOutcome> {
        let (reply, outcome) = channel::bounded(1);
        self.sender
            .send(ConsoleMessage::Command { line, reply })
            .map_err(|_| ConsoleError::Closed)?;
        outcome.recv().map_err(|_| ConsoleError::Closed)
    }

    fn finish(&mut self) {
        let _ = self.sender.send(ConsoleMessage::Shutdown);
    }
}
