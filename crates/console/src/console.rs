use crate::actor::{ActorExit, ActorHandle, ConsoleActor, ConsoleMessage};
use crate::config::ConsoleConfig;
use crate::console_service::{
    BlockingGate, CommandCompleter, CommandDispatcher, CommandRegistry, ConsoleOutput,
    EditorSource, InputLoop, LineParser, LineSource,
};
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::{register_session_commands, Collaborator, EventSink, Session};
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

/// A configured console that has not started yet.
///
/// Construction builds the command table; a registration error is fatal and
/// the console refuses to start.
pub struct Console {
    config: ConsoleConfig,
    output: Arc<ConsoleOutput>,
    dispatcher: CommandDispatcher<Session>,
    gate: Arc<BlockingGate>,
    sender: Sender<ConsoleMessage>,
    mailbox: Receiver<ConsoleMessage>,
    queued: Vec<String>,
}

impl Console {
    pub fn new(config: ConsoleConfig, output: ConsoleOutput) -> ConsoleResult<Self> {
        config.validate()?;
        let prefix = config.console.prefix;

        let mut registry = CommandRegistry::new();
        if let Err(err) = register_session_commands(&mut registry, prefix) {
            error!(target: "chatline::console", error = %err, "command registration failed");
            return Err(err.into());
        }
        let dispatcher = CommandDispatcher::new(registry.build(), LineParser::new(prefix));

        let mut queued = Vec::new();
        if config.console.auto_connect {
            queued.push(format!("{prefix}L"));
        }
        queued.extend(config.console.startup.iter().cloned());

        let (sender, mailbox) = channel::unbounded();
        Ok(Self {
            config,
            output: Arc::new(output),
            dispatcher,
            gate: Arc::new(BlockingGate::new()),
            sender,
            mailbox,
            queued,
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn output(&self) -> Arc<ConsoleOutput> {
        Arc::clone(&self.output)
    }

    pub fn dispatcher(&self) -> &CommandDispatcher<Session> {
        &self.dispatcher
    }

    /// Handle the messaging stack delivers its events through.
    pub fn event_sink(&self) -> EventSink {
        EventSink::new(self.sender.clone())
    }

    pub fn completer(&self) -> CommandCompleter {
        CommandCompleter::new(self.dispatcher.table().command_names(), self.dispatcher.prefix())
    }

    /// Queues a line to run before the operator is prompted.
    pub fn queue_command(&mut self, line: impl Into<String>) {
        self.queued.push(line.into());
    }

    pub fn queued_commands(&self) -> &[String] {
        &self.queued
    }

    /// Starts the actor and the input loop. `make_source` runs on the input
    /// thread.
    pub fn start<F, S>(
        self,
        collaborator: Arc<dyn Collaborator>,
        make_source: F,
    ) -> ConsoleResult<RunningConsole>
    where
        F: FnOnce() -> ConsoleResult<S> + Send + 'static,
        S: LineSource,
    {
        let Console {
            config,
            output,
            dispatcher,
            gate,
            sender,
            mailbox,
            queued,
        } = self;

        let session = Session::new(
            config.session,
            collaborator,
            Arc::clone(&output),
            Arc::clone(&gate),
            sender.clone(),
        );
        let actor = ConsoleActor::new(session, dispatcher, mailbox).spawn()?;

        let mut input = InputLoop::new(ActorHandle::new(sender), gate, output);
        for line in queued {
            input.queue_command(line);
        }
        info!(target: "chatline::console", queued = input.queued(), "console started");
        let input = input.spawn(make_source)?;

        Ok(RunningConsole { actor, input })
    }

    /// Starts with the line editor on stdin.
    pub fn start_interactive(
        self,
        collaborator: Arc<dyn Collaborator>,
    ) -> ConsoleResult<RunningConsole> {
        let completer = self.completer();
        let history = self.config.console.history_file.clone();
        self.start(collaborator, move || EditorSource::new(completer, history))
    }
}

pub struct RunningConsole {
    actor: JoinHandle<ActorExit>,
    input: JoinHandle<ConsoleResult<()>>,
}

impl RunningConsole {
    /// Blocks until the actor stops.
    ///
    /// On [`ActorExit::Terminate`] the input thread is left parked on its
    /// read; the caller is expected to end the process.
    pub fn wait(self) -> ConsoleResult<ActorExit> {
        let exit = self.actor.join().map_err(|_| ConsoleError::Closed)?;
        if exit == ActorExit::Shutdown {
            self.input.join().map_err(|_| ConsoleError::Closed)??;
        }
        Ok(exit)
    }
}
