//! Console runtime tests
//!
//! These tests drive a full console (actor, input loop and session) against a
//! scripted messaging stack and a scripted operator.

use chatline_console::console_service::{
    CommandRegistry, ConsoleCommandAttribute, LineParser, ParameterDescriptor,
};
use chatline_console::*;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Messaging stack double. Connecting succeeds at once, disconnecting is
/// reported back as an event, and every send is recorded together with the
/// number of prompts the operator had seen at that point.
struct ScriptedStack {
    events: EventSink,
    prompts: Arc<Mutex<Vec<String>>>,
    sent: Mutex<Vec<(ProtocolEntity, usize)>>,
    connected: AtomicBool,
}

impl ScriptedStack {
    fn new(events: EventSink, prompts: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self {
            events,
            prompts,
            sent: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
        })
    }

    fn sent(&self) -> Vec<(ProtocolEntity, usize)> {
        self.sent.lock().clone()
    }
}

impl Collaborator for ScriptedStack {
    fn connect(&self) -> Result<(), CollaboratorError> {
        self.connected.store(true, Ordering::SeqCst);
        self.events.deliver(ProtocolEvent::LoginSucceeded);
        Ok(())
    }

    fn send_entity(&self, entity: ProtocolEntity) -> Result<(), CollaboratorError> {
        let prompts = self.prompts.lock().len();
        self.sent.lock().push((entity, prompts));
        Ok(())
    }

    fn disconnect(&self) -> Result<(), CollaboratorError> {
        self.connected.store(false, Ordering::SeqCst);
        self.events.deliver(ProtocolEvent::Disconnected {
            reason: "requested".into(),
        });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

struct Run {
    exit: ActorExit,
    stack: Arc<ScriptedStack>,
    output: BufferWriter,
    prompts: Arc<Mutex<Vec<String>>>,
}

fn run_console(config: ConsoleConfig, typed: &[&str]) -> Run {
    let output = BufferWriter::new();
    let console = Console::new(
        config,
        ConsoleOutput::with_writer(output.clone(), ConsoleMode::Interactive),
    )
    .unwrap();

    let source = ScriptedSource::new(typed.iter().copied());
    let prompts = source.prompts();
    let stack = ScriptedStack::new(console.event_sink(), Arc::clone(&prompts));
    let collaborator: Arc<dyn Collaborator> = stack.clone();

    let exit = console
        .start(collaborator, move || Ok(source))
        .unwrap()
        .wait()
        .unwrap();
    Run {
        exit,
        stack,
        output,
        prompts,
    }
}

#[cfg(test)]
mod console_tests {
    use super::*;

    /// Queued startup commands run in order, after the login they wait on and
    /// before the operator sees a prompt.
    #[test]
    fn test_startup_commands_run_before_prompt() {
        let mut config = ConsoleConfig::default();
        config.console.auto_connect = true;
        config.console.startup = vec!["/presence available".into(), "/message send 1555 hi".into()];
        config.session.announce_available = false;

        let run = run_console(config, &[]);

        assert_eq!(run.exit, ActorExit::Shutdown);
        let sent = run.stack.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (ProtocolEntity::AvailablePresence, 0));
        match &sent[1] {
            (ProtocolEntity::TextMessage { to, body, .. }, prompts) => {
                assert_eq!(to, "1555@s.whatsapp.net");
                assert_eq!(body, "hi");
                assert_eq!(*prompts, 0);
            }
            other => panic!("unexpected entity {other:?}"),
        }
        assert_eq!(*run.prompts.lock(), vec!["[connected]:".to_string()]);
        assert!(run.output.contents().contains("Auth: Logged in!"));
    }

    /// Without a session the same startup commands are harmless no-ops.
    #[test]
    fn test_startup_commands_without_session_noop() {
        let mut config = ConsoleConfig::default();
        config.console.startup = vec!["/presence available".into(), "/message send 1555 hi".into()];

        let run = run_console(config, &[]);

        assert_eq!(run.exit, ActorExit::Shutdown);
        assert!(run.stack.sent().is_empty());
        assert_eq!(run.output.contents().matches("Error: Not connected").count(), 2);
        assert_eq!(*run.prompts.lock(), vec!["[offline]:".to_string()]);
    }

    /// Typed lines pass through the same dispatcher; bad lines get one usage
    /// line each and the console keeps going.
    #[test]
    fn test_usage_errors_do_not_stop_the_console() {
        let run = run_console(
            ConsoleConfig::default(),
            &["hello", "/presence", "/message send 1555", "/bogus", "/status"],
        );

        assert_eq!(run.exit, ActorExit::Shutdown);
        let contents = run.output.contents();
        assert_eq!(contents.matches("Usage: ").count(), 4);
        assert!(contents.contains("Usage: /presence <available|subscribe|unavailable|unsubscribe>"));
        assert!(contents.contains("Usage: /message send <number> <content>"));
        assert!(contents.contains("Session: offline"));
        assert_eq!(run.prompts.lock().len(), 6);
    }

    /// With the exit policy a disconnect ends the actor and nothing typed
    /// afterwards is processed.
    #[test]
    fn test_exit_policy_terminates_on_disconnect() {
        let mut config = ConsoleConfig::default();
        config.console.auto_connect = true;
        config.session.disconnect_action = DisconnectAction::Exit;
        config.session.announce_available = false;

        let run = run_console(config, &["/disconnect", "/status"]);

        assert_eq!(run.exit, ActorExit::Terminate);
        let contents = run.output.contents();
        assert!(contents.contains("Disconnected: requested"));
        assert!(!contents.contains("Session:"));
    }

    /// An operator disconnect under the prompt policy leaves the console
    /// running and offline.
    #[test]
    fn test_prompt_policy_keeps_console_running() {
        let mut config = ConsoleConfig::default();
        config.console.auto_connect = true;
        config.session.announce_available = false;

        let run = run_console(config, &["/disconnect", "/status"]);

        assert_eq!(run.exit, ActorExit::Shutdown);
        assert!(run.output.contents().contains("Session: offline"));
        assert!(!run.stack.is_connected());
    }

    /// Completion offers the first command extending the text, once.
    #[test]
    fn test_completion_is_single_shot() {
        let console = Console::new(
            ConsoleConfig::default(),
            ConsoleOutput::with_writer(BufferWriter::new(), ConsoleMode::Quiet),
        )
        .unwrap();
        let completer = console.completer();

        assert_eq!(completer.complete_at("me", 0), Some("message"));
        assert_eq!(completer.complete_at("me", 1), None);
        assert_eq!(completer.complete_at("message", 0), None);
        assert_eq!(completer.complete_at("x", 0), None);
    }

    /// Auto-connect puts the login in front of configured startup lines.
    #[test]
    fn test_auto_connect_is_queued_first() {
        let mut config = ConsoleConfig::default();
        config.console.prefix = '!';
        config.console.auto_connect = true;
        config.console.startup = vec!["!status".into()];
        let mut console = Console::new(
            config,
            ConsoleOutput::with_writer(BufferWriter::new(), ConsoleMode::Quiet),
        )
        .unwrap();
        console.queue_command("!help");

        assert_eq!(console.queued_commands(), &["!L", "!status", "!help"]);
    }

    /// Quiet mode never writes to the operator stream.
    #[test]
    fn test_quiet_mode_is_silent() {
        let output = BufferWriter::new();
        let mut config = ConsoleConfig::default();
        config.console.mode = ConsoleMode::Quiet;
        config.console.startup = vec!["/presence available".into(), "/help".into()];
        let console = Console::new(
            config,
            ConsoleOutput::with_writer(output.clone(), ConsoleMode::Quiet),
        )
        .unwrap();
        let source = ScriptedSource::new(["/status"]);
        let stack = ScriptedStack::new(console.event_sink(), source.prompts());
        let exit = console
            .start(stack, move || Ok(source))
            .unwrap()
            .wait()
            .unwrap();

        assert_eq!(exit, ActorExit::Shutdown);
        assert!(output.contents().is_empty());
    }

    #[test]
    fn test_invalid_prefix_refuses_to_start() {
        let mut config = ConsoleConfig::default();
        config.console.prefix = 'x';
        let result = Console::new(
            config,
            ConsoleOutput::with_writer(BufferWriter::new(), ConsoleMode::Quiet),
        );
        assert!(matches!(result, Err(ConsoleError::Config(_))));
    }
}

#[cfg(test)]
mod dispatch_property_tests {
    use super::*;

    #[derive(Default)]
    struct Target {
        calls: Vec<(String, Vec<String>)>,
    }

    fn record(name: &'static str) -> impl Fn(&mut Target, Vec<String>) -> anyhow::Result<CommandOutcome> {
        move |target: &mut Target, args: Vec<String>| {
            target.calls.push((name.to_string(), args));
            Ok(CommandOutcome::Continue)
        }
    }

    fn dispatcher() -> CommandDispatcher<Target> {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                "ping",
                ConsoleCommandAttribute::new("single part"),
                vec![ParameterDescriptor::new("payload").with_default("")],
                record("ping"),
            )
            .unwrap();
        registry
            .register(
                "pair_set",
                ConsoleCommandAttribute::new("two part"),
                vec![ParameterDescriptor::new("a"), ParameterDescriptor::new("b").with_default("B")],
                record("pair_set"),
            )
            .unwrap();
        registry
            .register("pair_clear", ConsoleCommandAttribute::new("two part"), Vec::new(), record("pair_clear"))
            .unwrap();
        CommandDispatcher::new(registry.build(), LineParser::new('/'))
    }

    /// Single-part commands live under the sentinel and take zero or one
    /// extra token here.
    #[test]
    fn test_single_part_dispatch() {
        let dispatcher = dispatcher();
        assert!(dispatcher.table().lookup("ping", None).is_some());

        let mut target = Target::default();
        for line in ["/ping", "/ping hello"] {
            assert!(matches!(
                dispatcher.execute(&mut target, line),
                DispatchResult::Completed(CommandOutcome::Continue)
            ));
        }
        assert_eq!(target.calls[0], ("ping".to_string(), vec![String::new()]));
        assert_eq!(target.calls[1], ("ping".to_string(), vec!["hello".to_string()]));
        assert!(matches!(
            dispatcher.execute(&mut target, "/ping a b"),
            DispatchResult::Rejected(UsageError::Arity { .. })
        ));
    }

    /// Two-part commands need the subcommand; a wrong or missing one is a
    /// usage error.
    #[test]
    fn test_two_part_dispatch() {
        let dispatcher = dispatcher();
        let mut target = Target::default();

        assert!(matches!(
            dispatcher.execute(&mut target, "/pair"),
            DispatchResult::Rejected(UsageError::MissingSubcommand(_))
        ));
        assert!(matches!(
            dispatcher.execute(&mut target, "/pair swap 1"),
            DispatchResult::Rejected(UsageError::UnknownSubcommand { .. })
        ));
        assert!(matches!(
            dispatcher.execute(&mut target, "/set 1"),
            DispatchResult::Rejected(UsageError::UnknownCommand(_))
        ));
        assert!(target.calls.is_empty());
    }

    /// `(a, b)` with one optional accepts one or two arguments only.
    #[test]
    fn test_arity_window() {
        let dispatcher = dispatcher();
        let mut target = Target::default();

        for (line, accepted) in [
            ("/pair set", false),
            ("/pair set 1", true),
            ("/pair set 1 2", true),
            ("/pair set 1 2 3", false),
        ] {
            let result = dispatcher.execute(&mut target, line);
            assert_eq!(matches!(result, DispatchResult::Completed(_)), accepted, "{line}");
        }
        assert_eq!(
            target.calls,
            vec![
                ("pair_set".to_string(), vec!["1".to_string(), "B".to_string()]),
                ("pair_set".to_string(), vec!["1".to_string(), "2".to_string()]),
            ]
        );
    }

    /// Empty and prefix-less lines never reach a handler.
    #[test]
    fn test_no_op_lines_dispatch_nothing() {
        let dispatcher = dispatcher();
        let mut target = Target::default();
        assert!(matches!(dispatcher.execute(&mut target, ""), DispatchResult::Ignored));
        assert!(matches!(dispatcher.execute(&mut target, "   "), DispatchResult::Ignored));
        assert!(matches!(
            dispatcher.execute(&mut target, "ping"),
            DispatchResult::Rejected(UsageError::NotACommand { prefix: '/' })
        ));
        assert!(target.calls.is_empty());
    }
}
