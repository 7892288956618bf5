//! The operator input loop.
//!
//! Runs on its own thread. Each iteration takes a pre-queued line if one is
//! left, otherwise prompts the operator, hands the line to a [`CommandSink`]
//! and, when the sink reports [`CommandOutcome::BlockUntilReleased`], parks on
//! the [`BlockingGate`] until someone releases it. Only one command is ever in
//! flight.

use super::blocking_gate::BlockingGate;
use super::completion::CommandCompleter;
use super::console_command::CommandOutcome;
use super::console_output::ConsoleOutput;
use crate::error::{ConsoleError, ConsoleResult};
use parking_lot::Mutex;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};

/// Where operator lines come from.
pub trait LineSource {
    /// Reads one line after showing `prompt`. `Ok(None)` means end of input.
    fn read_line(&mut self, prompt: &str) -> ConsoleResult<Option<String>>;
}

/// Where the loop sends lines and learns whether to block.
pub trait CommandSink: Send {
    fn submit(&mut self, line: String) -> ConsoleResult<CommandOutcome>;

    /// End of input was reached; the loop is about to stop.
    fn finish(&mut self) {}
}

impl<F> CommandSink for F
where
    F: FnMut(String) -> ConsoleResult<CommandOutcome> + Send,
{
    fn submit(&mut self, line: String) -> ConsoleResult<CommandOutcome> {
        self(line)
    }
}

/// Input loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputState {
    AcceptingInput,
    AwaitingRelease,
    Stopped,
}

pub struct InputLoop<K> {
    sink: K,
    queued: VecDeque<String>,
    gate: Arc<BlockingGate>,
    output: Arc<ConsoleOutput>,
    state: Arc<Mutex<InputState>>,
}

impl<K: CommandSink> InputLoop<K> {
    pub fn new(sink: K, gate: Arc<BlockingGate>, output: Arc<ConsoleOutput>) -> Self {
        Self {
            sink,
            queued: VecDeque::new(),
            gate,
            output,
            state: Arc::new(Mutex::new(InputState::AcceptingInput)),
        }
    }

    /// Queues a synthetic command. Queued commands run in FIFO order before
    /// the operator is prompted. Only possible before the loop starts, since
    /// starting moves the loop onto its thread.
    pub fn queue_command(&mut self, line: impl Into<String>) {
        self.queued.push_back(line.into());
    }

    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    /// Observer for the loop's current state.
    pub fn state_handle(&self) -> Arc<Mutex<InputState>> {
        Arc::clone(&self.state)
    }

    fn set_state(&self, state: InputState) {
        *self.state.lock() = state;
        self.output
            .set_accepting_input(state == InputState::AcceptingInput);
    }

    fn next_line<S: LineSource>(&mut self, source: &mut S) -> ConsoleResult<Option<String>> {
        if let Some(line) = self.queued.pop_front() {
            debug!(target: "chatline::console", line = %line, "running queued command");
            return Ok(Some(line));
        }
        let prompt = self.output.prompt();
        self.output.set_reading(true);
        let line = source.read_line(&prompt);
        self.output.set_reading(false);
        Ok(line?.map(|line| line.trim().to_string()))
    }

    /// Runs until end of input or until the sink goes away.
    pub fn run<S: LineSource>(mut self, source: &mut S) -> ConsoleResult<()> {
        self.set_state(InputState::AcceptingInput);
        let result = loop {
            let line = match self.next_line(source) {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!(target: "chatline::console", "end of input, console stopping");
                    break Ok(());
                }
                Err(err) => {
                    error!(target: "chatline::console", error = %err, "failed to read input");
                    break Err(err);
                }
            };

            let outcome = match self.sink.submit(line) {
                Ok(outcome) => outcome,
                Err(ConsoleError::Closed) => {
                    debug!(target: "chatline::console", "command sink closed");
                    break Ok(());
                }
                Err(err) => {
                    warn!(target: "chatline::console", error = %err, "command submission failed");
                    CommandOutcome::Continue
                }
            };

            if outcome.blocks() {
                self.set_state(InputState::AwaitingRelease);
                debug!(target: "chatline::console", "input suspended until release");
                self.gate.wait();
                debug!(target: "chatline::console", "input released");
            }
            self.set_state(InputState::AcceptingInput);
        };

        self.sink.finish();
        self.set_state(InputState::Stopped);
        result
    }
}

impl<K: CommandSink + 'static> InputLoop<K> {
    /// Starts the loop on a dedicated thread. The source is built on that
    /// thread, so it does not have to be `Send`.
    pub fn spawn<F, S>(self, make_source: F) -> ConsoleResult<JoinHandle<ConsoleResult<()>>>
    where
        F: FnOnce() -> ConsoleResult<S> + Send + 'static,
        S: LineSource,
    {
        thread::Builder::new()
            .name("chatline-input".into())
            .spawn(move || match make_source() {
                Ok(mut source) => self.run(&mut source),
                Err(err) => {
                    error!(target: "chatline::console", error = %err, "input source unavailable");
                    let mut input = self;
                    input.sink.finish();
                    input.set_state(InputState::Stopped);
                    Err(err)
                }
            })
            .map_err(ConsoleError::Io)
    }
}

/// Line editor with history and command-name completion.
pub struct EditorSource {
    editor: Editor<CommandCompleter, DefaultHistory>,
    history: Option<PathBuf>,
    history_warned: bool,
}

impl EditorSource {
    pub fn new(completer: CommandCompleter, history: Option<PathBuf>) -> ConsoleResult<Self> {
        let mut editor = Editor::new().map_err(readline_error)?;
        editor.set_helper(Some(completer));

        if let Some(path) = &history {
            match editor.load_history(path) {
                Ok(()) => debug!(target: "chatline::console", path = %path.display(), "history loaded"),
                // Missing history on first run is expected.
                Err(err) if !path.exists() => {
                    debug!(target: "chatline::console", error = %err, "no history yet")
                }
                Err(err) => warn!(
                    target: "chatline::console",
                    path = %path.display(),
                    error = %err,
                    "history not loaded"
                ),
            }
        }
        Ok(Self {
            editor,
            history,
            history_warned: false,
        })
    }

    /// Adds a line to the history and persists it. A failing history file is
    /// reported once, then ignored.
    fn remember(&mut self, line: &str) {
        if let Err(err) = self.editor.add_history_entry(line) {
            debug!(target: "chatline::console", error = %err, "history entry dropped");
        }
        let Some(path) = &self.history else {
            return;
        };
        if let Err(err) = self.editor.save_history(path) {
            if !self.history_warned {
                self.history_warned = true;
                warn!(
                    target: "chatline::console",
                    path = %path.display(),
                    error = %err,
                    "cannot save history"
                );
            }
        }
    }
}

impl LineSource for EditorSource {
    fn read_line(&mut self, prompt: &str) -> ConsoleResult<Option<String>> {
        loop {
            let Some(result) = classify_read(self.editor.readline(prompt)) else {
                continue;
            };
            if let Ok(Some(line)) = &result {
                self.remember(line);
            }
            return result;
        }
    }
}

/// Maps one editor read onto the loop's terms. `None` means read again: Ctrl-C
/// only clears the current line.
fn classify_read(result: rustyline::Result<String>) -> Option<ConsoleResult<Option<String>>> {
    match result {
        Ok(line) => Some(Ok(Some(line))),
        Err(ReadlineError::Interrupted) => None,
        Err(ReadlineError::Eof) => Some(Ok(None)),
        Err(err) => Some(Err(readline_error(err))),
    }
}

fn readline_error(err: ReadlineError) -> ConsoleError {
    match err {
        ReadlineError::Io(io) => ConsoleError::Io(io),
        other => ConsoleError::Io(std::io::Error::new(std::io::ErrorKind::Other, other.to_string())),
    }
}

/// Fixed script of lines. Records every prompt it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSource {
    pub fn new<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }
}

impl LineSource for ScriptedSource {
    fn read_line(&mut self, prompt: &str) -> ConsoleResult<Option<String>> {
        self.prompts.lock().push(prompt.to_string());
        Ok(self.lines.pop_front())
    }
}
