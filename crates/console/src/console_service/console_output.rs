use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// How much the console says to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleMode {
    /// Every line is printed and a prompt follows when requested.
    #[default]
    Interactive,
    /// Auto-responder: nothing reaches the operator stream, lines are only
    /// logged at debug level.
    Quiet,
}

struct OutputInner {
    writer: Box<dyn Write + Send>,
    last_was_prompt: bool,
}

/// Line-atomic console writer plus the prompt state shared between the input
/// thread and asynchronous event delivery.
pub struct ConsoleOutput {
    inner: Mutex<OutputInner>,
    accepting_input: AtomicBool,
    /// The input loop is sitting at a prompt waiting for the operator.
    reading: AtomicBool,
    connected: AtomicBool,
    mode: ConsoleMode,
}

impl ConsoleOutput {
    pub fn stdout(mode: ConsoleMode) -> Self {
        Self::with_writer(io::stdout(), mode)
    }

    pub fn with_writer(writer: impl Write + Send + 'static, mode: ConsoleMode) -> Self {
        Self {
            inner: Mutex::new(OutputInner {
                writer: Box::new(writer),
                last_was_prompt: true,
            }),
            accepting_input: AtomicBool::new(false),
            reading: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            mode,
        }
    }

    pub fn mode(&self) -> ConsoleMode {
        self.mode
    }

    /// Writes one message. `tag` renders as `tag: message`; `wants_prompt`
    /// records that the next thing on screen is a prompt. The prompt is
    /// re-rendered only while the operator is sitting at one, otherwise the
    /// input loop prints it itself.
    ///
    /// The whole message goes out in a single write under the lock, so
    /// concurrent callers never tear each other's lines.
    pub fn output(&self, message: impl AsRef<str>, tag: Option<&str>, wants_prompt: bool) {
        let message = message.as_ref();
        let mut inner = self.inner.lock();

        if self.mode == ConsoleMode::Quiet {
            debug!(target: "chatline::console", tag = tag.unwrap_or(""), "{}", message);
            inner.last_was_prompt = wants_prompt;
            return;
        }

        let mut text = String::new();
        if self.is_accepting_input() && inner.last_was_prompt {
            text.push('\n');
        }
        inner.last_was_prompt = wants_prompt;

        match tag {
            Some(tag) => text.push_str(&format!("{tag}: {message}\n")),
            None => {
                text.push_str(message);
                text.push('\n');
            }
        }
        if wants_prompt && self.is_reading() {
            text.push_str(&self.prompt());
        }

        // A broken console stream is not worth killing the session over.
        let _ = inner
            .writer
            .write_all(text.as_bytes())
            .and_then(|_| inner.writer.flush());
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.output(message, None, true);
    }

    pub fn tagged(&self, tag: &str, message: impl AsRef<str>) {
        self.output(message, Some(tag), true);
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.output(message, Some("Error"), false);
    }

    /// Two-state indicator rendered before each operator line.
    pub fn prompt(&self) -> String {
        format!(
            "[{}]:",
            if self.is_connected() {
                "connected"
            } else {
                "offline"
            }
        )
    }

    pub fn last_was_prompt(&self) -> bool {
        self.inner.lock().last_was_prompt
    }

    pub fn is_accepting_input(&self) -> bool {
        self.accepting_input.load(Ordering::SeqCst)
    }

    pub fn set_accepting_input(&self, accepting: bool) {
        self.accepting_input.store(accepting, Ordering::SeqCst);
    }

    pub fn is_reading(&self) -> bool {
        self.reading.load(Ordering::SeqCst)
    }

    pub fn set_reading(&self, reading: bool) {
        self.reading.store(reading, Ordering::SeqCst);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Mirrors the session's connection flag for prompt rendering. Only the
    /// session owner writes it.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

/// Cloneable in-memory writer, handy for capturing console output.
#[derive(Debug, Clone, Default)]
pub struct BufferWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for BufferWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
