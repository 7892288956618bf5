//! Console service building blocks: command registration, parsing,
//! dispatch, the input loop and console output.

pub mod blocking_gate;
pub mod command_dispatcher;
pub mod command_registry;
pub mod command_tokenizer;
pub mod completion;
pub mod console_command;
pub mod console_output;
pub mod input_loop;
pub mod line_parser;

pub use blocking_gate::BlockingGate;
pub use command_dispatcher::{CommandDispatcher, DispatchResult};
pub use command_registry::{CommandRegistry, CommandTable, HelpEntry, SEPARATOR};
pub use command_tokenizer::tokenize;
pub use completion::CommandCompleter;
pub use console_command::{
    CommandDescriptor, CommandHandler, CommandOutcome, ConsoleCommandAttribute,
    ParameterDescriptor,
};
pub use console_output::{BufferWriter, ConsoleMode, ConsoleOutput};
pub use input_loop::{CommandSink, EditorSource, InputLoop, InputState, LineSource, ScriptedSource};
pub use line_parser::{LineParser, ParsedInput, ParsedLine, DEFAULT_PREFIX};
