use super::command_registry::CommandTable;
use super::command_tokenizer::tokenize;
use crate::error::UsageError;

/// Default command prefix.
pub const DEFAULT_PREFIX: char = '/';

/// One operator line resolved against the command table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInput {
    pub command: String,
    pub subcommand: Option<String>,
    pub arguments: Vec<String>,
}

/// Outcome of parsing a raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Nothing worth reporting (blank or single-character input).
    Empty,
    Command(ParsedInput),
}

/// Turns raw input lines into [`ParsedInput`] values.
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    prefix: char,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl LineParser {
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn parse<T>(&self, line: &str, table: &CommandTable<T>) -> Result<ParsedLine, UsageError> {
        let line = line.trim_end();
        if line.chars().count() <= 1 {
            return Ok(ParsedLine::Empty);
        }

        let Some(body) = line.strip_prefix(self.prefix) else {
            return Err(UsageError::NotACommand {
                prefix: self.prefix,
            });
        };

        let mut tokens = tokenize(body)?
            .into_iter()
            .filter(|token| !token.is_empty());

        let command = tokens
            .next()
            .ok_or_else(|| UsageError::UnknownCommand(String::new()))?;
        if !table.contains(&command) {
            return Err(UsageError::UnknownCommand(command));
        }

        if table.is_bare(&command) {
            return Ok(ParsedLine::Command(ParsedInput {
                command,
                subcommand: None,
                arguments: tokens.collect(),
            }));
        }

        let subcommand = tokens
            .next()
            .ok_or_else(|| UsageError::MissingSubcommand(command.clone()))?;
        if table.lookup(&command, Some(&subcommand)).is_none() {
            return Err(UsageError::UnknownSubcommand {
                command,
                subcommand,
            });
        }

        Ok(ParsedLine::Command(ParsedInput {
            command,
            subcommand: Some(subcommand),
            arguments: tokens.collect(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console_service::{
        CommandOutcome, CommandRegistry, ConsoleCommandAttribute, ParameterDescriptor,
    };

    fn table() -> CommandTable<()> {
        let mut registry = CommandRegistry::<()>::new();
        registry
            .register("disconnect", ConsoleCommandAttribute::new("d"), Vec::new(), |_, _| {
                Ok(CommandOutcome::Continue)
            })
            .unwrap();
        registry
            .register(
                "message_send",
                ConsoleCommandAttribute::new("m"),
                vec![ParameterDescriptor::new("number"), ParameterDescriptor::new("content")],
                |_, _| Ok(CommandOutcome::Continue),
            )
            .unwrap();
        registry.build()
    }

    fn parse(line: &str) -> Result<ParsedLine, UsageError> {
        LineParser::default().parse(line, &table())
    }

    #[test]
    fn blank_and_single_char_lines_are_noops() {
        assert_eq!(parse("").unwrap(), ParsedLine::Empty);
        assert_eq!(parse("   \n").unwrap(), ParsedLine::Empty);
        assert_eq!(parse("/").unwrap(), ParsedLine::Empty);
        assert_eq!(parse("x").unwrap(), ParsedLine::Empty);
    }

    #[test]
    fn prefixless_line_is_not_a_command() {
        assert_eq!(parse("hello").unwrap_err(), UsageError::NotACommand { prefix: '/' });
    }

    #[test]
    fn quoted_arguments_survive() {
        let parsed = parse(r#"/message send 1555 "hello world"  "#).unwrap();
        assert_eq!(
            parsed,
            ParsedLine::Command(ParsedInput {
                command: "message".into(),
                subcommand: Some("send".into()),
                arguments: vec!["1555".into(), "hello world".into()],
            })
        );
    }

    #[test]
    fn bare_command_takes_all_tokens_as_arguments() {
        let parsed = parse("/disconnect now").unwrap();
        let ParsedLine::Command(input) = parsed else {
            panic!("expected command");
        };
        assert_eq!(input.subcommand, None);
        assert_eq!(input.arguments, vec!["now"]);
    }

    #[test]
    fn unknown_and_missing_subcommands() {
        assert_eq!(parse("/nope").unwrap_err(), UsageError::UnknownCommand("nope".into()));
        assert_eq!(parse("/message").unwrap_err(), UsageError::MissingSubcommand("message".into()));
        assert_eq!(
            parse("/message shout").unwrap_err(),
            UsageError::UnknownSubcommand {
                command: "message".into(),
                subcommand: "shout".into()
            }
        );
    }

    #[test]
    fn custom_prefix() {
        let parser = LineParser::new('!');
        assert!(matches!(parser.parse("!disconnect", &table()), Ok(ParsedLine::Command(_))));
        assert!(parser.parse("/disconnect", &table()).is_err());
    }
}
