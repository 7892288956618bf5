use rustyline::completion::Completer;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// Tab completion over top-level command names.
///
/// Only state 0 ever yields a candidate: the first registered name that
/// extends the typed text. Later states always return `None`.
#[derive(Debug, Clone)]
pub struct CommandCompleter {
    names: Vec<String>,
    prefix: char,
}

impl CommandCompleter {
    pub fn new<I, S>(names: I, prefix: char) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            prefix,
        }
    }

    pub fn complete_at(&self, text: &str, state: usize) -> Option<&str> {
        if state != 0 {
            return None;
        }
        self.names
            .iter()
            .find(|name| name.starts_with(text) && name.as_str() != text)
            .map(String::as_str)
    }
}

impl Completer for CommandCompleter {
    type Candidate = String;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<String>)> {
        let head = &line[..pos];
        let Some(word) = head.strip_prefix(self.prefix) else {
            return Ok((pos, Vec::new()));
        };
        if word.contains(char::is_whitespace) {
            return Ok((pos, Vec::new()));
        }
        let candidates = (0..)
            .map_while(|state| self.complete_at(word, state))
            .map(str::to_string)
            .collect();
        Ok((self.prefix.len_utf8(), candidates))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

impl Helper for CommandCompleter {}
