use crate::error::UsageError;

/// Splits a command line into words using POSIX shell quoting.
///
/// Single quotes are literal, double quotes honour `\"` and `\\`, and a
/// backslash outside quotes escapes the next character. Adjacent quoted and
/// unquoted fragments join into one word.
pub fn tokenize(input: &str) -> Result<Vec<String>, UsageError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => current.push(c),
                        None => return Err(UsageError::Tokenize("no closing quotation".into())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\' | '$' | '`')) => current.push(c),
                            Some('\n') => {}
                            Some(c) => {
                                current.push('\\');
                                current.push(c);
                            }
                            None => {
                                return Err(UsageError::Tokenize("no closing quotation".into()))
                            }
                        },
                        Some(c) => current.push(c),
                        None => return Err(UsageError::Tokenize("no closing quotation".into())),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => current.push(c),
                    None => return Err(UsageError::Tokenize("no escaped character".into())),
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            tokenize("message send  1555   hi").unwrap(),
            vec!["message", "send", "1555", "hi"]
        );
    }

    #[test]
    fn double_quotes_keep_spaces() {
        assert_eq!(
            tokenize(r#"message send 1555 "hello there""#).unwrap(),
            vec!["message", "send", "1555", "hello there"]
        );
    }

    #[test]
    fn single_quotes_are_literal() {
        assert_eq!(tokenize(r#"'a \" b'"#).unwrap(), vec![r#"a \" b"#]);
    }

    #[test]
    fn escapes_inside_double_quotes() {
        assert_eq!(tokenize(r#""say \"hi\"""#).unwrap(), vec![r#"say "hi""#]);
        assert_eq!(tokenize(r#""a\nb""#).unwrap(), vec![r"a\nb"]);
    }

    #[test]
    fn backslash_escapes_space() {
        assert_eq!(tokenize(r"hello\ world x").unwrap(), vec!["hello world", "x"]);
    }

    #[test]
    fn adjacent_fragments_join() {
        assert_eq!(tokenize(r#"ab"c d"'e'"#).unwrap(), vec!["abc de"]);
    }

    #[test]
    fn empty_quotes_produce_empty_word() {
        assert_eq!(tokenize(r#"a "" b"#).unwrap(), vec!["a", "", "b"]);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(matches!(tokenize(r#"send "oops"#), Err(UsageError::Tokenize(_))));
        assert!(matches!(tokenize("send 'oops"), Err(UsageError::Tokenize(_))));
    }

    #[test]
    fn trailing_backslash_is_an_error() {
        assert!(tokenize("send \\").is_err());
    }
}
