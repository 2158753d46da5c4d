//! Shell-like command-line splitting for the trigger command.
//!
//! Splits a single command string into a program name and argument list, as
//! expected by `std::process::Command`. Honors single quotes, double quotes,
//! and backslash escapes. Never fails: malformed input (e.g. an unterminated
//! quote) yields a best-effort token list.

// ---------------------------------------------------------------------------
// split_command
// ---------------------------------------------------------------------------

/// Split `command` into `(program, args)`.
///
/// A space terminates a token only outside quotes; quote characters are
/// stripped from the emitted tokens; a backslash escapes the next character.
/// An empty command yields an empty program name and no arguments — the
/// caller decides whether to skip execution.
pub fn split_command(command: &str) -> (String, Vec<String>) {
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in command.chars() {
        if escaped {
            current.push(c);
            in_token = true;
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                in_token = true;
            }
            '\'' | '"' => {
                if quote == Some(c) {
                    quote = None;
                } else if quote.is_none() {
                    quote = Some(c);
                    in_token = true;
                } else {
                    current.push(c);
                }
            }
            ' ' if quote.is_none() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.push(c);
                in_token = true;
            }
        }
    }
    // An unterminated quote or trailing escape simply closes at end-of-input.
    if in_token {
        tokens.push(current);
    }

    let mut iter = tokens.into_iter();
    (iter.next().unwrap_or_default(), iter.collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::split_command;
    use rstest::rstest;

    fn split(command: &str) -> (String, Vec<String>) {
        split_command(command)
    }

    #[test]
    fn plain_words() {
        let (program, args) = split("systemctl reload nginx");
        assert_eq!(program, "systemctl");
        assert_eq!(args, vec!["reload", "nginx"]);
    }

    #[test]
    fn double_quotes_group_and_are_stripped() {
        let (program, args) = split(r#"echo "a b" c"#);
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["a b", "c"]);
    }

    #[test]
    fn single_quotes_group_and_are_stripped() {
        let (program, args) = split("run -x 'y z'");
        assert_eq!(program, "run");
        assert_eq!(args, vec!["-x", "y z"]);
    }

    #[test]
    fn backslash_escapes_a_space() {
        let (program, args) = split(r"cp a\ b dst");
        assert_eq!(program, "cp");
        assert_eq!(args, vec!["a b", "dst"]);
    }

    #[test]
    fn backslash_escapes_a_quote() {
        let (program, args) = split(r#"echo \"hi\""#);
        assert_eq!(program, "echo");
        assert_eq!(args, vec![r#""hi""#]);
    }

    #[test]
    fn opposite_quote_is_literal_inside_quotes() {
        let (program, args) = split(r#"echo "it's fine""#);
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["it's fine"]);
    }

    #[test]
    fn unterminated_quote_closes_at_end_of_input() {
        let (program, args) = split(r#"echo "half done"#);
        assert_eq!(program, "echo");
        assert_eq!(args, vec!["half done"]);
    }

    #[test]
    fn quoted_empty_token_is_preserved() {
        let (program, args) = split(r#"prog "" tail"#);
        assert_eq!(program, "prog");
        assert_eq!(args, vec!["", "tail"]);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_or_blank_yields_empty_program(#[case] input: &str) {
        let (program, args) = split(input);
        assert_eq!(program, "");
        assert!(args.is_empty());
    }

    #[test]
    fn repeated_spaces_do_not_emit_empty_tokens() {
        let (program, args) = split("a   b");
        assert_eq!(program, "a");
        assert_eq!(args, vec!["b"]);
    }
}
