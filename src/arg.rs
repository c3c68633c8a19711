use std::{iter::Peekable, str::CharIndices};

/// Iterates over the individual arguments in a command line accounting for quoted arguments.
///
/// A line ending in a space yields one final empty argument, which is how completion learns that
/// the invoker has started typing a new argument.
pub struct ArgumentTraverser<'cmd> {
    command: &'cmd str,
    chars: Peekable<CharIndices<'cmd>>,
    anchor: usize,
    index: usize,
}

impl<'cmd> ArgumentTraverser<'cmd> {
    /// Creates a traverser over the given command line, stripping off the initial '/' if it
    /// exists.
    pub fn new(command: &'cmd str) -> Self {
        let command = command.strip_prefix('/').unwrap_or(command);
        let mut traverser = ArgumentTraverser {
            command,
            chars: command.char_indices().peekable(),
            anchor: 0,
            index: 0,
        };
        traverser.skip_leading_spaces();
        traverser
    }

    /// Returns the remaining portion of the line, including the argument which was last read.
    pub fn gobble_remaining(&mut self) -> &'cmd str {
        self.index = self.command.len();
        &self.command[self.anchor ..]
    }

    /// Returns whether or not this traverser has more arguments. If this function returns true,
    /// then `next` will not return `None`.
    pub fn has_next(&self) -> bool {
        self.index < self.command.len()
    }

    fn skip_leading_spaces(&mut self) {
        while matches!(self.chars.peek().copied(), Some((_, ' '))) {
            self.index += 1;
            self.chars.next();
        }
    }
}

impl<'cmd> Iterator for ArgumentTraverser<'cmd> {
    type Item = &'cmd str;

    /// Returns the next raw argument, quotes included, or `None` if no arguments remain.
    fn next(&mut self) -> Option<&'cmd str> {
        if self.index >= self.command.len() {
            return None;
        }

        self.skip_leading_spaces();

        self.anchor = self.index;

        // Single or double quotes
        let mut quote_type: char = '\0';
        // Whether we're in quotes and should ignore spaces
        let mut in_quotes = false;
        // Used for escaping quotes with the '\' character
        let mut ignore_quote = false;

        self.index = loop {
            if !in_quotes {
                if let Some((index, ' ')) = self.chars.peek().copied() {
                    break index;
                }
            }

            let ch = match self.chars.next() {
                Some((_, ch)) => ch,
                None => break self.command.len(),
            };

            if (ch == '\'' || ch == '"') && !ignore_quote {
                if in_quotes {
                    if ch == quote_type {
                        in_quotes = false;
                    }
                } else {
                    quote_type = ch;
                    in_quotes = true;
                }
            }

            ignore_quote = ch == '\\' && !ignore_quote;
        };

        Some(&self.command[self.anchor .. self.index])
    }
}

/// Strips one pair of matching surrounding quotes.
pub fn unquote(arg: &str) -> &str {
    if arg.len() < 2 {
        return arg;
    }

    let first = arg.as_bytes()[0];
    let last = arg.as_bytes()[arg.len() - 1];
    if first == last && (first == b'"' || first == b'\'') {
        &arg[1 .. arg.len() - 1]
    } else {
        arg
    }
}

/// Splits a raw command line into tokens: the label first, then each argument with surrounding
/// quotes removed.
pub fn tokenize(line: &str) -> Vec<String> {
    ArgumentTraverser::new(line)
        .map(|arg| unquote(arg).to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn splits_on_spaces() {
        assert_eq!(tokenize("/give  item sword"), ["give", "item", "sword"]);
        assert_eq!(tokenize("give"), ["give"]);
        assert!(tokenize("").is_empty());
        assert!(tokenize("/").is_empty());
    }

    #[test]
    fn trailing_space_starts_an_empty_argument() {
        assert_eq!(tokenize("give item "), ["give", "item", ""]);
        assert_eq!(tokenize("give "), ["give", ""]);
    }

    #[test]
    fn quoted_arguments_stay_together() {
        assert_eq!(
            tokenize(r#"msg Steve "hello there" 'it''s'"#),
            ["msg", "Steve", "hello there", "it''s"]
        );
        assert_eq!(tokenize(r#"say "a \" b""#), ["say", r#"a \" b"#]);
    }

    #[test]
    fn gobble_returns_the_rest_of_the_line() {
        let mut args = ArgumentTraverser::new("/broadcast &cServer restarting soon");
        assert_eq!(args.next(), Some("broadcast"));
        assert_eq!(args.next(), Some("&cServer"));
        assert!(args.has_next());
        assert_eq!(args.gobble_remaining(), "&cServer restarting soon");
        assert!(!args.has_next());
        assert_eq!(args.next(), None);
    }
}
