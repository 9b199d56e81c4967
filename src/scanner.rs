/// What a single character means once quoting and escaping are taken into account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scanned {
    /// A backslash that escapes the next character; it is consumed.
    Escape,
    /// A character following a backslash, taken literally.
    Escaped(char),
    /// A `'` or `"` that opened or closed a quoted run.
    Quote,
    /// A character inside single or double quotes.
    Quoted(char),
    /// An ordinary character outside any quotes.
    Bare(char),
}

/// Quote/escape state machine shared by the splitter and the tokenizer.
///
/// A backslash escapes the following character in every state, a `'`
/// toggles single quoting unless inside double quotes, and vice versa.
#[derive(Debug, Default, Clone)]
pub struct QuoteState {
    single: bool,
    double: bool,
    escaped: bool,
}

impl QuoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the machine by one character and classify it.
    pub fn step(&mut self, ch: char) -> Scanned {
        if self.escaped {
            self.escaped = false;
            return Scanned::Escaped(ch);
        }
        match ch {
            '\\' => {
                self.escaped = true;
                Scanned::Escape
            }
            '\'' if !self.double => {
                self.single = !self.single;
                Scanned::Quote
            }
            '"' if !self.single => {
                self.double = !self.double;
                Scanned::Quote
            }
            c if self.is_quoted() => Scanned::Quoted(c),
            c => Scanned::Bare(c),
        }
    }

    /// True while inside single or double quotes.
    pub fn is_quoted(&self) -> bool {
        self.single || self.double
    }

    /// True if the last character fed was an unconsumed backslash.
    pub fn is_escaping(&self) -> bool {
        self.escaped
    }
}

/// Byte offset of the first occurrence of `needle` that starts outside
/// quotes and is not escaped.
pub fn find_unquoted(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut state = QuoteState::new();
    for (idx, ch) in haystack.char_indices() {
        if let Scanned::Bare(_) = state.step(ch) {
            if haystack[idx..].starts_with(needle) {
                return Some(idx);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_bare_operator() {
        assert_eq!(find_unquoted("a && b", "&&"), Some(2));
        assert_eq!(find_unquoted("a || b", "&&"), None);
    }

    #[test]
    fn ignores_operator_in_quotes() {
        assert_eq!(find_unquoted("echo 'a && b'", "&&"), None);
        assert_eq!(find_unquoted(r#"echo "x || y" || z"#, "||"), Some(14));
    }

    #[test]
    fn escaped_first_char_is_skipped() {
        assert_eq!(find_unquoted(r"echo \&& b", "&&"), None);
        assert_eq!(find_unquoted(r"a \&&& b", "&&"), Some(4));
    }

    #[test]
    fn single_quote_inside_double_is_literal() {
        let mut state = QuoteState::new();
        let kinds: Vec<Scanned> = "\"'\"".chars().map(|c| state.step(c)).collect();
        assert_eq!(kinds, vec![Scanned::Quote, Scanned::Quoted('\''), Scanned::Quote]);
        assert!(!state.is_quoted());
    }

    #[test]
    fn backslash_escapes_inside_quotes() {
        let mut state = QuoteState::new();
        state.step('"');
        assert_eq!(state.step('\\'), Scanned::Escape);
        assert!(state.is_escaping());
        assert_eq!(state.step('"'), Scanned::Escaped('"'));
        assert!(state.is_quoted());
    }
}
