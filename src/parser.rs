use tracing::warn;

use crate::scanner::{QuoteState, Scanned};

/// Split one command segment into argument tokens.
///
/// Quotes group whitespace and are removed; a backslash makes the next
/// character literal in any quoting state. Empty tokens are never produced,
/// so `echo ""` yields just `echo`.
///
/// Malformed input does not fail: an unterminated quote keeps what was
/// collected so far and a trailing lone backslash is dropped. Both are
/// logged at `warn` level.
pub fn tokenize(segment: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut state = QuoteState::new();

    for ch in segment.chars() {
        match state.step(ch) {
            Scanned::Escape | Scanned::Quote => {}
            Scanned::Escaped(c) | Scanned::Quoted(c) => current.push(c),
            Scanned::Bare(c) if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            Scanned::Bare(c) => current.push(c),
        }
    }

    if state.is_quoted() {
        warn!(segment, "unterminated quote");
    }
    if state.is_escaping() {
        warn!(segment, "trailing backslash dropped");
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}
