use tracing::trace;

use crate::ast::{ConditionalCommand, Connector};
use crate::scanner::find_unquoted;

/// Split a line into command segments joined by unquoted `&&` / `||`.
///
/// Each segment is tagged with the connector that follows it; the last one
/// gets [`Connector::None`]. Segments that are empty after trimming are
/// dropped, so `&& ls ||` yields a single `ls` tagged `||`.
pub fn split(line: &str) -> Vec<ConditionalCommand> {
    let mut commands = Vec::new();
    let mut rest = line.trim();

    while !rest.is_empty() {
        let and = find_unquoted(rest, "&&");
        let or = find_unquoted(rest, "||");

        let (end, operator) = match (and, or) {
            (None, None) => (rest.len(), Connector::None),
            (Some(a), Some(o)) if o < a => (o, Connector::Or),
            (Some(a), _) => (a, Connector::And),
            (None, Some(o)) => (o, Connector::Or),
        };

        let text = rest[..end].trim();
        if !text.is_empty() {
            trace!(segment = text, op = operator.as_str(), "split segment");
            commands.push(ConditionalCommand {
                text: text.to_string(),
                operator,
            });
        }

        rest = &rest[end + operator.as_str().len()..];
    }

    commands
}

/// Left-to-right `&&` / `||` evaluation state for one line.
///
/// Skipped commands carry the previous outcome forward, so in
/// `false && a && b || c` both `a` and `b` are skipped and `c` runs.
#[derive(Debug)]
pub struct ShortCircuit {
    prev_success: bool,
    prev_op: Connector,
}

impl Default for ShortCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortCircuit {
    pub fn new() -> Self {
        Self {
            prev_success: true,
            prev_op: Connector::None,
        }
    }

    /// Whether the next command should run, given the connector before it.
    pub fn should_run(&self) -> bool {
        match self.prev_op {
            Connector::None => true,
            Connector::And => self.prev_success,
            Connector::Or => !self.prev_success,
        }
    }

    /// Record that `command` was skipped or was a no-op; the outcome carries over.
    pub fn carry(&mut self, command: &ConditionalCommand) {
        self.prev_op = command.operator;
    }

    /// Record the outcome of running `command`.
    pub fn record(&mut self, command: &ConditionalCommand, success: bool) {
        self.prev_success = success;
        self.prev_op = command.operator;
    }
}
