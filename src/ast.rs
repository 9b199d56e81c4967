/// The connective that follows a command on the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// Last command of the line; nothing follows.
    None,
    /// `&&`: the next command runs only if this one succeeded.
    And,
    /// `||`: the next command runs only if this one failed.
    Or,
}

impl Connector {
    pub fn as_str(self) -> &'static str {
        match self {
            Connector::None => "",
            Connector::And => "&&",
            Connector::Or => "||",
        }
    }
}

/// One command segment of a line, tagged with the connector after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalCommand {
    /// Trimmed, still unparsed segment text (may contain `|` and redirections).
    pub text: String,
    pub operator: Connector,
}

/// Standard input/output rebinding pulled out of a token list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectionSpec {
    pub stdin_path: Option<String>,
    pub stdout_path: Option<String>,
    /// `>>` rather than `>`.
    pub append: bool,
}
