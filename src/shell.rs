use std::io;
use std::sync::Arc;

use tracing::debug;

use crate::builtins::{self, BuiltinAction};
use crate::conditional::{self, ShortCircuit};
use crate::error::Result;
use crate::executor;
use crate::expander::expand;
use crate::parser::tokenize;
use crate::pipeline;
use crate::redirect::extract_redirections;
use crate::registry::ProcessRegistry;

/// What the REPL should do after a line has been run.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Continue,
    /// The `exit` builtin ran.
    Exit,
}

/// Result of one conditional segment that did not fail.
#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Ran,
    /// Nothing left to execute after tokenizing; short-circuit state is untouched.
    Empty,
    Exit,
}

/// Line-level interpreter: splits on `&&`/`||` and dispatches each segment.
pub struct Shell {
    registry: Arc<ProcessRegistry>,
}

impl Shell {
    pub fn new(registry: Arc<ProcessRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ProcessRegistry> {
        &self.registry
    }

    /// Run every segment of `line`, honoring `&&` / `||` short-circuiting.
    /// Segment failures are printed to stderr and never end the line early.
    pub fn run_line(&self, line: &str) -> LineOutcome {
        let mut gate = ShortCircuit::new();

        for command in conditional::split(line) {
            if !gate.should_run() {
                debug!(segment = %command.text, "skipped");
                gate.carry(&command);
                continue;
            }

            match self.run_segment(&command.text) {
                Ok(Segment::Ran) => gate.record(&command, true),
                Ok(Segment::Empty) => gate.carry(&command),
                Ok(Segment::Exit) => return LineOutcome::Exit,
                Err(e) => {
                    eprintln!("pipesh: {e}");
                    debug!(segment = %command.text, status = e.status_code(), "segment failed");
                    gate.record(&command, false);
                }
            }
        }

        LineOutcome::Continue
    }

    fn run_segment(&self, text: &str) -> Result<Segment> {
        if text.contains('|') {
            debug!(segment = text, "pipeline");
            pipeline::run_pipeline(text, &self.registry)?;
            return Ok(Segment::Ran);
        }

        let (argv, redirection) = extract_redirections(expand(tokenize(text)));
        let Some(program) = argv.first() else {
            return Ok(Segment::Empty);
        };

        if builtins::is_builtin(program) {
            let mut stdout = io::stdout();
            return match builtins::execute(&argv, &redirection, &self.registry, &mut stdout)? {
                BuiltinAction::Continue => Ok(Segment::Ran),
                BuiltinAction::Exit => Ok(Segment::Exit),
            };
        }

        debug!(program = %program, "external");
        executor::run_external(&argv, &redirection, &self.registry)?;
        Ok(Segment::Ran)
    }
}
