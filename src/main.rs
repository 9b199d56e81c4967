#[cfg(not(unix))]
compile_error!("pipesh relies on Unix process groups and signals");

mod ast;
mod builtins;
mod conditional;
mod config;
mod editor;
mod error;
mod executor;
mod expander;
mod interrupt;
mod job_control;
mod parser;
mod pipeline;
mod redirect;
mod registry;
mod scanner;
mod shell;
mod status;

use std::io;
use std::process;
use std::sync::Arc;

use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::Config;
use crate::editor::LineEditor;
use crate::registry::ProcessRegistry;
use crate::shell::{LineOutcome, Shell};

fn init_tracing() {
    let directive = Config::log_filter(|key| std::env::var(key).ok());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn main() {
    init_tracing();
    let config = Config::from_env();
    debug!(?config, "starting");

    let registry = Arc::new(ProcessRegistry::new());
    if let Err(e) = interrupt::install(Arc::clone(&registry)) {
        error!("failed to install interrupt handler: {e}");
        eprintln!("pipesh: failed to install interrupt handler: {e}");
        process::exit(1);
    }

    let mut editor = match LineEditor::new(config.history_size) {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("pipesh: cannot initialize line editor: {e}");
            process::exit(1);
        }
    };

    let shell = Shell::new(registry);

    loop {
        match editor.read_line(&config.prompt) {
            Ok(Some(input)) => {
                let line = input.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_to_history(line);

                if shell.run_line(line) == LineOutcome::Exit {
                    process::exit(0);
                }
            }
            Ok(None) => {
                println!("exit");
                if !shell.registry().is_empty() {
                    shell.registry().signal_all(libc::SIGTERM);
                }
                process::exit(0);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("pipesh: error reading input: {e}");
                process::exit(1);
            }
        }
    }
}
