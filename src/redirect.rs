use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use tracing::debug;

use crate::ast::RedirectionSpec;
use crate::error::{Result, ShellError};

/// Separate redirect operators from regular arguments.
///
/// Handles `<`, `>` and `>>`, each consuming the token after it as the
/// filename. An operator with nothing after it is dropped silently. When
/// the same stream is redirected twice the last one wins.
pub fn extract_redirections(tokens: Vec<String>) -> (Vec<String>, RedirectionSpec) {
    let mut args = Vec::with_capacity(tokens.len());
    let mut spec = RedirectionSpec::default();
    let mut tokens = tokens.into_iter();

    while let Some(token) = tokens.next() {
        match token.as_str() {
            ">" | ">>" => match tokens.next() {
                Some(path) => {
                    spec.append = token == ">>";
                    spec.stdout_path = Some(path);
                }
                None => debug!(op = %token, "dangling redirection dropped"),
            },
            "<" => match tokens.next() {
                Some(path) => spec.stdin_path = Some(path),
                None => debug!(op = "<", "dangling redirection dropped"),
            },
            _ => args.push(token),
        }
    }

    (args, spec)
}

/// Open a `<` target for reading.
pub fn open_input(path: &str) -> Result<File> {
    File::open(path).map_err(|source| ShellError::Redirection {
        path: Path::new(path).to_path_buf(),
        source,
    })
}

/// Open a `>` / `>>` target, creating it with mode 0644 if needed.
pub fn open_output(path: &str, append: bool) -> Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o644);
    if append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options.open(path).map_err(|source| ShellError::Redirection {
        path: Path::new(path).to_path_buf(),
        source,
    })
}

/// Both targets of a [`RedirectionSpec`], opened. Dropping this closes them.
#[derive(Debug, Default)]
pub struct OpenedRedirections {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

impl OpenedRedirections {
    /// Open every target named in `spec`; nothing is left open on failure.
    pub fn open(spec: &RedirectionSpec) -> Result<Self> {
        let stdin = spec.stdin_path.as_deref().map(open_input).transpose()?;
        let stdout = spec
            .stdout_path
            .as_deref()
            .map(|path| open_output(path, spec.append))
            .transpose()?;
        Ok(Self { stdin, stdout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn simple_stdout_redirect() {
        let (args, spec) = extract_redirections(strings(&["echo", "hello", ">", "out.txt"]));
        assert_eq!(args, vec!["echo", "hello"]);
        assert_eq!(spec.stdout_path.as_deref(), Some("out.txt"));
        assert!(!spec.append);
        assert!(spec.stdin_path.is_none());
    }

    #[test]
    fn append_redirect() {
        let (args, spec) = extract_redirections(strings(&["echo", "hello", ">>", "out.txt"]));
        assert_eq!(args, vec!["echo", "hello"]);
        assert_eq!(spec.stdout_path.as_deref(), Some("out.txt"));
        assert!(spec.append);
    }

    #[test]
    fn stdin_redirect() {
        let (args, spec) = extract_redirections(strings(&["sort", "<", "data.txt"]));
        assert_eq!(args, vec!["sort"]);
        assert_eq!(spec.stdin_path.as_deref(), Some("data.txt"));
    }

    #[test]
    fn both_directions_preserve_argument_order() {
        let (args, spec) =
            extract_redirections(strings(&["tr", "<", "in", "a-z", ">", "out", "A-Z"]));
        assert_eq!(args, vec!["tr", "a-z", "A-Z"]);
        assert_eq!(spec.stdin_path.as_deref(), Some("in"));
        assert_eq!(spec.stdout_path.as_deref(), Some("out"));
    }

    #[test]
    fn dangling_operator_is_dropped() {
        let (args, spec) = extract_redirections(strings(&["echo", "hi", ">"]));
        assert_eq!(args, vec!["echo", "hi"]);
        assert_eq!(spec, RedirectionSpec::default());

        let (args, spec) = extract_redirections(strings(&["cat", "<"]));
        assert_eq!(args, vec!["cat"]);
        assert_eq!(spec, RedirectionSpec::default());
    }

    #[test]
    fn attached_operator_is_an_argument() {
        let (args, spec) = extract_redirections(strings(&["echo", ">out"]));
        assert_eq!(args, vec!["echo", ">out"]);
        assert_eq!(spec, RedirectionSpec::default());
    }

    #[test]
    fn truncate_then_append_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        let path = path.to_str().unwrap();

        writeln!(open_output(path, false).unwrap(), "hi").unwrap();
        writeln!(open_output(path, true).unwrap(), "bye").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hi\nbye\n");

        writeln!(open_output(path, false).unwrap(), "new").unwrap();
        let mut contents = String::new();
        open_input(path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "new\n");
    }

    #[test]
    fn missing_input_is_redirection_error() {
        let err = open_input("/definitely/not/here.txt").unwrap_err();
        assert!(matches!(err, ShellError::Redirection { .. }));
    }
}
