use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{self, ClearType},
    tty::IsTty,
};

/// `true` while the editor holds the terminal in raw mode. The interrupt
/// forwarder skips its notice while this is set.
pub static EDITOR_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Raw mode for as long as the guard lives, restored even on panic.
struct RawMode;

impl RawMode {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        EDITOR_ACTIVE.store(true, Ordering::Relaxed);
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        EDITOR_ACTIVE.store(false, Ordering::Relaxed);
    }
}

/// Bounded, session-only command history with a browsing cursor.
#[derive(Debug)]
struct History {
    entries: VecDeque<String>,
    capacity: usize,
    /// Browsing position; `entries.len()` means "not browsing".
    pos: usize,
    /// What the user was typing before they started browsing.
    draft: String,
}

impl History {
    fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            pos: 0,
            draft: String::new(),
        }
    }

    /// Record a submitted line. Blank lines and immediate repeats are skipped.
    fn push(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() || self.capacity == 0 {
            return;
        }
        if self.entries.back().map(String::as_str) == Some(line) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
        self.reset();
    }

    fn reset(&mut self) {
        self.pos = self.entries.len();
        self.draft.clear();
    }

    /// Step back in time. Returns the line to show, if it changed.
    fn older(&mut self, current: &str) -> Option<&str> {
        if self.pos == 0 {
            return None;
        }
        if self.pos == self.entries.len() {
            self.draft = current.to_string();
        }
        self.pos -= 1;
        self.entries.get(self.pos).map(String::as_str)
    }

    /// Step forward in time, ending back at the saved draft.
    fn newer(&mut self) -> Option<&str> {
        if self.pos >= self.entries.len() {
            return None;
        }
        self.pos += 1;
        if self.pos == self.entries.len() {
            Some(self.draft.as_str())
        } else {
            self.entries.get(self.pos).map(String::as_str)
        }
    }
}

enum KeyAction {
    Continue,
    Submit(String),
    Eof,
}

/// Interactive line reader with Emacs-style keys and in-memory history.
///
/// When stdin is not a terminal it degrades to plain buffered line reads,
/// which is how the interpreter is driven from pipes and tests.
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
    history: History,
    interactive: bool,
}

impl LineEditor {
    /// Set up the editor. On a terminal this checks that the terminal can
    /// be queried; failure here is fatal for the interpreter.
    pub fn new(history_size: usize) -> io::Result<Self> {
        let interactive = io::stdin().is_tty();
        if interactive {
            terminal::size()?;
        }
        Ok(Self {
            buffer: Vec::new(),
            cursor: 0,
            history: History::new(history_size),
            interactive,
        })
    }

    /// Read one line. `Ok(None)` means end of input.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.interactive {
            return read_line_plain(prompt);
        }

        self.buffer.clear();
        self.cursor = 0;
        self.history.reset();

        let _raw = RawMode::enter()?;
        print!("{prompt}");
        io::stdout().flush()?;

        loop {
            let key = match event::read() {
                Ok(Event::Key(key))
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) =>
                {
                    key
                }
                Ok(_) => continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            match self.handle_key(key, prompt)? {
                KeyAction::Continue => {}
                KeyAction::Submit(line) => return Ok(Some(line)),
                KeyAction::Eof => return Ok(None),
            }
        }
    }

    pub fn add_to_history(&mut self, line: &str) {
        self.history.push(line);
    }

    fn line(&self) -> String {
        self.buffer.iter().collect()
    }

    fn set_line(&mut self, line: &str) {
        self.buffer = line.chars().collect();
        self.cursor = self.buffer.len();
    }

    fn handle_key(&mut self, key: KeyEvent, prompt: &str) -> io::Result<KeyAction> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Enter => {
                print!("\r\n");
                io::stdout().flush()?;
                return Ok(KeyAction::Submit(self.line()));
            }
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    print!("\r\n");
                    io::stdout().flush()?;
                    return Ok(KeyAction::Eof);
                }
                if self.cursor < self.buffer.len() {
                    self.buffer.remove(self.cursor);
                }
            }
            // ISIG is off in raw mode, so Ctrl-C arrives here, not as SIGINT.
            KeyCode::Char('c') if ctrl => {
                print!("^C\r\n");
                self.buffer.clear();
                self.cursor = 0;
                self.history.reset();
            }
            KeyCode::Char('a') if ctrl => self.cursor = 0,
            KeyCode::Home => self.cursor = 0,
            KeyCode::Char('e') if ctrl => self.cursor = self.buffer.len(),
            KeyCode::End => self.cursor = self.buffer.len(),
            KeyCode::Char('k') if ctrl => self.buffer.truncate(self.cursor),
            KeyCode::Char('u') if ctrl => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(self.buffer.len()),
            KeyCode::Up => {
                let current = self.line();
                if let Some(line) = self.history.older(&current).map(str::to_string) {
                    self.set_line(&line);
                }
            }
            KeyCode::Down => {
                if let Some(line) = self.history.newer().map(str::to_string) {
                    self.set_line(&line);
                }
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    self.buffer.remove(self.cursor);
                }
            }
            KeyCode::Delete => {
                if self.cursor < self.buffer.len() {
                    self.buffer.remove(self.cursor);
                }
            }
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += 1;
            }
            _ => return Ok(KeyAction::Continue),
        }

        self.redraw(prompt)?;
        Ok(KeyAction::Continue)
    }

    fn redraw(&self, prompt: &str) -> io::Result<()> {
        let col = (prompt.chars().count() + self.cursor) as u16;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
        )?;
        write!(stdout, "{prompt}{}", self.line())?;
        execute!(stdout, cursor::MoveToColumn(col))?;
        stdout.flush()
    }
}

fn read_line_plain(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line)),
    }
}
