//! Password prompt with echo turned off.
//!
//! The terminal is put in raw mode for the duration of the prompt and key
//! events are collected into a [`PasswordInput`], which never prints what it
//! receives.

use std::fmt;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use zeroize::Zeroizing;

use crate::ClientError;

/// What a key press did to the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordKey {
    /// Keep reading
    Continue,
    /// Enter: the password is complete
    Submit,
    /// Esc or Ctrl+C/Ctrl+D: abandon the prompt
    Cancel,
}

/// Hidden line editor for a password.
#[derive(Default)]
pub struct PasswordInput {
    buffer: Zeroizing<String>,
}

impl PasswordInput {
    /// Empty input.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one key event.
    pub fn handle_key(&mut self, key: KeyEvent) -> PasswordKey {
        // Windows reports releases too
        if key.kind != KeyEventKind::Press {
            return PasswordKey::Continue;
        }

        match key.code {
            KeyCode::Char('c' | 'd') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                PasswordKey::Cancel
            },
            KeyCode::Char(c) => {
                self.buffer.push(c);
                PasswordKey::Continue
            },
            KeyCode::Backspace => {
                self.buffer.pop();
                PasswordKey::Continue
            },
            KeyCode::Enter => PasswordKey::Submit,
            KeyCode::Esc => PasswordKey::Cancel,
            _ => PasswordKey::Continue,
        }
    }

    /// Characters entered so far.
    pub fn len(&self) -> usize {
        self.buffer.chars().count()
    }

    /// True if nothing has been typed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finish editing.
    pub fn into_password(self) -> Zeroizing<String> {
        self.buffer
    }
}

impl fmt::Debug for PasswordInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordInput").field("len", &self.len()).finish_non_exhaustive()
    }
}

/// Raw mode for as long as this lives.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

/// Read a password from the terminal without echoing it.
///
/// Blocks the calling thread; run it through `spawn_blocking` from async
/// code.
///
/// # Errors
///
/// - `Cancelled` if the user pressed Esc, Ctrl+C or Ctrl+D
/// - `Io` if the terminal cannot be switched to raw mode or read
pub fn read_password() -> Result<Zeroizing<String>, ClientError> {
    let _raw = RawMode::enable()?;
    let mut input = PasswordInput::new();

    loop {
        if let Event::Key(key) = event::read()? {
            match input.handle_key(key) {
                PasswordKey::Continue => {},
                PasswordKey::Submit => return Ok(input.into_password()),
                PasswordKey::Cancel => return Err(ClientError::Cancelled),
            }
        }
    }
}
