use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, poll, read};
use std::collections::VecDeque;
use std::io;
use std::io::{Stdout, Write, stdout};
use std::time::Duration;

/// Character I/O as seen by the simulated machine, independent of an implementation.
pub trait IoPort {
    /// Checks if input is available, does not block.
    ///
    /// # Errors
    /// - the underlying device failed, `io::ErrorKind::Interrupted` if the user interrupted
    fn poll_input(&mut self) -> io::Result<bool>;
    /// Reads one character, blocking until one is available.
    ///
    /// # Errors
    /// - the underlying device failed, `io::ErrorKind::Interrupted` if the user interrupted
    fn read_char(&mut self) -> io::Result<u8>;
    /// Writes one character.
    ///
    /// # Errors
    /// - the underlying device failed
    fn write_char(&mut self, c: u8) -> io::Result<()>;
    /// Makes written characters visible.
    ///
    /// # Errors
    /// - the underlying device failed
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Keyboard and screen of the hosting terminal, to be used with the terminal in raw mode.
///
/// A CTRL-C key press marks the port interrupted. From then on every read or poll reports
/// `io::ErrorKind::Interrupted` without touching the terminal again.
pub struct TerminalIoPort<W: Write = Stdout> {
    pending_char: Option<u8>,
    interrupted: bool,
    out: W,
}

impl TerminalIoPort {
    #[must_use]
    pub fn new() -> Self {
        Self::with_output(stdout())
    }
}
impl Default for TerminalIoPort {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> TerminalIoPort<W> {
    pub const fn with_output(out: W) -> Self {
        Self {
            pending_char: None,
            interrupted: false,
            out,
        }
    }

    fn check_interrupted(&self) -> io::Result<()> {
        if self.interrupted {
            return Err(interrupted_error());
        }
        Ok(())
    }

    fn handle_event(&mut self, event: &Event) -> io::Result<Option<u8>> {
        let result = event_to_char(event);
        if matches!(&result, Err(e) if e.kind() == io::ErrorKind::Interrupted) {
            self.interrupted = true;
        }
        result
    }
}

fn interrupted_error() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "CTRL-C pressed")
}

/// Maps a key press to the character code a program sees.
///
/// # Errors
/// - `io::ErrorKind::Interrupted` for CTRL-C
fn key_to_char(event: KeyEvent) -> io::Result<Option<u8>> {
    if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
        return Err(interrupted_error());
    }
    Ok(match event.code {
        KeyCode::Char(c) => u8::try_from(c).ok().filter(u8::is_ascii),
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Esc => Some(0x1B),
        _ => None,
    })
}

fn event_to_char(event: &Event) -> io::Result<Option<u8>> {
    event
        .as_key_press_event()
        .map_or(Ok(None), key_to_char)
}

impl<W: Write> IoPort for TerminalIoPort<W> {
    fn poll_input(&mut self) -> io::Result<bool> {
        self.check_interrupted()?;
        if self.pending_char.is_some() {
            return Ok(true);
        }
        while poll(Duration::from_secs(0))? {
            if let Some(c) = self.handle_event(&read()?)? {
                self.pending_char = Some(c);
                return Ok(true);
            }
        }
        Ok(false)
    }
    fn read_char(&mut self) -> io::Result<u8> {
        self.check_interrupted()?;
        if let Some(c) = self.pending_char.take() {
            return Ok(c);
        }
        loop {
            if let Some(c) = self.handle_event(&read()?)? {
                return Ok(c);
            }
        }
    }
    fn write_char(&mut self, c: u8) -> io::Result<()> {
        // raw mode does not return the carriage on line feed
        if c == b'\n' {
            self.out.write_all(b"\r\n")
        } else {
            self.out.write_all(&[c])
        }
    }
    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// In-memory I/O: input is served from a queue, output is captured.
#[derive(Debug, Default, Clone)]
pub struct BufferedIoPort {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl BufferedIoPort {
    #[must_use]
    pub fn new(input: &[u8]) -> Self {
        Self {
            input: input.iter().copied().collect(),
            output: Vec::with_capacity(120),
        }
    }
    pub fn push_input(&mut self, input: &[u8]) {
        self.input.extend(input);
    }
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }
    /// Captured output, invalid UTF-8 replaced.
    #[must_use]
    pub fn output_string(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

impl IoPort for BufferedIoPort {
    fn poll_input(&mut self) -> io::Result<bool> {
        Ok(!self.input.is_empty())
    }
    /// An exhausted queue can never be refilled while the machine waits, so it reports
    /// `io::ErrorKind::UnexpectedEof` instead of blocking.
    fn read_char(&mut self) -> io::Result<u8> {
        self.input
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "No input available"))
    }
    fn write_char(&mut self, c: u8) -> io::Result<()> {
        self.output.push(c);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventKind, KeyEventState};
    use googletest::prelude::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[gtest]
    pub fn test_key_to_char() {
        let none = KeyModifiers::NONE;
        expect_that!(key_to_char(key(KeyCode::Char('a'), none)).ok(), eq(Some(Some(b'a'))));
        expect_that!(key_to_char(key(KeyCode::Enter, none)).ok(), eq(Some(Some(b'\n'))));
        expect_that!(key_to_char(key(KeyCode::Char('ä'), none)).ok(), eq(Some(None)));
        expect_that!(key_to_char(key(KeyCode::F(1), none)).ok(), eq(Some(None)));
        let interrupt = key_to_char(key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        expect_that!(
            interrupt.map_err(|e| e.kind()).err(),
            eq(Some(io::ErrorKind::Interrupted))
        );
    }

    #[gtest]
    pub fn test_terminal_output_translates_newline() {
        let mut port = TerminalIoPort::with_output(Vec::new());
        port.write_char(b'a').unwrap();
        port.write_char(b'\n').unwrap();
        port.flush().unwrap();
        expect_that!(port.out, eq(&b"a\r\n".to_vec()));
    }

    #[gtest]
    pub fn test_terminal_ctrl_c_marks_port_interrupted() {
        let mut port = TerminalIoPort::with_output(Vec::new());
        let plain = Event::Key(key(KeyCode::Char('a'), KeyModifiers::NONE));
        expect_that!(port.handle_event(&plain).ok(), eq(Some(Some(b'a'))));
        expect_that!(port.interrupted, eq(false));

        let ctrl_c = Event::Key(key(KeyCode::Char('c'), KeyModifiers::CONTROL));
        expect_that!(
            port.handle_event(&ctrl_c).map_err(|e| e.kind()).err(),
            eq(Some(io::ErrorKind::Interrupted))
        );
        expect_that!(port.interrupted, eq(true));
        // later reads fail right away instead of waiting for the terminal
        expect_that!(
            port.poll_input().map_err(|e| e.kind()).err(),
            eq(Some(io::ErrorKind::Interrupted))
        );
        expect_that!(
            port.read_char().map_err(|e| e.kind()).err(),
            eq(Some(io::ErrorKind::Interrupted))
        );
    }

    #[gtest]
    pub fn test_buffered_io_port() {
        let mut port = BufferedIoPort::new(b"x");
        expect_that!(port.poll_input().unwrap(), eq(true));
        expect_that!(port.read_char().unwrap(), eq(b'x'));
        expect_that!(port.poll_input().unwrap(), eq(false));
        expect_that!(
            port.read_char().map_err(|e| e.kind()).err(),
            eq(Some(io::ErrorKind::UnexpectedEof))
        );
        port.write_char(b'H').unwrap();
        port.write_char(b'i').unwrap();
        expect_that!(port.output_string(), eq("Hi"));
    }
}
