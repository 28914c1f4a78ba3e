//! Console access
//!
//! [`Console`] is the one component that touches the real terminal. All
//! output goes through the shadow [`ScreenGrid`] and is mirrored to the
//! writer as crossterm commands, so the grid always matches what is visible.
//! Input comes through the [`KeyProbe`] seam, which keeps the whole layer
//! drivable from tests with a scripted key source and a byte sink.

use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::{Hide, MoveLeft, MoveTo, Show};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, DisableLineWrap, EnableLineWrap, SetTitle};
use crossterm::{execute, queue};
use tracing::info;
use unicode_width::UnicodeWidthChar;

use super::grid::{CellAttrs, ScreenGrid};
use super::waiter::{self, CrosstermKeys, KeyProbe};

/// Window dimensions used when the real terminal size cannot be queried
const FALLBACK_SIZE: (u16, u16) = (90, 35);

/// The terminal, as the engine sees it: a shadow grid, a writer for the
/// mirrored output, and a probe for keystrokes.
pub struct Console<W: Write, K: KeyProbe> {
    out: W,
    keys: K,
    grid: ScreenGrid,
    attrs: CellAttrs,
}

/// The production console: stdout plus crossterm's event queue
pub type StdConsole = Console<io::Stdout, CrosstermKeys>;

impl StdConsole {
    pub fn stdout() -> Self {
        let (cols, rows) = terminal::size().unwrap_or(FALLBACK_SIZE);
        Self::new(io::stdout(), CrosstermKeys::new(), cols, rows)
    }
}

impl<W: Write, K: KeyProbe> Console<W, K> {
    pub fn new(out: W, keys: K, cols: u16, rows: u16) -> Self {
        Self {
            out,
            keys,
            grid: ScreenGrid::new(cols, rows),
            attrs: CellAttrs::default(),
        }
    }

    /// Put the terminal into the session's mode: raw input, no auto-wrap
    /// (the grid decides where lines break), titled window, black screen.
    pub fn init(&mut self, title: &str) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        self.attrs.bg = Color::Black;
        execute!(
            self.out,
            SetTitle(title),
            DisableLineWrap,
            SetBackgroundColor(Color::Black),
            Clear(ClearType::All),
            MoveTo(0, 0),
        )?;
        self.grid.clear();
        info!(cols = self.grid.cols(), rows = self.grid.rows(), "console initialized");
        Ok(())
    }

    /// Undo everything `init` did. Safe to call on every exit path.
    pub fn cleanup(&mut self) -> io::Result<()> {
        let _ = terminal::disable_raw_mode();
        execute!(self.out, ResetColor, EnableLineWrap, Show)?;
        queue!(self.out, Print("\r\n"))?;
        self.out.flush()
    }

    pub fn grid(&self) -> &ScreenGrid {
        &self.grid
    }

    pub fn current_attrs(&self) -> CellAttrs {
        self.attrs
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn set_fg(&mut self, color: Color) -> io::Result<()> {
        self.attrs.fg = color;
        queue!(self.out, SetForegroundColor(color))
    }

    pub fn set_bg(&mut self, color: Color) -> io::Result<()> {
        self.attrs.bg = color;
        queue!(self.out, SetBackgroundColor(color))
    }

    pub fn show_cursor(&mut self, visible: bool) -> io::Result<()> {
        if visible {
            queue!(self.out, Show)
        } else {
            queue!(self.out, Hide)
        }
    }

    pub fn move_to(&mut self, col: u16, row: u16) -> io::Result<()> {
        self.grid.move_to(col, row);
        queue!(self.out, MoveTo(col, row))
    }

    /// Clear the visible area to the current background color
    pub fn clear(&mut self) -> io::Result<()> {
        self.grid.clear();
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    /// Emit one character, keeping the grid and the terminal in step.
    /// `'\n'` breaks the line; `'\r'` and zero-width characters are dropped.
    pub fn put_char(&mut self, ch: char) -> io::Result<()> {
        match ch {
            '\n' => self.newline(),
            '\r' => Ok(()),
            _ => {
                let width = ch.width().unwrap_or(0) as u16;
                if width == 0 {
                    return Ok(());
                }
                if self.grid.cursor().0 + width > self.grid.cols() {
                    queue!(self.out, Print("\r\n"))?;
                }
                self.grid.put_char(ch, self.attrs);
                queue!(self.out, Print(ch))
            }
        }
    }

    pub fn put_str(&mut self, text: &str) -> io::Result<()> {
        for ch in text.chars() {
            self.put_char(ch)?;
        }
        Ok(())
    }

    pub fn newline(&mut self) -> io::Result<()> {
        self.grid.newline();
        queue!(self.out, Print("\r\n"))
    }

    pub fn blank_lines(&mut self, count: u16) -> io::Result<()> {
        for _ in 0..count {
            self.newline()?;
        }
        Ok(())
    }

    /// Whether an unconsumed keystroke is pending right now
    pub fn key_available(&mut self) -> io::Result<bool> {
        self.keys.poll(Duration::ZERO)
    }

    /// Throw away every keystroke typed so far (e.g. while the engine was
    /// typing its own output)
    pub fn drain_pending(&mut self) -> io::Result<()> {
        while self.keys.poll(Duration::ZERO)? {
            self.keys.read()?;
        }
        Ok(())
    }

    /// Block until one key press arrives and consume it
    pub fn read_key(&mut self) -> io::Result<KeyEvent> {
        self.flush()?;
        self.keys.read()
    }

    /// Interruptible pause; see [`waiter::wait`]
    pub fn wait(&mut self, duration: Duration) -> io::Result<bool> {
        self.flush()?;
        waiter::wait(&mut self.keys, duration)
    }

    /// Read one line of input with echo, backspace editing, and Enter to
    /// submit. Control/alt chords are ignored.
    pub fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        self.flush()?;
        loop {
            let key = self.keys.read()?;
            match key.code {
                KeyCode::Enter => {
                    self.newline()?;
                    self.flush()?;
                    return Ok(line);
                }
                KeyCode::Backspace => {
                    if line.pop().is_some() && self.grid.cursor().0 > 0 {
                        self.grid.backspace();
                        queue!(self.out, MoveLeft(1), Print(' '), MoveLeft(1))?;
                        self.flush()?;
                    }
                }
                KeyCode::Char(ch) => {
                    if key
                        .modifiers
                        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
                    {
                        continue;
                    }
                    line.push(ch);
                    self.put_char(ch)?;
                    self.flush()?;
                }
                _ => {}
            }
        }
    }

    pub(super) fn grid_mut(&mut self) -> &mut ScreenGrid {
        &mut self.grid
    }

    pub(super) fn out_mut(&mut self) -> &mut W {
        &mut self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::waiter::testkeys::FakeKeys;

    fn headless(keys: FakeKeys) -> Console<Vec<u8>, FakeKeys> {
        Console::new(Vec::new(), keys, 20, 5)
    }

    #[test]
    fn test_put_str_tracks_grid() {
        let mut console = headless(FakeKeys::empty());
        console.put_str("ok\ngo").unwrap();

        assert_eq!(console.grid().cell(0, 0).ch, 'o');
        assert_eq!(console.grid().cell(1, 0).ch, 'k');
        assert_eq!(console.grid().cell(0, 1).ch, 'g');
        assert_eq!(console.grid().cursor(), (2, 1));
    }

    #[test]
    fn test_read_line_echoes_and_submits() {
        let mut console = headless(FakeKeys::typed("open\r"));
        let line = console.read_line().unwrap();

        assert_eq!(line, "open");
        assert_eq!(console.grid().cell(0, 0).ch, 'o');
        assert_eq!(console.grid().cell(3, 0).ch, 'n');
        // Enter moved to the next row
        assert_eq!(console.grid().cursor(), (0, 1));
    }

    #[test]
    fn test_read_line_backspace_edits() {
        let mut console = headless(FakeKeys::with_keys(&[
            KeyCode::Char('a'),
            KeyCode::Char('b'),
            KeyCode::Backspace,
            KeyCode::Char('c'),
            KeyCode::Enter,
        ]));
        let line = console.read_line().unwrap();

        assert_eq!(line, "ac");
        assert_eq!(console.grid().cell(1, 0).ch, 'c');
    }

    #[test]
    fn test_drain_pending_consumes_everything() {
        let mut console = headless(FakeKeys::with_keys(&[
            KeyCode::Char('x'),
            KeyCode::Char('y'),
            KeyCode::Char('z'),
        ]));
        console.drain_pending().unwrap();
        assert!(!console.key_available().unwrap());
    }
}
