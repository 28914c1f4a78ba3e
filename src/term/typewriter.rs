//! Typewriter output
//!
//! The engine's voice: text is emitted one character at a time with a small
//! delay. A pending keystroke drops the delay for every character still to
//! come, so the rest of the string appears instantly instead of being cut
//! off. The keystroke itself is left unconsumed for the next read.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::style::Color;

use super::console::Console;
use super::waiter::KeyProbe;

impl<W: Write, K: KeyProbe> Console<W, K> {
    /// Emit `blanks_before` empty lines, then `text` character by character
    /// with `delay` between characters, then `blanks_after` empty lines.
    ///
    /// An empty `text` still emits the blank lines. The cursor is hidden
    /// while typing.
    pub fn type_out(
        &mut self,
        text: &str,
        color: Color,
        blanks_before: u16,
        blanks_after: u16,
        delay: Duration,
    ) -> io::Result<()> {
        self.show_cursor(false)?;
        self.set_fg(color)?;
        self.blank_lines(blanks_before)?;

        let mut delay = delay;
        for ch in text.chars() {
            if !delay.is_zero() && self.key_available()? {
                delay = Duration::ZERO;
            }
            self.put_char(ch)?;
            self.flush()?;
            if !delay.is_zero() {
                thread::sleep(delay);
            }
        }

        self.blank_lines(blanks_after)?;
        self.show_cursor(true)?;
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::waiter::testkeys::FakeKeys;
    use crossterm::event::KeyCode;
    use std::time::Instant;

    fn headless(keys: FakeKeys) -> Console<Vec<u8>, FakeKeys> {
        Console::new(Vec::new(), keys, 40, 6)
    }

    #[test]
    fn test_pending_key_drops_delay_but_not_output() {
        let mut console = headless(FakeKeys::with_keys(&[KeyCode::Char(' ')]));
        let start = Instant::now();
        console
            .type_out("a longer line of narration", Color::Grey, 0, 0, Duration::from_millis(40))
            .unwrap();

        // 26 chars at 40ms each would be over a second; the pending key
        // must collapse that to nothing
        assert!(start.elapsed() < Duration::from_millis(200));

        // Every character was still emitted
        assert_eq!(console.grid().cell(0, 0).ch, 'a');
        assert_eq!(console.grid().cell(25, 0).ch, 'n');

        // The interrupting keystroke was not consumed
        assert!(console.key_available().unwrap());
    }

    #[test]
    fn test_empty_text_emits_only_blank_lines() {
        let mut console = headless(FakeKeys::empty());
        console
            .type_out("", Color::Grey, 2, 1, Duration::from_millis(1))
            .unwrap();

        assert_eq!(console.grid().cursor(), (0, 3));
    }

    #[test]
    fn test_blank_line_framing() {
        let mut console = headless(FakeKeys::empty());
        console
            .type_out("mid", Color::Grey, 1, 2, Duration::ZERO)
            .unwrap();

        assert_eq!(console.grid().cell(0, 1).ch, 'm');
        assert_eq!(console.grid().cursor(), (0, 3));
    }
}
