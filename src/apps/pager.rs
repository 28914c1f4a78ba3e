//! File pager
//!
//! `open` hands a found text to the pager: the screen is captured, cleared,
//! and filled with the text until any keypress restores the prior view.

use std::io::Write;
use std::time::Duration;

use crate::session::{Result, Session};
use crate::term::waiter::KeyProbe;

/// Poll cadence while the text is on screen
const HOLD_INTERVAL: Duration = Duration::from_millis(1000);

pub fn run<W: Write, K: KeyProbe>(session: &mut Session<W, K>, content: &str) -> Result<()> {
    let snapshot = session.console.snapshot()?;

    let text = session.palette.text;
    session.console.show_cursor(false)?;
    session.console.set_fg(text)?;
    session.console.clear()?;
    session.console.put_str(content)?;
    session.console.flush()?;

    while !session.console.wait(HOLD_INTERVAL)? {}

    session.console.clear()?;
    session.console.show_cursor(true)?;
    session.console.restore(snapshot, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testutil::{scripted_session, story_tree};
    use crate::term::waiter::testkeys::FakeKeys;
    use crossterm::event::KeyCode;

    #[test]
    fn test_pager_restores_screen_on_keypress() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::with_keys(&[KeyCode::Char(' ')]));

        session.say("prompt history", 0, 1).unwrap();
        let before = session.console.grid().clone();

        run(&mut session, "PAGED CONTENT\nacross lines").unwrap();

        assert_eq!(session.console.grid().cells(), before.cells());
        assert_eq!(session.console.grid().cursor(), before.cursor());
    }
}
