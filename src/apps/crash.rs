//! Crash screen
//!
//! The classic blue screen, played straight: capture the display, flood it
//! blue, print the crash text in white, and hold until a keypress brings
//! the session back exactly as it was.

use std::io::Write;
use std::time::Duration;

use crossterm::style::Color;
use tracing::info;

use crate::session::{Result, Session};
use crate::term::waiter::KeyProbe;

/// Poll cadence while parked on the crash screen
const HOLD_INTERVAL: Duration = Duration::from_millis(1000);

pub fn run<W: Write, K: KeyProbe>(session: &mut Session<W, K>) -> Result<()> {
    let text = session.store.fetch("crash.txt")?;

    let snapshot = session.console.snapshot()?;
    info!("crash screen shown");

    session.console.show_cursor(false)?;
    session.console.set_bg(Color::Blue)?;
    session.console.clear()?;
    session.console.set_fg(Color::White)?;
    session.console.put_str(&text)?;
    session.console.flush()?;

    while !session.console.wait(HOLD_INTERVAL)? {}

    session.console.set_bg(Color::Black)?;
    session.console.clear()?;
    session.console.show_cursor(true)?;
    session.console.restore(snapshot, 1)?;
    Ok(())
}
