//! Idle-screen loop
//!
//! Takes over the display with the blinking eye: the first frame holds for
//! a randomized pause, then the blink frames flick past. Any keypress ends
//! the loop and the captured screen comes back. An audio cue plays around
//! each blink from a detached thread that the loop never waits on.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::info;

use crate::session::{Result, Session};
use crate::term::waiter::KeyProbe;

/// Delay before the takeover clears the screen
const LEAD_IN: Duration = Duration::from_millis(500);

/// Gap between the two tones of the cue
const CHIRP_GAP: Duration = Duration::from_millis(140);

pub fn run<W: Write, K: KeyProbe>(session: &mut Session<W, K>) -> Result<()> {
    // Resolve the frames before touching the screen so a missing resource
    // surfaces as a normal failure instead of a blank takeover
    let frames = session.store.screensaver_frames()?;

    let snapshot = session.console.snapshot()?;
    info!(frames = frames.len(), "screensaver started");

    let text = session.palette.text;
    session.console.show_cursor(false)?;
    session.console.set_fg(text)?;
    session.pause(LEAD_IN);
    session.console.clear()?;

    let min_pause = session.screensaver.min_pause_ms;
    let max_pause = session.screensaver.max_pause_ms.max(min_pause + 1);
    let blink = Duration::from_millis(session.screensaver.blink_ms);
    let mut rng = rand::thread_rng();

    'blinking: loop {
        draw(session, &frames[0])?;
        let hold = Duration::from_millis(rng.gen_range(min_pause..max_pause));
        if session.console.wait(hold)? {
            break;
        }

        chirp();

        for frame_index in [1, 2, 1] {
            let frame = frames.get(frame_index).unwrap_or(&frames[0]);
            draw(session, frame)?;
            if session.console.wait(blink)? {
                break 'blinking;
            }
        }
    }

    session.console.clear()?;
    session.console.show_cursor(true)?;
    session.console.restore(snapshot, 1)?;
    info!("screensaver ended");
    Ok(())
}

fn draw<W: Write, K: KeyProbe>(session: &mut Session<W, K>, frame: &str) -> Result<()> {
    session.console.move_to(0, 0)?;
    session.console.put_str(frame)?;
    session.console.flush()?;
    Ok(())
}

/// Two-tone cue, fired and forgotten. No join point, no shared state; if
/// the bell is slow or silent the blink loop never notices.
fn chirp() {
    thread::spawn(|| {
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
        thread::sleep(CHIRP_GAP);
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    });
}
