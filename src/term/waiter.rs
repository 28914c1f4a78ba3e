//! Interrupt-aware waiting
//!
//! Every timed visual effect in the engine is built on one primitive: block
//! for up to a duration, but let any pending keystroke cut the wait short.
//! The keystroke that interrupts is consumed, so a skipped pause never leaks
//! a stray key into the next prompt.

use std::io;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

/// Polling granularity of [`wait`]
pub const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Source of keystrokes.
///
/// The production implementation sits on crossterm's event queue; tests
/// substitute a scripted probe.
pub trait KeyProbe {
    /// Whether a key press is available within `timeout`.
    /// Non-key events (resize, mouse, key release) are swallowed.
    fn poll(&mut self, timeout: Duration) -> io::Result<bool>;

    /// Read one pending key press, blocking until one arrives
    fn read(&mut self) -> io::Result<KeyEvent>;
}

/// Crossterm-backed key probe
#[derive(Default)]
pub struct CrosstermKeys {
    pending: Option<KeyEvent>,
}

impl CrosstermKeys {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyProbe for CrosstermKeys {
    fn poll(&mut self, timeout: Duration) -> io::Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if !event::poll(remaining)? {
                return Ok(false);
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    self.pending = Some(key);
                    return Ok(true);
                }
                // Releases, repeats, resizes: not keystrokes
                _ => {
                    if Instant::now() >= deadline {
                        return Ok(false);
                    }
                }
            }
        }
    }

    fn read(&mut self) -> io::Result<KeyEvent> {
        loop {
            if let Some(key) = self.pending.take() {
                return Ok(key);
            }
            self.poll(Duration::from_millis(250))?;
        }
    }
}

/// Block for up to `duration`, polling for a keystroke every few
/// milliseconds. Returns `true` ("interrupted") after consuming exactly one
/// keystroke, or `false` ("completed") once the duration elapses.
pub fn wait<K: KeyProbe>(keys: &mut K, duration: Duration) -> io::Result<bool> {
    let deadline = Instant::now() + duration;
    loop {
        if keys.poll(Duration::ZERO)? {
            keys.read()?;
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
pub(crate) mod testkeys {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::collections::VecDeque;

    /// Scripted key source for tests.
    ///
    /// Keys built with [`FakeKeys::with_keys`] count as already pending
    /// (visible to `poll`). Keys built with [`FakeKeys::typed`] model input
    /// the user types only once prompted: invisible to `poll`, so drains and
    /// waits pass them by, but `read` still delivers them in order.
    #[derive(Default)]
    pub struct FakeKeys {
        pub queue: VecDeque<KeyEvent>,
        poll_hidden: bool,
    }

    impl FakeKeys {
        pub fn empty() -> Self {
            Self::default()
        }

        pub fn with_keys(codes: &[KeyCode]) -> Self {
            Self {
                queue: codes
                    .iter()
                    .map(|&code| KeyEvent::new(code, KeyModifiers::NONE))
                    .collect(),
                poll_hidden: false,
            }
        }

        pub fn typed(text: &str) -> Self {
            Self {
                queue: text
                    .chars()
                    .map(|ch| {
                        let code = if ch == '\r' {
                            KeyCode::Enter
                        } else {
                            KeyCode::Char(ch)
                        };
                        KeyEvent::new(code, KeyModifiers::NONE)
                    })
                    .collect(),
                poll_hidden: true,
            }
        }
    }

    impl KeyProbe for FakeKeys {
        fn poll(&mut self, _timeout: Duration) -> io::Result<bool> {
            Ok(!self.poll_hidden && !self.queue.is_empty())
        }

        fn read(&mut self) -> io::Result<KeyEvent> {
            self.queue
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted keys left"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testkeys::FakeKeys;
    use super::*;
    use crossterm::event::KeyCode;

    #[test]
    fn test_wait_completes_without_input() {
        let mut keys = FakeKeys::empty();
        let start = Instant::now();
        let interrupted = wait(&mut keys, Duration::from_millis(30)).unwrap();

        assert!(!interrupted);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_interrupts_and_consumes_one_key() {
        let mut keys = FakeKeys::with_keys(&[KeyCode::Char('a'), KeyCode::Char('b')]);
        let start = Instant::now();
        let interrupted = wait(&mut keys, Duration::from_secs(10)).unwrap();

        assert!(interrupted);
        // Returned well before the ten seconds were up
        assert!(start.elapsed() < Duration::from_secs(1));
        // Exactly one keystroke was consumed
        assert_eq!(keys.queue.len(), 1);
    }
}
