//! Terminal session primitives.
//!
//! This module contains the display and input layer the story engine is
//! built on:
//!
//! - **grid**: shadow cell grid mirroring the visible screen
//! - **console**: the single writer to the real terminal, plus line input
//! - **snapshot**: capture/restore for full-screen takeovers
//! - **waiter**: interruptible timed pause, the one cancellation primitive
//! - **typewriter**: character-by-character output rendering
//!
//! # Architecture
//!
//! ```text
//! Console
//! ├── ScreenGrid (cells + cursor, the source of truth for snapshots)
//! ├── KeyProbe  (crossterm events, or a scripted fake in tests)
//! └── Writer    (stdout, or a byte sink in tests)
//! ```

pub mod console;
pub mod grid;
pub mod snapshot;
pub mod typewriter;
pub mod waiter;

pub use console::{Console, StdConsole};
pub use snapshot::SnapshotError;
pub use waiter::KeyProbe;
