//! Story sub-systems.
//!
//! Everything the dispatcher can hand the whole terminal to:
//!
//! - **device_manager**: configuration menu with the floor-lock panel
//! - **endings**: the three scripted ending dialogues
//! - **screensaver**: the blinking-eye idle loop
//! - **crash**: the blue crash screen
//! - **pager**: full-screen text display for `open`
//!
//! The takeovers all follow the same shape: capture the screen, borrow the
//! display, wait for a keypress, restore.

pub mod crash;
pub mod device_manager;
pub mod endings;
pub mod pager;
pub mod screensaver;
