//! Device-configuration console
//!
//! A menu loop entered with `device_manager`, with one live panel: floor
//! access control. Floors form a closed set fixed at startup; their lock
//! states change only through the operations here. Locking asks for two
//! exact confirmations, unlocking grants three code attempts per visit to
//! the panel.

use std::fmt;
use std::io::Write;

use tracing::info;

use crate::session::{Result, Session};
use crate::term::waiter::KeyProbe;

/// The floors the panel manages. Fixed at startup; nothing is added or
/// removed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Floor {
    F0,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
}

impl Floor {
    pub const ALL: [Floor; 7] = [
        Floor::F0,
        Floor::F1,
        Floor::F2,
        Floor::F3,
        Floor::F4,
        Floor::F5,
        Floor::F6,
    ];

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "0" => Some(Floor::F0),
            "1" => Some(Floor::F1),
            "2" => Some(Floor::F2),
            "3" => Some(Floor::F3),
            "4" => Some(Floor::F4),
            "5" => Some(Floor::F5),
            "6" => Some(Floor::F6),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Floor::F0 => "0",
            Floor::F1 => "1",
            Floor::F2 => "2",
            Floor::F3 => "3",
            Floor::F4 => "4",
            Floor::F5 => "5",
            Floor::F6 => "6",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unlocked,
    Locked,
}

impl fmt::Display for LockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockState::Unlocked => write!(f, "unlocked"),
            LockState::Locked => write!(f, "locked - requires code"),
        }
    }
}

/// Lock state and unlock code per floor. Every floor always has both.
#[derive(Debug)]
pub struct FloorRegistry {
    states: [LockState; Floor::ALL.len()],
    codes: [&'static str; Floor::ALL.len()],
}

impl Default for FloorRegistry {
    fn default() -> Self {
        let mut states = [LockState::Locked; Floor::ALL.len()];
        states[Floor::F0.index()] = LockState::Unlocked;
        states[Floor::F1.index()] = LockState::Unlocked;
        Self {
            states,
            codes: ["000"; Floor::ALL.len()],
        }
    }
}

impl FloorRegistry {
    pub fn state(&self, floor: Floor) -> LockState {
        self.states[floor.index()]
    }

    pub fn code(&self, floor: Floor) -> &'static str {
        self.codes[floor.index()]
    }

    pub fn set(&mut self, floor: Floor, state: LockState) {
        info!(floor = floor.label(), ?state, "floor state changed");
        self.states[floor.index()] = state;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Floor, LockState)> + '_ {
        Floor::ALL.iter().map(|&floor| (floor, self.state(floor)))
    }
}

/// How many wrong codes one visit to the panel tolerates
const UNLOCK_TRIES: u8 = 3;

/// One unlock dialogue. The counter lives and dies with the panel visit;
/// leaving and coming back starts over.
#[derive(Debug)]
pub struct UnlockAttempt {
    remaining: u8,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// Correct code: the floor is now unlocked
    Unlocked,
    /// Wrong code with tries still left
    WrongCode { remaining: u8 },
    /// Wrong code on the last try; the floor stays locked
    Exhausted,
}

impl UnlockAttempt {
    pub fn new() -> Self {
        Self {
            remaining: UNLOCK_TRIES,
        }
    }

    pub fn submit(
        &mut self,
        registry: &mut FloorRegistry,
        floor: Floor,
        code: &str,
    ) -> UnlockOutcome {
        if code == registry.code(floor) {
            registry.set(floor, LockState::Unlocked);
            return UnlockOutcome::Unlocked;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            UnlockOutcome::Exhausted
        } else {
            UnlockOutcome::WrongCode {
                remaining: self.remaining,
            }
        }
    }
}

impl Default for UnlockAttempt {
    fn default() -> Self {
        Self::new()
    }
}

/// The device-manager menu loop
pub fn run<W: Write, K: KeyProbe>(session: &mut Session<W, K>) -> Result<()> {
    session.render_resource("device_manager_boot.txt", 1, 1)?;

    loop {
        session.render_resource("device_manager_options.txt", 1, 1)?;
        let choice = session.prompt("")?;
        match choice.trim() {
            "1" => session.render_resource("device_manager_1.txt", 1, 1)?,
            "2" => floor_panel(session)?,
            "3" => session.render_resource("device_manager_3.txt", 1, 1)?,
            "4" => {
                session.render_resource("device_manager_4.txt", 1, 1)?;
                return Ok(());
            }
            _ => {}
        }
    }
}

/// Floor-access panel: list states, pick a floor, lock or unlock it
fn floor_panel<W: Write, K: KeyProbe>(session: &mut Session<W, K>) -> Result<()> {
    session.render_resource("device_manager_2.txt", 1, 1)?;
    let lines: Vec<String> = session
        .floors
        .iter()
        .map(|(floor, state)| format!("  floor {}: {}", floor.label(), state))
        .collect();
    for line in lines {
        session.say(&line, 0, 1)?;
    }

    session.console.blank_lines(1)?;
    let choice = session.prompt("Select floor to reconfigure [0-6]: ")?;

    // Unrecognized floors fall back to the menu without comment
    let Some(floor) = Floor::parse(&choice) else {
        return Ok(());
    };

    match session.floors.state(floor) {
        LockState::Unlocked => lock_floor(session, floor),
        LockState::Locked => unlock_floor(session, floor),
    }
}

/// Locking an open floor takes two exact confirmations
fn lock_floor<W: Write, K: KeyProbe>(session: &mut Session<W, K>, floor: Floor) -> Result<()> {
    session.render_resource("lock_floor_1.txt", 1, 1)?;
    if session.prompt("")? != "y" {
        return Ok(());
    }

    session.render_resource("lock_floor_2.txt", 1, 1)?;
    if session.prompt("")? != "yes i am sure" {
        return Ok(());
    }

    session.floors.set(floor, LockState::Locked);
    session.render_resource("lock_floor_3.txt", 1, 1)?;
    Ok(())
}

/// Unlocking a protected floor: three code attempts, then give up
fn unlock_floor<W: Write, K: KeyProbe>(session: &mut Session<W, K>, floor: Floor) -> Result<()> {
    session.say("Access to that floor is protected with a code.", 1, 1)?;

    let mut attempt = UnlockAttempt::new();
    loop {
        let code = session.prompt("Please enter the code: ")?;
        match attempt.submit(&mut session.floors, floor, &code) {
            UnlockOutcome::Unlocked => {
                session.say("Floor unlocked.", 1, 1)?;
                return Ok(());
            }
            UnlockOutcome::WrongCode { remaining } => {
                session.say("Code incorrect!", 1, 1)?;
                session.say(&format!("Try again ({remaining} more tries left)."), 1, 1)?;
            }
            UnlockOutcome::Exhausted => {
                session.say("No more tries left.", 1, 1)?;
                return Ok(());
            }
        }
    }
}
