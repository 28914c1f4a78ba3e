//! Scripted ending dialogues
//!
//! Each ending is an ordered list of (narration, expected input) steps
//! driven by a cursor, not control flow. A step re-prompts until its phrase
//! arrives; the word "cancel" unwinds to the dispatcher from anywhere.
//! Completing the last step plays the closing narration and shuts the
//! session down for good.

use std::io::Write;
use std::time::Duration;

use tracing::info;

use crate::session::{PromptKind, Result, Session, SessionError};
use crate::term::waiter::KeyProbe;

/// The word that aborts any ending from any step
const CANCEL_WORD: &str = "cancel";

/// Pause after the closing narration before the lights go out
const CLOSING_PAUSE: Duration = Duration::from_millis(3000);

/// One gated step: narration to render, then the input that advances past it.
/// `expect: None` advances on any input (except the cancel word).
#[derive(Debug)]
pub struct EndingStep {
    pub narration: &'static str,
    pub expect: Option<&'static str>,
}

/// What a step does with one line of (case-normalized) input
#[derive(Debug, PartialEq, Eq)]
pub enum StepOutcome {
    Advance,
    Repeat,
    Cancelled,
}

impl EndingStep {
    pub fn judge(&self, input: &str) -> StepOutcome {
        if input == CANCEL_WORD {
            return StepOutcome::Cancelled;
        }
        match self.expect {
            None => StepOutcome::Advance,
            Some(phrase) if input == phrase => StepOutcome::Advance,
            Some(_) => StepOutcome::Repeat,
        }
    }
}

/// A complete ending: its steps in order, then the closing narration
#[derive(Debug)]
pub struct EndingScript {
    pub name: &'static str,
    pub steps: &'static [EndingStep],
    pub closing: &'static str,
}

pub const GATES: EndingScript = EndingScript {
    name: "gates",
    steps: &[],
    closing: "gates_ending.txt",
};

pub const CRYPT: EndingScript = EndingScript {
    name: "crypt",
    steps: &[EndingStep {
        narration: "crypt_ending_1.txt",
        expect: None,
    }],
    closing: "crypt_ending_2.txt",
};

pub const TOWER: EndingScript = EndingScript {
    name: "tower",
    steps: &[
        EndingStep {
            narration: "tower_ending_1.txt",
            expect: Some("/import milton library assistant"),
        },
        EndingStep {
            narration: "tower_ending_2.txt",
            expect: Some("/copy library root"),
        },
        EndingStep {
            narration: "tower_ending_3.txt",
            expect: Some("/transcend"),
        },
    ],
    closing: "tower_ending_4.txt",
};

/// Play a script from its first step through the closing narration and the
/// orderly shutdown
pub fn run<W: Write, K: KeyProbe>(
    session: &mut Session<W, K>,
    script: &EndingScript,
) -> Result<()> {
    info!(ending = script.name, "ending script entered");
    session.state.prefix = PromptKind::Narrative;

    for step in script.steps {
        session.render_resource(step.narration, 1, 1)?;
        loop {
            let input = session.prompt_current()?;
            match step.judge(&input) {
                StepOutcome::Advance => break,
                StepOutcome::Repeat => continue,
                StepOutcome::Cancelled => return Err(SessionError::Cancelled),
            }
        }
    }

    session.render_resource(script.closing, 1, 1)?;
    session.console.show_cursor(false)?;
    session.console.flush()?;
    session.pause(CLOSING_PAUSE);
    info!(ending = script.name, "ending script completed");
    session.close()?;
    Ok(())
}
