//! Session dispatcher and state.
//!
//! The REPL at the heart of the engine: render the current prompt prefix,
//! read a line, tokenize it, route the first token to a handler. The
//! dispatcher is the only place failures are caught: sub-dialogues
//! propagate them up, and a `Cancelled` never travels further than here.

pub mod commands;
pub mod tokenizer;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::style::Color;
use thiserror::Error;
use tracing::{info, warn};

use crate::apps::device_manager::FloorRegistry;
use crate::config::{Config, Palette, ScreensaverConfig};
use crate::resources::{ResourceError, ResourceStore};
use crate::term::snapshot::SnapshotError;
use crate::term::waiter::KeyProbe;
use crate::term::Console;

use commands::Command;
use tokenizer::tokenize;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// User typed the cancellation word inside a sub-dialogue
    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Which prompt prefix the session shows before each command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Bare narrative prompt, used inside ending scripts
    Narrative,
    /// Default guest prompt
    Guest,
    /// Guest prompt for an unidentified host
    Unknown,
    /// Administrator prompt
    Admin,
}

/// The prefix strings, loaded from the `user_prefix.txt` resource
#[derive(Debug, Clone)]
pub struct PromptSet {
    narrative: String,
    guest: String,
    unknown: String,
    admin: String,
}

impl PromptSet {
    /// One prefix per line: narrative, guest, unknown-host, admin
    pub fn from_text(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        Some(Self {
            narrative: lines.next()?.to_string(),
            guest: lines.next()?.to_string(),
            unknown: lines.next()?.to_string(),
            admin: lines.next()?.to_string(),
        })
    }

    pub fn get(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Narrative => &self.narrative,
            PromptKind::Guest => &self.guest,
            PromptKind::Unknown => &self.unknown,
            PromptKind::Admin => &self.admin,
        }
    }
}

/// Session-wide flags and the active prompt
#[derive(Debug)]
pub struct SessionState {
    pub prefix: PromptKind,
    pub admin: bool,
    pub debug: bool,
    pub exit_requested: bool,
    pub packing_enabled: bool,
}

/// The running session: console, resources, state, look and pacing
pub struct Session<W: Write, K: KeyProbe> {
    pub console: Console<W, K>,
    pub store: ResourceStore,
    pub state: SessionState,
    pub floors: FloorRegistry,
    pub palette: Palette,
    pub screensaver: ScreensaverConfig,
    prompts: PromptSet,
    typing_delay: Duration,
}

impl<W: Write, K: KeyProbe> Session<W, K> {
    pub fn new(
        console: Console<W, K>,
        store: ResourceStore,
        prompts: PromptSet,
        config: &Config,
        debug: bool,
        packing_enabled: bool,
    ) -> Self {
        Self {
            console,
            store,
            state: SessionState {
                prefix: PromptKind::Guest,
                admin: false,
                debug,
                exit_requested: false,
                packing_enabled,
            },
            floors: FloorRegistry::default(),
            palette: config.resolve_palette(),
            screensaver: config.screensaver.clone(),
            prompts,
            typing_delay: config.typing_delay(),
        }
    }

    pub fn typing_delay(&self) -> Duration {
        self.typing_delay
    }

    /// The prefix string for the session's current mode
    pub fn prompt_text(&self) -> &str {
        self.prompts.get(self.state.prefix)
    }

    /// Command loop: runs until a handler requests exit
    pub fn run(&mut self) -> io::Result<()> {
        info!("session loop started");
        while !self.state.exit_requested {
            let line = self.read_command_line()?;
            self.handle_line(&line)?;
        }
        info!("session loop finished");
        Ok(())
    }

    /// Tokenize one input line, dispatch it, and render any failure.
    /// This is the dispatcher boundary: nothing propagates past it except
    /// terminal i/o breakage.
    pub fn handle_line(&mut self, line: &str) -> io::Result<()> {
        let tokens = tokenize(line);

        if self.state.debug {
            self.say("Input strings:", 1, 1)?;
            for token in &tokens {
                self.say(token, 0, 1)?;
            }
            self.console.blank_lines(1)?;
        }

        if tokens.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.dispatch(&tokens) {
            self.report(err)?;
        }
        Ok(())
    }

    /// Route the first token to its handler
    fn dispatch(&mut self, tokens: &[String]) -> Result<()> {
        let word = tokens[0].to_lowercase();
        let Some(command) = Command::parse(&word) else {
            self.render_resource("unknown_error.txt", 0, 1)?;
            return Ok(());
        };

        match command {
            Command::Help => self.render_resource("help.txt", 1, 1)?,
            Command::List => {
                let dir = tokens.get(1).map(String::as_str).unwrap_or("");
                self.cmd_list(dir)?;
            }
            Command::Open => match tokens.get(1) {
                Some(file) => self.cmd_open(file)?,
                None => self.say("Please enter a file to open.", 0, 1)?,
            },
            Command::Run => match tokens.get(1) {
                Some(program) => self.cmd_run(program)?,
                None => self.say("Please enter a program to run.", 0, 1)?,
            },
            Command::Exit => self.cmd_exit(tokens.get(1).map(String::as_str))?,
            Command::Admin => self.cmd_admin()?,
            Command::DeviceManager => crate::apps::device_manager::run(self)?,
            Command::Screensaver => crate::apps::screensaver::run(self)?,
            Command::Crash => crate::apps::crash::run(self)?,
            Command::Debug => {
                let arg = tokens.get(1).map(|arg| arg.to_lowercase());
                self.cmd_debug(arg.as_deref())?;
            }
            Command::Banish => self.cmd_banish()?,
            Command::AccessCommPortal => self.render_resource("access_comm_portal.txt", 1, 1)?,
            Command::Eternalize => crate::apps::endings::run(self, &crate::apps::endings::GATES)?,
            Command::Transcend => crate::apps::endings::run(self, &crate::apps::endings::TOWER)?,
            Command::Messenger => crate::apps::endings::run(self, &crate::apps::endings::CRYPT)?,
        }
        Ok(())
    }

    /// Render a failure at the dispatcher boundary and keep going
    fn report(&mut self, err: SessionError) -> io::Result<()> {
        match err {
            SessionError::Cancelled => {
                info!("operation cancelled by user");
                self.say("Operation cancelled.", 1, 2)?;
                self.state.prefix = PromptKind::Guest;
            }
            SessionError::Resource(ResourceError::NotFound(name)) => {
                self.say(&format!("Could not find resource: '{name}'."), 1, 2)?;
            }
            err => {
                warn!(error = %err, "command failed");
                self.say("Exception thrown.", 1, 2)?;
                if self.state.debug {
                    let detail = err.to_string();
                    self.console
                        .type_out(&detail, Color::Red, 0, 2, self.typing_delay)?;
                }
            }
        }
        Ok(())
    }

    /// Type the current prefix and read one command line, preserving case
    fn read_command_line(&mut self) -> io::Result<String> {
        let prefix = self.prompt_text().to_string();
        self.console
            .type_out(&prefix, self.palette.text, 0, 0, self.typing_delay)?;
        self.console.set_fg(self.palette.input)?;
        // Keys mashed while the engine was typing are not input
        self.console.drain_pending()?;
        self.console.read_line()
    }

    /// Sub-dialogue prompt: type `prefix`, read a line, normalize case
    pub fn prompt(&mut self, prefix: &str) -> io::Result<String> {
        self.console
            .type_out(prefix, self.palette.text, 0, 0, self.typing_delay)?;
        self.console.set_fg(self.palette.input)?;
        self.console.drain_pending()?;
        Ok(self.console.read_line()?.to_lowercase())
    }

    /// Prompt with the session's current prefix
    pub fn prompt_current(&mut self) -> io::Result<String> {
        let prefix = self.prompt_text().to_string();
        self.prompt(&prefix)
    }

    /// Typewrite narration in the session text color
    pub fn say(&mut self, text: &str, blanks_before: u16, blanks_after: u16) -> io::Result<()> {
        self.console
            .type_out(text, self.palette.text, blanks_before, blanks_after, self.typing_delay)
    }

    /// Fetch a stored text and typewrite it
    pub fn render_resource(&mut self, name: &str, blanks_before: u16, blanks_after: u16) -> Result<()> {
        let text = self.store.fetch(name)?;
        self.say(&text, blanks_before, blanks_after)?;
        Ok(())
    }

    /// Uninterruptible pause with the cursor parked
    pub fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }

    /// Orderly shutdown: repack the resource tree, then leave the loop
    pub fn close(&mut self) -> Result<()> {
        self.store.pack_if_enabled(self.state.packing_enabled)?;
        self.request_exit();
        Ok(())
    }

    /// Leave the loop without touching the resource tree
    pub fn request_exit(&mut self) {
        info!("exit requested");
        self.state.exit_requested = true;
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use crate::term::waiter::testkeys::FakeKeys;
    use std::fs;
    use tempfile::TempDir;

    pub fn prompt_set() -> PromptSet {
        PromptSet::from_text("> \n[guest@local]# \n[guest@unknown]# \n[admin@local]# \n").unwrap()
    }

    /// Temp resource tree with the texts the dispatcher tests touch
    pub fn story_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let text_dir = dir.path().join("resources/program/text");
        fs::create_dir_all(&text_dir).unwrap();
        for (name, content) in [
            ("unknown_error.txt", "Unknown command."),
            ("exit.txt", "Connection closed."),
            ("crypt_ending_1.txt", "A voice echoes in the crypt."),
            ("crypt_ending_2.txt", "The voice fades."),
            ("tower_ending_1.txt", "The tower rises before you."),
            ("tower_ending_2.txt", "The library opens."),
            ("tower_ending_3.txt", "The root is copied."),
            ("tower_ending_4.txt", "You ascend."),
            ("gates_ending.txt", "The gates close behind you."),
        ] {
            fs::write(text_dir.join(name), content).unwrap();
        }
        dir
    }

    pub fn scripted_session(dir: &TempDir, keys: FakeKeys) -> Session<Vec<u8>, FakeKeys> {
        let console = Console::new(Vec::new(), keys, 80, 24);
        let store = ResourceStore::new(dir.path());
        Session::new(console, store, prompt_set(), &Config::default(), false, true)
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::{scripted_session, story_tree};
    use super::*;
    use crate::term::waiter::testkeys::FakeKeys;

    #[test]
    fn test_unknown_command_leaves_state_untouched() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::empty());

        session.handle_line("frobnicate the widget").unwrap();

        assert_eq!(session.state.prefix, PromptKind::Guest);
        assert!(!session.state.admin);
        assert!(!session.state.debug);
        assert!(!session.state.exit_requested);
    }

    #[test]
    fn test_empty_line_is_a_silent_noop() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::empty());

        session.handle_line("   ").unwrap();

        let blank = session.console.grid().cell(0, 0).ch;
        assert_eq!(blank, ' ');
        assert_eq!(session.console.grid().cursor(), (0, 0));
    }

    #[test]
    fn test_cancelled_ending_resets_prefix_and_skips_packing() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::typed("cancel\r"));
        session.state.prefix = PromptKind::Admin;

        session.handle_line("/messenger").unwrap();

        // Cancelled was caught at the dispatcher: prefix reset, no exit
        assert_eq!(session.state.prefix, PromptKind::Guest);
        assert!(!session.state.exit_requested);
        // The archive was never packed
        assert!(!dir.path().join("resources.pak").exists());
    }

    #[test]
    fn test_completed_ending_packs_and_exits() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::typed("anything\r"));

        session.handle_line("/messenger").unwrap();

        assert!(session.state.exit_requested);
        assert!(dir.path().join("resources.pak").exists());
        assert!(!dir.path().join("resources").exists());
    }

    #[test]
    fn test_exit_force_skips_packing() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::empty());

        session.handle_line("exit force").unwrap();

        assert!(session.state.exit_requested);
        assert!(!dir.path().join("resources.pak").exists());
    }

    #[test]
    fn test_prompt_set_requires_four_lines() {
        assert!(PromptSet::from_text("> \nguest\n").is_none());
        let set = PromptSet::from_text("> \na\nb\nc").unwrap();
        assert_eq!(set.get(PromptKind::Narrative), "> ");
        assert_eq!(set.get(PromptKind::Admin), "c");
    }
}
