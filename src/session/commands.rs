//! Command table and the simple handlers
//!
//! Commands that finish in one exchange live here; anything with its own
//! loop (device manager, endings, takeovers) lives under `apps`.

use std::io::Write;
use std::time::Duration;

use tracing::info;

use crate::apps::pager;
use crate::resources::ResourceError;
use crate::term::waiter::KeyProbe;

use super::{PromptKind, Result, Session};

/// Everything the dispatcher knows how to route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Open,
    Run,
    Exit,
    Admin,
    DeviceManager,
    Screensaver,
    Crash,
    Debug,
    Banish,
    AccessCommPortal,
    Eternalize,
    Transcend,
    Messenger,
}

impl Command {
    /// Look up a lowercased first token. Narrative triggers keep their
    /// leading slash.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "help" => Some(Self::Help),
            "list" => Some(Self::List),
            "open" => Some(Self::Open),
            "run" => Some(Self::Run),
            "exit" => Some(Self::Exit),
            "admin" => Some(Self::Admin),
            "device_manager" => Some(Self::DeviceManager),
            "screensaver" => Some(Self::Screensaver),
            "crash" => Some(Self::Crash),
            "debug" => Some(Self::Debug),
            "/banish" => Some(Self::Banish),
            "access_comm_portal" => Some(Self::AccessCommPortal),
            "/eternalize" => Some(Self::Eternalize),
            "/transcend" => Some(Self::Transcend),
            "/messenger" => Some(Self::Messenger),
            _ => None,
        }
    }
}

impl<W: Write, K: KeyProbe> Session<W, K> {
    /// `list [dir]`: directories then files under the found-texts tree
    pub(super) fn cmd_list(&mut self, dir: &str) -> Result<()> {
        self.say("Searching for locally cached resources....", 0, 1)?;

        match self.store.list_found(dir) {
            Ok((dirs, files)) => {
                let listing = self.palette.listing;
                let delay = self.typing_delay();
                for name in dirs.iter().chain(files.iter()) {
                    self.console
                        .type_out(&format!("  {name}"), listing, 1, 0, delay)?;
                }
                self.console.blank_lines(3)?;
            }
            Err(ResourceError::NotFound(_)) => {
                self.say(&format!("Could not find folder: '{dir}'"), 0, 1)?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// `open <file>`: show a found text in the pager until a keypress
    pub(super) fn cmd_open(&mut self, file: &str) -> Result<()> {
        let text = if file.contains('/') || file.contains('\\') {
            self.store.read_found(file)
        } else {
            self.store.fetch(file)
        };

        match text {
            Ok(content) => pager::run(self, &content)?,
            Err(ResourceError::NotFound(_)) => {
                self.say(&format!("Could not find file: '{file}'"), 0, 1)?;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    /// `run <program>`: the assistant is the only known program
    pub(super) fn cmd_run(&mut self, program: &str) -> Result<()> {
        if program.eq_ignore_ascii_case("mla") {
            self.say(
                "Milton Library Assistant is currently unavailable. Please try again later.",
                0,
                1,
            )?;
        } else {
            self.say(&format!("Could not find program: '{program}'"), 0, 1)?;
        }
        Ok(())
    }

    /// `exit [force]`
    pub(super) fn cmd_exit(&mut self, arg: Option<&str>) -> Result<()> {
        match arg {
            Some(arg) if arg.eq_ignore_ascii_case("force") => self.request_exit(),
            Some(_) => {
                self.say("exit - close the terminal session", 1, 1)?;
                self.say("exit force - force the terminal session to close", 0, 2)?;
            }
            None => {
                self.render_resource("exit.txt", 1, 1)?;
                self.console.show_cursor(false)?;
                self.console.flush()?;
                self.pause(Duration::from_millis(1000));
                self.close()?;
            }
        }
        Ok(())
    }

    /// `admin`: the authentication program never shipped, but the prompt
    /// changes anyway
    pub(super) fn cmd_admin(&mut self) -> Result<()> {
        self.say(
            "Administrator authentication program currently unavailable. Please try again later.",
            0,
            1,
        )?;
        self.state.prefix = PromptKind::Admin;
        self.state.admin = true;
        info!("administrator mode granted");
        Ok(())
    }

    /// `debug [on|off]`
    pub(super) fn cmd_debug(&mut self, arg: Option<&str>) -> Result<()> {
        match arg {
            Some("on") => {
                self.state.debug = true;
                self.say("Debug mode activated.", 0, 1)?;
            }
            Some("off") => {
                self.state.debug = false;
                self.say("Debug mode deactivated.", 0, 1)?;
            }
            _ => {
                self.say("debug on - Activate debug messages", 1, 1)?;
                self.say("debug off - Deactivate debug messages", 0, 2)?;
            }
        }
        Ok(())
    }

    /// `/banish`: admin-gated dialogue that only "resume" escapes
    pub(super) fn cmd_banish(&mut self) -> Result<()> {
        if !self.state.admin {
            self.say("Administrator permissions required.", 0, 1)?;
            return Ok(());
        }

        self.render_resource("banish.txt", 1, 1)?;
        self.prompt("")?;
        self.render_resource("banish_2.txt", 1, 1)?;
        while self.prompt("")? != "resume" {
            self.render_resource("banished.txt", 1, 1)?;
        }
        self.render_resource("resume_session.txt", 1, 1)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testutil::{scripted_session, story_tree};
    use crate::term::waiter::testkeys::FakeKeys;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(Command::parse("help"), Some(Command::Help));
        assert_eq!(Command::parse("device_manager"), Some(Command::DeviceManager));
        assert_eq!(Command::parse("/transcend"), Some(Command::Transcend));
    }

    #[test]
    fn test_parse_rejects_unknown_and_unslashed() {
        assert_eq!(Command::parse("frobnicate"), None);
        // Narrative triggers require the slash
        assert_eq!(Command::parse("transcend"), None);
        assert_eq!(Command::parse("banish"), None);
    }

    #[test]
    fn test_admin_flips_state_and_prefix() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::empty());

        session.handle_line("admin").unwrap();

        assert!(session.state.admin);
        assert_eq!(session.state.prefix, PromptKind::Admin);
    }

    #[test]
    fn test_debug_toggles() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::empty());

        session.handle_line("debug on").unwrap();
        assert!(session.state.debug);
        session.handle_line("debug off").unwrap();
        assert!(!session.state.debug);
        // Bad argument prints usage and changes nothing
        session.handle_line("debug sideways").unwrap();
        assert!(!session.state.debug);
    }

    #[test]
    fn test_banish_requires_admin() {
        let dir = story_tree();
        let mut session = scripted_session(&dir, FakeKeys::empty());

        // No admin: the handler refuses before prompting for anything
        session.handle_line("/banish").unwrap();
        assert!(!session.state.exit_requested);
    }
}
