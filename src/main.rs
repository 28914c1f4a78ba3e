//! mlaterm - an interactive-story terminal session
//!
//! mlaterm simulates a terminal that talks back: responses are typed out
//! character by character, and a small set of stateful sub-systems (a device
//! manager with a floor-lock panel, a screensaver, a crash screen, and three
//! scripted endings) gate progress through the story.
//!
//! # Quick Start
//!
//! ```text
//! mlaterm            # Start the session
//! mlaterm -d         # Start with debug output enabled
//! mlaterm -n         # Leave the resource tree unpacked on exit
//! ```
//!
//! # Commands
//!
//! | Command | Action |
//! |---------|--------|
//! | help | Show the command listing |
//! | list [dir] | List found texts |
//! | open <file> | Read a found text |
//! | run <program> | Launch a stored program |
//! | device_manager | Open the device-configuration console |
//! | screensaver / crash | Full-screen takeovers |
//! | debug on/off | Toggle debug output |
//! | exit [force] | Close the session |
//!
//! Story text lives in `resources/`; on exit the tree is packed into
//! `resources.pak` and unpacked again on the next boot.

mod apps;
mod config;
mod resources;
mod session;
mod term;

use std::env;
use std::path::PathBuf;

use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::resources::ResourceStore;
use crate::session::{PromptSet, Session};
use crate::term::StdConsole;

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Window title shown while the session runs
const WINDOW_TITLE: &str = "MLA Terminal";

/// Boot flags read once from the command line
struct Flags {
    /// Show failure detail and parsed tokens
    debug: bool,
    /// Repack the resource tree on orderly exit
    packing: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Self {
            debug: false,
            packing: true,
        }
    }
}

fn print_version() {
    eprintln!("mlaterm {}", VERSION);
}

fn print_help() {
    eprintln!("mlaterm {} - an interactive-story terminal session", VERSION);
    eprintln!();
    eprintln!("Usage: mlaterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -d, --debug           Enable debug output");
    eprintln!("  -n, --no-pack         Do not repack resources into resources.pak on exit");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Configuration: ./terminal.toml (palette, typing delay, resource dir)");
    eprintln!();
    eprintln!("Exit: type 'exit' at the prompt to close the session");
}

fn parse_args() -> Result<Flags, String> {
    let args: Vec<String> = env::args().collect();
    let mut flags = Flags::default();

    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-d" | "--debug" => {
                flags.debug = true;
            }
            "-n" | "--no-pack" => {
                flags.packing = false;
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
    }

    Ok(flags)
}

/// Initialize logging to a file; the screen belongs to the story
fn init_logging() {
    let home = env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from);

    let log_path = home
        .map(|h| h.join(".mlaterm").join("mlaterm.log"))
        .unwrap_or_else(|| PathBuf::from("mlaterm.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let flags = match parse_args() {
        Ok(flags) => flags,
        Err(err) => {
            eprintln!("Error: {}", err);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("mlaterm {} starting", VERSION);

    let config = Config::load();
    let base = config
        .resource_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    info!(base = %base.display(), packing = flags.packing, "resource root resolved");
    let store = ResourceStore::new(base);

    let mut console = StdConsole::stdout();
    console.init(WINDOW_TITLE)?;

    // Restore the loose tree from the archive before anything reads it
    if let Err(err) = store.unpack_if_present() {
        error!(error = %err, "failed to unpack resource archive");
        return boot_failure(console, store, &config, &flags);
    }

    // The prompt prefixes and the boot narration are the resources the
    // session cannot start without
    let prompts = store
        .fetch("user_prefix.txt")
        .ok()
        .and_then(|text| PromptSet::from_text(&text));
    let boot_text = store.fetch("boot.txt").ok();

    let (Some(prompts), Some(boot_text)) = (prompts, boot_text) else {
        error!("required boot resources are missing");
        return boot_failure(console, store, &config, &flags);
    };

    let mut session = Session::new(console, store, prompts, &config, flags.debug, flags.packing);
    let text_color = session.palette.text;
    let delay = session.typing_delay();
    session.console.type_out(&boot_text, text_color, 0, 1, delay)?;

    let result = session.run();
    let _ = session.console.cleanup();
    result?;

    info!("mlaterm exiting normally");
    Ok(())
}

/// Fatal boot path: tell the user, wait for a key, still run the packing
/// step so no partial archive state is left behind, and exit non-zero.
fn boot_failure(
    mut console: StdConsole,
    store: ResourceStore,
    config: &Config,
    flags: &Flags,
) -> anyhow::Result<()> {
    let delay = config.typing_delay();
    let _ = console.type_out(
        "Initialization failed. Could not find resource files. Press any key to exit.",
        config.resolve_palette().text,
        1,
        2,
        delay,
    );
    let _ = console.read_key();
    if let Err(err) = store.pack_if_enabled(flags.packing) {
        error!(error = %err, "failed to repack resources during boot failure");
    }
    let _ = console.cleanup();
    std::process::exit(1);
}
