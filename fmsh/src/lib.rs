//! fmsh - Interactive file manager shell
//!
//! This crate provides:
//! - A quote-aware command-line parser with flag helpers
//! - A command registry with aliases, categories and confirmation gating
//! - A dispatch loop with cooperative cancellation of long-running operations
//! - A local file engine (navigation, CRUD, search, hashing, compression, OS info)

pub mod cancel;
pub mod commands;
pub mod console;
pub mod engine;
pub mod error;
pub mod help;
pub mod interrupt;
pub mod parser;
pub mod registry;
pub mod session;
pub mod shell;

pub use cancel::CancellationToken;
pub use console::{CapturedConsole, Console, TerminalConsole};
pub use error::{FmshError, FmshResult};
pub use parser::{parse_command_with_quotes, ParsedCommand};
pub use registry::{Category, Command, CommandContext, CommandDoc, CommandRegistry, Handler};
pub use session::Session;
pub use shell::{Flow, Shell, ShellBuilder, ShellState};
