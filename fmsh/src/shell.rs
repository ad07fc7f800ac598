//! Shell state and dispatch loop
//!
//! One line at a time: parse, resolve, confirm if the command asks for it,
//! then execute under a fresh cancellation token. Interrupts arrive over a
//! channel so the terminal driver and tests feed them the same way.

use crate::cancel::CancellationToken;
use crate::commands;
use crate::console::{Console, TerminalConsole};
use crate::error::{FmshError, FmshResult};
use crate::help::wants_help;
use crate::interrupt::{InterruptAction, InterruptTracker, DEFAULT_WINDOW};
use crate::parser::{parse_command_with_quotes, ParsedCommand};
use crate::registry::{CommandContext, CommandRegistry};
use crate::session::Session;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellState {
    Idle,
    AwaitingLine,
    Parsing,
    ResolvingCommand,
    Confirming,
    Executing,
    Exited,
}

const EXIT_HINT: &str = "(To exit, press Ctrl+C again or type \".exit\")";

enum Confirmation {
    Proceed,
    Declined,
    Exit,
}

/// What the driver should do after a line or an interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell {
    registry: CommandRegistry,
    session: Session,
    console: Arc<dyn Console>,
    tracker: InterruptTracker,
    interrupt_tx: mpsc::UnboundedSender<()>,
    interrupt_rx: mpsc::UnboundedReceiver<()>,
    current: Option<CancellationToken>,
    state: ShellState,
    show_cwd: bool,
}

impl Shell {
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut CommandRegistry {
        &mut self.registry
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn console(&self) -> &Arc<dyn Console> {
        &self.console
    }

    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Token of the operation in flight, if any.
    pub fn current_token(&self) -> Option<&CancellationToken> {
        self.current.as_ref()
    }

    /// Sender used to deliver interrupts that happen while a command runs.
    pub fn interrupt_handle(&self) -> mpsc::UnboundedSender<()> {
        self.interrupt_tx.clone()
    }

    pub fn welcome(&mut self) {
        tracing::info!(user = %self.session.username, cwd = %self.session.cwd_display(), "Session started");
        self.console
            .print(&format!("Welcome to the File Manager, {}!", self.session.username));
        self.print_cwd();
        self.state = ShellState::AwaitingLine;
    }

    pub fn print_cwd(&self) {
        self.console
            .print(&format!("You are currently in {}", self.session.cwd_display()));
    }

    /// Print the farewell and move to the terminal state.
    pub fn exit(&mut self) -> Flow {
        if self.state != ShellState::Exited {
            tracing::info!(user = %self.session.username, "Session finished");
            self.console.print(&format!(
                "Thank you for using File Manager, {}, goodbye!",
                self.session.username
            ));
            self.state = ShellState::Exited;
        }
        Flow::Exit
    }

    /// Handle one input line end to end.
    pub async fn dispatch_line(&mut self, line: &str) -> Flow {
        match self.state {
            ShellState::Exited => return Flow::Exit,
            ShellState::Confirming | ShellState::Executing => {
                tracing::debug!(line = %line, "Dropping input while busy");
                return Flow::Continue;
            }
            _ => {}
        }

        self.state = ShellState::Parsing;
        let parsed = parse_command_with_quotes(line.trim());
        if parsed.is_empty() {
            self.state = ShellState::AwaitingLine;
            return Flow::Continue;
        }

        let flow = match self.run_parsed(&parsed).await {
            Ok(flow) => flow,
            Err(FmshError::Exit) => Flow::Exit,
            Err(e) if e.is_aborted() => {
                tracing::debug!(command = %parsed.command, "Command aborted");
                Flow::Continue
            }
            Err(e) => {
                tracing::debug!(command = %parsed.command, error = %e, "Command failed");
                self.console.error(&format!("Error: {e}"));
                Flow::Continue
            }
        };

        match flow {
            Flow::Exit => self.exit(),
            Flow::Continue => {
                if self.show_cwd {
                    self.print_cwd();
                }
                self.state = ShellState::AwaitingLine;
                Flow::Continue
            }
        }
    }

    /// Interrupt delivered outside of command execution (e.g. Ctrl+C at the prompt).
    pub fn on_interrupt(&mut self) -> Flow {
        let running = self.current.is_some();
        match self.tracker.register(Instant::now(), running) {
            InterruptAction::Exit => self.exit(),
            InterruptAction::AbortOperation => {
                if let Some(token) = &self.current {
                    token.cancel();
                }
                self.console.notice("Operation interrupted");
                Flow::Continue
            }
            InterruptAction::Hint => {
                self.console.notice(EXIT_HINT);
                Flow::Continue
            }
        }
    }

    async fn run_parsed(&mut self, parsed: &ParsedCommand) -> FmshResult<Flow> {
        self.state = ShellState::ResolvingCommand;
        let command = self
            .registry
            .get(&parsed.command)
            .ok_or_else(|| FmshError::UnknownCommand(parsed.command.clone()))?;

        if wants_help(&parsed.args) {
            if let Some(help) = self.registry.generate_command_help(&parsed.command) {
                self.console.print(help.trim_end());
            }
            return Ok(Flow::Continue);
        }

        if command.requires_confirmation {
            self.state = ShellState::Confirming;
            let invocation = std::iter::once(parsed.command.as_str())
                .chain(parsed.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            let question = format!("Are you sure you want to run '{invocation}'?");
            match self.confirm(question).await {
                Confirmation::Proceed => {}
                Confirmation::Declined => {
                    self.console.notice("Operation cancelled");
                    return Ok(Flow::Continue);
                }
                Confirmation::Exit => return Ok(Flow::Exit),
            }
        }

        self.execute(parsed).await
    }

    /// Ask on a blocking worker so interrupts are still tracked while the
    /// user decides. A lone interrupt only prints the hint; a double one exits
    /// even though the question is unanswered.
    async fn confirm(&mut self, question: String) -> Confirmation {
        while self.interrupt_rx.try_recv().is_ok() {}

        let console = Arc::clone(&self.console);
        let mut answer = tokio::task::spawn_blocking(move || console.confirm(&question));
        let interrupts = &mut self.interrupt_rx;
        let tracker = &mut self.tracker;

        loop {
            tokio::select! {
                biased;
                Some(()) = interrupts.recv() => {
                    match tracker.register(Instant::now(), false) {
                        InterruptAction::Exit => {
                            tracing::debug!("Exit requested during confirmation");
                            return Confirmation::Exit;
                        }
                        InterruptAction::AbortOperation | InterruptAction::Hint => {
                            self.console.notice(EXIT_HINT);
                        }
                    }
                }
                res = &mut answer => {
                    return match res {
                        Ok(true) => Confirmation::Proceed,
                        Ok(false) => Confirmation::Declined,
                        Err(e) => {
                            tracing::warn!(error = %e, "Confirmation prompt failed");
                            Confirmation::Declined
                        }
                    };
                }
            }
        }
    }

    async fn execute(&mut self, parsed: &ParsedCommand) -> FmshResult<Flow> {
        self.state = ShellState::Executing;

        // Interrupts from before this invocation started belong to nobody.
        while self.interrupt_rx.try_recv().is_ok() {}

        let token = CancellationToken::new();
        self.current = Some(token.clone());

        let console = Arc::clone(&self.console);
        let registry = &self.registry;
        let tracker = &mut self.tracker;
        let interrupts = &mut self.interrupt_rx;
        let mut ctx = CommandContext {
            session: &mut self.session,
            console: console.as_ref(),
            registry,
        };

        let fut = registry.execute(&parsed.command, &parsed.args, &mut ctx, &token);
        tokio::pin!(fut);

        let outcome = loop {
            let exit = tokio::select! {
                res = &mut fut => break res.map(|()| Flow::Continue),
                Some(()) = interrupts.recv() => {
                    match tracker.register(Instant::now(), true) {
                        InterruptAction::Exit => true,
                        InterruptAction::AbortOperation | InterruptAction::Hint => {
                            tracing::debug!(command = %parsed.command, "Aborting running command");
                            token.cancel();
                            console.notice("Operation interrupted");
                            false
                        }
                    }
                }
            };
            if exit {
                // The handler still gets to observe the abort and remove partial output.
                token.cancel();
                let _ = (&mut fut).await;
                break Ok(Flow::Exit);
            }
        };

        self.current = None;
        outcome
    }
}

pub struct ShellBuilder {
    username: String,
    cwd: Option<PathBuf>,
    console: Option<Arc<dyn Console>>,
    interrupt_window: Duration,
    show_cwd: bool,
    builtins: bool,
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            username: String::new(),
            cwd: None,
            console: None,
            interrupt_window: DEFAULT_WINDOW,
            show_cwd: true,
            builtins: true,
        }
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = username.to_string();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn console(mut self, console: Arc<dyn Console>) -> Self {
        self.console = Some(console);
        self
    }

    pub fn interrupt_window(mut self, window: Duration) -> Self {
        self.interrupt_window = window;
        self
    }

    pub fn show_cwd(mut self, show: bool) -> Self {
        self.show_cwd = show;
        self
    }

    /// Start from an empty registry instead of the built-in command set.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    pub fn build(self) -> FmshResult<Shell> {
        let mut registry = CommandRegistry::new();
        if self.builtins {
            commands::register_builtins(&mut registry)?;
        }

        let session = match self.cwd {
            Some(cwd) => Session::new(cwd, &self.username),
            None => Session::in_home(&self.username),
        };
        let (interrupt_tx, interrupt_rx) = mpsc::unbounded_channel();

        Ok(Shell {
            registry,
            session,
            console: self.console.unwrap_or_else(|| Arc::new(TerminalConsole::new())),
            tracker: InterruptTracker::new(self.interrupt_window),
            interrupt_tx,
            interrupt_rx,
            current: None,
            state: ShellState::Idle,
            show_cwd: self.show_cwd,
        })
    }
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::CapturedConsole;
    use crate::registry::{Category, CommandDoc};

    fn shell_with(console: Arc<CapturedConsole>) -> Shell {
        ShellBuilder::new()
            .username("tester")
            .cwd("/")
            .console(console)
            .show_cwd(false)
            .without_builtins()
            .build()
            .unwrap()
    }

    #[test]
    fn test_shell_creation() {
        let console = Arc::new(CapturedConsole::new());
        let shell = shell_with(console);
        assert_eq!(shell.state(), ShellState::Idle);
        assert_eq!(shell.session().username, "tester");
        assert!(shell.current_token().is_none());
        assert!(shell.registry().is_empty());
    }

    #[test]
    fn test_builtins_registered_by_default() {
        let shell = ShellBuilder::new()
            .cwd("/")
            .console(Arc::new(CapturedConsole::new()))
            .build()
            .unwrap();
        assert_eq!(shell.session().username, "Anonymous");
        assert!(shell.registry().has("ls"));
        assert!(shell.registry().has("dir"));
        assert!(shell.registry().requires_confirmation("del"));
    }

    #[tokio::test]
    async fn test_empty_line_is_noop() {
        let console = Arc::new(CapturedConsole::new());
        let mut shell = shell_with(console.clone());
        assert_eq!(shell.dispatch_line("   ").await, Flow::Continue);
        assert!(console.lines().is_empty());
        assert_eq!(shell.state(), ShellState::AwaitingLine);
    }

    #[tokio::test]
    async fn test_unknown_command_prints_error() {
        let console = Arc::new(CapturedConsole::new());
        let mut shell = shell_with(console.clone());
        assert_eq!(shell.dispatch_line("bogus arg").await, Flow::Continue);
        let errors = console.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Error: Invalid command 'bogus'"));
    }

    #[tokio::test]
    async fn test_abort_is_silent() {
        let console = Arc::new(CapturedConsole::new());
        let mut shell = shell_with(console.clone());
        shell.registry_mut().register_fn(
            "boom",
            |_args: &[String], _ctx: &mut CommandContext<'_>| Err(FmshError::Aborted),
            CommandDoc::new(Category::Utility, "always aborts"),
            false,
        );
        assert_eq!(shell.dispatch_line("boom").await, Flow::Continue);
        assert!(console.errors().is_empty());
        assert!(shell.current_token().is_none());
    }

    #[tokio::test]
    async fn test_exit_error_ends_session() {
        let console = Arc::new(CapturedConsole::new());
        let mut shell = shell_with(console.clone());
        shell.registry_mut().register_fn(
            "quit",
            |_args: &[String], _ctx: &mut CommandContext<'_>| Err(FmshError::Exit),
            CommandDoc::new(Category::Utility, "leave"),
            false,
        );
        assert_eq!(shell.dispatch_line("quit").await, Flow::Exit);
        assert_eq!(shell.state(), ShellState::Exited);
        assert!(console.output().contains("goodbye"));
        assert_eq!(shell.dispatch_line("quit").await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_help_flag_shows_command_help() {
        let console = Arc::new(CapturedConsole::new());
        let mut shell = shell_with(console.clone());
        shell.registry_mut().register_fn(
            "never",
            |_args: &[String], _ctx: &mut CommandContext<'_>| Err(FmshError::InvalidArgument("ran".into())),
            CommandDoc::new(Category::Utility, "must not run").syntax("never"),
            true,
        );
        shell.dispatch_line("never --help").await;
        assert!(console.output().contains("never - must not run"));
        assert!(console.questions().is_empty());
        assert!(console.errors().is_empty());
    }

    #[test]
    fn test_idle_interrupts() {
        let console = Arc::new(CapturedConsole::new());
        let mut shell = shell_with(console.clone());
        assert_eq!(shell.on_interrupt(), Flow::Continue);
        assert_eq!(console.notices().len(), 1);
        assert_eq!(shell.on_interrupt(), Flow::Exit);
        assert_eq!(shell.state(), ShellState::Exited);
        assert!(console.output().contains("Thank you for using File Manager, tester, goodbye!"));
    }
}
