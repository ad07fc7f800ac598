use clap::Parser;
use fmsh::{Flow, Shell, ShellBuilder};
use fmsh_config::{FmshConfig, LogFormat, ShellConfig};
use std::sync::{Arc, RwLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

mod completer;

/// fmsh - Interactive file manager shell
#[derive(Parser, Debug)]
#[command(name = "fmsh", version, about)]
struct Args {
    /// Name used in the greeting and the prompt
    #[arg(long)]
    username: Option<String>,

    /// Configuration file (replaces the default search locations)
    #[arg(long)]
    config: Option<String>,

    /// Execute command and exit
    #[arg(short = 'c')]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => fmsh_config::load_from_file(path),
        None => fmsh_config::load(),
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("Warning: {e}; using default configuration");
        FmshConfig::default()
    });
    init_logging(&config);

    let username = args
        .username
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| config.shell.username.clone());

    let mut builder = ShellBuilder::new()
        .username(&username)
        .interrupt_window(config.shell.interrupt_window())
        .show_cwd(config.shell.show_cwd && args.command.is_none());
    if let Some(dir) = config.shell.start_dir_path() {
        builder = builder.cwd(dir);
    }
    let mut shell = builder.build()?;

    forward_interrupts(&shell);

    if let Some(command) = args.command {
        shell.dispatch_line(&command).await;
    } else {
        run_repl(&mut shell, &config.shell).await?;
    }

    // A confirmation left unanswered by a double interrupt may still be
    // blocked on stdin; runtime shutdown would wait for it.
    std::process::exit(0)
}

fn init_logging(config: &FmshConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.logging.directive()));

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.logging.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry().with(fmt_layer).with(filter).init();
}

/// Ctrl+C outside of line editing arrives as SIGINT; hand it to the shell.
fn forward_interrupts(shell: &Shell) {
    let interrupts = shell.interrupt_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupts.send(()).is_err() {
                break;
            }
        }
    });
}

fn render_prompt(template: &str, shell: &Shell) -> String {
    template
        .replace("{cwd}", &shell.session().cwd_display())
        .replace("{user}", &shell.session().username)
        .replace("{red}", "\x1b[31m")
        .replace("{green}", "\x1b[32m")
        .replace("{blue}", "\x1b[34m")
        .replace("{yellow}", "\x1b[33m")
        .replace("{cyan}", "\x1b[36m")
        .replace("{bold}", "\x1b[1m")
        .replace("{reset}", "\x1b[0m")
}

async fn run_repl(shell: &mut Shell, shell_config: &ShellConfig) -> Result<(), Box<dyn std::error::Error>> {
    use completer::FmshHelper;
    use rustyline::error::ReadlineError;
    use rustyline::{CompletionType, Config, Editor};

    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .max_history_size(shell_config.history.max_entries.max(1))?
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .build();

    let cwd = Arc::new(RwLock::new(shell.session().cwd.clone()));
    let mut names = shell.registry().command_names();
    names.extend(shell.registry().aliases().into_keys());
    let helper = FmshHelper::new(names, Arc::clone(&cwd), shell.session().home.clone());

    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(helper));

    let history_path = shell_config.history.enabled.then(|| shell_config.history.path());
    if let Some(path) = &history_path {
        if let Err(e) = rl.load_history(path) {
            tracing::debug!(path = %path.display(), error = %e, "No history loaded");
        }
    }

    shell.welcome();

    loop {
        if let Ok(mut guard) = cwd.write() {
            guard.clone_from(&shell.session().cwd);
        }

        let prompt = render_prompt(&shell_config.prompt, shell);
        match rl.readline(&prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                if shell.dispatch_line(&line).await == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                if shell.on_interrupt() == Flow::Exit {
                    break;
                }
            }
            Err(ReadlineError::Eof) => {
                shell.exit();
                break;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to read input");
                shell.exit();
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        if let Err(e) = rl.save_history(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to save history");
        }
    }

    Ok(())
}
