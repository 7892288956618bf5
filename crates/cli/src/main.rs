use anyhow::Result;
use chatline_cli::{config, display_version, CliArgs, LogLevel, LoopbackStack};
use chatline_console::{ActorExit, Collaborator, Console, ConsoleOutput};
use clap::Parser;
use std::sync::Arc;
use tokio::{signal, task};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    if args.show_version {
        display_version();
        return Ok(());
    }
    init_tracing(args.verbose);

    let profile = config::load_profile(&args)?;
    let output = ConsoleOutput::stdout(profile.console.mode);
    let console = Console::new(profile, output)?;

    let username = console.config().session.username.clone();
    let stack: Arc<dyn Collaborator> =
        Arc::new(LoopbackStack::new(console.event_sink(), username.as_deref()));

    info!(
        target: "chatline",
        account = username.as_deref().unwrap_or("<unset>"),
        mode = ?console.config().console.mode,
        queued = console.queued_commands().len(),
        "console starting; type /help for commands"
    );
    let running = console.start_interactive(stack)?;
    let console_handle = task::spawn_blocking(move || running.wait());

    // The input thread may still be parked on a read; do not let runtime
    // shutdown wait for it.
    let code = tokio::select! {
        result = signal::ctrl_c() => {
            if let Err(err) = result {
                error!(target: "chatline", error = %err, "failed to wait for shutdown signal");
                1
            } else {
                info!(target: "chatline", "shutdown signal received (Ctrl+C)");
                0
            }
        }
        console = console_handle => {
            match console {
                Ok(Ok(ActorExit::Terminate)) => {
                    info!(target: "chatline", "session dropped, exiting");
                    0
                }
                Ok(Ok(ActorExit::Shutdown)) => {
                    info!(target: "chatline", "console session ended");
                    0
                }
                Ok(Err(err)) => {
                    error!(target: "chatline", error = %err, "console session failed");
                    1
                }
                Err(err) => {
                    error!(target: "chatline", error = %err, "console task error");
                    1
                }
            }
        }
    };

    std::process::exit(code);
}

fn init_tracing(level: LogLevel) {
    let directive = level.as_directive();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{directive},chatline={directive}")));
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
