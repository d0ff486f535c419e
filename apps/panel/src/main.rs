use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use panel_core::Activation;
use shared::domain::Door;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    task::JoinSet,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;
mod session;

use config::{load_settings, Overrides};
use console::{parse_input, render_toast, spawn_printer, Input, HELP};
use session::{ChannelReloader, NoopReloader, Session};

#[derive(Parser, Debug)]
#[command(name = "door-panel", about = "Open the inner or outer door")]
struct Cli {
    #[arg(long, default_value = "panel.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open one door and report the outcome.
    Open { door: Door },
    /// Read door commands from stdin until quit.
    Interactive,
}

enum Next {
    Reload,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let overrides = Overrides {
        server_url: cli.server_url,
        username: cli.username,
    };

    match cli.command.unwrap_or(Command::Interactive) {
        Command::Open { door } => open_once(&cli.config, &overrides, door).await,
        Command::Interactive => run_interactive(&cli.config, &overrides).await,
    }
}

async fn open_once(config: &Path, overrides: &Overrides, door: Door) -> Result<()> {
    let settings = load_settings(config, overrides)?;
    let session = Session::open(&settings, Arc::new(NoopReloader))?;

    let activation = session.panel.activate(door).await;
    for toast in session.panel.tray().items() {
        println!("{}", render_toast(&toast));
    }
    session.close();

    match activation {
        Activation::Settled(outcome) if outcome.is_success() => {
            println!("{} opened", door.label());
            Ok(())
        }
        Activation::Settled(_) => bail!("failed to open the {}", door.label()),
        Activation::Ignored => bail!("{} control is busy", door.label()),
    }
}

async fn run_interactive(config: &Path, overrides: &Overrides) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let settings = load_settings(config, overrides)?;
        let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
        let session = Session::open(&settings, Arc::new(ChannelReloader::new(reload_tx)))?;
        let printer = spawn_printer(&session.panel);
        let mut activations = JoinSet::new();
        println!("{HELP}");

        let next = loop {
            tokio::select! {
                Some(()) = reload_rx.recv() => break Next::Reload,
                Some(_) = activations.join_next(), if !activations.is_empty() => {}
                line = lines.next_line() => {
                    let Some(line) = line.context("failed to read stdin")? else {
                        break Next::Quit;
                    };
                    match parse_input(&line) {
                        Ok(Input::Activate(door)) => {
                            let panel = session.panel.clone();
                            activations.spawn(async move {
                                if panel.activate(door).await == Activation::Ignored {
                                    println!("{} is still being opened", door.label());
                                }
                            });
                        }
                        Ok(Input::Help) => println!("{HELP}"),
                        Ok(Input::Quit) => break Next::Quit,
                        Ok(Input::Empty) => {}
                        Err(error) => warn!(%error, "ignoring input"),
                    }
                }
            }
        };

        activations.abort_all();
        session.close();
        printer.abort();

        match next {
            Next::Quit => return Ok(()),
            Next::Reload => info!("reloading panel session"),
        }
    }
}
