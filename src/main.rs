use anyhow::Context;
use clap::Parser;
use ledger_bot::args::{Args, Command};
use ledger_bot::{Config, Engine, Inbound, Mode, Result};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().home().path();

    // This allows for testing the program without hitting the Google APIs.
    // When LEDGER_BOT_IN_TEST_MODE is set and non-zero in length, the mode
    // will be Mode::Test, otherwise it will be Mode::Google.
    let mode = Mode::from_env();

    match args.command() {
        Command::Init(init_args) => {
            let config = Config::create(home, init_args.sheet_url()).await?;
            println!(
                "Initialized '{}'. Put an access token at '{}' before talking to Google.",
                config.root().display(),
                config.token_path().display()
            );
        }

        Command::Chat => {
            let config = Config::load(home).await?;
            run_chat(config, mode).await?;
        }

        Command::Validate => {
            let config = Config::load(home).await?;
            let spreadsheet_id = config.spreadsheet_id();
            if spreadsheet_id.is_empty() {
                println!("No default spreadsheet configured; re-run init with --sheet-url.");
                return Ok(());
            }
            let mut engine = Engine::new(ledger_bot::sheets_api(&config, mode).await?);
            engine.validate(spreadsheet_id).await?;
            println!("Spreadsheet '{spreadsheet_id}' is reachable and has the expected sheets.");
        }
    }
    Ok(())
}

/// A local stand-in for the chat transport: stdin lines come in as messages,
/// replies go to stdout. Lines starting with '/' carry the command marker.
async fn run_chat(config: Config, mode: Mode) -> Result<()> {
    let mut dispatcher = ledger_bot::dispatcher(&config, mode).await?;

    println!("ledgerbot session ({mode} mode). Send /start to begin; ctrl-d quits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let msg = if text.starts_with('/') {
            Inbound::command("local", "local", text).with_sender_name("Local User")
        } else {
            Inbound::text("local", "local", text).with_sender_name("Local User")
        };
        let reply = dispatcher.dispatch(&msg).await;
        println!("{}", reply.text);
    }
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "{}={},{}={}",
                env!("CARGO_CRATE_NAME"),
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
