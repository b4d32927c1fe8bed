//! Operator command line for Jules.

use anyhow::Context;
use clap::{Parser, Subcommand};
use jules_rs::{StdoutChannel, config_options, format_reminder, init_logging, load_config};
use jules_rs_core::orchestrator::seed::seed_ledger;
use jules_rs_core::{OpenRouterClient, Orchestrator, ReminderLedger, SeedPolicy};
use jules_rs_memory::MessageLedger;
use jules_rs_protocol::{Clock, SystemClock};
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Command-line options for the Jules operator binary.
#[derive(Parser)]
#[command(name = "jules", version)]
struct Cli {
    /// Extra jules.json5 layers, applied last in the order given
    #[arg(long = "config")]
    config: Vec<PathBuf>,
    /// Skip seeding an empty message ledger
    #[arg(long)]
    no_seed: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Answer a single user message
    Reply {
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Read user messages from stdin, one per line
    Chat,
    /// Emit the morning wakeup message
    Wakeup,
    /// Deliver every reminder that has come due
    SendPending,
    /// Clear the message ledger
    Reset {
        /// Write the canned dialogue after clearing
        #[arg(long)]
        seed: bool,
    },
    /// List registered reminders
    Reminders,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let config = load_config(config_options(&cwd, &cli.config)).context("failed to load config")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match cli.command {
        Command::Reminders => {
            let reminders = ReminderLedger::open(&config.reminders.path, clock)
                .context("failed to open reminder store")?;
            for reminder in reminders.all()? {
                println!("{}", format_reminder(&reminder));
            }
            reminders.close()?;
            return Ok(());
        }
        Command::Reset { seed } => {
            let mut ledger = MessageLedger::open(&config.ledger.path, clock.clone())
                .context("failed to open message ledger")?;
            ledger.reset()?;
            if seed {
                seed_ledger(&mut ledger, clock.now())?;
            }
            info!(
                "message ledger reset (path={}, seeded={})",
                ledger.path().display(),
                seed
            );
            return Ok(());
        }
        _ => {}
    }

    let llm = Arc::new(
        OpenRouterClient::from_config(&config.llm).context("failed to build completion client")?,
    );
    let seed = if cli.no_seed {
        SeedPolicy::Disabled
    } else {
        SeedPolicy::from_enabled(config.seed.enabled)
    };
    let mut orchestrator = Orchestrator::from_config(&config, llm, clock, seed)
        .context("failed to start orchestrator")?;

    match cli.command {
        Command::Reply { text } => {
            let reply = orchestrator.handle_user_message(&text.join(" "), None).await?;
            println!("{reply}");
        }
        Command::Wakeup => {
            let reply = orchestrator.emit_wakeup().await?;
            println!("{reply}");
        }
        Command::SendPending => {
            let delivered = orchestrator.deliver_due(&StdoutChannel).await?;
            info!("pending reminders delivered (count={delivered})");
        }
        Command::Chat => chat(&mut orchestrator).await?,
        Command::Reminders | Command::Reset { .. } => {}
    }

    orchestrator.close()?;
    Ok(())
}

async fn chat(orchestrator: &mut Orchestrator) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }
        match orchestrator.handle_user_message(text, None).await {
            Ok(reply) => println!("{reply}"),
            Err(err) => eprintln!("error: {err}"),
        }
    }
    Ok(())
}
