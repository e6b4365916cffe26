//! Command-line chat against the assistant backend.
//!
//! Sends each message in order on one conversation, printing the reply as
//! it streams in. Configuration comes from the `MICHI_*` environment
//! variables.

use std::io::{self, Write};

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use michi::{ChatClient, ChatConfig, ConversationSession, PatientRef};

/// Chat with the health assistant from the terminal
#[derive(Debug, Parser)]
#[command(name = "michi", version, about)]
struct Cli {
    /// Messages to send, in order, on the same conversation
    #[arg(required = true, value_name = "MESSAGE")]
    messages: Vec<String>,

    /// Patient id sent with each message (non-numeric ids fall back to 1)
    #[arg(short, long, value_name = "ID")]
    patient: Option<String>,

    /// Continue an existing conversation
    #[arg(short, long, value_name = "ID")]
    conversation: Option<String>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn write_delta<W: Write>(out: &mut W, delta: &str) -> io::Result<()> {
    write!(out, "{delta}")?;
    out.flush()
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ChatConfig::from_env()?;
    let client = ChatClient::from_config(config)?;

    let mut session = ConversationSession::new(cli.patient.map(PatientRef::from))
        .on_conversation_change(|id| eprintln!("conversation: {id}"));
    if let Some(id) = cli.conversation {
        session = session.with_conversation_id(id);
    }
    info!(patient_id = session.patient_id(), "starting chat");

    for message in &cli.messages {
        let mut write_error: Option<io::Error> = None;
        let mut end_error: Option<io::Error> = None;
        let outcome = client
            .send_message(
                &mut session,
                message,
                |delta| {
                    if write_error.is_none() {
                        write_error = write_delta(&mut io::stdout().lock(), delta).err();
                    }
                },
                || end_error = writeln!(io::stdout()).err(),
            )
            .await;

        if let Some(err) = write_error.or(end_error) {
            return Err(err).wrap_err("failed to write the reply to stdout");
        }
        if let Some(err) = outcome.error {
            return Err(eyre!("{} ({})", err.user_message(), err.error_code()));
        }
    }

    Ok(())
}
