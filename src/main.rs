//! Coffee-Bot - console chat with a coffee shop assistant
//!
//! Reads lines from stdin, dispatches them to a conversation session and
//! prints new or changed messages plus notifications.

use coffee_bot::console::{parse_command, spawn_printer, Command, HELP_TEXT};
use coffee_bot::gateway::{self, GatewayConfig};
use coffee_bot::runtime::start_session;
use coffee_bot::state_machine::ConvContext;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the chat on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coffee_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = GatewayConfig::from_env()?;
    let gateway = gateway::from_config(&config)?;

    let (handle, runtime_task) = start_session(ConvContext::generate(), gateway);
    tracing::info!(conv_id = %handle.conversation_id(), "Session started");

    let printer = spawn_printer(&handle, std::io::stdout());

    println!("{HELP_TEXT}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("! {e}");
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{HELP_TEXT}"),
            command => match command.into_intent(&handle.snapshot()) {
                Ok(Some(intent)) => handle.dispatch(intent).await?,
                Ok(None) => {}
                Err(e) => println!("! {e}"),
            },
        }
    }

    handle.shutdown();
    runtime_task.await?;
    printer.abort();
    Ok(())
}
