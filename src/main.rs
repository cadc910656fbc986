use std::io::Read;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sparkpost_transport::config::Config;
use sparkpost_transport::mail::message::TEXT_HTML;
use sparkpost_transport::mail::{Mailbox, Message, SparkPostTransport, TracingListener, Transport};

const USAGE: &str = "usage: sparkpost-send [--html] <from> <to> <subject> < body";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let mut html = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--html" => html = true,
            _ => positional.push(arg),
        }
    }

    let [from, to, subject] = <[String; 3]>::try_from(positional)
        .map_err(|_| anyhow::anyhow!(USAGE))?;

    let from: Mailbox = from.parse()?;
    let to: Mailbox = to.parse()?;

    let mut body = String::new();
    std::io::stdin()
        .read_to_string(&mut body)
        .context("Failed to read message body from stdin")?;

    let mut builder = Message::builder().from(from).to(to).subject(subject).body(body);
    if html {
        builder = builder.content_type(TEXT_HTML);
    }
    let message = builder.build()?;

    // Load configuration
    let config = Config::from_env()?;
    if config.api_key.is_none() {
        bail!("SPARKPOST_API_KEY is not set");
    }
    tracing::info!(api_url = %config.api_url, "Configuration loaded");

    let mut transport = SparkPostTransport::from_config(&config)?;
    transport.register_plugin(Arc::new(TracingListener));

    let outcome = transport.send(&message).await?;

    println!(
        "accepted: {}, rejected: {}",
        outcome.accepted, outcome.rejected
    );

    if !outcome.is_success() {
        bail!("No recipients were accepted");
    }

    Ok(())
}
