use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatwire_cli::{cli::Args, config::Config, session::ChatSession};
use chatwire_client::{ChatBackend, ChatClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(doc_type) = args.doc_type.clone() {
        config.chat.doc_type_id = doc_type;
    }
    if args.sync {
        config.chat.stream = false;
    }

    init_logging(&config);

    tracing::info!(base_url = %config.client.base_url, "Starting chatwire");

    let client =
        ChatClient::from_config(config.client.clone()).context("Failed to create chat client")?;
    let backend: Arc<dyn ChatBackend> = Arc::new(client);

    let mut session = ChatSession::new(backend, &config.chat)
        .with_session(args.session)
        .cancel_on_interrupt(true);

    let stdout = std::io::stdout();

    match args.message {
        Some(message) => {
            let report = session.send(&message, &mut stdout.lock()).await?;
            if !report.outcome.is_success() {
                std::process::exit(1);
            }
        }
        None => run_interactive(&mut session).await?,
    }

    Ok(())
}

async fn run_interactive(session: &mut ChatSession) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(session.session_id())?;

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };

        let Some(line) = line else {
            break;
        };

        let message = line.trim();
        if message.is_empty() {
            continue;
        }

        session.send(message, &mut std::io::stdout().lock()).await?;
    }

    eprintln!();
    Ok(())
}

fn prompt(session_id: Option<i64>) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    match session_id {
        Some(id) => write!(stderr, "[{}] > ", id)?,
        None => write!(stderr, "> ")?,
    }
    stderr.flush()
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);

    // stdout carries only the reply
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
