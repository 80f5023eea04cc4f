use clap::Parser;
use std::path::PathBuf;

/// Terminal chat against a streaming chat backend
#[derive(Debug, Parser)]
#[command(name = "chatwire", version, about)]
pub struct Args {
    /// Message to send; omit it to chat interactively
    pub message: Option<String>,

    /// Continue an existing session
    #[arg(short, long)]
    pub session: Option<i64>,

    /// Document type tag sent with each turn
    #[arg(long = "doc-type")]
    pub doc_type: Option<String>,

    /// Wait for the whole reply instead of streaming it
    #[arg(long)]
    pub sync: bool,

    /// Extra config file, applied over config/ and the environment
    #[arg(short, long, env = "CHATWIRE_CONFIG")]
    pub config: Option<PathBuf>,
}
