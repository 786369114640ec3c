use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Serves calendar occurrences for a time window over HTTP
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "occur.toml")]
    pub config: PathBuf,
    /// Address to listen on, overriding the configuration
    #[arg(long)]
    pub listen_addr: Option<SocketAddr>,
    /// JSON snapshot of base events, overriding the configuration
    #[arg(short, long)]
    pub events: Option<PathBuf>,
}
