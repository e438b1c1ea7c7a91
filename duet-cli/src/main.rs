use anyhow::Result;
use clap::Parser;
use colored::*;
use duet_server::ServerConfig;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Two-party WebRTC signaling server.
#[derive(Parser)]
#[command(name = "duet", version)]
struct Cli {
    /// Address to listen on. Overrides DUET_BIND_ADDR.
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Seconds between heartbeat pings.
    #[arg(long)]
    ping_interval: Option<u64>,

    /// Seconds of silence before a connection is dropped.
    #[arg(long)]
    idle_timeout: Option<u64>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, env = "DUET_LOG", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> ServerConfig {
        let mut config = ServerConfig::from_env();
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(secs) = self.ping_interval.filter(|s| *s > 0) {
            config.ping_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.idle_timeout.filter(|s| *s > 0) {
            config.idle_timeout = Duration::from_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = cli.config();
    println!("{}", "duet signaling server".green().bold());
    println!("   ws:     ws://{}/ws", config.bind_addr);
    println!("   health: http://{}/health", config.bind_addr);

    info!(
        "ping every {:?}, idle timeout {:?}",
        config.ping_interval, config.idle_timeout
    );
    duet_server::serve(config).await
}
