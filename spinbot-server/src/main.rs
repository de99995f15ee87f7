use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod context;
mod server;

/// Environment variable that overrides the port of `--bind-addr`.
const PORT_ENV: &str = "PORT";

#[derive(Parser, Debug, Clone)]
#[command(name = "spinbot")]
#[command(author, version, about = "Spinbot - Twitch bit/gift-sub spin tracker")]
pub struct Args {
    /// Address the REST and live-update server binds to
    #[arg(long, default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// Twitch channel to watch (without '#')
    #[arg(long, default_value = "girl_dm_")]
    pub channel: String,

    /// Directory holding the CSV logs and config.json
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Seconds to wait before reconnecting to chat
    #[arg(long, default_value_t = 5)]
    pub reconnect_delay_secs: u64,

    /// Run the REST/live surface only, without a chat connection
    #[arg(long, default_value = "false")]
    pub no_chat: bool,
}

impl Args {
    /// `--bind-addr`, with its port replaced by `$PORT` when that is set.
    pub fn resolve_bind_addr(&self, port_env: Option<&str>) -> anyhow::Result<SocketAddr> {
        let mut addr: SocketAddr = self
            .bind_addr
            .parse()
            .with_context(|| format!("invalid --bind-addr '{}'", self.bind_addr))?;
        if let Some(port) = port_env.map(str::trim).filter(|p| !p.is_empty()) {
            let port: u16 = port
                .parse()
                .with_context(|| format!("invalid {} '{}'", PORT_ENV, port))?;
            addr.set_port(port);
        }
        Ok(addr)
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("spinbot=info".parse()?);
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub).context("Failed to set global subscriber")?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing()?;

    let args = Args::parse();
    let addr = args.resolve_bind_addr(std::env::var(PORT_ENV).ok().as_deref())?;
    info!(
        "Spinbot starting. channel={}, data_dir={}, chat={}",
        args.channel,
        args.data_dir.display(),
        !args.no_chat
    );

    server::run_server(args, addr).await?;
    info!("Main finished. Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_hosted_setup() {
        let args = Args::parse_from(["spinbot"]);
        assert_eq!(args.channel, "girl_dm_");
        assert_eq!(args.reconnect_delay_secs, 5);
        assert!(!args.no_chat);
        assert_eq!(args.resolve_bind_addr(None).unwrap().port(), 5000);
    }

    #[test]
    fn port_env_overrides_bind_port() {
        let args = Args::parse_from(["spinbot", "--bind-addr", "127.0.0.1:8080"]);
        let addr = args.resolve_bind_addr(Some("3000")).unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
        assert!(args.resolve_bind_addr(Some("not-a-port")).is_err());
        assert_eq!(args.resolve_bind_addr(Some("")).unwrap().port(), 8080);
    }

    #[test]
    fn no_chat_flag() {
        let args = Args::parse_from(["spinbot", "--no-chat", "--data-dir", "/tmp/spin"]);
        assert!(args.no_chat);
        assert_eq!(args.data_dir, PathBuf::from("/tmp/spin"));
    }
}
