use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file. Environment variables alone are
    /// enough when it doesn't exist.
    #[arg(short, long, default_value = "config/config.toml")]
    pub config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Answer commands only; don't watch for new buys
    #[arg(long)]
    pub no_poller: bool,

    /// Serve Prometheus metrics on this address, e.g. 127.0.0.1:9100
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}
