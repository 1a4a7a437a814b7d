//! Client CLI.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use relay_core::constants::{DEFAULT_DOWNLOAD_DIR, DEFAULT_PORT};

/// Log output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CliLogFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

impl From<CliLogFormat> for relay_core::LogFormat {
    fn from(fmt: CliLogFormat) -> Self {
        match fmt {
            CliLogFormat::Text => relay_core::LogFormat::Text,
            CliLogFormat::Json => relay_core::LogFormat::Json,
        }
    }
}

/// relay-client - terminal client for the relay server.
#[derive(Debug, Parser)]
#[command(
    name = "relay-client",
    version,
    about = "terminal client for the relay server"
)]
pub struct Cli {
    /// Server address to connect to
    #[arg(short = 's', long = "server", default_value = "127.0.0.1")]
    pub server: IpAddr,

    /// Server port
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Display name to join under
    #[arg(short = 'u', long = "username", default_value = "anonymous")]
    pub username: String,

    /// Directory received files are saved in
    #[arg(long = "download-dir", default_value = DEFAULT_DOWNLOAD_DIR, value_name = "DIR")]
    pub download_dir: PathBuf,

    /// Increase verbosity (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Log to file instead of stderr
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", default_value = "text")]
    pub log_format: CliLogFormat,
}

impl Cli {
    /// Get the server socket address.
    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server, self.port)
    }
}
