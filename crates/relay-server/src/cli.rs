//! Server CLI.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};

use relay_core::constants::{DEFAULT_PORT, DEFAULT_UPLOAD_DIR};

use crate::listener::ServerConfig;

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

/// relay-server - broadcast relay for chat messages and files.
#[derive(Debug, Parser)]
#[command(
    name = "relay-server",
    version,
    about = "relay server - fans out messages and files to all other connected clients"
)]
pub struct Cli {
    /// Address to listen on
    #[arg(short = 'b', long = "bind", default_value = "0.0.0.0")]
    pub bind_addr: IpAddr,

    /// Port to listen on
    #[arg(short = 'p', long = "port", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Directory uploaded files are stored in
    #[arg(long = "upload-dir", default_value = DEFAULT_UPLOAD_DIR, value_name = "DIR")]
    pub upload_dir: PathBuf,

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
    /// Get the socket address to bind to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }

    /// Build the server configuration.
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.socket_addr(),
            upload_dir: self.upload_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::net::Ipv4Addr;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_values() {
        let cli = Cli::try_parse_from(["relay-server"]).unwrap();
        assert_eq!(cli.bind_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(cli.port, DEFAULT_PORT);
        assert_eq!(cli.upload_dir, PathBuf::from("uploads"));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.log_format, CliLogFormat::Text);
    }

    #[test]
    fn parse_bind_and_port() {
        let cli = Cli::try_parse_from(["relay-server", "-b", "127.0.0.1", "-p", "7000"]).unwrap();
        assert_eq!(
            cli.socket_addr(),
            "127.0.0.1:7000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn parse_upload_dir() {
        let cli =
            Cli::try_parse_from(["relay-server", "--upload-dir", "/var/relay/files"]).unwrap();
        assert_eq!(cli.server_config().upload_dir, PathBuf::from("/var/relay/files"));
    }

    #[test]
    fn parse_verbosity() {
        let cli = Cli::try_parse_from(["relay-server", "-vvv"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn parse_log_format() {
        let cli = Cli::try_parse_from(["relay-server", "--log-format", "json"]).unwrap();
        assert_eq!(cli.log_format, CliLogFormat::Json);
    }
}
