//! relay server binary entry point.

use clap::Parser;
use tracing::{error, info};

use relay_server::{Cli, Server};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_format = cli.log_format.into();
    if let Err(e) = relay_core::init_logging(cli.verbose, cli.log_file.as_deref(), log_format) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    info!(version = env!("CARGO_PKG_VERSION"), "relay-server starting");

    let config = cli.server_config();
    info!(
        addr = %config.bind_addr,
        upload_dir = %config.upload_dir.display(),
        "Binding server"
    );

    let server = match Server::bind(config).await {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };

    if let Err(e) = server.run_until(shutdown).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
