//! relay client binary entry point.
//!
//! Line-oriented terminal loop: plain lines are chat messages, `/file PATH`
//! uploads a file, `/name NEW` re-joins under a new display name, `/quit`
//! exits. Incoming frames print to stdout; received files are saved under
//! the download directory.

use std::path::Path;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::error;

use relay_client::{Cli, ClientConnection, ClientSender, Event};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_format = cli.log_format.into();
    if let Err(e) = relay_core::init_logging(cli.verbose, cli.log_file.as_deref(), log_format) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if let Err(e) = tokio::fs::create_dir_all(&cli.download_dir).await {
        eprintln!(
            "Failed to create download directory {}: {e}",
            cli.download_dir.display()
        );
        std::process::exit(1);
    }

    let conn = match ClientConnection::connect(cli.server_addr(), &cli.username).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Failed to connect to {}: {e}", cli.server_addr());
            std::process::exit(1);
        }
    };
    println!("Connected to {} as {}", cli.server_addr(), cli.username);

    let (mut sender, mut receiver) = conn.split();

    let download_dir = cli.download_dir.clone();
    tokio::spawn(async move {
        loop {
            match receiver.next_event().await {
                Ok(Some(event)) => print_event(event, &download_dir).await,
                Ok(None) => {
                    println!("Disconnected from server.");
                    std::process::exit(0);
                }
                Err(e) => {
                    eprintln!("Receive error: {e}");
                    std::process::exit(1);
                }
            }
        }
    });

    if let Err(e) = input_loop(&mut sender).await {
        error!(error = %e, "Input loop failed");
    }
}

async fn input_loop(sender: &mut ClientSender) -> relay_core::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(path) = line.strip_prefix("/file ") {
            match sender.send_file(Path::new(path.trim())).await {
                Ok((name, size)) => println!("Sent file: {name} ({size} bytes)"),
                Err(e) => println!("Could not send {path}: {e}"),
            }
        } else if let Some(name) = line.strip_prefix("/name ") {
            let name = name.trim();
            if !name.is_empty() {
                sender.join(name).await?;
                println!("Now known as {name}");
            }
        } else if line == "/quit" {
            println!("Quitting...");
            break;
        } else {
            sender.send_text(line).await?;
        }
    }

    Ok(())
}

async fn print_event(event: Event, download_dir: &Path) {
    match event {
        Event::System { text } => println!("[SYSTEM] {text}"),
        Event::Message { username, text } => println!("[{username}] {text}"),
        Event::File {
            username,
            filename,
            data,
        } => {
            // Trust nothing about the announced name beyond its basename.
            let safe = Path::new(&filename)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file.bin".to_string());
            let dest = download_dir.join(safe);
            match tokio::fs::write(&dest, &data).await {
                Ok(()) => println!(
                    "[{username}] sent file saved as: {} ({} bytes)",
                    dest.display(),
                    data.len()
                ),
                Err(e) => eprintln!("Failed to save {}: {e}", dest.display()),
            }
        }
    }
}
