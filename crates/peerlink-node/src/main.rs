// ============================================
// File: crates/peerlink-node/src/main.rs
// ============================================
//! # PeerLink Entry Point
//!
//! ## Creation Reason
//! Single binary for both roles of the network: the key directory and an
//! interactive peer.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading
//! - Directory service execution
//! - Interactive peer menu
//!
//! ## Usage
//! ```bash
//! # Terminal 1: directory
//! peerlink directory
//!
//! # Terminals 2 and 3: peers from the address book
//! peerlink peer Alice
//! peerlink peer Bob
//!
//! # Check a config file
//! peerlink validate --config peerlink.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A missing config file means defaults; a broken one is an error
//! - `RUST_LOG` overrides `[logging] level`
//! - Peer key pairs are regenerated on every start, so peers must register
//!   again after a restart
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use peerlink_common::error::CommonError;
use peerlink_common::types::PeerId;
use peerlink_node::directory::MemoryKeyStore;
use peerlink_node::{DirectoryServer, NodeConfig, PeerNode};
use peerlink_transport::TcpLineListener;

// ============================================
// CLI Definition
// ============================================

/// PeerLink authenticated peer-to-peer messaging
#[derive(Parser, Debug)]
#[command(name = "peerlink")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the key directory service
    Directory {
        /// Path to configuration file
        #[arg(short, long, default_value = "peerlink.toml")]
        config: PathBuf,
    },

    /// Run an interactive peer
    ///
    /// The name must be an entry of the configured address book.
    Peer {
        /// Peer identity, e.g. Alice
        name: String,

        /// Path to configuration file
        #[arg(short, long, default_value = "peerlink.toml")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "peerlink.toml")]
        config: PathBuf,
    },
}

impl Commands {
    fn config_path(&self) -> &Path {
        match self {
            Self::Directory { config } | Self::Peer { config, .. } | Self::Validate { config } => {
                config
            }
        }
    }
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging level comes from the config, so load it first
    let config = load_config(cli.command.config_path()).await;
    init_logging(config.as_ref().map_or("info", |c| c.logging.level.as_str()));

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Directory { .. } => cmd_directory(config).await,
        Commands::Peer { name, .. } => cmd_peer(name, config).await,
        Commands::Validate { config: path } => cmd_validate(&path, &config),
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Runs the directory service until Ctrl+C.
async fn cmd_directory(config: NodeConfig) -> anyhow::Result<()> {
    let listener = TcpLineListener::bind(config.directory.addr, config.timeouts.to_timeouts())
        .await
        .with_context(|| format!("cannot listen on {}", config.directory.addr))?;

    let server = Arc::new(DirectoryServer::new(Arc::new(MemoryKeyStore::new())));
    let signal = {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received shutdown signal");
                server.shutdown();
            }
        })
    };

    println!("📒 Directory listening on {}", config.directory.addr);
    server.serve(listener).await?;
    signal.abort();
    Ok(())
}

/// Runs one peer with its interactive menu.
async fn cmd_peer(name: String, config: NodeConfig) -> anyhow::Result<()> {
    let identity = PeerId::new(name).map_err(CommonError::from)?;
    let listen_addr = config
        .peers
        .resolve(&identity)
        .with_context(|| format!("'{identity}' is not in the address book"))?;

    let (node, mut events) = PeerNode::from_config(&config, identity.clone())?;
    let node = Arc::new(node);
    let listener = TcpLineListener::bind(listen_addr, config.timeouts.to_timeouts())
        .await
        .with_context(|| format!("cannot listen on {listen_addr}"))?;

    println!("════════════════════════════════════════");
    println!("   Peer:        {identity}");
    println!("   Listening:   {listen_addr}");
    println!("   Public key:  {}", node.public_key());
    println!("   Directory:   {}", config.directory.addr);
    println!("════════════════════════════════════════");

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.run(listener).await })
    };
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!();
            println!("📨 {event}");
            print_prompt();
        }
    });

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print_menu(&identity);
        let Some(choice) = read_input(&mut input).await? else {
            break;
        };

        match choice.trim() {
            "1" => match node.register().await {
                Ok(()) => println!("✅ Registered {} with the directory", node.public_key()),
                Err(e) => println!("❌ Registration failed: {e}"),
            },
            "2" => {
                let Some(counterpart) = ask_peer(&mut input, "Handshake with: ").await? else {
                    continue;
                };
                match node.initiate_handshake(&counterpart).await {
                    Ok(_) => println!("✅ Session established with {counterpart}"),
                    Err(e) => println!("❌ Handshake failed: {e}"),
                }
            }
            "3" => {
                let Some(counterpart) = ask_peer(&mut input, "Send to: ").await? else {
                    continue;
                };
                print!("Message: ");
                flush_stdout();
                let Some(text) = read_input(&mut input).await? else {
                    break;
                };
                match node.send_message(&counterpart, &text).await {
                    Ok(()) => println!("✅ Sent to {counterpart}"),
                    Err(e) => println!("❌ Send failed: {e}"),
                }
            }
            "4" => print_status(&node),
            "5" => break,
            "" => {}
            other => println!("Unknown option '{other}'"),
        }
    }

    info!("Shutting down peer...");
    node.shutdown();
    match tokio::time::timeout(std::time::Duration::from_secs(5), runner).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!("Accept loop failed: {}", e),
        Ok(Err(e)) => error!("Accept loop panicked: {}", e),
        Err(_) => error!("Accept loop did not stop in time"),
    }
    printer.abort();
    Ok(())
}

/// Validates configuration file.
fn cmd_validate(path: &Path, config: &NodeConfig) -> anyhow::Result<()> {
    if path.exists() {
        println!("✅ Configuration is valid");
    } else {
        println!("⚠️  Config file not found: {}", path.display());
        println!("   Defaults will be used.");
    }
    println!();
    println!("Directory:");
    println!("   Address:     {}", config.directory.addr);
    println!();
    println!("Peers:");
    for peer in config.peers.identities() {
        if let Ok(addr) = config.peers.resolve(peer) {
            println!("   {peer:<12} {addr}");
        }
    }
    println!();
    println!("Keys:");
    println!("   Prime pool:  {:?}", config.keys.prime_pool);
    println!("   Exponent:    {}", config.keys.initial_exponent);
    println!("   Secrets:     {:?}", config.keys.secret_range());
    println!();
    println!("Storage:");
    println!("   Data dir:    {}", config.storage.data_dir.display());
    println!();
    println!("Timeouts:");
    println!("   Connect:     {}ms", config.timeouts.connect_ms);
    println!("   Read:        {}ms", config.timeouts.read_ms);
    println!();
    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads the config file, or defaults when it does not exist.
async fn load_config(path: &Path) -> anyhow::Result<NodeConfig> {
    if path.exists() {
        Ok(NodeConfig::load(path).await?)
    } else {
        Ok(NodeConfig::default())
    }
}

fn print_menu(identity: &PeerId) {
    println!();
    println!("── {identity} ──────────────────────────");
    println!("  1. Register with directory");
    println!("  2. Handshake with peer");
    println!("  3. Send message");
    println!("  4. Status");
    println!("  5. Exit");
    print_prompt();
}

fn print_prompt() {
    print!("> ");
    flush_stdout();
}

fn flush_stdout() {
    // Prompt only; a failed flush is not worth aborting the menu
    let _ = std::io::stdout().flush();
}

/// Reads one line; `None` on end of input or Ctrl+C.
async fn read_input(input: &mut Lines<BufReader<Stdin>>) -> anyhow::Result<Option<String>> {
    tokio::select! {
        line = input.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}

async fn ask_peer(input: &mut Lines<BufReader<Stdin>>, prompt: &str) -> anyhow::Result<Option<PeerId>> {
    print!("{prompt}");
    flush_stdout();
    let Some(name) = read_input(input).await? else {
        return Ok(None);
    };
    match name.trim().parse::<PeerId>() {
        Ok(peer) => Ok(Some(peer)),
        Err(e) => {
            println!("❌ {}", CommonError::from(e));
            Ok(None)
        }
    }
}

fn print_status(node: &PeerNode) {
    let status = node.status();
    println!();
    println!("Identity:      {} {}", status.identity, status.public_key);
    println!();
    println!("Sessions:");
    if status.sessions.is_empty() {
        println!("   (none)");
    }
    for session in &status.sessions {
        println!(
            "   {:<12} {:<10} age {:>5}s  idle {:>5}s  sent {:>3}  received {:>3}",
            session.counterpart.as_str(),
            session.role.to_string(),
            session.age().as_secs(),
            session.idle_time().as_secs(),
            session.messages_sent(),
            session.messages_received(),
        );
    }
    for peer in &status.pending {
        println!("   {:<12} handshake pending", peer.as_str());
    }
    println!();
    println!("Cached keys:");
    if status.cached_keys.is_empty() {
        println!("   (none)");
    }
    for (peer, key) in &status.cached_keys {
        println!("   {:<12} {key}", peer.as_str());
    }
}
