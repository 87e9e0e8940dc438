use clap::{Parser, Subcommand};

use surfkeeper_core::types::EverscaleNetNameKey;
use surfkeeper_core::NetworkKey;

/// Command-line client for Surfkeeper wallet bridges.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// Wallet bridge JSON-RPC URL.
    #[arg(long, default_value = "http://127.0.0.1:8080", env = "SURFKEEPER_BRIDGE_URL")]
    pub bridge_url: String,

    /// Bridge username (optional).
    #[arg(long, env = "SURFKEEPER_BRIDGE_USER")]
    pub bridge_user: Option<String>,

    /// Bridge password (optional).
    #[arg(long, env = "SURFKEEPER_BRIDGE_PASS")]
    pub bridge_pass: Option<String>,

    /// Maximum outbound requests per second.
    #[arg(long)]
    pub requests_per_second: Option<u32>,

    /// Subscription polling interval in milliseconds.
    #[arg(long, default_value = "5000")]
    pub poll_interval_ms: u64,

    /// Address a per-network sub-interface (e.g. `venom`, `tonTestnet`).
    #[arg(long, global = true)]
    pub network: Option<NetworkKey>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the current connection status.
    Status,

    /// Connect the wallet; the user approves in the wallet.
    Connect,

    Disconnect,

    /// Sign base64 encoded data.
    SignData {
        #[arg(long)]
        data: String,
    },

    /// Send tokens to an address.
    SendTransaction {
        /// Destination address.
        #[arg(long)]
        to: String,

        /// Amount in nano tokens.
        #[arg(long)]
        amount: String,

        #[arg(long, default_value = "")]
        comment: String,

        /// Bounce the transfer if the destination does not exist.
        #[arg(long)]
        bounce: bool,

        #[arg(long, default_value = "mainnet")]
        net: EverscaleNetNameKey,
    },

    /// Send an internal message; parameters are given as a JSON object.
    SendMessage {
        #[arg(long)]
        params: String,
    },

    /// Print balance changes of an address until interrupted.
    WatchBalance {
        #[arg(long)]
        address: String,
    },

    /// Print connection state changes until interrupted.
    WatchConnection,
}
