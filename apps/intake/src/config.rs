use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};
use wai_core::DEFAULT_GRAPH_API_BASE;

#[derive(Parser, Debug)]
#[command(
    name = "wai-intake",
    author,
    version,
    about = "WhatsApp history proxy, webhook receiver and live viewer",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve(ServeArgs),
    /// Fetch one page of message history from the Graph API
    History(HistoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Listen address
    #[arg(long, env = "BIND", default_value = "0.0.0.0:8087")]
    pub listen: SocketAddr,
    /// Secret expected in `hub.verify_token` during webhook verification
    #[arg(long, env = "WHATSAPP_VERIFY_TOKEN", hide_env_values = true)]
    pub verify_token: Option<String>,
    /// Graph API base URL
    #[arg(long, env = "WA_API_BASE", default_value = DEFAULT_GRAPH_API_BASE)]
    pub api_base: String,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[arg(long, env = "WHATSAPP_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: String,
    #[arg(long, env = "WHATSAPP_PHONE_NUMBER_ID")]
    pub phone_number_id: String,
    /// Page size
    #[arg(long)]
    pub limit: Option<i64>,
    /// Forward paging cursor
    #[arg(long, conflicts_with = "before")]
    pub cursor: Option<String>,
    /// Backward paging cursor
    #[arg(long)]
    pub before: Option<String>,
    /// Graph API base URL
    #[arg(long, env = "WA_API_BASE", default_value = DEFAULT_GRAPH_API_BASE)]
    pub api_base: String,
    /// Print the raw Graph API response
    #[arg(long)]
    pub json: bool,
}

/// Server settings resolved from the command line and environment.
#[derive(Clone)]
pub struct IntakeConfig {
    pub addr: SocketAddr,
    pub verify_token: Option<String>,
    pub api_base: String,
}

impl std::fmt::Debug for IntakeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntakeConfig")
            .field("addr", &self.addr)
            .field("verify_token_set", &self.verify_token.is_some())
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl From<ServeArgs> for IntakeConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            addr: args.listen,
            verify_token: args.verify_token.filter(|token| !token.is_empty()),
            api_base: args.api_base,
        }
    }
}
