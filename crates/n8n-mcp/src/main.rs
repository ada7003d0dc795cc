//! n8n MCP server binary.
//!
//! Speaks MCP over stdin/stdout. Connection settings come from the environment:
//! `N8N_BASE_URL`, `N8N_API_KEY`, and optionally `CF_ACCESS_CLIENT_ID` + `CF_ACCESS_CLIENT_SECRET`.
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "n8n": {
//!       "command": "n8n-mcp",
//!       "env": { "N8N_BASE_URL": "http://localhost:5678", "N8N_API_KEY": "..." }
//!     }
//!   }
//! }
//! ```

use clap::{Parser, ValueEnum};
use n8n_mcp::{EnvSource, N8nMcpServer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "n8n-mcp")]
#[command(about = "Expose n8n workflows as MCP tools over stdio")]
#[command(version)]
struct Cli {
    /// Log filter (e.g. `info`, `n8n_mcp=debug,rmcp=info`). Logs go to stderr.
    #[arg(long, env = "N8N_MCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format.
    #[arg(long, env = "N8N_MCP_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn init_tracing(cli: &Cli) {
    // stdout carries the MCP stream; everything else goes to stderr.
    let filter =
        EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match cli.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    N8nMcpServer::new(EnvSource::Process).run_stdio().await
}
