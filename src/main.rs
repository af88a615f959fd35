use clap::{Parser, Subcommand};

use gatehook::cli;

#[derive(Parser)]
#[command(
    name = "gatehook",
    version,
    about = "Remote approval gating for AI coding assistant tool calls"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the MCP approval server with the HTTP control surface
    Serve {
        /// Port for the HTTP control surface (default: $GATEHOOK_HTTP_PORT or 8080)
        #[arg(long)]
        port: Option<u16>,

        /// Seconds before an undecided request is denied
        /// (default: $GATEHOOK_APPROVAL_TIMEOUT_SECS or 300)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },

    /// List pending approval requests
    Pending {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Approve a pending request
    Approve {
        request_id: String,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },

    /// Deny a pending request
    Deny {
        request_id: String,

        /// Reason shown to the assistant
        #[arg(long)]
        message: Option<String>,

        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout belongs to the MCP transport; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { port, timeout_secs } => cli::run_serve(port, timeout_secs).await?,
        Command::Pending { port } => cli::run_pending(port).await?,
        Command::Approve { request_id, port } => cli::run_approve(port, &request_id).await?,
        Command::Deny {
            request_id,
            message,
            port,
        } => cli::run_deny(port, &request_id, message).await?,
    }

    Ok(())
}
