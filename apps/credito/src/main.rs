//! # Credito - Credit Analysis Desk
//!
//! The main binary for the credit-analysis desk.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for desk operations
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │              apps/credito (THE BINARY)             │
//! │                                                    │
//! │  ┌─────────────┐    ┌─────────────┐                │
//! │  │   CLI       │    │   HTTP API  │                │
//! │  │  (clap)     │    │   (axum)    │                │
//! │  └──────┬──────┘    └──────┬──────┘                │
//! │         │                  │                       │
//! │         └────────┬─────────┘                       │
//! │                  ▼                                 │
//! │          ┌───────────────┐                         │
//! │          │ credito-core  │                         │
//! │          │  (THE LOGIC)  │                         │
//! │          └───────────────┘                         │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! credito server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! credito status
//! credito register "ACME Ltda" -a Gabriel -e 2026-03-10
//! credito move-stage "ACME Ltda" -e "Análise de Crédito" -r Leonardo -p 5
//! ```

use clap::Parser;
use credito::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Initialize tracing — CREDITO_LOG_FORMAT=json enables machine-parseable output,
    // --verbose raises the default level to debug (RUST_LOG still wins).
    let log_format = std::env::var("CREDITO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "credito=debug,tower_http=debug"
    } else {
        "credito=info,tower_http=debug"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Credito startup banner.
fn print_banner() {
    println!(
        r#"
   ██████╗██████╗ ███████╗██████╗ ██╗████████╗ ██████╗
  ██╔════╝██╔══██╗██╔════╝██╔══██╗██║╚══██╔══╝██╔═══██╗
  ██║     ██████╔╝█████╗  ██║  ██║██║   ██║   ██║   ██║
  ██║     ██╔══██╗██╔══╝  ██║  ██║██║   ██║   ██║   ██║
  ╚██████╗██║  ██║███████╗██████╔╝██║   ██║   ╚██████╔╝
   ╚═════╝╚═╝  ╚═╝╚══════╝╚═════╝ ╚═╝   ╚═╝    ╚═════╝

  Credit Analysis Desk v{}

  Empresas • Pendências • Enquadramento • PDD
"#,
        env!("CARGO_PKG_VERSION")
    );
}
