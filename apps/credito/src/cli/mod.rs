//! # Credito CLI Module
//!
//! This module implements the CLI interface for the credit desk.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `status` - Show desk KPIs
//! - `companies` - List companies
//! - `company` - Show one company with its stage progress
//! - `register` - Register a new company
//! - `move-stage` - Move a company to a workflow stage
//! - `pendencia` - List or update a company's document checklist
//! - `enquadramento` - Run a concentration report from a positions file

mod commands;

use clap::{Parser, Subcommand};
use credito_core::CreditoError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Credito - Credit Analysis Desk
///
/// Company registration, pendência tracking, workflow deadlines,
/// enquadramento concentration checks and the PDD pivot.
#[derive(Parser, Debug)]
#[command(name = "credito")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the desk database
    #[arg(short = 'D', long, global = true, default_value = "credito.db")]
    pub database: PathBuf,

    /// Path to the toml config file (users, documents, funds)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Initialize a new empty database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,
    },

    /// Show desk KPIs
    Status {
        /// Restrict to one sales agent
        #[arg(short, long)]
        agente: Option<String>,
    },

    /// List companies
    Companies {
        /// Restrict to one sales agent
        #[arg(short, long)]
        agente: Option<String>,
    },

    /// Show one company with its stage progress
    Company {
        /// Company name
        name: String,
    },

    /// Register a new company
    Register {
        /// Company name
        empresa: String,

        /// Sales agent
        #[arg(short, long)]
        agente: String,

        /// Entry date (YYYY-MM-DD)
        #[arg(short, long)]
        entrada: String,
    },

    /// Move a company to a workflow stage
    MoveStage {
        /// Company name
        empresa: String,

        /// Stage display name ("Análise de Crédito", "Comitê", ...)
        #[arg(short, long)]
        etapa: String,

        /// Responsible party for the new stage
        #[arg(short, long)]
        responsavel: String,

        /// Deadline in days (empty or malformed means no deadline)
        #[arg(short, long, default_value = "")]
        prazo: String,
    },

    /// List or update a company's document checklist
    Pendencia {
        /// Company name
        empresa: String,

        /// Document to update (omit to list)
        #[arg(short, long)]
        documento: Option<String>,

        /// New status ("recebido", "pendente", "ok", ...)
        #[arg(short, long)]
        status: Option<String>,

        /// List only still-pending rows
        #[arg(long)]
        pendentes: bool,
    },

    /// Run a concentration report from a positions file
    Enquadramento {
        /// Fund name ("apuama", "bristol", or a config-defined fund)
        fundo: String,

        /// Fund equity ("R$ 10.000.000,00", "10000000")
        #[arg(short, long)]
        pl: String,

        /// JSON file with the receivable positions
        #[arg(short, long)]
        file: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), CreditoError> {
    let json_mode = cli.json_mode;
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Server { host, port }) => {
            cmd_server(&cli.database, config_path, &host, port).await
        }
        Some(Commands::Init { force }) => cmd_init(&cli.database, config_path, force),
        Some(Commands::Status { agente }) => {
            cmd_status(&cli.database, json_mode, agente.as_deref())
        }
        Some(Commands::Companies { agente }) => {
            cmd_companies(&cli.database, json_mode, agente.as_deref())
        }
        Some(Commands::Company { name }) => cmd_company(&cli.database, json_mode, &name),
        Some(Commands::Register {
            empresa,
            agente,
            entrada,
        }) => cmd_register(&cli.database, json_mode, &empresa, &agente, &entrada),
        Some(Commands::MoveStage {
            empresa,
            etapa,
            responsavel,
            prazo,
        }) => cmd_move_stage(&cli.database, json_mode, &empresa, &etapa, &responsavel, &prazo),
        Some(Commands::Pendencia {
            empresa,
            documento,
            status,
            pendentes,
        }) => cmd_pendencia(
            &cli.database,
            json_mode,
            &empresa,
            documento.as_deref(),
            status.as_deref(),
            pendentes,
        ),
        Some(Commands::Enquadramento { fundo, pl, file }) => {
            cmd_enquadramento(config_path, json_mode, &fundo, &pl, &file)
        }
        None => {
            // No subcommand - show status by default
            cmd_status(&cli.database, json_mode, None)
        }
    }
}
