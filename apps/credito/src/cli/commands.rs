//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api;
use crate::api::PositionJson;
use crate::config::AppConfig;
use chrono::Utc;
use credito_core::{
    CreditoError, Desk, DocStatus, DocumentDirectory, Money, WorkflowStage, build_report,
    parse_deadline_days, parse_optional_date,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size for a positions file (10 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_POSITIONS_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), CreditoError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| CreditoError::IoError(format!("Cannot read file metadata: {e}")))?;

    if metadata.len() > max_size {
        return Err(CreditoError::InvalidInput(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it exists
/// and is a regular file. This prevents path traversal through paths like
/// "../../../etc/passwd".
fn validate_file_path(path: &Path) -> Result<PathBuf, CreditoError> {
    let canonical = path.canonicalize().map_err(|e| {
        CreditoError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(CreditoError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open (or create) the desk database.
pub fn open_desk(db_path: &Path) -> Result<Desk, CreditoError> {
    Desk::with_redb(db_path)
}

/// Apply the config's document-list override to the desk, if any.
fn apply_document_override(desk: &mut Desk, config: &AppConfig) -> Result<(), CreditoError> {
    if !config.documents.is_empty() {
        desk.set_documents(DocumentDirectory::from_names(config.documents.clone()))?;
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    db_path: &Path,
    config_path: Option<&Path>,
    host: &str,
    port: u16,
) -> Result<(), CreditoError> {
    let config = AppConfig::load_or_default(config_path)?;
    let mut desk = open_desk(db_path)?;
    apply_document_override(&mut desk, &config)?;

    println!("Credito Desk Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Database: {:?}", db_path);
    println!("  Users:    {}", config.users.len());
    println!();
    println!("Endpoints:");
    println!("  POST /login                          - Open a session");
    println!("  GET  /kpis                           - Desk KPIs");
    println!("  GET  /companies                      - List companies");
    println!("  POST /companies                      - Register a company");
    println!("  GET  /companies/{{name}}/pendencias    - Document checklist");
    println!("  POST /companies/{{name}}/transitions   - Move workflow stage");
    println!("  GET  /companies/{{name}}/progress      - Deadline progress");
    println!("  POST /enquadramento                  - Concentration report");
    println!("  POST /pdd                            - PDD pivot");
    println!("  GET  /health                         - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, desk, &config).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize new database.
pub fn cmd_init(db_path: &Path, config_path: Option<&Path>, force: bool) -> Result<(), CreditoError> {
    if db_path.exists() {
        if !force {
            return Err(CreditoError::InvalidInput(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(db_path)
            .map_err(|e| CreditoError::IoError(format!("Cannot remove database: {e}")))?;
    }

    let config = AppConfig::load_or_default(config_path)?;
    let mut desk = open_desk(db_path)?;
    apply_document_override(&mut desk, &config)?;

    let directory = desk.documents()?;
    println!("Initialized new database at {:?}", db_path);
    println!("Required documents: {}", directory.len());
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show desk KPIs.
pub fn cmd_status(db_path: &Path, json_mode: bool, agente: Option<&str>) -> Result<(), CreditoError> {
    let desk = open_desk(db_path)?;
    let kpis = desk.kpis(agente)?;

    if json_mode {
        print_json(&kpis);
        return Ok(());
    }

    println!("Credito Desk Status");
    println!("===================");
    println!("Database: {:?}", db_path);
    if let Some(agente) = agente {
        println!("Agente:   {}", agente);
    }
    println!();
    println!("Empresas:            {}", kpis.total);
    println!("  Em análise:        {}", kpis.em_analise);
    println!("  Aprovadas:         {}", kpis.aprovadas);
    println!("  Reprovadas:        {}", kpis.reprovadas);
    println!("  Stand by:          {}", kpis.stand_by);
    println!("Pendências abertas:  {}", kpis.pendencias_abertas);
    println!("Limite total:        {}", kpis.limite_total);

    Ok(())
}

// =============================================================================
// COMPANY COMMANDS
// =============================================================================

/// List companies.
pub fn cmd_companies(
    db_path: &Path,
    json_mode: bool,
    agente: Option<&str>,
) -> Result<(), CreditoError> {
    let desk = open_desk(db_path)?;
    let companies = desk.companies(agente)?;

    if json_mode {
        print_json(&companies);
        return Ok(());
    }

    if companies.is_empty() {
        println!("No companies registered.");
        return Ok(());
    }

    for company in &companies {
        println!(
            "{} | {} | {} | {} | {}",
            company.empresa, company.agente, company.situacao, company.etapa, company.limite
        );
    }
    println!();
    println!("{} companies", companies.len());

    Ok(())
}

/// Show one company with its stage progress.
pub fn cmd_company(db_path: &Path, json_mode: bool, name: &str) -> Result<(), CreditoError> {
    let desk = open_desk(db_path)?;
    let company = desk.company(name)?;
    let report = desk.stage_report(name, Utc::now())?;

    if json_mode {
        print_json(&serde_json::json!({
            "company": company,
            "report": report,
        }));
        return Ok(());
    }

    println!("{}", company.empresa);
    println!("{}", "=".repeat(company.empresa.chars().count()));
    println!("Agente:     {}", company.agente);
    println!("Entrada:    {}", company.entrada.format("%Y-%m-%d"));
    println!("Situação:   {}", company.situacao);
    println!("Limite:     {}", company.limite);
    println!("Etapa:      {}", company.etapa);
    if !company.responsavel.is_empty() {
        println!("Responsável: {}", company.responsavel);
    }
    if let Some(saida) = company.saida_credito {
        println!("Saída crédito: {}", saida.format("%Y-%m-%d"));
    }
    println!();
    println!("Progresso: {}% ({:?})", report.progress.percent, report.progress.status);
    if let Some(days) = report.progress.days_remaining {
        println!("Dias restantes: {}", days);
    }
    for (stage, position) in &report.posicoes {
        let marker = match position {
            credito_core::StagePosition::Passed => "[x]",
            credito_core::StagePosition::Current => "[>]",
            credito_core::StagePosition::Upcoming => "[ ]",
        };
        println!("  {} {}", marker, stage);
    }

    Ok(())
}

/// Register a new company.
pub fn cmd_register(
    db_path: &Path,
    json_mode: bool,
    empresa: &str,
    agente: &str,
    entrada: &str,
) -> Result<(), CreditoError> {
    let entrada = parse_optional_date(entrada)?
        .ok_or_else(|| CreditoError::InvalidInput("Informe a data de entrada.".to_string()))?;

    let mut desk = open_desk(db_path)?;
    let company = desk.register_company(empresa, agente, entrada, Utc::now())?;
    let pendencias = desk.pendencias(&company.empresa, true, Utc::now())?;

    if json_mode {
        print_json(&company);
        return Ok(());
    }

    println!("Registered {} (agente: {})", company.empresa, company.agente);
    println!("{} pendências seeded", pendencias.len());

    Ok(())
}

// =============================================================================
// WORKFLOW COMMANDS
// =============================================================================

/// Move a company to a workflow stage.
pub fn cmd_move_stage(
    db_path: &Path,
    json_mode: bool,
    empresa: &str,
    etapa: &str,
    responsavel: &str,
    prazo: &str,
) -> Result<(), CreditoError> {
    let etapa = WorkflowStage::parse(etapa)?;
    let prazo_dias = parse_deadline_days(prazo);

    let mut desk = open_desk(db_path)?;
    let entry = desk.move_stage(empresa, etapa, responsavel, prazo_dias, Utc::now())?;

    if json_mode {
        print_json(&entry);
        return Ok(());
    }

    println!("{} -> {} (responsável: {})", empresa, entry.etapa, entry.responsavel);
    if entry.prazo_dias > 0 {
        println!("Prazo: {} dias", entry.prazo_dias);
    } else {
        println!("Sem prazo");
    }

    Ok(())
}

// =============================================================================
// PENDENCIA COMMAND
// =============================================================================

/// List or update a company's document checklist.
pub fn cmd_pendencia(
    db_path: &Path,
    json_mode: bool,
    empresa: &str,
    documento: Option<&str>,
    status: Option<&str>,
    pendentes: bool,
) -> Result<(), CreditoError> {
    let mut desk = open_desk(db_path)?;

    if let Some(documento) = documento {
        let status = status.ok_or_else(|| {
            CreditoError::InvalidInput("Informe o --status para atualizar.".to_string())
        })?;
        let updates = vec![(documento.to_string(), DocStatus::normalize(status))];
        let changed = desk.set_pendencia_status(empresa, &updates, Utc::now())?;
        if !json_mode {
            println!("{} row(s) changed", changed);
        }
    }

    let docs = desk.pendencias(empresa, pendentes, Utc::now())?;

    if json_mode {
        print_json(&docs);
        return Ok(());
    }

    for doc in &docs {
        println!("  [{}] {}", doc.status, doc.documento);
    }
    println!();
    println!(
        "{} documents ({} pending)",
        docs.len(),
        docs.iter().filter(|d| d.status.is_pending()).count()
    );

    Ok(())
}

// =============================================================================
// ENQUADRAMENTO COMMAND
// =============================================================================

/// Run a concentration report from a positions file.
pub fn cmd_enquadramento(
    config_path: Option<&Path>,
    json_mode: bool,
    fundo: &str,
    pl: &str,
    file: &Path,
) -> Result<(), CreditoError> {
    let config = AppConfig::load_or_default(config_path)?;
    let limits = config
        .fund_limits(fundo)
        .ok_or_else(|| CreditoError::InvalidInput(format!("Fundo desconhecido: {fundo}")))?;

    let validated_path = validate_file_path(file)?;
    validate_file_size(&validated_path, MAX_POSITIONS_FILE_SIZE)?;

    let contents = std::fs::read(&validated_path)
        .map_err(|e| CreditoError::IoError(format!("Read file: {e}")))?;
    let rows: Vec<PositionJson> = serde_json::from_slice(&contents)
        .map_err(|e| CreditoError::SerializationError(format!("Invalid positions file: {e}")))?;
    let positions: Vec<_> = rows.iter().map(PositionJson::to_position).collect();

    let reassigned: BTreeSet<String> = credito_core::DEFAULT_REASSIGNED_CEDENTES
        .iter()
        .map(|s| (*s).to_string())
        .collect();
    let report = build_report(&positions, Money::parse_br(pl), limits, &reassigned)?;

    if json_mode {
        print_json(&report);
        return Ok(());
    }

    println!("Enquadramento: {} (PL {})", fundo, report.pl);
    println!();
    let checks = [
        ("Maior cedente", &report.maior_cedente),
        ("Top cedentes", &report.top_cedentes),
        ("Maior sacado", &report.maior_sacado),
        ("Top sacados", &report.top_sacados),
    ];
    for (rotulo, check) in checks {
        let flag = if check.enquadrado { "OK " } else { "FORA" };
        println!(
            "  [{}] {:<14} {:<28} {}.{:02}% (limite {}.{:02}%)",
            flag,
            rotulo,
            check.descricao,
            check.share_bps / 100,
            check.share_bps % 100,
            check.limite_bps / 100,
            check.limite_bps % 100
        );
    }

    Ok(())
}
