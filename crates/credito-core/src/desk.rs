//! # Desk Module
//!
//! The `Desk` is the high-level façade over a storage backend. Every
//! operation an analyst or sales agent performs on the desk goes through
//! it: registering companies (with pendência seeding), partial updates,
//! pendência status changes, workflow movements with the transition log,
//! deadline-progress reports and KPI aggregation.
//!
//! ## Storage Backends
//!
//! Desk supports two storage backends:
//! - `InMemory`: volatile `MemoryStore` (tests, ephemeral sessions)
//! - `Persistent`: `RedbStore` for disk-backed ACID storage
//!
//! Writes are last-write-wins; the transition log is the only append-only
//! history. Time enters every mutating operation as an explicit `now`
//! argument, keeping the desk itself deterministic.

use crate::company::{Company, CompanyUpdate};
use crate::pendencia::{DocumentDirectory, PendingDoc};
use crate::storage::RedbStore;
use crate::store::{DeskStore, MemoryStore};
use crate::types::{CreditoError, DocStatus, Money, Situacao};
use crate::workflow::{
    StagePosition, StageProgress, TransitionEntry, WorkflowStage, evaluate_progress,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Storage backend for a Desk.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    fn store(&self) -> &dyn DeskStore {
        match self {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }

    fn store_mut(&mut self) -> &mut dyn DeskStore {
        match self {
            StorageBackend::InMemory(s) => s,
            StorageBackend::Persistent(s) => s,
        }
    }
}

// NOTE: StorageBackend does NOT implement Clone.
// RedbStore (database handle) cannot be safely cloned.

/// Deadline-progress report for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Current stage.
    pub etapa: WorkflowStage,
    /// Evaluator output against the last transition's deadline.
    pub progress: StageProgress,
    /// Every stage with its position relative to the current one.
    pub posicoes: Vec<(WorkflowStage, StagePosition)>,
}

/// Aggregated desk KPIs, optionally scoped to one sales agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DeskKpis {
    pub total: usize,
    pub em_analise: usize,
    pub aprovadas: usize,
    pub reprovadas: usize,
    pub stand_by: usize,
    /// Pendência rows still pending across the scoped companies.
    pub pendencias_abertas: usize,
    /// Sum of approved credit limits.
    pub limite_total: Money,
}

/// The credit-desk façade.
#[derive(Debug, Default)]
pub struct Desk {
    backend: StorageBackend,
}

impl Desk {
    /// Create a new empty desk with in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a desk with persistent redb storage.
    ///
    /// Opens or creates a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, CreditoError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
        })
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, StorageBackend::Persistent(_))
    }

    /// The reference document directory, falling back to the built-in list
    /// when none has been configured.
    pub fn documents(&self) -> Result<DocumentDirectory, CreditoError> {
        Ok(self
            .backend
            .store()
            .documents()?
            .unwrap_or_default())
    }

    /// Replace the reference document directory.
    ///
    /// Existing pendência rows are untouched; new documents appear for each
    /// company on its next `ensure_pendencias` (which registration and
    /// pendência reads perform).
    pub fn set_documents(&mut self, directory: DocumentDirectory) -> Result<(), CreditoError> {
        self.backend.store_mut().put_documents(&directory)
    }

    // =========================================================================
    // COMPANIES
    // =========================================================================

    /// Register a new company and seed its pendência rows.
    ///
    /// # Errors
    ///
    /// `CompanyExists` when the name is already registered; `InvalidInput`
    /// when the name is blank.
    pub fn register_company(
        &mut self,
        empresa: &str,
        agente: &str,
        entrada: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Company, CreditoError> {
        let name = Company::validate_name(empresa)?;
        if self.backend.store().get_company(&name)?.is_some() {
            return Err(CreditoError::CompanyExists(name));
        }

        let company = Company::register(name.clone(), agente.trim(), entrada);
        self.backend.store_mut().put_company(&company)?;
        self.ensure_pendencias(&name, now)?;
        Ok(company)
    }

    /// Fetch one company.
    pub fn company(&self, empresa: &str) -> Result<Company, CreditoError> {
        self.backend
            .store()
            .get_company(empresa)?
            .ok_or_else(|| CreditoError::CompanyNotFound(empresa.to_string()))
    }

    /// List companies, optionally restricted to one sales agent.
    pub fn companies(&self, agente: Option<&str>) -> Result<Vec<Company>, CreditoError> {
        let mut companies = self.backend.store().list_companies()?;
        if let Some(agente) = agente {
            companies.retain(|c| c.agente == agente);
        }
        Ok(companies)
    }

    /// Apply a partial update to a company.
    pub fn update_company(
        &mut self,
        empresa: &str,
        update: &CompanyUpdate,
    ) -> Result<Company, CreditoError> {
        let mut company = self.company(empresa)?;
        update.apply(&mut company);
        self.backend.store_mut().put_company(&company)?;
        Ok(company)
    }

    /// Delete a company and cascade its pendências and transition log.
    pub fn delete_company(&mut self, empresa: &str) -> Result<(), CreditoError> {
        if !self.backend.store_mut().remove_company(empresa)? {
            return Err(CreditoError::CompanyNotFound(empresa.to_string()));
        }
        Ok(())
    }

    // =========================================================================
    // PENDENCIAS
    // =========================================================================

    /// Seed the missing pendência rows for a company against the reference
    /// directory. Idempotent: existing rows (and their statuses) are kept,
    /// and no duplicates are ever created.
    ///
    /// Returns how many rows were seeded.
    pub fn ensure_pendencias(
        &mut self,
        empresa: &str,
        now: DateTime<Utc>,
    ) -> Result<usize, CreditoError> {
        let directory = self.documents()?;
        let existing: BTreeSet<String> = self
            .backend
            .store()
            .pendencias_for(empresa)?
            .into_iter()
            .map(|d| d.documento)
            .collect();

        let missing: Vec<String> = directory
            .missing_for(&existing)
            .into_iter()
            .map(str::to_string)
            .collect();
        for documento in &missing {
            self.backend
                .store_mut()
                .put_pendencia(&PendingDoc::seeded(empresa, documento, now))?;
        }
        Ok(missing.len())
    }

    /// Pendência rows for a company, seeding any gaps first.
    ///
    /// With `only_pending`, received documents are filtered out.
    pub fn pendencias(
        &mut self,
        empresa: &str,
        only_pending: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<PendingDoc>, CreditoError> {
        // Verify existence before seeding rows for a ghost company.
        let _ = self.company(empresa)?;
        self.ensure_pendencias(empresa, now)?;
        let mut docs = self.backend.store().pendencias_for(empresa)?;
        if only_pending {
            docs.retain(|d| d.status.is_pending());
        }
        Ok(docs)
    }

    /// Apply a batch of pendência status changes.
    ///
    /// Each named document must already have a row. Returns how many rows
    /// actually changed (same-status writes are skipped and do not touch the
    /// update timestamp).
    pub fn set_pendencia_status(
        &mut self,
        empresa: &str,
        updates: &[(String, DocStatus)],
        now: DateTime<Utc>,
    ) -> Result<usize, CreditoError> {
        let _ = self.company(empresa)?;
        self.ensure_pendencias(empresa, now)?;

        let mut changed = 0;
        for (documento, status) in updates {
            let rows = self.backend.store().pendencias_for(empresa)?;
            let mut row = rows
                .into_iter()
                .find(|d| d.documento == *documento)
                .ok_or_else(|| CreditoError::DocumentNotFound {
                    empresa: empresa.to_string(),
                    documento: documento.clone(),
                })?;
            if row.status == *status {
                continue;
            }
            row.status = *status;
            row.data_ultima_atualizacao = now;
            self.backend.store_mut().put_pendencia(&row)?;
            changed += 1;
        }
        Ok(changed)
    }

    // =========================================================================
    // WORKFLOW
    // =========================================================================

    /// Move a company to a stage, appending a transition-log entry.
    ///
    /// Any stage may be set from any other stage; moving to the current
    /// stage just renews the deadline. The company's stage, responsible
    /// party and movement timestamp are updated alongside the log append.
    pub fn move_stage(
        &mut self,
        empresa: &str,
        etapa: WorkflowStage,
        responsavel: &str,
        prazo_dias: u32,
        now: DateTime<Utc>,
    ) -> Result<TransitionEntry, CreditoError> {
        let mut company = self.company(empresa)?;

        let entry = TransitionEntry::record(empresa, etapa, responsavel, prazo_dias, now);
        self.backend.store_mut().append_transition(&entry)?;

        company.etapa = etapa;
        company.responsavel = responsavel.to_string();
        company.ultima_movimentacao = Some(now);
        self.backend.store_mut().put_company(&company)?;

        Ok(entry)
    }

    /// The transition log for a company, in append order.
    pub fn transitions(&self, empresa: &str) -> Result<Vec<TransitionEntry>, CreditoError> {
        let _ = self.company(empresa)?;
        self.backend.store().transitions_for(empresa)
    }

    /// Deadline-progress report for a company at `now`.
    ///
    /// The deadline comes from the most recent transition entry; a company
    /// that never moved has no deadline.
    pub fn stage_report(
        &self,
        empresa: &str,
        now: DateTime<Utc>,
    ) -> Result<StageReport, CreditoError> {
        let company = self.company(empresa)?;
        let transitions = self.backend.store().transitions_for(empresa)?;

        let prazo_dias = transitions.last().map(|t| t.prazo_dias).unwrap_or(0);
        let progress = evaluate_progress(prazo_dias, company.ultima_movimentacao, now);

        let posicoes = crate::workflow::STAGES
            .iter()
            .map(|&s| (s, company.etapa.position_of(s)))
            .collect();

        Ok(StageReport {
            etapa: company.etapa,
            progress,
            posicoes,
        })
    }

    // =========================================================================
    // KPIS
    // =========================================================================

    /// Aggregate KPIs, optionally scoped to one sales agent.
    pub fn kpis(&self, agente: Option<&str>) -> Result<DeskKpis, CreditoError> {
        let companies = self.companies(agente)?;
        let mut kpis = DeskKpis {
            total: companies.len(),
            ..DeskKpis::default()
        };

        for company in &companies {
            match company.situacao {
                Situacao::EmAnalise => kpis.em_analise += 1,
                Situacao::Aprovada => kpis.aprovadas += 1,
                Situacao::Reprovada => kpis.reprovadas += 1,
                Situacao::StandBy => kpis.stand_by += 1,
            }
            kpis.limite_total = kpis.limite_total.add(company.limite);
            kpis.pendencias_abertas += self
                .backend
                .store()
                .pendencias_for(&company.empresa)?
                .iter()
                .filter(|d| d.status.is_pending())
                .count();
        }
        Ok(kpis)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pendencia::DEFAULT_DOCUMENTS;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-08-24T12:00:00Z")
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    fn entry_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date")
    }

    fn desk_with_acme() -> Desk {
        let mut desk = Desk::new();
        desk.register_company("ACME Ltda", "Gabriel", entry_date(), now())
            .expect("register");
        desk
    }

    #[test]
    fn register_seeds_full_pendencia_set() {
        let mut desk = desk_with_acme();
        let docs = desk.pendencias("ACME Ltda", false, now()).expect("docs");
        assert_eq!(docs.len(), DEFAULT_DOCUMENTS.len());
        assert!(docs.iter().all(|d| d.status.is_pending()));
    }

    #[test]
    fn register_duplicate_is_rejected() {
        let mut desk = desk_with_acme();
        let err = desk.register_company(" ACME Ltda ", "Outro", entry_date(), now());
        assert!(matches!(err, Err(CreditoError::CompanyExists(_))));
    }

    #[test]
    fn seeding_is_idempotent_and_preserves_status() {
        let mut desk = desk_with_acme();
        let documento = DEFAULT_DOCUMENTS[0].to_string();
        desk.set_pendencia_status(
            "ACME Ltda",
            &[(documento.clone(), DocStatus::Recebido)],
            now(),
        )
        .expect("set status");

        // A second ensure must not duplicate nor reset the received row.
        let seeded = desk.ensure_pendencias("ACME Ltda", now()).expect("ensure");
        assert_eq!(seeded, 0);
        let docs = desk.pendencias("ACME Ltda", false, now()).expect("docs");
        assert_eq!(docs.len(), DEFAULT_DOCUMENTS.len());
        let row = docs
            .iter()
            .find(|d| d.documento == documento)
            .expect("row");
        assert_eq!(row.status, DocStatus::Recebido);
    }

    #[test]
    fn directory_growth_backfills_on_next_read() {
        let mut desk = desk_with_acme();
        let mut names: Vec<String> = DEFAULT_DOCUMENTS.iter().map(|d| (*d).to_string()).collect();
        names.push("Certidão Negativa".to_string());
        desk.set_documents(DocumentDirectory::from_names(names))
            .expect("set documents");

        let docs = desk.pendencias("ACME Ltda", false, now()).expect("docs");
        assert_eq!(docs.len(), DEFAULT_DOCUMENTS.len() + 1);
        assert!(docs.iter().any(|d| d.documento == "Certidão Negativa"));
    }

    #[test]
    fn pending_filter_hides_received() {
        let mut desk = desk_with_acme();
        desk.set_pendencia_status(
            "ACME Ltda",
            &[(DEFAULT_DOCUMENTS[0].to_string(), DocStatus::Recebido)],
            now(),
        )
        .expect("set status");

        let pending = desk.pendencias("ACME Ltda", true, now()).expect("docs");
        assert_eq!(pending.len(), DEFAULT_DOCUMENTS.len() - 1);
    }

    #[test]
    fn unknown_document_is_an_error() {
        let mut desk = desk_with_acme();
        let err = desk.set_pendencia_status(
            "ACME Ltda",
            &[("Documento Fantasma".to_string(), DocStatus::Recebido)],
            now(),
        );
        assert!(matches!(err, Err(CreditoError::DocumentNotFound { .. })));
    }

    #[test]
    fn same_status_write_is_skipped() {
        let mut desk = desk_with_acme();
        let changed = desk
            .set_pendencia_status(
                "ACME Ltda",
                &[(DEFAULT_DOCUMENTS[0].to_string(), DocStatus::Pendente)],
                now(),
            )
            .expect("set status");
        assert_eq!(changed, 0);
    }

    #[test]
    fn move_stage_appends_and_updates_company() {
        let mut desk = desk_with_acme();
        desk.move_stage(
            "ACME Ltda",
            WorkflowStage::AnaliseCredito,
            "Leonardo",
            5,
            now(),
        )
        .expect("move");

        let company = desk.company("ACME Ltda").expect("company");
        assert_eq!(company.etapa, WorkflowStage::AnaliseCredito);
        assert_eq!(company.responsavel, "Leonardo");
        assert_eq!(company.ultima_movimentacao, Some(now()));

        let log = desk.transitions("ACME Ltda").expect("log");
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].prazo_dias, 5);
    }

    #[test]
    fn free_jumps_are_allowed() {
        let mut desk = desk_with_acme();
        desk.move_stage("ACME Ltda", WorkflowStage::Finalizado, "Leonardo", 0, now())
            .expect("jump forward");
        desk.move_stage("ACME Ltda", WorkflowStage::Cadastro, "Gabriel", 0, now())
            .expect("jump back");
        assert_eq!(desk.transitions("ACME Ltda").expect("log").len(), 2);
    }

    #[test]
    fn stage_report_uses_last_transition_deadline() {
        let mut desk = desk_with_acme();

        // Never moved: neutral.
        let report = desk.stage_report("ACME Ltda", now()).expect("report");
        assert_eq!(report.progress, StageProgress::no_deadline());

        desk.move_stage(
            "ACME Ltda",
            WorkflowStage::AnaliseCredito,
            "Leonardo",
            10,
            now() - Duration::days(5),
        )
        .expect("move");

        let report = desk.stage_report("ACME Ltda", now()).expect("report");
        assert_eq!(report.etapa, WorkflowStage::AnaliseCredito);
        assert_eq!(report.progress.percent, 50);
        assert_eq!(report.progress.days_remaining, Some(5));
        let positions: Vec<StagePosition> = report.posicoes.iter().map(|(_, p)| *p).collect();
        assert_eq!(
            positions,
            vec![
                StagePosition::Passed,
                StagePosition::Passed,
                StagePosition::Current,
                StagePosition::Upcoming,
                StagePosition::Upcoming,
                StagePosition::Upcoming,
            ]
        );
    }

    #[test]
    fn kpis_aggregate_and_scope_by_agent() {
        let mut desk = desk_with_acme();
        desk.register_company("Beta SA", "Marina", entry_date(), now())
            .expect("register");
        desk.update_company(
            "Beta SA",
            &CompanyUpdate {
                situacao: Some(Situacao::Aprovada),
                limite: Some(Money(250_000_00)),
                ..CompanyUpdate::default()
            },
        )
        .expect("update");

        let all = desk.kpis(None).expect("kpis");
        assert_eq!(all.total, 2);
        assert_eq!(all.em_analise, 1);
        assert_eq!(all.aprovadas, 1);
        assert_eq!(all.limite_total, Money(250_000_00));
        assert_eq!(all.pendencias_abertas, 2 * DEFAULT_DOCUMENTS.len());

        let marina = desk.kpis(Some("Marina")).expect("kpis");
        assert_eq!(marina.total, 1);
        assert_eq!(marina.aprovadas, 1);
    }

    #[test]
    fn delete_cascades() {
        let mut desk = desk_with_acme();
        desk.move_stage("ACME Ltda", WorkflowStage::Comite, "Leonardo", 3, now())
            .expect("move");
        desk.delete_company("ACME Ltda").expect("delete");

        assert!(matches!(
            desk.company("ACME Ltda"),
            Err(CreditoError::CompanyNotFound(_))
        ));
        assert!(matches!(
            desk.delete_company("ACME Ltda"),
            Err(CreditoError::CompanyNotFound(_))
        ));
    }

    #[test]
    fn persistent_desk_survives_reopen() {
        let temp = tempfile::tempdir().expect("temp dir");
        let db_path = temp.path().join("desk.redb");

        {
            let mut desk = Desk::with_redb(&db_path).expect("open");
            assert!(desk.is_persistent());
            desk.register_company("ACME Ltda", "Gabriel", entry_date(), now())
                .expect("register");
            desk.move_stage("ACME Ltda", WorkflowStage::Comite, "Leonardo", 3, now())
                .expect("move");
        }
        {
            let desk = Desk::with_redb(&db_path).expect("reopen");
            let company = desk.company("ACME Ltda").expect("company");
            assert_eq!(company.etapa, WorkflowStage::Comite);
            assert_eq!(desk.transitions("ACME Ltda").expect("log").len(), 1);
        }
    }
}
