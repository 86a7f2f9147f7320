//! # Desk Storage Trait
//!
//! `DeskStore` abstracts the persistence of companies, pendências, the
//! document directory and the transition log. Two implementations exist:
//! the in-memory `MemoryStore` below (tests, ephemeral sessions) and the
//! redb-backed store in `storage::redb_store` (everything else).
//!
//! Reads return owned values; iteration order is always deterministic
//! (company name, then document name or transition sequence).

use crate::company::Company;
use crate::pendencia::{DocumentDirectory, PendingDoc};
use crate::types::CreditoError;
use crate::workflow::TransitionEntry;
use std::collections::BTreeMap;

/// Persistence operations the desk needs.
pub trait DeskStore {
    /// Insert or overwrite a company record.
    fn put_company(&mut self, company: &Company) -> Result<(), CreditoError>;

    /// Fetch one company by name.
    fn get_company(&self, empresa: &str) -> Result<Option<Company>, CreditoError>;

    /// All companies, ordered by name.
    fn list_companies(&self) -> Result<Vec<Company>, CreditoError>;

    /// Remove a company and cascade its pendências and transitions.
    ///
    /// Returns whether the company existed.
    fn remove_company(&mut self, empresa: &str) -> Result<bool, CreditoError>;

    /// Insert or overwrite one pendência row.
    fn put_pendencia(&mut self, doc: &PendingDoc) -> Result<(), CreditoError>;

    /// All pendência rows for a company, ordered by document name.
    fn pendencias_for(&self, empresa: &str) -> Result<Vec<PendingDoc>, CreditoError>;

    /// Append one transition-log entry. Entries are never rewritten.
    fn append_transition(&mut self, entry: &TransitionEntry) -> Result<(), CreditoError>;

    /// All transition entries for a company, in append order.
    fn transitions_for(&self, empresa: &str) -> Result<Vec<TransitionEntry>, CreditoError>;

    /// Replace the reference document directory.
    fn put_documents(&mut self, directory: &DocumentDirectory) -> Result<(), CreditoError>;

    /// The stored reference document directory, if one was ever written.
    fn documents(&self) -> Result<Option<DocumentDirectory>, CreditoError>;
}

/// In-memory store over `BTreeMap`s.
#[derive(Debug, Default)]
pub struct MemoryStore {
    companies: BTreeMap<String, Company>,
    /// Keyed by (empresa, documento).
    pendencias: BTreeMap<(String, String), PendingDoc>,
    /// Keyed by (empresa, sequence).
    transitions: BTreeMap<(String, u64), TransitionEntry>,
    next_seq: u64,
    documents: Option<DocumentDirectory>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeskStore for MemoryStore {
    fn put_company(&mut self, company: &Company) -> Result<(), CreditoError> {
        self.companies
            .insert(company.empresa.clone(), company.clone());
        Ok(())
    }

    fn get_company(&self, empresa: &str) -> Result<Option<Company>, CreditoError> {
        Ok(self.companies.get(empresa).cloned())
    }

    fn list_companies(&self) -> Result<Vec<Company>, CreditoError> {
        Ok(self.companies.values().cloned().collect())
    }

    fn remove_company(&mut self, empresa: &str) -> Result<bool, CreditoError> {
        let existed = self.companies.remove(empresa).is_some();
        self.pendencias.retain(|(e, _), _| e != empresa);
        self.transitions.retain(|(e, _), _| e != empresa);
        Ok(existed)
    }

    fn put_pendencia(&mut self, doc: &PendingDoc) -> Result<(), CreditoError> {
        self.pendencias
            .insert((doc.empresa.clone(), doc.documento.clone()), doc.clone());
        Ok(())
    }

    fn pendencias_for(&self, empresa: &str) -> Result<Vec<PendingDoc>, CreditoError> {
        Ok(self
            .pendencias
            .range((empresa.to_string(), String::new())..)
            .take_while(|((e, _), _)| e == empresa)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    fn append_transition(&mut self, entry: &TransitionEntry) -> Result<(), CreditoError> {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.transitions
            .insert((entry.empresa.clone(), seq), entry.clone());
        Ok(())
    }

    fn transitions_for(&self, empresa: &str) -> Result<Vec<TransitionEntry>, CreditoError> {
        Ok(self
            .transitions
            .range((empresa.to_string(), 0)..)
            .take_while(|((e, _), _)| e == empresa)
            .map(|(_, entry)| entry.clone())
            .collect())
    }

    fn put_documents(&mut self, directory: &DocumentDirectory) -> Result<(), CreditoError> {
        self.documents = Some(directory.clone());
        Ok(())
    }

    fn documents(&self) -> Result<Option<DocumentDirectory>, CreditoError> {
        Ok(self.documents.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocStatus;
    use crate::workflow::WorkflowStage;
    use chrono::{NaiveDate, Utc};

    fn company(name: &str) -> Company {
        Company::register(
            name,
            "Gabriel",
            NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date"),
        )
    }

    #[test]
    fn companies_listed_in_name_order() {
        let mut store = MemoryStore::new();
        store.put_company(&company("Zeta")).expect("put");
        store.put_company(&company("Alfa")).expect("put");

        let names: Vec<String> = store
            .list_companies()
            .expect("list")
            .into_iter()
            .map(|c| c.empresa)
            .collect();
        assert_eq!(names, vec!["Alfa", "Zeta"]);
    }

    #[test]
    fn pendencias_scoped_per_company() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        store
            .put_pendencia(&PendingDoc::seeded("Alfa", "Contrato Social", now))
            .expect("put");
        store
            .put_pendencia(&PendingDoc::seeded("Beta", "Cartão CNPJ", now))
            .expect("put");

        let alfa = store.pendencias_for("Alfa").expect("pendencias");
        assert_eq!(alfa.len(), 1);
        assert_eq!(alfa[0].documento, "Contrato Social");
        assert_eq!(alfa[0].status, DocStatus::Pendente);
    }

    #[test]
    fn transitions_keep_append_order() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        for etapa in [WorkflowStage::AnaliseCredito, WorkflowStage::Comite] {
            store
                .append_transition(&TransitionEntry::record("Alfa", etapa, "Leonardo", 5, now))
                .expect("append");
        }

        let log = store.transitions_for("Alfa").expect("transitions");
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].etapa, WorkflowStage::AnaliseCredito);
        assert_eq!(log[1].etapa, WorkflowStage::Comite);
    }

    #[test]
    fn remove_company_cascades() {
        let mut store = MemoryStore::new();
        let now = Utc::now();
        store.put_company(&company("Alfa")).expect("put");
        store
            .put_pendencia(&PendingDoc::seeded("Alfa", "Contrato Social", now))
            .expect("put");
        store
            .append_transition(&TransitionEntry::record(
                "Alfa",
                WorkflowStage::Comite,
                "Leonardo",
                0,
                now,
            ))
            .expect("append");

        assert!(store.remove_company("Alfa").expect("remove"));
        assert!(store.pendencias_for("Alfa").expect("pendencias").is_empty());
        assert!(store.transitions_for("Alfa").expect("transitions").is_empty());
        assert!(!store.remove_company("Alfa").expect("remove again"));
    }
}
