//! # Pendências
//!
//! Required-document tracking per company. Every company carries exactly one
//! row per document in the reference directory — seeding fills the gaps and
//! never duplicates, so the invariant "no duplicates, no omissions" holds
//! after every `ensure` call, whether the company is new or revisited.

use crate::types::DocStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default reference list of required documents, used when no directory has
/// been configured. Mirrors the desk's standard onboarding checklist.
pub const DEFAULT_DOCUMENTS: &[&str] = &[
    "Balanço (2 últimos exercícios)",
    "Cartão CNPJ",
    "Contrato Social",
    "DRE (exercício corrente)",
    "Faturamento (últimos 12 meses)",
    "Relação de Endividamento",
    "Última alteração contratual",
];

/// A required document for a company, tracked as pending or received.
///
/// Composite identity = (`empresa`, `documento`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDoc {
    /// Company the document belongs to.
    pub empresa: String,
    /// Document name, drawn from the reference directory.
    pub documento: String,
    /// Current status.
    pub status: DocStatus,
    /// Timestamp of the last status change.
    pub data_ultima_atualizacao: DateTime<Utc>,
}

impl PendingDoc {
    /// Create a fresh pending row for a (company, document) pair.
    #[must_use]
    pub fn seeded(empresa: &str, documento: &str, at: DateTime<Utc>) -> Self {
        Self {
            empresa: empresa.to_string(),
            documento: documento.to_string(),
            status: DocStatus::Pendente,
            data_ultima_atualizacao: at,
        }
    }
}

/// The reference list of required document names.
///
/// Deterministically ordered; duplicate names in the input collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentDirectory {
    documentos: BTreeSet<String>,
}

impl Default for DocumentDirectory {
    fn default() -> Self {
        Self::from_names(DEFAULT_DOCUMENTS.iter().map(|d| (*d).to_string()))
    }
}

impl DocumentDirectory {
    /// Build a directory from an iterator of document names.
    ///
    /// Blank names are dropped; the rest are trimmed and deduplicated.
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = String>) -> Self {
        let documentos = names
            .into_iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self { documentos }
    }

    /// Iterate the reference document names in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.documentos.iter().map(String::as_str)
    }

    /// Number of reference documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documentos.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documentos.is_empty()
    }

    /// Whether a document name belongs to the reference list.
    #[must_use]
    pub fn contains(&self, documento: &str) -> bool {
        self.documentos.contains(documento)
    }

    /// Compute which documents a company is missing rows for.
    ///
    /// `existing` is the set of document names already present for the
    /// company. The result preserves directory order and never contains
    /// names that already exist, so seeding is idempotent.
    #[must_use]
    pub fn missing_for<'a>(&'a self, existing: &BTreeSet<String>) -> Vec<&'a str> {
        self.documentos
            .iter()
            .filter(|d| !existing.contains(*d))
            .map(String::as_str)
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directory_is_populated_and_sorted() {
        let dir = DocumentDirectory::default();
        assert_eq!(dir.len(), DEFAULT_DOCUMENTS.len());
        let names: Vec<&str> = dir.iter().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn from_names_trims_and_dedupes() {
        let dir = DocumentDirectory::from_names(vec![
            " Contrato Social ".to_string(),
            "Contrato Social".to_string(),
            String::new(),
            "Balanço".to_string(),
        ]);
        assert_eq!(dir.len(), 2);
        assert!(dir.contains("Contrato Social"));
        assert!(dir.contains("Balanço"));
    }

    #[test]
    fn missing_for_is_idempotent() {
        let dir = DocumentDirectory::from_names(vec!["A".to_string(), "B".to_string()]);
        let mut existing = BTreeSet::new();

        let first = dir.missing_for(&existing);
        assert_eq!(first, vec!["A", "B"]);

        existing.insert("A".to_string());
        let second = dir.missing_for(&existing);
        assert_eq!(second, vec!["B"]);

        existing.insert("B".to_string());
        assert!(dir.missing_for(&existing).is_empty());
    }
}
