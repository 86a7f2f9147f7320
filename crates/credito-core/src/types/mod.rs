//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the credit desk:
//! - Money (`Money`, integer centavos — no floats anywhere in this workspace)
//! - Company situation (`Situacao`) and pendência status (`DocStatus`)
//! - The operational checklist (`Checklist`)
//! - Error types (`CreditoError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they are used as `BTreeMap`/`BTreeSet` keys
//! - Normalize free-text vocabulary to one canonical form on entry

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// MONEY (integer centavos)
// =============================================================================

/// A monetary amount in centavos (hundredths of a real).
///
/// Credit limits, receivable values, fund equity and PDD provisions are all
/// carried as `Money`. Arithmetic is saturating to keep aggregation total.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(pub i64);

impl Money {
    /// Create a new amount from centavos.
    #[must_use]
    pub const fn from_centavos(centavos: i64) -> Self {
        Self(centavos)
    }

    /// Get the raw centavos value.
    #[must_use]
    pub const fn centavos(self) -> i64 {
        self.0
    }

    /// Saturating addition.
    #[must_use]
    pub const fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a Brazilian-formatted amount ("R$ 1.234,56", "1234.56", "1234").
    ///
    /// Defensive: malformed input yields zero rather than an error, matching
    /// the desk's tolerance for hand-typed spreadsheet values.
    #[must_use]
    pub fn parse_br(input: &str) -> Self {
        let cleaned: String = input
            .replace("R$", "")
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
            .collect();
        if cleaned.is_empty() {
            return Self(0);
        }

        let (negative, digits) = match cleaned.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, cleaned.as_str()),
        };

        // "1234.56" (single dot, no comma) is already decimal-point form.
        let (int_part, frac_part) = if digits.matches('.').count() == 1 && !digits.contains(',') {
            match digits.split_once('.') {
                Some((i, f)) => (i.to_string(), f.to_string()),
                None => (digits.to_string(), String::new()),
            }
        } else if let Some((i, f)) = digits.split_once(',') {
            // "1.234,56": dots are thousands separators.
            (i.replace('.', ""), f.to_string())
        } else {
            (digits.replace('.', ""), String::new())
        };

        let reais = if int_part.is_empty() {
            0i64
        } else {
            match int_part.parse::<i64>() {
                Ok(v) => v,
                Err(_) => return Self(0),
            }
        };

        // Fraction is read as exactly two decimal places. Truncate by chars,
        // not bytes: byte-indexed truncate panics on multibyte input.
        let mut frac: String = frac_part.chars().take(2).collect();
        while frac.len() < 2 {
            frac.push('0');
        }
        let Ok(cents) = frac.parse::<i64>() else {
            return Self(0);
        };

        let total = reais.saturating_mul(100).saturating_add(cents);
        if negative { Self(-total) } else { Self(total) }
    }
}

impl std::fmt::Display for Money {
    /// Formats as "R$ 1.234,56" using integer math only.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abs = self.0.unsigned_abs();
        let reais = abs / 100;
        let cents = abs % 100;

        let digits = reais.to_string();
        let mut grouped = String::new();
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }

        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}R$ {},{:02}", sign, grouped, cents)
    }
}

// =============================================================================
// SITUACAO (company review status)
// =============================================================================

/// Review situation of a company, one of a fixed enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Situacao {
    /// "Em análise" — under review (initial state).
    #[serde(rename = "Em análise")]
    EmAnalise,
    /// "Aprovada" — credit limit approved.
    Aprovada,
    /// "Reprovada" — rejected.
    Reprovada,
    /// "Stand by" — parked.
    #[serde(rename = "Stand by")]
    StandBy,
}

impl Default for Situacao {
    fn default() -> Self {
        Self::EmAnalise
    }
}

impl Situacao {
    /// Canonical display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Situacao::EmAnalise => "Em análise",
            Situacao::Aprovada => "Aprovada",
            Situacao::Reprovada => "Reprovada",
            Situacao::StandBy => "Stand by",
        }
    }

    /// Parse a label back into a situation.
    pub fn parse(label: &str) -> Result<Self, CreditoError> {
        match label.trim() {
            "Em análise" | "Em analise" => Ok(Situacao::EmAnalise),
            "Aprovada" => Ok(Situacao::Aprovada),
            "Reprovada" => Ok(Situacao::Reprovada),
            "Stand by" | "Stand By" => Ok(Situacao::StandBy),
            other => Err(CreditoError::InvalidInput(format!(
                "situação desconhecida: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Situacao {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// DOC STATUS (pendência status)
// =============================================================================

/// Status of a required document: still pending or already received.
///
/// Historical data carries several spellings ("Recebido", "ok", "entregue");
/// `normalize` folds them all into the canonical lowercase pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
    Pendente,
    Recebido,
}

impl Default for DocStatus {
    fn default() -> Self {
        Self::Pendente
    }
}

impl DocStatus {
    /// Normalize free-text status input to the canonical enumeration.
    ///
    /// Anything not recognized as "received" is treated as pending.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "recebido" | "ok" | "entregue" | "sim" | "true" => DocStatus::Recebido,
            _ => DocStatus::Pendente,
        }
    }

    /// Canonical storage string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DocStatus::Pendente => "pendente",
            DocStatus::Recebido => "recebido",
        }
    }

    /// Whether the document is still outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, DocStatus::Pendente)
    }
}

impl std::fmt::Display for DocStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CHECKLIST (operational flags)
// =============================================================================

/// The five yes/no operational flags tracked per company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Checklist {
    pub envio_das: bool,
    pub emissao_contrato: bool,
    pub assinatura: bool,
    pub homologacao: bool,
    pub apto_a_operar: bool,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the credit desk.
///
/// - No silent failures outside the explicitly defensive parsers
/// - Use `Result<T, CreditoError>` for fallible operations
/// - The core should never panic; all errors are recoverable
#[derive(Debug, Error)]
pub enum CreditoError {
    /// A date string did not parse as YYYY-MM-DD.
    #[error("Data inválida: {0} (use YYYY-MM-DD)")]
    InvalidDate(String),

    /// An unknown workflow stage name was supplied.
    #[error("Etapa desconhecida: {0}")]
    InvalidStage(String),

    /// A company with this name already exists.
    #[error("Empresa já cadastrada: {0}")]
    CompanyExists(String),

    /// The requested company was not found.
    #[error("Empresa não encontrada: {0}")]
    CompanyNotFound(String),

    /// The requested pendência row was not found.
    #[error("Pendência não encontrada: {empresa} / {documento}")]
    DocumentNotFound { empresa: String, documento: String },

    /// Generic invalid input with a user-facing message.
    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
