//! # Company Record
//!
//! The central row of the desk: one entry per prospective client company,
//! keyed by its unique name. Updates overwrite in place — the desk keeps no
//! historical versions of this record (the transition log is the only
//! append-only history).

use crate::types::{Checklist, CreditoError, Money, Situacao};
use crate::workflow::WorkflowStage;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A prospective client company under credit analysis.
///
/// PK = `empresa` (the unique company name).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Unique company name — primary key.
    pub empresa: String,

    /// Sales agent that registered the company.
    pub agente: String,

    /// Date the company entered the desk.
    pub entrada: NaiveDate,

    /// Current review situation.
    #[serde(default)]
    pub situacao: Situacao,

    /// Approved credit limit (centavos, non-negative).
    #[serde(default)]
    pub limite: Money,

    /// Free-text internal comment.
    #[serde(default)]
    pub comentario_interno: String,

    /// Date credit was released, if any.
    #[serde(default)]
    pub saida_credito: Option<NaiveDate>,

    /// Operational checklist flags.
    #[serde(default)]
    pub checklist: Checklist,

    /// Current workflow stage.
    #[serde(default)]
    pub etapa: WorkflowStage,

    /// Current responsible party for the stage.
    #[serde(default)]
    pub responsavel: String,

    /// Timestamp of the last workflow movement, if the company ever moved.
    #[serde(default)]
    pub ultima_movimentacao: Option<DateTime<Utc>>,
}

impl Company {
    /// Create a freshly registered company in the initial state.
    #[must_use]
    pub fn register(empresa: impl Into<String>, agente: impl Into<String>, entrada: NaiveDate) -> Self {
        Self {
            empresa: empresa.into(),
            agente: agente.into(),
            entrada,
            situacao: Situacao::EmAnalise,
            limite: Money::default(),
            comentario_interno: String::new(),
            saida_credito: None,
            checklist: Checklist::default(),
            etapa: WorkflowStage::Cadastro,
            responsavel: String::new(),
            ultima_movimentacao: None,
        }
    }

    /// Validate a company name for registration.
    ///
    /// Names are trimmed; empty names are rejected with a user-facing message.
    pub fn validate_name(raw: &str) -> Result<String, CreditoError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(CreditoError::InvalidInput(
                "Informe o nome da empresa.".to_string(),
            ));
        }
        Ok(name.to_string())
    }
}

/// Partial update applied by an analyst to a company record.
///
/// `None` fields are left untouched; `saida_credito` uses a double Option so
/// the caller can distinguish "leave as is" from "clear the date".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situacao: Option<Situacao>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limite: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comentario_interno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saida_credito: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist: Option<Checklist>,
}

impl CompanyUpdate {
    /// Apply this update to a company record, overwriting in place.
    pub fn apply(&self, company: &mut Company) {
        if let Some(situacao) = self.situacao {
            company.situacao = situacao;
        }
        if let Some(limite) = self.limite {
            company.limite = limite;
        }
        if let Some(comentario) = &self.comentario_interno {
            company.comentario_interno = comentario.clone();
        }
        if let Some(saida) = self.saida_credito {
            company.saida_credito = saida;
        }
        if let Some(checklist) = self.checklist {
            company.checklist = checklist;
        }
    }
}

/// Parse an optional YYYY-MM-DD date field from user input.
///
/// Empty input clears the date; malformed input is rejected (the operation
/// aborts with a user-facing message, it does not default).
pub fn parse_optional_date(raw: &str) -> Result<Option<NaiveDate>, CreditoError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| CreditoError::InvalidDate(trimmed.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).expect("valid date")
    }

    #[test]
    fn register_starts_em_analise_at_cadastro() {
        let c = Company::register("ACME Ltda", "Gabriel", entry_date());
        assert_eq!(c.situacao, Situacao::EmAnalise);
        assert_eq!(c.etapa, WorkflowStage::Cadastro);
        assert_eq!(c.limite, Money(0));
        assert!(c.ultima_movimentacao.is_none());
    }

    #[test]
    fn validate_name_rejects_blank() {
        assert!(Company::validate_name("   ").is_err());
        assert_eq!(Company::validate_name(" ACME ").expect("name"), "ACME");
    }

    #[test]
    fn update_applies_only_set_fields() {
        let mut c = Company::register("ACME", "Gabriel", entry_date());
        let update = CompanyUpdate {
            situacao: Some(Situacao::Aprovada),
            limite: Some(Money(50_000_00)),
            ..CompanyUpdate::default()
        };
        update.apply(&mut c);
        assert_eq!(c.situacao, Situacao::Aprovada);
        assert_eq!(c.limite, Money(50_000_00));
        assert_eq!(c.agente, "Gabriel");
        assert!(c.comentario_interno.is_empty());
    }

    #[test]
    fn update_can_clear_release_date() {
        let mut c = Company::register("ACME", "Gabriel", entry_date());
        c.saida_credito = Some(entry_date());
        let update = CompanyUpdate {
            saida_credito: Some(None),
            ..CompanyUpdate::default()
        };
        update.apply(&mut c);
        assert!(c.saida_credito.is_none());
    }

    #[test]
    fn parse_optional_date_variants() {
        assert_eq!(parse_optional_date("").expect("empty"), None);
        assert_eq!(
            parse_optional_date(" 2026-03-10 ").expect("date"),
            Some(entry_date())
        );
        assert!(parse_optional_date("10/03/2026").is_err());
        assert!(parse_optional_date("2026-13-40").is_err());
    }
}
