//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Responses carry a `success` flag and
//! an optional `error` message; request conversion helpers validate at the
//! boundary and surface `CreditoError` messages to the caller.
//!
//! Money fields arrive as free text ("R$ 1.234,56", "1500") and are parsed
//! defensively; dates arrive as strict `YYYY-MM-DD` and are rejected when
//! malformed.

use credito_core::{
    Checklist, Company, CompanyUpdate, CreditoError, DeskKpis, DocStatus, EnquadramentoReport,
    Money, PddEntry, PddPivot, PendingDoc, Position, Situacao, StageReport, TransitionEntry,
    parse_deadline_days, parse_optional_date,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// AUTH
// =============================================================================

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response carrying the bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: Option<String>,
    pub role: Option<String>,
    pub agente: Option<String>,
    pub error: Option<String>,
}

impl LoginResponse {
    pub fn success(token: String, role: &str, agente: Option<String>) -> Self {
        Self {
            success: true,
            token: Some(token),
            role: Some(role.to_string()),
            agente,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            token: None,
            role: None,
            agente: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// GENERIC OPERATION RESPONSE
// =============================================================================

/// Response for operations that return no payload (logout, delete, batch
/// pendência updates).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpResponse {
    pub success: bool,
    /// Rows affected, where the operation counts them.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub changed: Option<usize>,
    pub error: Option<String>,
}

impl OpResponse {
    pub fn success() -> Self {
        Self {
            success: true,
            changed: None,
            error: None,
        }
    }

    pub fn changed(changed: usize) -> Self {
        Self {
            success: true,
            changed: Some(changed),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            changed: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// COMPANIES
// =============================================================================

/// Company registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub empresa: String,
    /// Sales agent. Ignored for comercial callers, whose own agent name is
    /// always used.
    #[serde(default)]
    pub agente: Option<String>,
    /// Entry date, strict `YYYY-MM-DD`.
    pub entrada: String,
}

/// Partial company update request (analyst only).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub situacao: Option<String>,
    /// Credit limit as free text, parsed defensively.
    #[serde(default)]
    pub limite: Option<String>,
    #[serde(default)]
    pub comentario_interno: Option<String>,
    /// Release date: absent = unchanged, empty string = cleared,
    /// `YYYY-MM-DD` = set.
    #[serde(default)]
    pub saida_credito: Option<String>,
    #[serde(default)]
    pub checklist: Option<Checklist>,
}

impl UpdateRequest {
    /// Convert to a core update, validating the enumerated fields.
    pub fn to_update(&self) -> Result<CompanyUpdate, CreditoError> {
        let situacao = match &self.situacao {
            Some(label) => Some(Situacao::parse(label)?),
            None => None,
        };
        let saida_credito = match &self.saida_credito {
            Some(raw) => Some(parse_optional_date(raw)?),
            None => None,
        };
        let limite = match self.limite.as_deref() {
            Some(raw) => {
                let amount = Money::parse_br(raw);
                if amount.centavos() < 0 {
                    return Err(CreditoError::InvalidInput(format!(
                        "Limite não pode ser negativo: {raw}"
                    )));
                }
                Some(amount)
            }
            None => None,
        };
        Ok(CompanyUpdate {
            situacao,
            limite,
            comentario_interno: self.comentario_interno.clone(),
            saida_credito,
            checklist: self.checklist,
        })
    }
}

/// Single-company response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyResponse {
    pub success: bool,
    pub company: Option<Company>,
    pub error: Option<String>,
}

impl CompanyResponse {
    pub fn success(company: Company) -> Self {
        Self {
            success: true,
            company: Some(company),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            company: None,
            error: Some(msg.into()),
        }
    }
}

/// Company-list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompaniesResponse {
    pub success: bool,
    pub companies: Vec<Company>,
    pub error: Option<String>,
}

impl CompaniesResponse {
    pub fn success(companies: Vec<Company>) -> Self {
        Self {
            success: true,
            companies,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            companies: vec![],
            error: Some(msg.into()),
        }
    }
}

/// KPI response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpisResponse {
    pub success: bool,
    pub kpis: Option<DeskKpis>,
    pub error: Option<String>,
}

impl KpisResponse {
    pub fn success(kpis: DeskKpis) -> Self {
        Self {
            success: true,
            kpis: Some(kpis),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            kpis: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// PENDENCIAS
// =============================================================================

/// Pendência-list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendenciasResponse {
    pub success: bool,
    pub pendencias: Vec<PendingDoc>,
    pub error: Option<String>,
}

impl PendenciasResponse {
    pub fn success(pendencias: Vec<PendingDoc>) -> Self {
        Self {
            success: true,
            pendencias,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            pendencias: vec![],
            error: Some(msg.into()),
        }
    }
}

/// One pendência status change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendenciaStatusJson {
    pub documento: String,
    /// Free-text status, normalized ("recebido", "ok", "entregue", ...).
    pub status: String,
}

/// Batch pendência status request (analyst only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendenciaUpdateRequest {
    pub updates: Vec<PendenciaStatusJson>,
}

impl PendenciaUpdateRequest {
    /// Normalize the free-text statuses into the canonical pairs.
    #[must_use]
    pub fn to_updates(&self) -> Vec<(String, DocStatus)> {
        self.updates
            .iter()
            .map(|u| (u.documento.clone(), DocStatus::normalize(&u.status)))
            .collect()
    }
}

// =============================================================================
// WORKFLOW
// =============================================================================

/// Stage-movement request (analyst only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveStageRequest {
    /// Stage display name ("Análise de Crédito", ...).
    pub etapa: String,
    pub responsavel: String,
    /// Deadline in days as free text; malformed input means no deadline.
    #[serde(default)]
    pub prazo_dias: String,
}

impl MoveStageRequest {
    /// Defensive deadline parse.
    #[must_use]
    pub fn deadline_days(&self) -> u32 {
        parse_deadline_days(&self.prazo_dias)
    }
}

/// Stage-movement response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionResponse {
    pub success: bool,
    pub transition: Option<TransitionEntry>,
    pub error: Option<String>,
}

impl TransitionResponse {
    pub fn success(transition: TransitionEntry) -> Self {
        Self {
            success: true,
            transition: Some(transition),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            transition: None,
            error: Some(msg.into()),
        }
    }
}

/// Deadline-progress response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressResponse {
    pub success: bool,
    pub report: Option<StageReport>,
    pub error: Option<String>,
}

impl ProgressResponse {
    pub fn success(report: StageReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// ENQUADRAMENTO
// =============================================================================

/// One receivable position, money as free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionJson {
    pub cedente: String,
    #[serde(default)]
    pub cnpj_cedente: String,
    pub sacado: String,
    #[serde(default)]
    pub cnpj_sacado: String,
    pub valor: String,
}

impl PositionJson {
    /// Trim the party names and parse the free-text amount.
    #[must_use]
    pub fn to_position(&self) -> Position {
        Position {
            cedente: self.cedente.trim().to_string(),
            cnpj_cedente: self.cnpj_cedente.trim().to_string(),
            sacado: self.sacado.trim().to_string(),
            cnpj_sacado: self.cnpj_sacado.trim().to_string(),
            valor: Money::parse_br(&self.valor),
        }
    }
}

/// Enquadramento request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnquadramentoRequest {
    /// Fund name ("apuama", "bristol", or a config-defined fund).
    pub fundo: String,
    /// Fund equity as free text.
    pub pl: String,
    pub positions: Vec<PositionJson>,
}

impl EnquadramentoRequest {
    /// Parse the positions and equity.
    #[must_use]
    pub fn to_positions(&self) -> (Vec<Position>, Money) {
        let positions = self.positions.iter().map(PositionJson::to_position).collect();
        (positions, Money::parse_br(&self.pl))
    }
}

/// Enquadramento response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnquadramentoResponse {
    pub success: bool,
    pub report: Option<EnquadramentoReport>,
    pub error: Option<String>,
}

impl EnquadramentoResponse {
    pub fn success(report: EnquadramentoReport) -> Self {
        Self {
            success: true,
            report: Some(report),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            report: None,
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// PDD
// =============================================================================

/// One PDD observation, date strict and money free text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PddEntryJson {
    pub cedente: String,
    #[serde(default)]
    pub sacado: String,
    /// Observation date, strict `YYYY-MM-DD`.
    pub data: String,
    pub valor: String,
}

impl PddEntryJson {
    fn to_entry(&self) -> Result<PddEntry, CreditoError> {
        let data = parse_optional_date(&self.data)?
            .ok_or_else(|| CreditoError::InvalidDate(self.data.clone()))?;
        Ok(PddEntry {
            cedente: self.cedente.trim().to_string(),
            sacado: self.sacado.trim().to_string(),
            data,
            valor: Money::parse_br(&self.valor),
        })
    }
}

/// PDD pivot request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PddRequest {
    pub entries: Vec<PddEntryJson>,
}

impl PddRequest {
    /// Parse all entries, failing on the first malformed date.
    pub fn to_entries(&self) -> Result<Vec<PddEntry>, CreditoError> {
        self.entries.iter().map(PddEntryJson::to_entry).collect()
    }
}

/// PDD pivot response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PddResponse {
    pub success: bool,
    pub pivot: Option<PddPivot>,
    pub error: Option<String>,
}

impl PddResponse {
    pub fn success(pivot: PddPivot) -> Self {
        Self {
            success: true,
            pivot: Some(pivot),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            pivot: None,
            error: Some(msg.into()),
        }
    }
}
