//! # Application Configuration
//!
//! Desk configuration loaded from a toml file:
//! - `[[users]]` credential table (username, password, role, agente)
//! - `documents` overriding the built-in required-document list
//! - `[funds.<name>]` concentration caps overriding the built-in funds
//!
//! A missing file yields the defaults: no users (the API refuses logins
//! until credentials are configured), the built-in document list, and the
//! Apuama/Bristol caps.

use credito_core::{CreditoError, FundLimits};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A user's role on the desk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Sales agent: registers companies and sees their own portfolio.
    Comercial,
    /// Credit analyst: full read/write over the desk.
    Analista,
}

impl UserRole {
    /// Whether this role can mutate analyst-only surfaces (updates,
    /// pendência statuses, workflow movements, deletions).
    #[must_use]
    pub fn is_analista(&self) -> bool {
        matches!(self, UserRole::Analista)
    }
}

/// One credential row from the config's `[[users]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    /// Sales-agent name this login is scoped to. Required for comercial
    /// users; ignored for analysts.
    #[serde(default)]
    pub agente: Option<String>,
}

/// The full application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Credential table.
    #[serde(default)]
    pub users: Vec<Credential>,

    /// Required-document list override. Empty means the built-in list.
    #[serde(default)]
    pub documents: Vec<String>,

    /// Fund concentration caps by fund name (lowercase).
    #[serde(default)]
    pub funds: BTreeMap<String, FundLimits>,
}

impl AppConfig {
    /// Load configuration from a toml file.
    ///
    /// # Errors
    ///
    /// `IoError` when the file cannot be read, `InvalidInput` when it does
    /// not parse as the expected shape.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CreditoError> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            CreditoError::IoError(format!(
                "Cannot read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let mut config: AppConfig = toml::from_str(&raw)
            .map_err(|e| CreditoError::InvalidInput(format!("Invalid config: {e}")))?;
        config.fill_default_funds();
        Ok(config)
    }

    /// Load from a path if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, CreditoError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let mut config = Self::default();
                config.fill_default_funds();
                Ok(config)
            }
        }
    }

    /// Caps for a fund by name (case-insensitive).
    #[must_use]
    pub fn fund_limits(&self, name: &str) -> Option<&FundLimits> {
        self.funds.get(&name.trim().to_lowercase())
    }

    fn fill_default_funds(&mut self) {
        self.funds
            .entry("apuama".to_string())
            .or_insert(FundLimits::APUAMA);
        self.funds
            .entry("bristol".to_string())
            .or_insert(FundLimits::BRISTOL);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let raw = r#"
            documents = ["Contrato Social", "Cartão CNPJ"]

            [[users]]
            username = "gabriel"
            password = "segredo"
            role = "comercial"
            agente = "Gabriel"

            [[users]]
            username = "leonardo"
            password = "outro-segredo"
            role = "analista"

            [funds.apuama]
            maior_cedente_bps = 1200
            top_cedentes_bps = 4000
            top_cedentes_n = 5
            maior_sacado_bps = 1000
            top_sacados_bps = 3500
            top_sacados_n = 10
        "#;
        let mut config: AppConfig = toml::from_str(raw).unwrap();
        config.fill_default_funds();

        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].role, UserRole::Comercial);
        assert_eq!(config.users[0].agente.as_deref(), Some("Gabriel"));
        assert!(config.users[1].role.is_analista());
        assert_eq!(config.documents.len(), 2);

        // Overridden apuama kept, bristol filled from the built-ins.
        assert_eq!(config.fund_limits("APUAMA").unwrap().maior_cedente_bps, 1200);
        assert_eq!(config.fund_limits("bristol"), Some(&FundLimits::BRISTOL));
        assert!(config.fund_limits("desconhecido").is_none());
    }

    #[test]
    fn defaults_have_builtin_funds_and_no_users() {
        let config = AppConfig::load_or_default(None).unwrap();
        assert!(config.users.is_empty());
        assert!(config.documents.is_empty());
        assert_eq!(config.fund_limits("apuama"), Some(&FundLimits::APUAMA));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load("/nonexistent/credito.toml").is_err());
    }
}
