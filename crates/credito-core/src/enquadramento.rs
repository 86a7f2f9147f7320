//! # Enquadramento
//!
//! Portfolio concentration-limit compliance checks against fund-level caps.
//!
//! Given the fund's receivable positions and its equity (PL), computes each
//! cedente's and sacado's share of PL and compares the largest party and the
//! top-N sum against the fund's caps. Shares are integer basis points
//! (1% = 100 bps); no floats.
//!
//! Positions originated through bank-sponsored cedentes (the reassignment
//! list) count against the sacado instead, since the named cedente is only
//! a conduit.

use crate::types::{CreditoError, Money};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Cedentes that are conduits: their positions are reattributed to the
/// sacado before aggregation.
pub const DEFAULT_REASSIGNED_CEDENTES: &[&str] = &[
    "UY3 SOCIEDADE DE CREDITO DIRETO S/ A",
    "MONEY PLUS SOCIEDADE DE CREDITO AO MICROEMPREENDED",
    "MONEY PLUS SOCIEDADE DE CREDITO AO MICRO",
    "BMP MONEY PLUS SOCIEDADE DE CRÉDITO DIRETO SA",
];

// =============================================================================
// INPUT TYPES
// =============================================================================

/// A receivable position in the fund's stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub cedente: String,
    pub cnpj_cedente: String,
    pub sacado: String,
    pub cnpj_sacado: String,
    /// Nominal value in centavos.
    pub valor: Money,
}

/// Concentration caps for one fund, in basis points of PL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundLimits {
    pub maior_cedente_bps: u32,
    pub top_cedentes_bps: u32,
    pub top_cedentes_n: usize,
    pub maior_sacado_bps: u32,
    pub top_sacados_bps: u32,
    pub top_sacados_n: usize,
}

impl FundLimits {
    /// FIDC Apuama caps: 10% / 40% top-5 / 10% / 35% top-10.
    pub const APUAMA: FundLimits = FundLimits {
        maior_cedente_bps: 1000,
        top_cedentes_bps: 4000,
        top_cedentes_n: 5,
        maior_sacado_bps: 1000,
        top_sacados_bps: 3500,
        top_sacados_n: 10,
    };

    /// FIDC Bristol caps: 7% / 40% top-5 / 10% / 25% top-5.
    pub const BRISTOL: FundLimits = FundLimits {
        maior_cedente_bps: 700,
        top_cedentes_bps: 4000,
        top_cedentes_n: 5,
        maior_sacado_bps: 1000,
        top_sacados_bps: 2500,
        top_sacados_n: 5,
    };
}

// =============================================================================
// OUTPUT TYPES
// =============================================================================

/// One party's aggregated exposure and share of PL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyShare {
    pub nome: String,
    pub documento: String,
    pub valor: Money,
    /// Share of PL in basis points.
    pub share_bps: u64,
}

/// One concentration check against a cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitCheck {
    /// The party (or party set) being checked, for display.
    pub descricao: String,
    /// Observed share in basis points.
    pub share_bps: u64,
    /// Cap in basis points.
    pub limite_bps: u32,
    /// Within the cap.
    pub enquadrado: bool,
}

impl LimitCheck {
    fn new(descricao: String, share_bps: u64, limite_bps: u32) -> Self {
        Self {
            descricao,
            share_bps,
            limite_bps,
            enquadrado: share_bps <= u64::from(limite_bps),
        }
    }
}

/// Full enquadramento report for one fund.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnquadramentoReport {
    /// Fund equity the shares were computed against.
    pub pl: Money,
    /// Cedentes sorted by share descending (name-ascending ties).
    pub cedentes: Vec<PartyShare>,
    /// Sacados sorted by share descending (name-ascending ties).
    pub sacados: Vec<PartyShare>,
    pub maior_cedente: LimitCheck,
    pub top_cedentes: LimitCheck,
    pub maior_sacado: LimitCheck,
    pub top_sacados: LimitCheck,
}

// =============================================================================
// REPORT CONSTRUCTION
// =============================================================================

/// Share of `valor` over `pl` in basis points, computed in 128-bit to avoid
/// overflow on large books.
fn share_bps(valor: Money, pl: Money) -> u64 {
    let num = i128::from(valor.centavos().max(0)).saturating_mul(10_000);
    let den = i128::from(pl.centavos());
    (num / den).max(0) as u64
}

/// Aggregate positions by party and return shares sorted descending.
fn aggregate<'a>(
    parties: impl Iterator<Item = (&'a str, &'a str, Money)>,
    pl: Money,
) -> Vec<PartyShare> {
    let mut totals: BTreeMap<(String, String), Money> = BTreeMap::new();
    for (nome, documento, valor) in parties {
        let entry = totals
            .entry((nome.to_string(), documento.to_string()))
            .or_default();
        *entry = entry.add(valor);
    }

    let mut shares: Vec<PartyShare> = totals
        .into_iter()
        .map(|((nome, documento), valor)| PartyShare {
            share_bps: share_bps(valor, pl),
            nome,
            documento,
            valor,
        })
        .collect();
    // Descending by value; BTreeMap iteration already fixed name order for ties.
    shares.sort_by(|a, b| b.valor.cmp(&a.valor).then_with(|| a.nome.cmp(&b.nome)));
    shares
}

fn top_sum_bps(shares: &[PartyShare], n: usize) -> u64 {
    shares
        .iter()
        .take(n)
        .fold(0u64, |acc, s| acc.saturating_add(s.share_bps))
}

/// Build the enquadramento report for one fund.
///
/// `reassigned_cedentes` holds conduit-cedente names whose positions are
/// reattributed to the sacado before aggregation.
///
/// # Errors
///
/// Returns `CreditoError::InvalidInput` when `pl` is zero or negative —
/// shares of a non-positive equity are meaningless.
pub fn build_report(
    positions: &[Position],
    pl: Money,
    limits: &FundLimits,
    reassigned_cedentes: &BTreeSet<String>,
) -> Result<EnquadramentoReport, CreditoError> {
    if pl.centavos() <= 0 {
        return Err(CreditoError::InvalidInput(
            "PL do fundo deve ser positivo".to_string(),
        ));
    }

    // Conduit reassignment: the sacado takes the cedente's seat.
    let reassigned: Vec<Position> = positions
        .iter()
        .map(|p| {
            if reassigned_cedentes.contains(&p.cedente) {
                Position {
                    cedente: p.sacado.clone(),
                    cnpj_cedente: p.cnpj_sacado.clone(),
                    ..p.clone()
                }
            } else {
                p.clone()
            }
        })
        .collect();

    let cedentes = aggregate(
        reassigned
            .iter()
            .map(|p| (p.cedente.as_str(), p.cnpj_cedente.as_str(), p.valor)),
        pl,
    );
    let sacados = aggregate(
        reassigned
            .iter()
            .map(|p| (p.sacado.as_str(), p.cnpj_sacado.as_str(), p.valor)),
        pl,
    );

    let maior_cedente = LimitCheck::new(
        cedentes.first().map(|s| s.nome.clone()).unwrap_or_default(),
        cedentes.first().map(|s| s.share_bps).unwrap_or(0),
        limits.maior_cedente_bps,
    );
    let top_cedentes = LimitCheck::new(
        format!("Top {} cedentes", limits.top_cedentes_n),
        top_sum_bps(&cedentes, limits.top_cedentes_n),
        limits.top_cedentes_bps,
    );
    let maior_sacado = LimitCheck::new(
        sacados.first().map(|s| s.nome.clone()).unwrap_or_default(),
        sacados.first().map(|s| s.share_bps).unwrap_or(0),
        limits.maior_sacado_bps,
    );
    let top_sacados = LimitCheck::new(
        format!("Top {} sacados", limits.top_sacados_n),
        top_sum_bps(&sacados, limits.top_sacados_n),
        limits.top_sacados_bps,
    );

    Ok(EnquadramentoReport {
        pl,
        cedentes,
        sacados,
        maior_cedente,
        top_cedentes,
        maior_sacado,
        top_sacados,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(cedente: &str, sacado: &str, valor: i64) -> Position {
        Position {
            cedente: cedente.to_string(),
            cnpj_cedente: format!("{cedente}-doc"),
            sacado: sacado.to_string(),
            cnpj_sacado: format!("{sacado}-doc"),
            valor: Money(valor),
        }
    }

    fn no_reassign() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[test]
    fn zero_pl_is_rejected() {
        let err = build_report(&[], Money(0), &FundLimits::APUAMA, &no_reassign());
        assert!(err.is_err());
    }

    #[test]
    fn empty_positions_build_empty_report() {
        let report =
            build_report(&[], Money(1_000_000), &FundLimits::APUAMA, &no_reassign()).expect("report");
        assert!(report.cedentes.is_empty());
        assert!(report.sacados.is_empty());
        assert!(report.maior_cedente.enquadrado);
        assert_eq!(report.maior_cedente.share_bps, 0);
    }

    #[test]
    fn shares_are_basis_points_of_pl() {
        // PL = R$ 1.000,00; one cedente holds R$ 100,00 = 10% = 1000 bps.
        let positions = vec![pos("Alfa", "Mercado X", 10_000)];
        let report = build_report(
            &positions,
            Money(100_000),
            &FundLimits::APUAMA,
            &no_reassign(),
        )
        .expect("report");
        assert_eq!(report.cedentes[0].share_bps, 1000);
        assert_eq!(report.maior_cedente.descricao, "Alfa");
        // Apuama caps the largest cedente at exactly 10% — at the cap is in.
        assert!(report.maior_cedente.enquadrado);
    }

    #[test]
    fn bristol_tighter_cedente_cap_trips_first() {
        let positions = vec![pos("Alfa", "Mercado X", 8_000)]; // 8% of PL
        let pl = Money(100_000);
        let apuama =
            build_report(&positions, pl, &FundLimits::APUAMA, &no_reassign()).expect("report");
        let bristol =
            build_report(&positions, pl, &FundLimits::BRISTOL, &no_reassign()).expect("report");
        assert!(apuama.maior_cedente.enquadrado); // 8% <= 10%
        assert!(!bristol.maior_cedente.enquadrado); // 8% > 7%
    }

    #[test]
    fn aggregation_merges_positions_per_party() {
        let positions = vec![
            pos("Alfa", "Mercado X", 5_000),
            pos("Alfa", "Mercado Y", 5_000),
            pos("Beta", "Mercado X", 3_000),
        ];
        let report = build_report(
            &positions,
            Money(100_000),
            &FundLimits::APUAMA,
            &no_reassign(),
        )
        .expect("report");
        assert_eq!(report.cedentes.len(), 2);
        assert_eq!(report.cedentes[0].nome, "Alfa");
        assert_eq!(report.cedentes[0].valor, Money(10_000));
        // Sacado side: Mercado X accumulated across both cedentes.
        assert_eq!(report.sacados[0].nome, "Mercado X");
        assert_eq!(report.sacados[0].valor, Money(8_000));
    }

    #[test]
    fn conduit_cedentes_reassign_to_sacado() {
        let conduit = DEFAULT_REASSIGNED_CEDENTES[0];
        let positions = vec![pos(conduit, "Padaria Real", 10_000)];
        let reassign: BTreeSet<String> = DEFAULT_REASSIGNED_CEDENTES
            .iter()
            .map(|s| (*s).to_string())
            .collect();
        let report =
            build_report(&positions, Money(100_000), &FundLimits::APUAMA, &reassign)
                .expect("report");
        assert_eq!(report.cedentes[0].nome, "Padaria Real");
        assert!(report.cedentes.iter().all(|c| c.nome != conduit));
    }

    #[test]
    fn top_n_sums_and_deterministic_tie_order() {
        let positions = vec![
            pos("Alfa", "S1", 2_000),
            pos("Beta", "S2", 2_000),
            pos("Gama", "S3", 1_000),
        ];
        let report = build_report(
            &positions,
            Money(100_000),
            &FundLimits::BRISTOL,
            &no_reassign(),
        )
        .expect("report");
        // Equal values tie-break by name ascending.
        assert_eq!(report.cedentes[0].nome, "Alfa");
        assert_eq!(report.cedentes[1].nome, "Beta");
        // Top-5 sum covers all three: 2% + 2% + 1% = 500 bps.
        assert_eq!(report.top_cedentes.share_bps, 500);
        assert!(report.top_cedentes.enquadrado);
    }
}
