//! # Workflow
//!
//! The fixed ordered list of workflow stages a company moves through, the
//! append-only transition log, and the deadline-progress evaluator.
//!
//! Stages are compared by list index only. There is no guarded transition
//! table: any stage may be set to any other stage, and the index comparison
//! is used purely to render passed / current / upcoming.

pub mod progress;

use crate::types::CreditoError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use progress::{DeadlineStatus, Severity, StageProgress, evaluate_progress};

// =============================================================================
// WORKFLOW STAGE
// =============================================================================

/// Workflow stages, in desk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WorkflowStage {
    /// Company registered by the sales agent.
    Cadastro,
    /// Waiting for a positioning decision from the client.
    PendenciaPosicionamento,
    /// Under credit analysis.
    AnaliseCredito,
    /// In committee.
    Comite,
    /// Contract formalization.
    Formalizacao,
    /// Done.
    Finalizado,
}

impl Default for WorkflowStage {
    fn default() -> Self {
        Self::Cadastro
    }
}

/// All stages in order, for iteration and rendering.
pub const STAGES: &[WorkflowStage] = &[
    WorkflowStage::Cadastro,
    WorkflowStage::PendenciaPosicionamento,
    WorkflowStage::AnaliseCredito,
    WorkflowStage::Comite,
    WorkflowStage::Formalizacao,
    WorkflowStage::Finalizado,
];

impl WorkflowStage {
    /// Get the stage display name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowStage::Cadastro => "Cadastro",
            WorkflowStage::PendenciaPosicionamento => "Pendência de Posicionamento",
            WorkflowStage::AnaliseCredito => "Análise de Crédito",
            WorkflowStage::Comite => "Comitê",
            WorkflowStage::Formalizacao => "Formalização",
            WorkflowStage::Finalizado => "Finalizado",
        }
    }

    /// Get the position of this stage in the fixed ordered list.
    #[must_use]
    pub fn rank(&self) -> usize {
        match self {
            WorkflowStage::Cadastro => 0,
            WorkflowStage::PendenciaPosicionamento => 1,
            WorkflowStage::AnaliseCredito => 2,
            WorkflowStage::Comite => 3,
            WorkflowStage::Formalizacao => 4,
            WorkflowStage::Finalizado => 5,
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<WorkflowStage> {
        STAGES.get(self.rank() + 1).copied()
    }

    /// Get the previous stage, if any.
    #[must_use]
    pub fn previous(&self) -> Option<WorkflowStage> {
        self.rank().checked_sub(1).and_then(|r| STAGES.get(r)).copied()
    }

    /// Check if this stage is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStage::Finalizado)
    }

    /// Parse a display name back into a stage.
    pub fn parse(name: &str) -> Result<Self, CreditoError> {
        let trimmed = name.trim();
        STAGES
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(trimmed))
            .copied()
            .ok_or_else(|| CreditoError::InvalidStage(trimmed.to_string()))
    }

    /// Where `other` sits relative to this (the current) stage.
    #[must_use]
    pub fn position_of(&self, other: WorkflowStage) -> StagePosition {
        match other.rank().cmp(&self.rank()) {
            std::cmp::Ordering::Less => StagePosition::Passed,
            std::cmp::Ordering::Equal => StagePosition::Current,
            std::cmp::Ordering::Greater => StagePosition::Upcoming,
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative position of a stage against the company's current stage.
///
/// A static index lookup, not a transition system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StagePosition {
    Passed,
    Current,
    Upcoming,
}

// =============================================================================
// TRANSITION LOG ENTRY
// =============================================================================

/// An immutable transition-log fact: one append per workflow movement.
///
/// Never updated or deleted except via full company deletion cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionEntry {
    /// Company that moved.
    pub empresa: String,
    /// Stage the company moved into.
    pub etapa: WorkflowStage,
    /// Responsible party for the new stage.
    pub responsavel: String,
    /// Deadline in days; 0 means no deadline applies.
    pub prazo_dias: u32,
    /// Deadline status computed at append time (snapshot, not ground truth).
    pub status_inicial: DeadlineStatus,
    /// When the transition was recorded.
    pub criado_em: DateTime<Utc>,
}

impl TransitionEntry {
    /// Record a movement into `etapa` at `now`.
    ///
    /// The initial deadline-status snapshot is what the evaluator reports at
    /// zero elapsed days: `NoDeadline` when no deadline applies, `OnTime`
    /// otherwise.
    #[must_use]
    pub fn record(
        empresa: &str,
        etapa: WorkflowStage,
        responsavel: &str,
        prazo_dias: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let status_inicial = evaluate_progress(prazo_dias, Some(now), now).status;
        Self {
            empresa: empresa.to_string(),
            etapa,
            responsavel: responsavel.to_string(),
            prazo_dias,
            status_inicial,
            criado_em: now,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_ordering_follows_rank() {
        assert!(WorkflowStage::Cadastro < WorkflowStage::Finalizado);
        for window in STAGES.windows(2) {
            assert!(window[0].rank() < window[1].rank());
        }
    }

    #[test]
    fn next_previous_chain() {
        assert_eq!(
            WorkflowStage::Cadastro.next(),
            Some(WorkflowStage::PendenciaPosicionamento)
        );
        assert_eq!(WorkflowStage::Finalizado.next(), None);
        assert_eq!(WorkflowStage::Cadastro.previous(), None);
        assert_eq!(
            WorkflowStage::Finalizado.previous(),
            Some(WorkflowStage::Formalizacao)
        );
        assert!(WorkflowStage::Finalizado.is_terminal());
    }

    #[test]
    fn parse_display_names() {
        assert_eq!(
            WorkflowStage::parse("Pendência de Posicionamento").expect("parse"),
            WorkflowStage::PendenciaPosicionamento
        );
        assert_eq!(
            WorkflowStage::parse(" cadastro ").expect("parse"),
            WorkflowStage::Cadastro
        );
        assert!(WorkflowStage::parse("Triagem").is_err());
    }

    #[test]
    fn position_by_index_only() {
        let current = WorkflowStage::AnaliseCredito;
        assert_eq!(
            current.position_of(WorkflowStage::Cadastro),
            StagePosition::Passed
        );
        assert_eq!(
            current.position_of(WorkflowStage::AnaliseCredito),
            StagePosition::Current
        );
        assert_eq!(
            current.position_of(WorkflowStage::Finalizado),
            StagePosition::Upcoming
        );
    }

    #[test]
    fn record_snapshots_initial_status() {
        let now = Utc::now();
        let with_deadline =
            TransitionEntry::record("ACME", WorkflowStage::AnaliseCredito, "Leonardo", 5, now);
        assert_eq!(with_deadline.status_inicial, DeadlineStatus::OnTime);

        let without_deadline =
            TransitionEntry::record("ACME", WorkflowStage::Comite, "Leonardo", 0, now);
        assert_eq!(without_deadline.status_inicial, DeadlineStatus::NoDeadline);
    }
}
