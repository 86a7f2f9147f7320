//! # credito-core
//!
//! The deterministic domain engine of the credit-analysis desk - THE LOGIC.
//!
//! This crate implements everything the desk computes: company records and
//! their lifecycle, pendência (required-document) tracking, the workflow
//! stage list with its deadline-progress evaluator, enquadramento
//! concentration checks, the PDD pivot, and the storage backends.
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Is the ONLY place where desk state lives (in-memory or redb)
//! - Uses integer arithmetic exclusively (centavos, basis points, percent)
//! - Takes time as an explicit argument; nothing here reads the clock
//! - Has NO async, NO network dependencies (pure Rust)

// =============================================================================
// MODULES
// =============================================================================

pub mod company;
pub mod desk;
pub mod enquadramento;
pub mod pdd;
pub mod pendencia;
pub mod storage;
pub mod store;
pub mod types;
pub mod workflow;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Checklist, CreditoError, DocStatus, Money, Situacao};

// =============================================================================
// RE-EXPORTS: Desk Engine
// =============================================================================

pub use company::{Company, CompanyUpdate, parse_optional_date};
pub use desk::{Desk, DeskKpis, StageReport, StorageBackend};
pub use pendencia::{DEFAULT_DOCUMENTS, DocumentDirectory, PendingDoc};
pub use storage::RedbStore;
pub use store::{DeskStore, MemoryStore};
pub use workflow::{
    DeadlineStatus, STAGES, Severity, StagePosition, StageProgress, TransitionEntry,
    WorkflowStage, evaluate_progress, progress::parse_deadline_days,
};

// =============================================================================
// RE-EXPORTS: Reports
// =============================================================================

pub use enquadramento::{
    DEFAULT_REASSIGNED_CEDENTES, EnquadramentoReport, FundLimits, LimitCheck, PartyShare,
    Position, build_report,
};
pub use pdd::{PddCell, PddEntry, PddGroupRow, PddPivot, PddRow, build_pivot};
