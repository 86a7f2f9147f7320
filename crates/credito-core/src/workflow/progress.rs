//! # Deadline-Progress Evaluator
//!
//! Pure function computing how far along a company is in its current stage,
//! and whether it is late, from the most recent transition's timestamp and
//! the stage's declared deadline.
//!
//! ## Contract
//!
//! | Condition | percent | severity | days_remaining | status |
//! |---|---|---|---|---|
//! | no deadline or no timestamp | 0 | Neutral | — | NoDeadline |
//! | elapsed/deadline < 0.8 | elapsed·100/deadline | Normal | deadline−elapsed | OnTime |
//! | elapsed/deadline ≥ 0.8 | elapsed·100/deadline | Warning | deadline−elapsed | OnTime |
//! | elapsed > deadline | 100 (forced) | Critical | negative | Late |
//!
//! Deterministic, side-effect free, integer arithmetic only. Fractional-day
//! remainders are dropped: a transition 23 hours old counts as zero elapsed
//! days.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Elapsed fraction (percent of the allotted days) at which a stage flips
/// from Normal to Warning severity: 8/10 of the deadline.
const WARNING_NUM: u64 = 8;
const WARNING_DEN: u64 = 10;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Deadline status label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    /// No deadline applies (zero/absent deadline or no transition yet).
    NoDeadline,
    /// Within the allotted days.
    OnTime,
    /// Past the allotted days.
    Late,
}

impl DeadlineStatus {
    /// User-facing label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            DeadlineStatus::NoDeadline => "Sem prazo",
            DeadlineStatus::OnTime => "No prazo",
            DeadlineStatus::Late => "Atrasado",
        }
    }
}

impl std::fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity color class for rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// No deadline to judge against.
    Neutral,
    /// Comfortably within the deadline (green).
    Normal,
    /// 80% or more of the allotted days consumed (yellow).
    Warning,
    /// Past the deadline (red).
    Critical,
}

/// Output of the evaluator for one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    /// Percentage of the allotted days consumed, capped at 100.
    pub percent: u8,
    /// Severity color class.
    pub severity: Severity,
    /// Signed days remaining; `None` when no deadline applies.
    pub days_remaining: Option<i64>,
    /// Status label.
    pub status: DeadlineStatus,
}

impl StageProgress {
    /// The neutral result used when no deadline or no timestamp exists.
    #[must_use]
    pub const fn no_deadline() -> Self {
        Self {
            percent: 0,
            severity: Severity::Neutral,
            days_remaining: None,
            status: DeadlineStatus::NoDeadline,
        }
    }
}

// =============================================================================
// EVALUATOR
// =============================================================================

/// Evaluate deadline progress for a stage.
///
/// `deadline_days == 0` means no deadline. `last_transition_at` in the
/// future counts as zero elapsed days (clock skew between writers is
/// tolerated rather than rejected).
#[must_use]
pub fn evaluate_progress(
    deadline_days: u32,
    last_transition_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StageProgress {
    let Some(last) = last_transition_at else {
        return StageProgress::no_deadline();
    };
    if deadline_days == 0 {
        return StageProgress::no_deadline();
    }

    let days_elapsed = now.signed_duration_since(last).num_days().max(0) as u64;
    let deadline = u64::from(deadline_days);
    let days_remaining = deadline as i64 - days_elapsed as i64;

    if days_remaining < 0 {
        return StageProgress {
            percent: 100,
            severity: Severity::Critical,
            days_remaining: Some(days_remaining),
            status: DeadlineStatus::Late,
        };
    }

    let percent = (days_elapsed.saturating_mul(100) / deadline).min(100) as u8;
    // fraction >= 0.8, tested without floats
    let severity = if days_elapsed.saturating_mul(WARNING_DEN) >= deadline.saturating_mul(WARNING_NUM)
    {
        Severity::Warning
    } else {
        Severity::Normal
    };

    StageProgress {
        percent,
        severity,
        days_remaining: Some(days_remaining),
        status: DeadlineStatus::OnTime,
    }
}

/// Defensive numeric parse for deadline inputs arriving as free text.
///
/// Malformed or negative input falls back to zero, which the evaluator
/// treats as "no deadline".
#[must_use]
pub fn parse_deadline_days(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        // Fixed instant so elapsed-day math is exact in tests.
        DateTime::parse_from_rfc3339("2026-08-24T12:00:00Z")
            .expect("valid rfc3339")
            .with_timezone(&Utc)
    }

    #[test]
    fn zero_deadline_is_no_deadline_regardless_of_timestamp() {
        let result = evaluate_progress(0, Some(now() - Duration::days(30)), now());
        assert_eq!(result, StageProgress::no_deadline());
    }

    #[test]
    fn missing_timestamp_is_no_deadline() {
        let result = evaluate_progress(10, None, now());
        assert_eq!(result, StageProgress::no_deadline());
        assert_eq!(result.percent, 0);
        assert_eq!(result.severity, Severity::Neutral);
    }

    #[test]
    fn halfway_is_green() {
        // deadline 2, transition 1 day ago
        let result = evaluate_progress(2, Some(now() - Duration::days(1)), now());
        assert_eq!(result.percent, 50);
        assert_eq!(result.severity, Severity::Normal);
        assert_eq!(result.days_remaining, Some(1));
        assert_eq!(result.status, DeadlineStatus::OnTime);
    }

    #[test]
    fn elapsed_equals_deadline_is_warning_on_time() {
        let result = evaluate_progress(5, Some(now() - Duration::days(5)), now());
        assert_eq!(result.percent, 100);
        assert_eq!(result.days_remaining, Some(0));
        assert_eq!(result.status, DeadlineStatus::OnTime);
        assert_eq!(result.severity, Severity::Warning);
    }

    #[test]
    fn past_deadline_is_late_red_100() {
        // deadline 2, transition 3 days ago
        let result = evaluate_progress(2, Some(now() - Duration::days(3)), now());
        assert_eq!(result.percent, 100);
        assert_eq!(result.days_remaining, Some(-1));
        assert_eq!(result.status, DeadlineStatus::Late);
        assert_eq!(result.severity, Severity::Critical);
    }

    #[test]
    fn warning_threshold_at_eighty_percent() {
        // 8 of 10 days: exactly at the threshold
        let at = evaluate_progress(10, Some(now() - Duration::days(8)), now());
        assert_eq!(at.severity, Severity::Warning);

        // 7 of 10 days: still green
        let below = evaluate_progress(10, Some(now() - Duration::days(7)), now());
        assert_eq!(below.severity, Severity::Normal);
    }

    #[test]
    fn future_transition_counts_as_zero_elapsed() {
        let result = evaluate_progress(3, Some(now() + Duration::days(2)), now());
        assert_eq!(result.percent, 0);
        assert_eq!(result.days_remaining, Some(3));
        assert_eq!(result.status, DeadlineStatus::OnTime);
    }

    #[test]
    fn partial_days_round_down() {
        let result = evaluate_progress(2, Some(now() - Duration::hours(23)), now());
        assert_eq!(result.percent, 0);
        assert_eq!(result.days_remaining, Some(2));
    }

    #[test]
    fn evaluator_is_pure() {
        let fixed = now();
        let a = evaluate_progress(7, Some(fixed - Duration::days(3)), fixed);
        let b = evaluate_progress(7, Some(fixed - Duration::days(3)), fixed);
        assert_eq!(a, b);
    }

    #[test]
    fn deadline_parse_is_defensive() {
        assert_eq!(parse_deadline_days("5"), 5);
        assert_eq!(parse_deadline_days(" 12 "), 12);
        assert_eq!(parse_deadline_days("-3"), 0);
        assert_eq!(parse_deadline_days("abc"), 0);
        assert_eq!(parse_deadline_days(""), 0);
    }
}
