//! # Property-Based Tests
//!
//! Verification of determinism and correctness invariants across the
//! evaluator, money parsing, seeding and the PDD pivot.

use chrono::{DateTime, Duration, Utc};
use credito_core::{
    DeadlineStatus, DocumentDirectory, Money, PddEntry, Severity, build_pivot, evaluate_progress,
};
use proptest::collection::vec;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-08-24T12:00:00Z")
        .expect("valid rfc3339")
        .with_timezone(&Utc)
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// The evaluator is a pure function of its arguments.
    #[test]
    fn progress_deterministic(deadline in 0u32..400, elapsed in 0i64..800) {
        let now = fixed_now();
        let last = Some(now - Duration::days(elapsed));
        let a = evaluate_progress(deadline, last, now);
        let b = evaluate_progress(deadline, last, now);
        prop_assert_eq!(a, b);
    }

    /// Percent is always in 0..=100 and 100 is forced exactly when late.
    #[test]
    fn progress_percent_bounded(deadline in 1u32..400, elapsed in 0i64..800) {
        let now = fixed_now();
        let result = evaluate_progress(deadline, Some(now - Duration::days(elapsed)), now);

        prop_assert!(result.percent <= 100);
        if result.status == DeadlineStatus::Late {
            prop_assert_eq!(result.percent, 100);
            prop_assert_eq!(result.severity, Severity::Critical);
            prop_assert!(result.days_remaining.expect("late has remaining") < 0);
        } else {
            prop_assert!(result.days_remaining.expect("on time has remaining") >= 0);
        }
    }

    /// Severity never decreases as elapsed days grow.
    #[test]
    fn progress_severity_monotonic(deadline in 1u32..60, elapsed in 0i64..120) {
        let now = fixed_now();
        let earlier = evaluate_progress(deadline, Some(now - Duration::days(elapsed)), now);
        let later = evaluate_progress(deadline, Some(now - Duration::days(elapsed + 1)), now);
        prop_assert!(later.severity >= earlier.severity);
    }

    /// Display and parse of money agree for non-negative amounts.
    #[test]
    fn money_display_parse_roundtrip(centavos in 0i64..10_000_000_000) {
        let money = Money(centavos);
        prop_assert_eq!(Money::parse_br(&money.to_string()), money);
    }

    /// The defensive parser never panics, whatever the input.
    #[test]
    fn money_parse_total(input in ".{0,40}") {
        let _ = Money::parse_br(&input);
    }

    /// Seeding over any document set converges: after applying the missing
    /// list once, nothing is missing.
    #[test]
    fn seeding_converges(names in vec("[a-zA-Z ]{1,20}", 0..20)) {
        let dir = DocumentDirectory::from_names(names);
        let mut existing: BTreeSet<String> = BTreeSet::new();
        for doc in dir.missing_for(&existing) {
            existing.insert(doc.to_string());
        }
        prop_assert!(dir.missing_for(&existing).is_empty());
        prop_assert_eq!(existing.len(), dir.len());
    }

    /// Pivot totals equal the sum of all entry values per date, and every
    /// row spans the full date axis.
    #[test]
    fn pivot_totals_consistent(
        raw in vec((0u8..4, 0u8..4, 1u32..5, 0i64..100_000), 0..40)
    ) {
        let entries: Vec<PddEntry> = raw
            .iter()
            .map(|&(c, s, d, v)| PddEntry {
                cedente: format!("C{c}"),
                sacado: format!("S{s}"),
                data: chrono::NaiveDate::from_ymd_opt(2026, 7, d).expect("valid date"),
                valor: Money(v),
            })
            .collect();
        let pivot = build_pivot(&entries);

        for row in &pivot.linhas {
            prop_assert_eq!(row.celulas.len(), pivot.datas.len());
        }
        for (i, data) in pivot.datas.iter().enumerate() {
            let expected: i64 = entries
                .iter()
                .filter(|e| e.data == *data)
                .map(|e| e.valor.centavos())
                .sum();
            prop_assert_eq!(pivot.totais[i], Money(expected));
        }
    }
}
