//! # PDD Pivot
//!
//! Provision-for-doubtful-debts (PDD) pivot: rows keyed by
//! (cedente, sacado), one column per observation date in ascending order,
//! missing cells filled with zero. Each cell after the first column carries
//! a `changed` flag against the previous date, and cedente group rows
//! compare summed children rather than their own cells. A totals row sums
//! every column across the book.
//!
//! All ordering comes from `BTreeMap`, so identical input always yields an
//! identical pivot.

use crate::types::Money;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One provision observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PddEntry {
    pub cedente: String,
    pub sacado: String,
    pub data: NaiveDate,
    /// Expected provision in centavos.
    pub valor: Money,
}

/// One pivot cell: the provisioned value on a date, flagged when it moved
/// against the previous date column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PddCell {
    pub valor: Money,
    /// Differs from the previous date column. Always false in the first
    /// column.
    pub changed: bool,
}

/// A leaf pivot row for one (cedente, sacado) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PddRow {
    pub cedente: String,
    pub sacado: String,
    /// One cell per date column, aligned with `PddPivot::datas`.
    pub celulas: Vec<PddCell>,
}

/// A cedente group row: per-date sums over the cedente's sacado rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PddGroupRow {
    pub cedente: String,
    pub celulas: Vec<PddCell>,
}

/// The assembled pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PddPivot {
    /// Distinct observation dates, ascending. Column axis for every row.
    pub datas: Vec<NaiveDate>,
    /// Leaf rows, ordered by (cedente, sacado).
    pub linhas: Vec<PddRow>,
    /// One group row per cedente, ordered by cedente.
    pub grupos: Vec<PddGroupRow>,
    /// Column totals over the whole book.
    pub totais: Vec<Money>,
}

impl PddPivot {
    /// Whether the pivot has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.linhas.is_empty()
    }
}

fn flag_cells(values: &[Money]) -> Vec<PddCell> {
    values
        .iter()
        .enumerate()
        .map(|(i, &valor)| PddCell {
            valor,
            changed: i > 0 && values[i - 1] != valor,
        })
        .collect()
}

/// Build the pivot from raw entries.
///
/// Entries for the same (cedente, sacado, date) accumulate. An empty input
/// yields an empty pivot.
#[must_use]
pub fn build_pivot(entries: &[PddEntry]) -> PddPivot {
    let mut datas: BTreeSet<NaiveDate> = BTreeSet::new();
    let mut valores: BTreeMap<(String, String), BTreeMap<NaiveDate, Money>> = BTreeMap::new();
    for entry in entries {
        datas.insert(entry.data);
        let per_date = valores
            .entry((entry.cedente.clone(), entry.sacado.clone()))
            .or_default();
        let cell = per_date.entry(entry.data).or_default();
        *cell = cell.add(entry.valor);
    }
    let datas: Vec<NaiveDate> = datas.into_iter().collect();

    let mut linhas = Vec::with_capacity(valores.len());
    let mut group_sums: BTreeMap<String, Vec<Money>> = BTreeMap::new();
    let mut totais = vec![Money::default(); datas.len()];

    for ((cedente, sacado), per_date) in valores {
        // Zero-fill against the full date axis.
        let row_values: Vec<Money> = datas
            .iter()
            .map(|d| per_date.get(d).copied().unwrap_or_default())
            .collect();

        let sums = group_sums
            .entry(cedente.clone())
            .or_insert_with(|| vec![Money::default(); datas.len()]);
        for (i, v) in row_values.iter().enumerate() {
            sums[i] = sums[i].add(*v);
            totais[i] = totais[i].add(*v);
        }

        linhas.push(PddRow {
            cedente,
            sacado,
            celulas: flag_cells(&row_values),
        });
    }

    // Group rows flag against the summed children, not any single leaf.
    let grupos = group_sums
        .into_iter()
        .map(|(cedente, sums)| PddGroupRow {
            cedente,
            celulas: flag_cells(&sums),
        })
        .collect();

    PddPivot {
        datas,
        linhas,
        grupos,
        totais,
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, d).expect("valid date")
    }

    fn entry(cedente: &str, sacado: &str, d: u32, valor: i64) -> PddEntry {
        PddEntry {
            cedente: cedente.to_string(),
            sacado: sacado.to_string(),
            data: date(d),
            valor: Money(valor),
        }
    }

    #[test]
    fn empty_input_yields_empty_pivot() {
        let pivot = build_pivot(&[]);
        assert!(pivot.is_empty());
        assert!(pivot.datas.is_empty());
        assert!(pivot.totais.is_empty());
    }

    #[test]
    fn columns_sorted_and_zero_filled() {
        let entries = vec![
            entry("Alfa", "S1", 3, 100),
            entry("Alfa", "S1", 1, 50),
            entry("Beta", "S2", 2, 70),
        ];
        let pivot = build_pivot(&entries);
        assert_eq!(pivot.datas, vec![date(1), date(2), date(3)]);

        let alfa = &pivot.linhas[0];
        assert_eq!(alfa.cedente, "Alfa");
        let values: Vec<Money> = alfa.celulas.iter().map(|c| c.valor).collect();
        // No observation on day 2 for Alfa/S1.
        assert_eq!(values, vec![Money(50), Money(0), Money(100)]);
    }

    #[test]
    fn same_key_same_date_accumulates() {
        let entries = vec![entry("Alfa", "S1", 1, 30), entry("Alfa", "S1", 1, 20)];
        let pivot = build_pivot(&entries);
        assert_eq!(pivot.linhas[0].celulas[0].valor, Money(50));
    }

    #[test]
    fn changed_flags_compare_previous_column() {
        let entries = vec![
            entry("Alfa", "S1", 1, 100),
            entry("Alfa", "S1", 2, 100),
            entry("Alfa", "S1", 3, 120),
        ];
        let pivot = build_pivot(&entries);
        let flags: Vec<bool> = pivot.linhas[0].celulas.iter().map(|c| c.changed).collect();
        // First column never flags; day 2 equal; day 3 moved.
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn group_rows_flag_on_summed_children() {
        // Each leaf changes, but the cedente total is stable between the
        // two dates (one goes up, the other down by the same amount).
        let entries = vec![
            entry("Alfa", "S1", 1, 100),
            entry("Alfa", "S2", 1, 200),
            entry("Alfa", "S1", 2, 150),
            entry("Alfa", "S2", 2, 150),
        ];
        let pivot = build_pivot(&entries);

        assert!(pivot.linhas.iter().all(|l| l.celulas[1].changed));
        let alfa_group = &pivot.grupos[0];
        assert_eq!(alfa_group.celulas[0].valor, Money(300));
        assert_eq!(alfa_group.celulas[1].valor, Money(300));
        assert!(!alfa_group.celulas[1].changed);
    }

    #[test]
    fn totals_sum_every_row_per_column() {
        let entries = vec![
            entry("Alfa", "S1", 1, 100),
            entry("Beta", "S2", 1, 50),
            entry("Beta", "S2", 2, 80),
        ];
        let pivot = build_pivot(&entries);
        assert_eq!(pivot.totais, vec![Money(150), Money(80)]);
    }

    #[test]
    fn rows_ordered_by_cedente_then_sacado() {
        let entries = vec![
            entry("Beta", "S1", 1, 1),
            entry("Alfa", "S2", 1, 1),
            entry("Alfa", "S1", 1, 1),
        ];
        let pivot = build_pivot(&entries);
        let keys: Vec<(&str, &str)> = pivot
            .linhas
            .iter()
            .map(|l| (l.cedente.as_str(), l.sacado.as_str()))
            .collect();
        assert_eq!(keys, vec![("Alfa", "S1"), ("Alfa", "S2"), ("Beta", "S1")]);
    }
}
