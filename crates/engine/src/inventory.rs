//! Monthly inventory matrix.
//!
//! For every item of a branch the matrix carries the previous month's closing
//! quantity, the net change of each local calendar day, and the running
//! total after each day.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Quantity;

/// Where daily deltas are read from. Completions maintain the materialized
/// cells in both modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryRefresh {
    /// Materialized daily changes.
    #[default]
    Eager,
    /// Recomputed from completed transactions on every read.
    Lazy,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInventory {
    pub item_id: i64,
    pub previous_month_quantity: Quantity,
    /// Index 0 is day 1.
    pub daily_deltas: Vec<Quantity>,
    pub running_series: Vec<Quantity>,
    pub running_total: Quantity,
}

impl ItemInventory {
    fn new(item_id: i64, days: usize) -> Self {
        Self {
            item_id,
            previous_month_quantity: Quantity::ZERO,
            daily_deltas: vec![Quantity::ZERO; days],
            running_series: Vec::new(),
            running_total: Quantity::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMatrix {
    pub branch_id: i64,
    pub year: i32,
    pub month: u32,
    pub days_in_month: u32,
    pub items: BTreeMap<i64, ItemInventory>,
}

/// Collects snapshot and per-day inputs, then derives running totals.
#[derive(Debug)]
pub(crate) struct MatrixBuilder {
    matrix: InventoryMatrix,
}

impl MatrixBuilder {
    pub(crate) fn new(branch_id: i64, year: i32, month: u32, days_in_month: u32) -> Self {
        Self {
            matrix: InventoryMatrix {
                branch_id,
                year,
                month,
                days_in_month,
                items: BTreeMap::new(),
            },
        }
    }

    fn entry(&mut self, item_id: i64) -> &mut ItemInventory {
        let days = self.matrix.days_in_month as usize;
        self.matrix
            .items
            .entry(item_id)
            .or_insert_with(|| ItemInventory::new(item_id, days))
    }

    pub(crate) fn previous(&mut self, item_id: i64, quantity: Quantity) {
        self.entry(item_id).previous_month_quantity = quantity;
    }

    /// Adds `change` on `day` (1-based). Days outside the month are ignored.
    pub(crate) fn change(&mut self, item_id: i64, day: u32, change: Quantity) {
        if day == 0 || day > self.matrix.days_in_month {
            return;
        }
        let slot = (day - 1) as usize;
        self.entry(item_id).daily_deltas[slot] += change;
    }

    pub(crate) fn finish(mut self) -> InventoryMatrix {
        for item in self.matrix.items.values_mut() {
            let mut running = item.previous_month_quantity;
            item.running_series = item
                .daily_deltas
                .iter()
                .map(|delta| {
                    running += *delta;
                    running
                })
                .collect();
            item.running_total = running;
        }
        self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_series_starts_from_carryover() {
        let mut builder = MatrixBuilder::new(1, 2024, 4, 30);
        builder.previous(7, Quantity::units(100));
        builder.change(7, 1, Quantity::units(20));
        builder.change(7, 3, -Quantity::units(5));
        let matrix = builder.finish();

        let item = &matrix.items[&7];
        assert_eq!(item.daily_deltas.len(), 30);
        assert_eq!(item.running_series[0], Quantity::units(120));
        assert_eq!(item.running_series[1], Quantity::units(120));
        assert_eq!(item.running_series[2], Quantity::units(115));
        assert_eq!(item.running_total, Quantity::units(115));
    }

    #[test]
    fn snapshot_only_item_is_flat() {
        let mut builder = MatrixBuilder::new(1, 2024, 2, 29);
        builder.previous(3, Quantity::units(4));
        let matrix = builder.finish();
        let item = &matrix.items[&3];
        assert!(item.running_series.iter().all(|q| *q == Quantity::units(4)));
        assert_eq!(item.running_total, Quantity::units(4));
    }

    #[test]
    fn refresh_mode_uses_lowercase_names() {
        let mode: InventoryRefresh = serde_json::from_str("\"lazy\"").unwrap();
        assert_eq!(mode, InventoryRefresh::Lazy);
        assert_eq!(InventoryRefresh::default(), InventoryRefresh::Eager);
    }
}
