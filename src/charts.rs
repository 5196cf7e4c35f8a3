//! Chart series computed from the raw records.
//!
//! Nothing here draws; the dashboard page turns these into bars.

use crate::aggregate::parse_number;
use crate::error::AggregateError;
use crate::types::RecordTable;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Counts per (area, category), every row listing every category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Crosstab {
    pub categories: Vec<String>,
    pub rows: BTreeMap<String, Vec<u64>>,
}

/// Category frequencies, most frequent first, ties by name.
pub fn value_counts(table: &RecordTable, column: &str) -> Result<Vec<CategoryCount>, AggregateError> {
    let idx = table.column(column)?;
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for value in table.values(idx).filter(|v| !v.is_empty()) {
        *counts.entry(value).or_default() += 1;
    }

    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect();
    // stable sort keeps name order among equal counts
    out.sort_by(|a, b| b.count.cmp(&a.count));
    Ok(out)
}

/// Equal-width bins from min to max of the numeric values. The last bin
/// is closed so the maximum is counted.
pub fn histogram(table: &RecordTable, column: &str, bins: usize) -> Result<Vec<HistogramBin>, AggregateError> {
    let idx = table.column(column)?;
    let values: Vec<f64> = table.values(idx).filter_map(parse_number).collect();
    if values.is_empty() || bins == 0 {
        return Ok(Vec::new());
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    // numpy widens a zero range by half a unit on each side
    let (lo, hi) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0u64; bins];
    for v in values {
        let slot = (((v - lo) / width) as usize).min(bins - 1);
        counts[slot] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: lo + width * i as f64,
            end: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect())
}

pub fn crosstab(table: &RecordTable, row_column: &str, category_column: &str) -> Result<Crosstab, AggregateError> {
    let row_idx = table.column(row_column)?;
    let cat_idx = table.column(category_column)?;

    let pairs: Vec<(&str, &str)> = table
        .rows
        .iter()
        .map(|r| (r.get(row_idx).unwrap_or("").trim(), r.get(cat_idx).unwrap_or("").trim()))
        .filter(|(row, cat)| !row.is_empty() && !cat.is_empty())
        .collect();

    let categories: Vec<String> = pairs
        .iter()
        .map(|&(_, cat)| cat)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect();
    let position: BTreeMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut rows: BTreeMap<String, Vec<u64>> = BTreeMap::new();
    for (row, cat) in &pairs {
        let counts = rows
            .entry(row.to_string())
            .or_insert_with(|| vec![0; categories.len()]);
        counts[position[cat]] += 1;
    }

    Ok(Crosstab { categories, rows })
}
