//! Group records by area and reduce each group to summary statistics.

use crate::config::{StatConfig, StatKind};
use crate::error::AggregateError;
use crate::types::{RecordTable, StatValue, SummaryStat, SummaryTable};
use csv::StringRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// A statistic with its columns resolved against the table header.
enum Reducer<'a> {
    CountRows,
    CountNonEmpty(usize),
    Mean(usize),
    Share { idx: usize, equals: &'a str },
}

fn field(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("").trim()
}

impl Reducer<'_> {
    fn reduce(&self, rows: &[&StringRecord]) -> Option<StatValue> {
        match *self {
            Reducer::CountRows => Some(StatValue::Count(rows.len() as u64)),
            Reducer::CountNonEmpty(idx) => {
                let n = rows.iter().filter(|r| !field(r, idx).is_empty()).count();
                Some(StatValue::Count(n as u64))
            }
            Reducer::Mean(idx) => {
                let values: Vec<f64> = rows.iter().filter_map(|r| parse_number(field(r, idx))).collect();
                if values.is_empty() {
                    None
                } else {
                    Some(StatValue::Real(values.iter().sum::<f64>() / values.len() as f64))
                }
            }
            Reducer::Share { idx, equals } => {
                if rows.is_empty() {
                    return None;
                }
                let hits = rows.iter().filter(|r| field(r, idx) == equals).count();
                Some(StatValue::Real(hits as f64 / rows.len() as f64 * 100.0))
            }
        }
    }
}

fn resolve<'a>(table: &RecordTable, stat: &'a StatConfig) -> Result<Reducer<'a>, AggregateError> {
    let column = |name: &Option<String>| -> Result<usize, AggregateError> {
        let name = name.as_deref().ok_or_else(|| AggregateError::MissingColumn {
            column: format!("<{}>", stat.name),
        })?;
        table.column(name)
    };

    Ok(match stat.kind {
        StatKind::Count => match &stat.column {
            Some(name) => Reducer::CountNonEmpty(table.column(name)?),
            None => Reducer::CountRows,
        },
        StatKind::Mean => Reducer::Mean(column(&stat.column)?),
        StatKind::Share => Reducer::Share {
            idx: column(&stat.column)?,
            equals: stat.equals.as_deref().unwrap_or(""),
        },
    })
}

/// Aggregate `table` by the `group_by` column.
///
/// Rows with an empty key belong to no area and are dropped. A statistic
/// with no defined value for a group (a mean over no numbers) is left out
/// of that group's `SummaryStat`.
pub fn aggregate(
    table: &RecordTable,
    group_by: &str,
    stats: &[StatConfig],
) -> Result<SummaryTable, AggregateError> {
    let key_idx = table.column(group_by)?;
    let reducers = stats
        .iter()
        .map(|s| resolve(table, s).map(|r| (s.name.as_str(), r)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut groups: BTreeMap<&str, Vec<&StringRecord>> = BTreeMap::new();
    for row in &table.rows {
        let key = row.get(key_idx).unwrap_or("").trim();
        if key.is_empty() {
            continue;
        }
        groups.entry(key).or_default().push(row);
    }

    let mut summary = SummaryTable::default();
    for (area, rows) in groups {
        let values = reducers
            .iter()
            .filter_map(|(name, reducer)| reducer.reduce(&rows).map(|v| (name.to_string(), v)))
            .collect();
        summary.stats.insert(
            area.to_string(),
            SummaryStat {
                area: area.to_string(),
                values,
            },
        );
    }

    debug!("Aggregated {} records into {} areas by '{}'", table.len(), summary.len(), group_by);
    Ok(summary)
}

/// Lenient number parsing: whitespace, a leading currency sign and
/// thousands separators are ignored.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed.chars().filter(|&c| c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
