//! Write per-area aggregates onto the boundary features they describe.

use crate::config::MismatchPolicy;
use crate::error::JoinError;
use crate::types::{BoundaryFeature, SummaryTable};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinReport {
    pub matched: usize,
    /// Boundary features with no aggregate, in feature order.
    pub unmatched_features: Vec<String>,
    /// Aggregated areas no boundary feature carries.
    pub unused_areas: Vec<String>,
}

/// Join `summary` onto `boundaries` by exact area name.
///
/// Every statistic of a matched area is written into the feature's
/// properties under the statistic's name. Under [`MismatchPolicy::Error`]
/// the first unmatched feature aborts the join before anything is written.
/// A feature without a key property never matches.
pub fn join_stats(
    boundaries: &mut [BoundaryFeature],
    summary: &SummaryTable,
    policy: MismatchPolicy,
) -> Result<JoinReport, JoinError> {
    let lookup = |feature: &BoundaryFeature| feature.name.as_deref().and_then(|n| summary.get(n));

    if policy == MismatchPolicy::Error {
        if let Some((i, missing)) = boundaries.iter().enumerate().find(|(_, b)| lookup(*b).is_none()) {
            return Err(JoinError::UnmatchedFeature {
                name: missing.label(i),
            });
        }
    }

    let mut report = JoinReport::default();
    let mut used = BTreeSet::new();

    for (i, feature) in boundaries.iter_mut().enumerate() {
        let Some(stat) = lookup(&*feature) else {
            let label = feature.label(i);
            warn!("No aggregate for boundary feature '{}', leaving it unenriched", label);
            report.unmatched_features.push(label);
            continue;
        };

        for (name, value) in &stat.values {
            feature.properties.insert(name.clone(), value.to_json());
        }
        used.insert(stat.area.as_str());
        report.matched += 1;
    }

    report.unused_areas = summary
        .areas()
        .filter(|area| !used.contains(area))
        .map(str::to_string)
        .collect();
    for area in &report.unused_areas {
        warn!("Aggregate for '{}' matches no boundary feature", area);
    }

    info!(
        "Joined {} of {} boundary features ({} unmatched, {} unused aggregates)",
        report.matched,
        boundaries.len(),
        report.unmatched_features.len(),
        report.unused_areas.len()
    );
    Ok(report)
}
