//! Load → aggregate → join → classify for one dashboard.
//!
//! Every input is passed in explicitly; building a dashboard twice reads
//! the files twice.

use crate::aggregate::aggregate;
use crate::charts::{self, CategoryCount, Crosstab, HistogramBin};
use crate::classify::{self, Legend};
use crate::config::DashboardConfig;
use crate::data;
use crate::error::ConfigError;
use crate::join::{join_stats, JoinReport};
use crate::sampling::sample_markers;
use crate::types::{BoundaryFeature, RecordTable, SummaryTable};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Charts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<CategoryCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Vec<HistogramBin>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Crosstab>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub config: DashboardConfig,
    pub boundaries: Vec<BoundaryFeature>,
    pub summary: SummaryTable,
    pub report: JoinReport,
    pub legends: Vec<Legend>,
    pub charts: Charts,
    pub markers: Option<Vec<[f64; 2]>>,
}

pub fn build_dashboard(config: &DashboardConfig) -> Result<Dashboard> {
    info!("Building dashboard '{}'", config.name);

    let table = data::load_records(&config.records)?;
    let boundaries = data::load_boundaries(&config.boundaries, &config.boundary_key)?;

    build_from(config, &table, boundaries)
}

/// Same as [`build_dashboard`] with the inputs already in memory.
pub fn build_from(
    config: &DashboardConfig,
    table: &RecordTable,
    mut boundaries: Vec<BoundaryFeature>,
) -> Result<Dashboard> {
    let summary = aggregate(table, &config.group_by, &config.stats)
        .with_context(|| format!("Failed to aggregate dashboard '{}'", config.name))?;

    let report = join_stats(&mut boundaries, &summary, config.on_mismatch)
        .with_context(|| format!("Failed to join dashboard '{}'", config.name))?;

    let mut legends = Vec::with_capacity(config.stats.len());
    for stat in &config.stats {
        let legend = classify::classify(
            &mut boundaries,
            &stat.name,
            stat.display_label(),
            &config.choropleth.palette,
            config.choropleth.bins,
        )
        .ok_or_else(|| ConfigError::UnknownPalette(config.choropleth.palette.clone()))?;
        legends.push(legend);
    }

    let charts = match &config.charts {
        Some(cc) => Charts {
            categories: cc
                .category_column
                .as_deref()
                .map(|col| charts::value_counts(table, col))
                .transpose()?,
            histogram: cc
                .histogram_column
                .as_deref()
                .map(|col| charts::histogram(table, col, cc.histogram_bins))
                .transpose()?,
            breakdown: cc
                .breakdown_column
                .as_deref()
                .map(|col| charts::crosstab(table, &config.group_by, col))
                .transpose()?,
        },
        None => Charts::default(),
    };

    let markers = config
        .markers
        .as_ref()
        .map(|mc| sample_markers(table, mc))
        .transpose()?;

    info!(
        "Dashboard '{}': {} areas aggregated, {} features joined",
        config.name,
        summary.len(),
        report.matched
    );

    Ok(Dashboard {
        config: config.clone(),
        boundaries,
        summary,
        report,
        legends,
        charts,
        markers,
    })
}
