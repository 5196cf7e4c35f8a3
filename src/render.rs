use crate::config::AppConfig;
use crate::data::to_feature_collection;
use crate::join::JoinReport;
use crate::pipeline::{Charts, Dashboard};
use crate::classify::Legend;
use crate::types::{StatValue, SummaryTable};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

const INDEX_HTML: &str = include_str!("../assets/index.html");

/// What the dashboard page needs besides the boundaries.
#[derive(Debug, Serialize)]
pub struct DashboardView<'a> {
    pub name: &'a str,
    pub title: &'a str,
    pub center: [f64; 2],
    pub zoom: u8,
    /// Feature properties shown in the tooltip, name first.
    pub tooltip: Vec<TooltipField<'a>>,
    pub legends: &'a [Legend],
    pub charts: &'a Charts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers: Option<&'a [[f64; 2]]>,
    pub report: &'a JoinReport,
}

#[derive(Debug, Serialize)]
pub struct TooltipField<'a> {
    pub property: &'a str,
    pub alias: &'a str,
}

#[derive(Debug, Serialize)]
struct IndexEntry<'a> {
    name: &'a str,
    title: &'a str,
}

impl<'a> DashboardView<'a> {
    pub fn new(dashboard: &'a Dashboard) -> Self {
        let config = &dashboard.config;
        let mut tooltip = vec![TooltipField {
            property: &config.boundary_key,
            alias: "Zone",
        }];
        tooltip.extend(config.stats.iter().map(|s| TooltipField {
            property: &s.name,
            alias: s.display_label(),
        }));

        Self {
            name: &config.name,
            title: config.display_title(),
            center: config.center,
            zoom: config.zoom,
            tooltip,
            legends: &dashboard.legends,
            charts: &dashboard.charts,
            markers: dashboard.markers.as_deref(),
            report: &dashboard.report,
        }
    }
}

/// Write every dashboard plus the page shell into `config.output.dir`.
pub fn write_site(config: &AppConfig, dashboards: &[Dashboard]) -> Result<()> {
    let out_dir = &config.output.dir;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

    for dashboard in dashboards {
        write_dashboard(out_dir, dashboard)?;
    }

    let index: Vec<IndexEntry> = dashboards
        .iter()
        .map(|d| IndexEntry {
            name: &d.config.name,
            title: d.config.display_title(),
        })
        .collect();
    write_json(&out_dir.join("dashboards.json"), &index)?;

    let html_path = out_dir.join("index.html");
    fs::write(&html_path, INDEX_HTML)
        .with_context(|| format!("Failed to write {:?}", html_path))?;

    info!("Wrote {} dashboards to {:?}", dashboards.len(), out_dir);
    Ok(())
}

/// `<out_dir>/<name>/{boundaries.geojson, summary.csv, dashboard.json}`
pub fn write_dashboard(out_dir: &Path, dashboard: &Dashboard) -> Result<()> {
    let dir = out_dir.join(&dashboard.config.name);
    fs::create_dir_all(&dir).context("Failed to create dashboard directory")?;

    let fc = to_feature_collection(&dashboard.boundaries);
    let geojson_path = dir.join("boundaries.geojson");
    fs::write(&geojson_path, geojson::GeoJson::from(fc).to_string())
        .with_context(|| format!("Failed to write {:?}", geojson_path))?;

    let stat_names: Vec<&str> = dashboard.config.stats.iter().map(|s| s.name.as_str()).collect();
    let csv_path = dir.join("summary.csv");
    let file = fs::File::create(&csv_path)
        .with_context(|| format!("Failed to create {:?}", csv_path))?;
    write_summary(file, &dashboard.summary, &stat_names)
        .with_context(|| format!("Failed to write {:?}", csv_path))?;

    write_json(&dir.join("dashboard.json"), &DashboardView::new(dashboard))?;

    info!("Rendered dashboard '{}' into {:?}", dashboard.config.name, dir);
    Ok(())
}

/// One row per area; absent statistics are left empty.
pub fn write_summary<W: Write>(writer: W, summary: &SummaryTable, stats: &[&str]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["area"];
    header.extend_from_slice(stats);
    wtr.write_record(&header)?;

    for stat in summary.iter() {
        let mut row = vec![stat.area.clone()];
        row.extend(stats.iter().map(|name| match stat.get(name) {
            Some(StatValue::Count(n)) => n.to_string(),
            Some(StatValue::Real(x)) => x.to_string(),
            None => String::new(),
        }));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))
}
