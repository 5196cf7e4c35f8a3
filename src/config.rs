use crate::classify::{FILL_PREFIX, MAX_CLASSES};
use crate::error::ConfigError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub server: ServerConfig,
    pub dashboards: Vec<DashboardConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

fn default_port() -> u16 {
    3000
}

/// One dashboard: a record file, a boundary file and what to compute from them.
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    pub records: PathBuf,
    pub boundaries: PathBuf,
    /// CSV column holding the area name.
    pub group_by: String,
    /// GeoJSON property holding the area name.
    pub boundary_key: String,
    pub center: [f64; 2],
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    #[serde(default)]
    pub on_mismatch: MismatchPolicy,
    pub stats: Vec<StatConfig>,
    #[serde(default)]
    pub choropleth: ChoroplethConfig,
    #[serde(default)]
    pub markers: Option<MarkerConfig>,
    #[serde(default)]
    pub charts: Option<ChartsConfig>,
}

fn default_zoom() -> u8 {
    12
}

impl DashboardConfig {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

/// What the geo-join does with a boundary feature that has no aggregate.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    #[default]
    Skip,
    Error,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Count,
    Mean,
    Share,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatConfig {
    /// Property name written onto the boundary features.
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub kind: StatKind,
    #[serde(default)]
    pub column: Option<String>,
    /// Value compared against for `share`.
    #[serde(default)]
    pub equals: Option<String>,
}

impl StatConfig {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChoroplethConfig {
    #[serde(default = "default_palette")]
    pub palette: String,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

impl Default for ChoroplethConfig {
    fn default() -> Self {
        Self {
            palette: default_palette(),
            bins: default_bins(),
        }
    }
}

fn default_palette() -> String {
    "YlGn".to_string()
}

fn default_bins() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarkerConfig {
    #[serde(default = "default_lat_column")]
    pub lat_column: String,
    #[serde(default = "default_lon_column")]
    pub lon_column: String,
    #[serde(default = "default_sample")]
    pub sample: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_lat_column() -> String {
    "latitude".to_string()
}

fn default_lon_column() -> String {
    "longitude".to_string()
}

fn default_sample() -> usize {
    1000
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ChartsConfig {
    /// Bar chart of category frequencies.
    #[serde(default)]
    pub category_column: Option<String>,
    #[serde(default)]
    pub histogram_column: Option<String>,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    /// Category column broken down per area (small multiples).
    #[serde(default)]
    pub breakdown_column: Option<String>,
}

fn default_histogram_bins() -> usize {
    50
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for dashboard in &self.dashboards {
            if dashboard.name.trim().is_empty() {
                return Err(ConfigError::EmptyDashboardName);
            }
            if !seen.insert(dashboard.name.as_str()) {
                return Err(ConfigError::DuplicateDashboard(dashboard.name.clone()));
            }
            dashboard.validate()?;
        }
        Ok(())
    }
}

impl DashboardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stats.is_empty() {
            return Err(ConfigError::NoStats(self.name.clone()));
        }
        let mut names = HashSet::new();
        for stat in &self.stats {
            // Stat names become feature properties next to the key and the fill colors.
            if !names.insert(stat.name.as_str()) {
                return Err(ConfigError::DuplicateStat {
                    dashboard: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
            if stat.name == self.boundary_key {
                return Err(ConfigError::StatShadowsKey {
                    dashboard: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
            if stat.name.starts_with(FILL_PREFIX) {
                return Err(ConfigError::ReservedStatName {
                    dashboard: self.name.clone(),
                    stat: stat.name.clone(),
                });
            }
            match stat.kind {
                StatKind::Count => {}
                StatKind::Mean | StatKind::Share if stat.column.is_none() => {
                    return Err(ConfigError::MissingStatColumn {
                        dashboard: self.name.clone(),
                        stat: stat.name.clone(),
                    });
                }
                StatKind::Share if stat.equals.is_none() => {
                    return Err(ConfigError::MissingShareValue {
                        dashboard: self.name.clone(),
                        stat: stat.name.clone(),
                    });
                }
                _ => {}
            }
        }
        if self.choropleth.bins == 0 {
            return Err(ConfigError::ZeroBins(self.name.clone()));
        }
        if self.choropleth.bins > MAX_CLASSES {
            return Err(ConfigError::TooManyBins {
                dashboard: self.name.clone(),
                bins: self.choropleth.bins,
            });
        }
        if crate::classify::palette(&self.choropleth.palette).is_none() {
            return Err(ConfigError::UnknownPalette(self.choropleth.palette.clone()));
        }
        if let Some(charts) = &self.charts {
            if charts.histogram_bins == 0 {
                return Err(ConfigError::ZeroBins(self.name.clone()));
            }
        }
        Ok(())
    }
}
