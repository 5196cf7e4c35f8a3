//! Equal-interval choropleth classes over a joined statistic.

use crate::types::BoundaryFeature;
use serde::Serialize;
use serde_json::Value;

pub const NO_DATA_COLOR: &str = "#bdbdbd";
/// Prefix of the per-statistic color property.
pub const FILL_PREFIX: &str = "fill_";
/// Classes a palette can hold.
pub const MAX_CLASSES: usize = 9;

// ColorBrewer sequential schemes, 9 classes, light to dark.
const YL_GN: [&str; 9] = [
    "#ffffe5", "#f7fcb9", "#d9f0a3", "#addd8e", "#78c679", "#41ab5d", "#238443", "#006837", "#004529",
];
const BLUES: [&str; 9] = [
    "#f7fbff", "#deebf7", "#c6dbef", "#9ecae1", "#6baed6", "#4292c6", "#2171b5", "#08519c", "#08306b",
];
const OR_RD: [&str; 9] = [
    "#fff7ec", "#fee8c8", "#fdd49e", "#fdbb84", "#fc8d59", "#ef6548", "#d7301f", "#b30000", "#7f0000",
];
const PU_BU: [&str; 9] = [
    "#fff7fb", "#ece7f2", "#d0d1e6", "#a6bddb", "#74a9cf", "#3690c0", "#0570b0", "#045a8d", "#023858",
];

pub fn palette(name: &str) -> Option<&'static [&'static str; 9]> {
    match name {
        "YlGn" => Some(&YL_GN),
        "Blues" => Some(&BLUES),
        "OrRd" => Some(&OR_RD),
        "PuBu" => Some(&PU_BU),
        _ => None,
    }
}

/// Pick `n` colors spread over the scheme, keeping both ends.
fn spread(scheme: &[&'static str; 9], n: usize) -> Vec<String> {
    let last = scheme.len() - 1;
    (0..n)
        .map(|i| {
            let pos = if n == 1 { last } else { i * last / (n - 1) };
            scheme[pos].to_string()
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub stat: String,
    pub label: String,
    /// Class boundaries, `colors.len() + 1` values from min to max.
    pub thresholds: Vec<f64>,
    pub colors: Vec<String>,
    pub no_data: String,
}

impl Legend {
    pub fn color_for(&self, value: f64) -> &str {
        let classes = self.colors.len();
        if classes == 0 || self.thresholds.len() != classes + 1 {
            return &self.no_data;
        }
        let idx = self.thresholds[1..classes]
            .iter()
            .take_while(|&&upper| value >= upper)
            .count();
        &self.colors[idx.min(classes - 1)]
    }
}

/// Classify `stat` over the features carrying it and write a
/// `fill_<stat>` color property onto every feature.
///
/// Returns `None` when `palette_name` is unknown.
pub fn classify(
    boundaries: &mut [BoundaryFeature],
    stat: &str,
    label: &str,
    palette_name: &str,
    bins: usize,
) -> Option<Legend> {
    let scheme = palette(palette_name)?;
    let values: Vec<f64> = boundaries
        .iter()
        .filter_map(|b| b.properties.get(stat).and_then(Value::as_f64))
        .collect();

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let classes = if values.is_empty() || min == max { 1 } else { bins.clamp(1, MAX_CLASSES) };
    let thresholds: Vec<f64> = if values.is_empty() {
        Vec::new()
    } else {
        let step = (max - min) / classes as f64;
        (0..=classes)
            .map(|i| if i == classes { max } else { min + step * i as f64 })
            .collect()
    };

    let legend = Legend {
        stat: stat.to_string(),
        label: label.to_string(),
        thresholds,
        colors: spread(scheme, classes),
        no_data: NO_DATA_COLOR.to_string(),
    };

    let fill_key = format!("{FILL_PREFIX}{stat}");
    for feature in boundaries.iter_mut() {
        let color = match feature.properties.get(stat).and_then(Value::as_f64) {
            Some(v) => legend.color_for(v).to_string(),
            None => legend.no_data.clone(),
        };
        feature.properties.insert(fill_key.clone(), Value::String(color));
    }

    Some(legend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::MultiPolygon;
    use serde_json::{json, Map};

    fn areas(values: &[Option<f64>]) -> Vec<BoundaryFeature> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut properties = Map::new();
                if let Some(v) = v {
                    properties.insert("nb".to_string(), json!(v));
                }
                BoundaryFeature {
                    name: Some(format!("area{i}")),
                    geometry: MultiPolygon::new(vec![]),
                    properties,
                }
            })
            .collect()
    }

    fn fill(b: &BoundaryFeature) -> &str {
        b.properties["fill_nb"].as_str().unwrap()
    }

    #[test]
    fn extremes_land_in_first_and_last_class() {
        let mut boundaries = areas(&[Some(10.0), Some(70.0), Some(40.0), None]);
        let legend = classify(&mut boundaries, "nb", "Nombre", "YlGn", 6).unwrap();

        assert_eq!(legend.colors.len(), 6);
        assert_eq!(legend.thresholds, [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0]);
        assert_eq!(fill(&boundaries[0]), legend.colors[0]);
        assert_eq!(fill(&boundaries[1]), legend.colors[5]);
        assert_eq!(fill(&boundaries[2]), legend.colors[3]);
        assert_eq!(fill(&boundaries[3]), NO_DATA_COLOR);
    }

    #[test]
    fn palette_ends_are_kept() {
        let mut boundaries = areas(&[Some(0.0), Some(1.0)]);
        let legend = classify(&mut boundaries, "nb", "nb", "Blues", 4).unwrap();
        assert_eq!(legend.colors.first().unwrap(), BLUES[0]);
        assert_eq!(legend.colors.last().unwrap(), BLUES[8]);
    }

    #[test]
    fn constant_series_is_one_class() {
        let mut boundaries = areas(&[Some(5.0), Some(5.0)]);
        let legend = classify(&mut boundaries, "nb", "nb", "OrRd", 6).unwrap();
        assert_eq!(legend.colors.len(), 1);
        assert_eq!(legend.thresholds, [5.0, 5.0]);
        assert_eq!(fill(&boundaries[0]), legend.colors[0]);
    }

    #[test]
    fn unknown_palette_is_none() {
        let mut boundaries = areas(&[Some(1.0)]);
        assert!(classify(&mut boundaries, "nb", "nb", "Viridis", 6).is_none());
    }

    #[test]
    fn no_values_paint_no_data() {
        let mut boundaries = areas(&[None, None]);
        let legend = classify(&mut boundaries, "nb", "nb", "PuBu", 6).unwrap();
        assert!(legend.thresholds.is_empty());
        assert_eq!(fill(&boundaries[1]), NO_DATA_COLOR);
        assert_eq!(legend.color_for(3.0), NO_DATA_COLOR);
    }
}
