use choromap::config::AppConfig;
use choromap::pipeline::build_dashboard;
use choromap::render::write_site;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BOROUGHS: &str = r#"{"type": "FeatureCollection", "features": [
  {"type": "Feature", "properties": {"name": "Bronx"},
   "geometry": {"type": "Polygon", "coordinates": [[[-73.93,40.80],[-73.76,40.80],[-73.76,40.92],[-73.93,40.92],[-73.93,40.80]]]}},
  {"type": "Feature", "properties": {"name": "Brooklyn"},
   "geometry": {"type": "Polygon", "coordinates": [[[-74.05,40.57],[-73.85,40.57],[-73.85,40.74],[-74.05,40.74],[-74.05,40.57]]]}},
  {"type": "Feature", "properties": {"name": "Staten Island"},
   "geometry": {"type": "Polygon", "coordinates": [[[-74.25,40.50],[-74.05,40.50],[-74.05,40.65],[-74.25,40.65],[-74.25,40.50]]]}}
]}"#;

const RESTAURANTS: &str = "\
restaurant_id,name,borough,cuisine
30075445,Morris Park Bake Shop,Bronx,Bakery
30112340,Wendy'S,Brooklyn,Hamburgers
30191841,Dj Reynolds Pub,Brooklyn,Irish
40356018,Riviera Caterer,Brooklyn,American
40361521,Regina Caterers,Manhattan,American
";

fn write_inputs(dir: &Path, policy: &str) -> AppConfig {
    fs::write(dir.join("new-york-city-boroughs.geojson"), BOROUGHS).unwrap();
    fs::write(dir.join("restaurants_ok.csv"), RESTAURANTS).unwrap();

    let toml = format!(
        r#"
[output]
dir = '{out}'

[[dashboards]]
name = "restaurants"
records = '{records}'
boundaries = '{boundaries}'
group_by = "borough"
boundary_key = "name"
center = [40.7, -73.95]
zoom = 10
on_mismatch = "{policy}"

[[dashboards.stats]]
name = "nb"
label = "Nombre de restaurants"
kind = "count"
column = "restaurant_id"

[dashboards.charts]
category_column = "cuisine"
"#,
        out = dir.join("output").display(),
        records = dir.join("restaurants_ok.csv").display(),
        boundaries = dir.join("new-york-city-boroughs.geojson").display(),
    );
    let config_path = dir.join("config.toml");
    fs::write(&config_path, toml).unwrap();
    AppConfig::load_from_file(&config_path).unwrap()
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn restaurants_site_is_written() {
    let tmp = TempDir::new().unwrap();
    let config = write_inputs(tmp.path(), "skip");

    let dashboards: Vec<_> = config
        .dashboards
        .iter()
        .map(|d| build_dashboard(d).unwrap())
        .collect();
    write_site(&config, &dashboards).unwrap();

    let out = tmp.path().join("output");
    assert!(out.join("index.html").exists());

    let index = read_json(&out.join("dashboards.json"));
    assert_eq!(index[0]["name"], "restaurants");

    let geo = read_json(&out.join("restaurants/boundaries.geojson"));
    let features = geo["features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    assert_eq!(features[0]["properties"]["nb"], 1);
    assert_eq!(features[1]["properties"]["nb"], 3);
    // no restaurant in Staten Island: no value, no-data fill
    assert!(features[2]["properties"].get("nb").is_none());
    assert_eq!(features[2]["properties"]["fill_nb"], "#bdbdbd");

    let view = read_json(&out.join("restaurants/dashboard.json"));
    assert_eq!(view["report"]["matched"], 2);
    assert_eq!(view["report"]["unmatched_features"][0], "Staten Island");
    assert_eq!(view["report"]["unused_areas"][0], "Manhattan");
    assert_eq!(view["tooltip"][1]["alias"], "Nombre de restaurants");
    assert_eq!(view["charts"]["categories"][0]["category"], "American");
    assert!(view.get("markers").is_none());

    let summary = fs::read_to_string(out.join("restaurants/summary.csv")).unwrap();
    assert_eq!(summary, "area,nb\nBronx,1\nBrooklyn,3\nManhattan,1\n");
}

#[test]
fn strict_policy_rejects_unmatched_boroughs() {
    let tmp = TempDir::new().unwrap();
    let config = write_inputs(tmp.path(), "error");

    let err = build_dashboard(&config.dashboards[0]).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Staten Island"), "{message}");
}

#[test]
fn counts_match_record_totals() {
    let tmp = TempDir::new().unwrap();
    let config = write_inputs(tmp.path(), "skip");
    let dashboard = build_dashboard(&config.dashboards[0]).unwrap();

    let total: f64 = dashboard
        .summary
        .iter()
        .map(|s| s.get("nb").unwrap().as_f64())
        .sum();
    assert_eq!(total, 5.0);

    for feature in &dashboard.boundaries {
        if let Some(stat) = feature.name.as_deref().and_then(|n| dashboard.summary.get(n)) {
            assert_eq!(feature.properties["nb"], stat.get("nb").unwrap().to_json());
        }
    }
}
