use crate::types::{BoundaryFeature, RecordTable};
use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

pub fn load_records(path: &Path) -> Result<RecordTable> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let table = read_records(file).with_context(|| format!("Failed to read CSV file: {:?}", path))?;
    info!("Loaded {} records from {:?}", table.len(), path);
    Ok(table)
}

pub fn read_records<R: Read>(reader: R) -> Result<RecordTable> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        rows.push(result?);
    }

    Ok(RecordTable::new(headers, rows))
}

pub fn load_boundaries(path: &Path, key: &str) -> Result<Vec<BoundaryFeature>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let features = read_boundaries(BufReader::new(file), key)
        .with_context(|| format!("Failed to read GeoJSON file: {:?}", path))?;
    info!("Loaded {} boundary features from {:?}", features.len(), path);
    Ok(features)
}

pub fn read_boundaries<R: Read>(reader: R, key: &str) -> Result<Vec<BoundaryFeature>> {
    // Parse the GeoJSON. warning: this loads the whole file into memory.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let mut boundaries = Vec::new();

    for feature in collection.features {
        let properties = feature.properties.unwrap_or_default();

        // Keyless polygons are kept so the join reports them as unmatched.
        let name = match properties.get(key) {
            Some(serde_json::Value::String(s)) => Some(s.trim().to_string()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => {
                warn!("Boundary feature #{} has no '{}' property", boundaries.len(), key);
                None
            }
        };
        let label = name.clone().unwrap_or_else(|| format!("#{}", boundaries.len()));

        let geometry = match feature.geometry {
            Some(geom) => {
                let geo_geom: geo::Geometry<f64> = geom.value.try_into()
                    .map_err(|e| anyhow!("Failed to convert geometry of '{}': {:?}", label, e))?;

                match geo_geom {
                    geo::Geometry::MultiPolygon(mp) => mp,
                    geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                    _ => {
                        warn!("Skipping boundary feature '{}': not a polygon", label);
                        continue;
                    }
                }
            }
            None => {
                warn!("Skipping boundary feature '{}': no geometry", label);
                continue;
            }
        };

        boundaries.push(BoundaryFeature {
            name,
            geometry,
            properties,
        });
    }

    Ok(boundaries)
}

pub fn to_feature_collection(boundaries: &[BoundaryFeature]) -> FeatureCollection {
    boundaries
        .iter()
        .map(|b| Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(&b.geometry))),
            id: None,
            properties: Some(b.properties.clone()),
            foreign_members: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOROUGHS: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"name": "Bronx", "boroughCode": 2},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type": "Feature", "properties": {"name": "Queens"},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,0],[3,0],[3,1],[2,1],[2,0]]]]}},
        {"type": "Feature", "properties": {"code": 7},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]]}},
        {"type": "Feature", "properties": {"name": "Pier"},
         "geometry": {"type": "Point", "coordinates": [5, 5]}}
      ]
    }"#;

    #[test]
    fn reads_polygons_and_skips_the_rest() {
        let boundaries = read_boundaries(BOROUGHS.as_bytes(), "name").unwrap();
        let names: Vec<_> = boundaries.iter().map(|b| b.name.as_deref()).collect();
        assert_eq!(names, [Some("Bronx"), Some("Queens"), None]);
        assert_eq!(boundaries[0].geometry.0.len(), 1);
        assert_eq!(boundaries[0].properties["boroughCode"], 2);
    }

    #[test]
    fn numeric_keys_become_names() {
        let boundaries = read_boundaries(BOROUGHS.as_bytes(), "boroughCode").unwrap();
        assert_eq!(boundaries.len(), 3);
        assert_eq!(boundaries[0].name.as_deref(), Some("2"));
        assert!(boundaries[1].name.is_none());
    }

    #[test]
    fn keyless_polygons_are_kept_with_their_properties() {
        let boundaries = read_boundaries(BOROUGHS.as_bytes(), "name").unwrap();
        assert_eq!(boundaries[2].properties["code"], 7);
        assert_eq!(boundaries[2].label(2), "<feature #2 without key>");
    }

    #[test]
    fn names_are_trimmed_like_record_keys() {
        let padded = BOROUGHS.replace("\"name\": \"Bronx\"", "\"name\": \" Bronx \"");
        let boundaries = read_boundaries(padded.as_bytes(), "name").unwrap();
        assert_eq!(boundaries[0].name.as_deref(), Some("Bronx"));
        assert_eq!(boundaries[0].properties["name"], " Bronx ");
    }

    #[test]
    fn rejects_bare_geometry() {
        let point = r#"{"type": "Point", "coordinates": [1, 2]}"#;
        assert!(read_boundaries(point.as_bytes(), "name").is_err());
    }

    #[test]
    fn feature_collection_keeps_properties() {
        let boundaries = read_boundaries(BOROUGHS.as_bytes(), "name").unwrap();
        let fc = to_feature_collection(&boundaries);
        assert_eq!(fc.features.len(), 3);
        assert_eq!(fc.features[1].property("name").unwrap(), "Queens");
    }

    #[test]
    fn reads_ragged_csv() {
        let csv = "borough,restaurant_id\nBronx,1\nQueens\n";
        let table = read_records(csv.as_bytes()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("restaurant_id").unwrap(), 1);
        let ids: Vec<_> = table.values(1).collect();
        assert_eq!(ids, ["1", ""]);
    }
}
