use crate::aggregate::parse_number;
use crate::config::MarkerConfig;
use crate::error::AggregateError;
use crate::types::RecordTable;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Reproducible sample of `[lat, lon]` marker positions.
///
/// Rows without parsable coordinates are dropped first. Fewer rows than
/// `config.sample` are returned whole.
pub fn sample_markers(table: &RecordTable, config: &MarkerConfig) -> Result<Vec<[f64; 2]>, AggregateError> {
    let lat_idx = table.column(&config.lat_column)?;
    let lon_idx = table.column(&config.lon_column)?;

    let points: Vec<[f64; 2]> = table
        .rows
        .iter()
        .filter_map(|r| {
            let lat = parse_number(r.get(lat_idx)?)?;
            let lon = parse_number(r.get(lon_idx)?)?;
            Some([lat, lon])
        })
        .collect();

    if points.len() <= config.sample {
        return Ok(points);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    Ok(points
        .choose_multiple(&mut rng, config.sample)
        .copied()
        .collect())
}
