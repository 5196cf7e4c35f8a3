use crate::config::AppConfig;
use crate::pipeline::Dashboard;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

// Wrapper for RTree indexing
pub struct AreaIndex {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for AreaIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct IndexedDashboard {
    pub dashboard: Dashboard,
    pub tree: RTree<AreaIndex>,
}

impl IndexedDashboard {
    pub fn new(dashboard: Dashboard) -> Self {
        // Features with empty geometry have no bounding box and can never contain a point.
        let items: Vec<AreaIndex> = dashboard
            .boundaries
            .iter()
            .enumerate()
            .filter_map(|(i, area)| {
                let rect = area.geometry.bounding_rect()?;
                Some(AreaIndex {
                    index: i,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        Self {
            dashboard,
            tree: RTree::bulk_load(items),
        }
    }

    /// Properties of the boundary feature containing (`lon`, `lat`).
    pub fn locate(&self, lon: f64, lat: f64) -> Option<&Map<String, Value>> {
        let point = Point::new(lon, lat);
        let envelope = AABB::from_point([lon, lat]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.dashboard.boundaries.get(candidate.index))
            .find(|area| area.geometry.contains(&point))
            .map(|area| &area.properties)
    }
}

pub struct AppState {
    pub dashboards: HashMap<String, IndexedDashboard>,
}

impl AppState {
    pub fn new(dashboards: Vec<Dashboard>) -> Self {
        let dashboards = dashboards
            .into_iter()
            .map(|d| (d.config.name.clone(), IndexedDashboard::new(d)))
            .collect();
        Self { dashboards }
    }
}

#[derive(Deserialize)]
pub struct QueryParams {
    dashboard: String,
    lat: f64,
    lon: f64,
}

pub fn router(state: Arc<AppState>, site_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/api/dashboards", get(list_handler))
        .route("/api/query", get(query_handler))
        .fallback_service(ServeDir::new(site_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, dashboards: Vec<Dashboard>) -> Result<()> {
    info!("Building spatial indexes for {} dashboards...", dashboards.len());
    let state = Arc::new(AppState::new(dashboards));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let app = router(state, &config.output.dir);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn list_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    let mut names: Vec<String> = state.dashboards.keys().cloned().collect();
    names.sort();
    Json(names)
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Option<Map<String, Value>>>, StatusCode> {
    let indexed = state
        .dashboards
        .get(&params.dashboard)
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(indexed.locate(params.lon, params.lat).cloned()))
}
