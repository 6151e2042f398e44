use std::collections::HashMap;

use geo::{Area, BooleanOps, BoundingRect, Contains, LineString, MapCoords, MultiPolygon, Point, Polygon};
use rstar::RTree;

use crate::error::LayoutError;
use crate::geom::{IndexedPoint, ScalingInfo};
use crate::plan::FloorPlan;
use crate::types::{NodeId, Position};

/// Per-floor output of discretization: lattice node positions (index = node
/// id), the usable polygon in grid space, fixed-element and connector node
/// snappings, and the grid/real scaling.
#[derive(Clone, Debug)]
pub struct DiscretizationResult {
    positions: Vec<Position>,
    grid_polygon: MultiPolygon<f64>,
    fixed_nodes: HashMap<String, Vec<NodeId>>,
    connector_nodes: HashMap<String, NodeId>,
    scaling: ScalingInfo,
}

impl DiscretizationResult {
    #[inline] pub fn node_count(&self) -> usize { self.positions.len() }
    #[inline] pub fn positions(&self) -> &[Position] { &self.positions }
    #[inline] pub fn grid_polygon(&self) -> &MultiPolygon<f64> { &self.grid_polygon }
    #[inline] pub fn fixed_nodes(&self) -> &HashMap<String, Vec<NodeId>> { &self.fixed_nodes }
    #[inline] pub fn connector_nodes(&self) -> &HashMap<String, NodeId> { &self.connector_nodes }
    #[inline] pub fn scaling(&self) -> &ScalingInfo { &self.scaling }
}

fn ring(coords: &[Position]) -> LineString<f64> {
    LineString::from(coords.iter().map(|&[x, y]| (x, y)).collect::<Vec<_>>())
}

/// Usable area of a floor: boundary polygon minus the union of obstacles.
fn usable_polygon(plan: &FloorPlan) -> MultiPolygon<f64> {
    let boundary = MultiPolygon::new(vec![Polygon::new(ring(plan.boundary()), vec![])]);
    let obstacles = plan.obstacles().iter()
        .map(|o| MultiPolygon::new(vec![Polygon::new(ring(o), vec![])]))
        .reduce(|a, b| a.union(&b));

    match obstacles {
        Some(walls) => boundary.difference(&walls),
        None => boundary,
    }
}

/// Discretize a floor into roughly `target_node_count` lattice nodes.
///
/// Grid spacing is `sqrt(usable_area / target_node_count)` and the grid
/// resolution is `max(ceil(width / spacing), ceil(height / spacing), 1)`.
/// Fixed elements and connectors snap to the nearest lattice node; a
/// connector's node is also registered as a fixed node of its zone type.
pub fn discretize(
    plan: &FloorPlan,
    target_node_count: usize,
) -> Result<DiscretizationResult, LayoutError> {
    let usable = usable_polygon(plan);
    let area = usable.unsigned_area();
    let bbox = usable.bounding_rect();
    let (Some(bbox), true) = (bbox, area > 0.0) else {
        return Err(LayoutError::Geometry { floor: plan.name().to_string() });
    };

    let spacing = (area / target_node_count.max(1) as f64).sqrt();
    let nx = (bbox.width() / spacing).ceil() as u32;
    let ny = (bbox.height() / spacing).ceil() as u32;
    let n = nx.max(ny).max(1);

    let scaling = ScalingInfo::new(
        [bbox.min().x, bbox.min().y],
        bbox.width().max(bbox.height()),
        n,
    );

    let grid_polygon = usable.map_coords(|c| {
        let [x, y] = scaling.to_grid([c.x, c.y]);
        geo::Coord { x, y }
    });

    let positions = lattice_positions(&grid_polygon, n);
    if positions.is_empty() {
        tracing::warn!(floor = plan.name(), n, "no grid nodes inside usable polygon");
        return Ok(DiscretizationResult {
            positions,
            grid_polygon,
            fixed_nodes: HashMap::new(),
            connector_nodes: HashMap::new(),
            scaling,
        });
    }

    let tree = RTree::bulk_load(
        positions.iter().enumerate()
            .map(|(i, &pos)| IndexedPoint::new(i as NodeId, pos))
            .collect(),
    );
    let snap = |real: Position| -> NodeId {
        // tree is non-empty here, nearest_neighbor always yields a node
        tree.nearest_neighbor(&scaling.to_grid(real)).map(|p| p.idx()).unwrap_or(0)
    };

    let mut fixed_nodes: HashMap<String, Vec<NodeId>> = HashMap::new();
    for (type_name, coords) in plan.fixed_elements() {
        for &coord in coords {
            fixed_nodes.entry(type_name.clone()).or_default().push(snap(coord));
        }
    }

    let mut connector_nodes = HashMap::new();
    for conn in plan.connectors() {
        let node = snap(conn.coord());
        connector_nodes.insert(conn.group().to_string(), node);
        fixed_nodes.entry(conn.zone().to_string()).or_default().push(node);
    }

    Ok(DiscretizationResult { positions, grid_polygon, fixed_nodes, connector_nodes, scaling })
}

/// Enumerate unit-cell centers inside the grid-space polygon, scanning the
/// polygon's bounds clamped to `[0, n-1]`.
fn lattice_positions(grid_polygon: &MultiPolygon<f64>, n: u32) -> Vec<Position> {
    let Some(bbox) = grid_polygon.bounding_rect() else { return Vec::new() };
    let min_x = (bbox.min().x.floor() as i64).max(0);
    let min_y = (bbox.min().y.floor() as i64).max(0);
    let max_x = (bbox.max().x.ceil() as i64).min(n as i64 - 1);
    let max_y = (bbox.max().y.ceil() as i64).min(n as i64 - 1);

    let mut positions = Vec::new();
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let center = [x as f64 + 0.5, y as f64 + 0.5];
            if grid_polygon.contains(&Point::new(center[0], center[1])) {
                positions.push(center);
            }
        }
    }
    positions
}
