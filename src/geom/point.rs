use rstar::{AABB, PointDistance, RTreeObject};

use crate::types::{NodeId, Position};

/// A grid node position in an R-tree, associated with its node id.
#[derive(Debug, Clone)]
pub(crate) struct IndexedPoint {
    idx: NodeId,
    pos: Position,
}

impl IndexedPoint {
    pub(crate) fn new(idx: NodeId, pos: Position) -> Self {
        Self { idx, pos }
    }

    /// Get the node id of this position.
    #[inline] pub(crate) fn idx(&self) -> NodeId { self.idx }
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.pos)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.pos[0] - point[0];
        let dy = self.pos[1] - point[1];
        dx * dx + dy * dy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstar::RTree;

    #[test]
    fn nearest_neighbor_returns_closest_index() {
        let tree = RTree::bulk_load(vec![
            IndexedPoint::new(0, [0.5, 0.5]),
            IndexedPoint::new(1, [1.5, 0.5]),
            IndexedPoint::new(2, [0.5, 1.5]),
        ]);
        assert_eq!(tree.nearest_neighbor(&[1.4, 0.4]).unwrap().idx(), 1);
        assert_eq!(tree.nearest_neighbor(&[0.0, 2.0]).unwrap().idx(), 2);
    }
}
