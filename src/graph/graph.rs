use std::collections::{HashMap, VecDeque};

use rstar::RTree;
use smallvec::SmallVec;

use crate::error::LayoutError;
use crate::geom::IndexedPoint;
use crate::types::{NodeId, Position};

/// Neighbor radius in grid units. On a unit lattice this captures the four
/// orthogonal neighbors at distance 1.0 and excludes diagonals at sqrt(2).
const ADJACENCY_RADIUS: f64 = 1.01;

/// An undirected lattice-adjacency graph over grid nodes, stored both in
/// compressed sparse row form (for the propagation kernel) and as per-node
/// neighbor lists (for the optimizer's local moves).
#[derive(Debug, Default)]
pub struct DiscretizedGraph {
    offsets: Vec<u32>,
    neighbors: Vec<NodeId>,
    adjacency: Vec<SmallVec<[NodeId; 8]>>,
    edges: Vec<(NodeId, NodeId)>,
    positions: Vec<Position>,
    floor_ranges: Vec<(u32, u32)>,
}

impl DiscretizedGraph {
    /// Build the adjacency for a single floor by connecting each node to
    /// every other node within [`ADJACENCY_RADIUS`] grid distance.
    pub fn for_floor(positions: Vec<Position>) -> Self {
        let tree = RTree::bulk_load(
            positions.iter().enumerate()
                .map(|(i, &pos)| IndexedPoint::new(i as NodeId, pos))
                .collect::<Vec<_>>(),
        );

        let adjacency = positions.iter().enumerate()
            .map(|(i, pos)| {
                let mut list: SmallVec<[NodeId; 8]> = tree
                    .locate_within_distance(*pos, ADJACENCY_RADIUS * ADJACENCY_RADIUS)
                    .map(|p| p.idx())
                    .filter(|&j| j != i as NodeId)
                    .collect();
                list.sort_unstable();
                list
            })
            .collect::<Vec<_>>();

        let n = positions.len() as u32;
        Self::from_parts(positions, adjacency, vec![(0, n)])
    }

    /// Concatenate per-floor graphs with cumulative node-id offsets, then
    /// splice extra edges chaining each connector group's nodes across its
    /// floors. Neighbor sets are deduplicated and sorted; connectivity of
    /// the result is validated by breadth-first traversal.
    ///
    /// `connectors[i]` maps connector-group id to the node id (floor-local)
    /// on floor `i`.
    pub fn stitch(
        graphs: Vec<DiscretizedGraph>,
        connectors: &[HashMap<String, NodeId>],
    ) -> Result<Self, LayoutError> {
        assert!(!graphs.is_empty(), "cannot stitch an empty list of graphs");
        assert!(connectors.len() == graphs.len(), "connectors.len() must equal graphs.len()");

        let mut offsets = Vec::with_capacity(graphs.len());
        let mut total = 0u32;
        for graph in &graphs {
            offsets.push(total);
            total += graph.node_count() as u32;
        }

        let mut positions = Vec::with_capacity(total as usize);
        let mut adjacency: Vec<SmallVec<[NodeId; 8]>> = Vec::with_capacity(total as usize);
        for (graph, &offset) in graphs.iter().zip(&offsets) {
            positions.extend_from_slice(&graph.positions);
            adjacency.extend(graph.adjacency.iter()
                .map(|list| list.iter().map(|&v| v + offset).collect::<SmallVec<[NodeId; 8]>>()));
        }

        // Gather each group's nodes in floor order and chain consecutive pairs.
        let mut groups: Vec<&str> = connectors.iter().flat_map(|m| m.keys()).map(String::as_str).collect();
        groups.sort_unstable();
        groups.dedup();
        for group in groups {
            let chain: Vec<NodeId> = connectors.iter().zip(&offsets)
                .filter_map(|(map, &offset)| map.get(group).map(|&node| node + offset))
                .collect();
            for pair in chain.windows(2) {
                adjacency[pair[0] as usize].push(pair[1]);
                adjacency[pair[1] as usize].push(pair[0]);
            }
        }

        for list in &mut adjacency {
            list.sort_unstable();
            list.dedup();
        }

        let floor_ranges = graphs.iter().zip(&offsets)
            .map(|(graph, &offset)| (offset, offset + graph.node_count() as u32))
            .collect();

        let stitched = Self::from_parts(positions, adjacency, floor_ranges);
        stitched.validate_connectivity()?;
        Ok(stitched)
    }

    fn from_parts(
        positions: Vec<Position>,
        adjacency: Vec<SmallVec<[NodeId; 8]>>,
        floor_ranges: Vec<(u32, u32)>,
    ) -> Self {
        assert!(adjacency.len() == positions.len(), "adjacency.len() must equal positions.len()");

        let offsets = std::iter::once(0u32)
            .chain(adjacency.iter()
                .map(|list| list.len() as u32)
                .scan(0u32, |acc, len| { *acc += len; Some(*acc) }))
            .collect();
        let neighbors = adjacency.iter().flatten().copied().collect();
        let edges = adjacency.iter().enumerate()
            .flat_map(|(u, list)| {
                list.iter().filter_map(move |&v| (u < v as usize).then_some((u as NodeId, v)))
            })
            .collect();

        Self { offsets, neighbors, adjacency, edges, positions, floor_ranges }
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.positions.len() }

    /// Get the deduplicated undirected edge list (`u < v`).
    #[inline] pub fn edges(&self) -> &[(NodeId, NodeId)] { &self.edges }

    /// Get all node positions in grid coordinates.
    #[inline] pub fn positions(&self) -> &[Position] { &self.positions }

    /// Per-floor `[start, end)` node-id ranges within the global numbering.
    #[inline] pub fn floor_ranges(&self) -> &[(u32, u32)] { &self.floor_ranges }

    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize..self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Iterate the neighbors of a given node through the CSR layout.
    #[inline]
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.range(node).map(move |i| self.neighbors[i])
    }

    /// Get the sorted neighbor list of a given node.
    #[inline]
    pub fn neighbor_list(&self, node: usize) -> &[NodeId] { &self.adjacency[node] }

    /// Check that every node is reachable from node 0.
    pub fn validate_connectivity(&self) -> Result<(), LayoutError> {
        let total = self.node_count();
        if total == 0 {
            return Ok(());
        }

        let mut visited = vec![false; total];
        let mut queue = VecDeque::from([0usize]);
        visited[0] = true;
        let mut reached = 1usize;
        while let Some(u) = queue.pop_front() {
            for v in self.neighbors(u) {
                if !visited[v as usize] {
                    visited[v as usize] = true;
                    reached += 1;
                    queue.push_back(v as usize);
                }
            }
        }

        if reached != total {
            return Err(LayoutError::Connectivity { unreached: total - reached, total });
        }
        Ok(())
    }
}
