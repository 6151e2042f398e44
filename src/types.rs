/// Node identifier within one stage's stitched graph.
pub type NodeId = u32;

/// Dense index of a zone type within a stage's [`crate::TypeIndexMap`].
pub type TypeIndex = usize;

/// Sentinel for a node no wavefront has reached.
pub const UNASSIGNED: i32 = -1;

/// A position in grid space (unit-cell coordinates) or real space (metres).
pub type Position = [f64; 2];
