use crate::types::Position;

/// An affine map between real-world coordinates and an `n x n`
/// integer-addressable grid: `grid = (real - offset) / scale * n`.
///
/// `to_grid` and `to_real` are mutually inverse within floating tolerance;
/// neither clamps. Only the lattice enumeration clamps its scan bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalingInfo {
    offset: Position,
    scale: f64,
    n: u32,
}

impl ScalingInfo {
    /// `offset` is the bounding-box min corner; `scale` the max bbox extent
    /// (floored at 1e-6 to keep the map invertible for degenerate floors).
    pub fn new(offset: Position, scale: f64, n: u32) -> Self {
        Self { offset, scale: scale.max(1e-6), n }
    }

    /// Grid resolution per axis.
    #[inline] pub fn n(&self) -> u32 { self.n }

    /// Map a real-world coordinate into grid space.
    #[inline]
    pub fn to_grid(&self, p: Position) -> Position {
        let f = self.n as f64 / self.scale;
        [(p[0] - self.offset[0]) * f, (p[1] - self.offset[1]) * f]
    }

    /// Map a grid coordinate back into real space.
    #[inline]
    pub fn to_real(&self, p: Position) -> Position {
        let f = self.scale / self.n as f64;
        [p[0] * f + self.offset[0], p[1] * f + self.offset[1]]
    }
}
