/// Fatal failures surfaced by the layout core.
///
/// Non-fatal conditions (a zero-node floor, a rule naming an unknown zone)
/// degrade to warnings and empty collections instead of appearing here.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The usable polygon (boundary minus obstacles) of a floor is empty.
    #[error("usable polygon for floor '{floor}' is empty")]
    Geometry { floor: String },

    /// The stitched multi-floor graph is not a single connected component.
    #[error(
        "stitched graph is not fully connected ({unreached} of {total} nodes unreachable); \
         check that every floor has geometry and that connectors form a continuous path"
    )]
    Connectivity { unreached: usize, total: usize },

    /// Malformed run parameters or zone catalog.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An optimization stage produced no survivors.
    #[error("optimization produced no surviving layouts")]
    EmptyResult,
}
