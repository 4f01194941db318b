/// Which hard ceiling a capacity overflow hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityKind {
    Vertices,
    Indices,
}

impl std::fmt::Display for CapacityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapacityKind::Vertices => f.write_str("vertices"),
            CapacityKind::Indices => f.write_str("indices"),
        }
    }
}

/// Errors raised while building or aggregating geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A vertex or index count exceeds the configured ceiling.
    ///
    /// Fatal for shapes in a tree; immediate-mode batches flush instead.
    CapacityOverflow {
        kind: CapacityKind,
        requested: usize,
        limit: usize,
    },

    /// An operation was called in a state where it cannot apply, e.g. a
    /// bezier continuation with no preceding vertex. Nothing was changed.
    Precondition(&'static str),

    /// The node id does not belong to this tree.
    NodeNotFound(usize),
}

impl std::fmt::Display for GeometryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryError::CapacityOverflow {
                kind,
                requested,
                limit,
            } => write!(
                f,
                "Shape too complex: {} {} requested but the limit is {}",
                requested, kind, limit
            ),
            GeometryError::Precondition(msg) => write!(f, "Invalid geometry operation: {}", msg),
            GeometryError::NodeNotFound(id) => write!(f, "Shape node {} not found", id),
        }
    }
}

impl std::error::Error for GeometryError {}

/// Result type for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;
