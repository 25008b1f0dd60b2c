use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// The first group is recoverable: every variant is surfaced at the call
/// boundary of the triggering request and leaves all other state untouched.
/// `DisjointnessViolation` and `InvariantViolation` are fatal: they indicate
/// a bug in path-pair computation or in occupancy bookkeeping, and must be
/// propagated to the top of the run instead of being caught and retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no candidate combination satisfies reach and spectrum constraints for demand '{0}'")]
    NoFeasiblePath(String),

    #[error("assignment overlaps existing occupancy on fiber {fiber} slot {slot}")]
    ResourceConflict { fiber: usize, slot: usize },

    #[error("unknown {kind} '{id}'")]
    NotFound { kind: &'static str, id: String },

    #[error("computed path pair for '{src}' -> '{target}' fails the {disjointness} disjointness post-condition")]
    DisjointnessViolation { src: String, target: String, disjointness: String },

    #[error("incremental occupancy grid diverged from recomputed ground truth at fiber {fiber} slot {slot}")]
    InvariantViolation { fiber: usize, slot: usize },

    #[error("file not found or could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse scenario JSON: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("failed to build internal network model: {0}")]
    ModelConstruction(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound { kind, id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
