use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NavError {
    #[error("navigation geometry has no triangles")]
    EmptyGeometry,

    #[error("non-indexed geometry needs a multiple of 3 positions, got {0}")]
    UnalignedPositions(usize),

    #[error("index buffer length {0} is not a multiple of 3")]
    UnalignedIndices(usize),

    #[error("index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),

    #[error("weld tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f32),

    #[error("zone {0:?} is not indexed")]
    UnknownZone(String),
}
