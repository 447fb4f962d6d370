//! Defines tensor errors.

use thiserror::Error;

/// An error type for all operations on tensors.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TensorError {
    /// An operation was performed on 2 objects with incompatible shapes.
    #[error("incompatible shapes {0:?} and {1:?}")]
    IncompatibleShapes(Vec<usize>, Vec<usize>),

    /// An operation was performed with an dimension that does not exist.
    #[error("unknown dimension {0}")]
    UnknownDimension(usize),

    /// The number of elements given does not match the number the shape requires.
    #[error("expected {expected} elements, got {actual}")]
    ElementCount {
        /// Number of elements implied by the shape.
        expected: usize,
        /// Number of elements actually provided.
        actual: usize,
    },

    /// A reshape was requested into a shape holding a different number of elements.
    #[error("cannot reshape {from:?} into {to:?}")]
    ReshapeCount {
        /// The original shape.
        from: Vec<usize>,
        /// The requested shape.
        to: Vec<usize>,
    },

    /// A reduction that needs at least one element was applied to an empty tensor.
    #[error("cannot reduce an empty tensor")]
    EmptyReduction,

    /// Sampling bounds that do not describe a non-empty half-open interval.
    #[error("invalid sampling bounds [{low}, {high})")]
    InvalidBounds {
        /// Inclusive lower bound.
        low: f32,
        /// Exclusive upper bound.
        high: f32,
    },
}
