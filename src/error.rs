use thiserror::Error;

use crate::{nn::NnError, optim::OptimError, tensor::TensorError};

/// Any error raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A tensor operation failed.
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),

    /// A network could not be built or run.
    #[error("network error: {0}")]
    Nn(#[from] NnError),

    /// An optimizer could not be built or stepped.
    #[error("optimizer error: {0}")]
    Optim(#[from] OptimError),

    /// Writing output failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
