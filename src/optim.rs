//! Optimizers updating [`Parameter`]s from their accumulated gradients.

use thiserror::Error;

use crate::{
    nn::{NnError, Parameter},
    tensor::TensorError,
};

mod sgd;

pub use sgd::Sgd;

/// Errors raised while configuring or running an optimizer.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum OptimError {
    /// The learning rate is negative or not finite.
    #[error("invalid learning rate: {0}")]
    LearningRate(f32),

    /// The momentum factor is negative or not finite.
    #[error("invalid momentum value: {0}")]
    Momentum(f32),

    /// The weight decay is negative or not finite.
    #[error("invalid weight_decay value: {0}")]
    WeightDecay(f32),

    /// The optimizer was stepped with a different set of parameters than before.
    #[error("optimizer tracks {expected} parameters, got {actual}")]
    ParameterCount {
        /// Parameters seen on the first step.
        expected: usize,
        /// Parameters given now.
        actual: usize,
    },

    /// A parameter rejected its updated value.
    #[error(transparent)]
    Parameter(#[from] NnError),

    /// An underlying tensor operation failed.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// An update rule over a list of parameters.
///
/// Parameters are passed on every call rather than captured, so the same optimizer can be
/// stepped over `module.parameters_mut()` while the module stays usable in between. The order of
/// the list has to be stable across calls.
pub trait Optimizer {
    /// Clear the gradients of every parameter.
    fn zero_grad(&self, params: &mut [&mut Parameter]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Apply one update using the gradients accumulated in each parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter list changed between calls or a parameter changed shape.
    fn step(&mut self, params: &mut [&mut Parameter]) -> Result<(), OptimError>;
}
