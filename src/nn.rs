//! Neural network building blocks recorded on an autodiff [`Tape`].

use thiserror::Error;

use crate::{
    autodiff::{Gradients, Tape, Var},
    tensor::TensorError,
};

pub mod functional;
mod linear;
mod loss;
mod parameter;
mod simple_net;

pub use linear::Linear;
pub use loss::{MseLoss, Reduction};
pub use parameter::Parameter;
pub use simple_net::SimpleNet;

/// Errors raised while running a network.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum NnError {
    /// The input does not have as many features as the layer expects.
    #[error("expected {expected} input features, got {actual}")]
    InputSize {
        /// Features the layer was built for.
        expected: usize,
        /// Features actually given.
        actual: usize,
    },

    /// Prediction and target differ in length.
    #[error("prediction has {prediction} elements but target has {target}")]
    TargetSize {
        /// Length of the prediction.
        prediction: usize,
        /// Length of the target.
        target: usize,
    },

    /// A loss was requested over zero elements.
    #[error("cannot compute a loss over an empty prediction")]
    EmptyPrediction,

    /// The gradients were computed on a tape that no longer holds the parameter's variables.
    #[error("gradients do not cover parameter `{0}`")]
    MissingGradient(String),

    /// Two layers or a layer and its parameters do not fit together.
    #[error("layer `{name}` expects shape {expected:?}, got {actual:?}")]
    LayerShape {
        /// Which tensor was rejected.
        name: String,
        /// The shape that would fit.
        expected: Vec<usize>,
        /// The shape that was given.
        actual: Vec<usize>,
    },

    /// An underlying tensor operation failed.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// A network component that owns learnable parameters.
pub trait Module {
    /// Record the forward pass on `tape`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not fit the module.
    fn forward<'t>(&self, tape: &'t Tape, input: &[Var<'t>]) -> Result<Vec<Var<'t>>, NnError>;

    /// All learnable parameters, in a stable order.
    fn parameters(&self) -> Vec<&Parameter>;

    /// All learnable parameters, in the same order as [`Module::parameters`].
    fn parameters_mut(&mut self) -> Vec<&mut Parameter>;

    /// Total number of learnable scalars.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.value().elems()).sum()
    }

    /// Collect the gradients of the last forward pass into each parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if `gradients` came from a different pass than the one the parameters
    /// were bound in.
    fn accumulate_grads(&mut self, gradients: &Gradients) -> Result<(), NnError> {
        for param in self.parameters_mut() {
            param.accumulate_grad(gradients)?;
        }
        Ok(())
    }
}
