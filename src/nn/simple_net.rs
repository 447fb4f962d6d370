use std::fmt;

use rand::Rng;

use crate::{
    autodiff::{Tape, Var},
    nn::{functional, Linear, Module, NnError, Parameter},
    tensor::Tensor,
};

/// A two-layer perceptron: `fc2(relu(fc1(x)))` with `fc1: 3 -> 2` and `fc2: 2 -> 1`.
#[derive(Debug, Clone)]
pub struct SimpleNet {
    fc1: Linear,
    fc2: Linear,
}

impl SimpleNet {
    /// Number of input features.
    pub const INPUTS: usize = 3;
    /// Width of the hidden layer.
    pub const HIDDEN: usize = 2;
    /// Number of outputs.
    pub const OUTPUTS: usize = 1;

    /// Create a network with randomly initialized layers.
    ///
    /// # Errors
    ///
    /// Never fails for the fixed layer sizes; the error is propagated from layer construction.
    pub fn new<R>(rng: &mut R) -> Result<Self, NnError>
    where
        R: Rng + ?Sized,
    {
        let fc1 = Linear::new(Self::INPUTS, Self::HIDDEN, rng)?;
        let fc2 = Linear::new(Self::HIDDEN, Self::OUTPUTS, rng)?;
        Self::from_layers(fc1, fc2)
    }

    /// Assemble a network from two existing layers.
    ///
    /// # Errors
    ///
    /// Returns an error if `fc1` does not produce as many features as `fc2` consumes.
    pub fn from_layers(fc1: Linear, fc2: Linear) -> Result<Self, NnError> {
        if fc1.out_features() != fc2.in_features() {
            return Err(NnError::LayerShape {
                name: "fc2.weight".to_string(),
                expected: vec![fc2.out_features(), fc1.out_features()],
                actual: fc2.weight().value().shape().to_vec(),
            });
        }
        Ok(Self { fc1, fc2 })
    }

    /// The first layer.
    pub fn fc1(&self) -> &Linear {
        &self.fc1
    }

    /// The second layer.
    pub fn fc2(&self) -> &Linear {
        &self.fc2
    }

    /// Run the network on a tensor without recording anything.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not have `fc1.in_features()` features.
    pub fn infer(&self, input: &Tensor) -> Result<Tensor, NnError> {
        let hidden = self.fc1.infer(input)?.relu();
        self.fc2.infer(&hidden)
    }
}

impl Module for SimpleNet {
    fn forward<'t>(&self, tape: &'t Tape, input: &[Var<'t>]) -> Result<Vec<Var<'t>>, NnError> {
        let hidden = functional::relu(&self.fc1.forward(tape, input)?);
        self.fc2.forward(tape, &hidden)
    }

    fn parameters(&self) -> Vec<&Parameter> {
        let mut params = self.fc1.parameters();
        params.extend(self.fc2.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        let mut params = self.fc1.parameters_mut();
        params.extend(self.fc2.parameters_mut());
        params
    }
}

impl fmt::Display for SimpleNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SimpleNet(")?;
        writeln!(f, "  (fc1): {}", self.fc1)?;
        writeln!(f, "  (fc2): {}", self.fc2)?;
        write!(f, ")")
    }
}
