use std::fmt;

use rand::Rng;

use crate::{
    autodiff::{Tape, Var},
    nn::{Module, NnError, Parameter},
    tensor::Tensor,
};

/// An affine layer computing `W x + b`, with `W` of shape `[out_features, in_features]`.
#[derive(Debug, Clone)]
pub struct Linear {
    weight: Parameter,
    bias: Parameter,
}

impl Linear {
    /// Create a layer with weights and bias drawn from `U(-1/sqrt(in), 1/sqrt(in))`.
    ///
    /// # Errors
    ///
    /// Returns an error if `in_features` is 0.
    pub fn new<R>(in_features: usize, out_features: usize, rng: &mut R) -> Result<Self, NnError>
    where
        R: Rng + ?Sized,
    {
        let bound = 1.0 / (in_features as f32).sqrt();
        let weight = Tensor::uniform(&[out_features, in_features], -bound, bound, rng)?;
        let bias = Tensor::uniform(&[out_features], -bound, bound, rng)?;
        Self::from_tensors(weight, bias)
    }

    /// Create a layer from explicit weights and bias.
    ///
    /// # Errors
    ///
    /// Returns an error if `weight` is not a matrix with at least one column, or `bias` does not
    /// have one entry per row.
    pub fn from_tensors(weight: Tensor, bias: Tensor) -> Result<Self, NnError> {
        let out_features = match *weight.shape() {
            [out_features, in_features] if in_features > 0 => out_features,
            _ => {
                return Err(NnError::LayerShape {
                    name: "weight".to_string(),
                    expected: vec![bias.elems(), 1],
                    actual: weight.shape().to_vec(),
                })
            }
        };
        if bias.shape() != [out_features].as_slice() {
            return Err(NnError::LayerShape {
                name: "bias".to_string(),
                expected: vec![out_features],
                actual: bias.shape().to_vec(),
            });
        }
        Ok(Self {
            weight: Parameter::new("weight", weight),
            bias: Parameter::new("bias", bias),
        })
    }

    /// Number of input features.
    pub fn in_features(&self) -> usize {
        self.weight.value().shape()[1]
    }

    /// Number of output features.
    pub fn out_features(&self) -> usize {
        self.weight.value().shape()[0]
    }

    /// The weight matrix.
    pub fn weight(&self) -> &Parameter {
        &self.weight
    }

    /// The bias vector.
    pub fn bias(&self) -> &Parameter {
        &self.bias
    }

    /// Apply the layer to a tensor without recording anything.
    ///
    /// `input` is either one sample `[in_features]` or a batch `[n, in_features]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the last axis of `input` is not `in_features` long.
    pub fn infer(&self, input: &Tensor) -> Result<Tensor, NnError> {
        let features = input.shape().last().copied().unwrap_or(0);
        if features != self.in_features() || input.shape().len() > 2 {
            return Err(NnError::InputSize {
                expected: self.in_features(),
                actual: features,
            });
        }
        let weight = self.weight.value();
        let out = match input.shape().len() {
            1 => weight.matmul(input)?,
            _ => input.matmul(&weight.transpose(0, 1)?)?,
        };
        Ok(out.add(self.bias.value())?)
    }
}

impl Module for Linear {
    fn forward<'t>(&self, tape: &'t Tape, input: &[Var<'t>]) -> Result<Vec<Var<'t>>, NnError> {
        let in_features = self.in_features();
        if input.len() != in_features {
            return Err(NnError::InputSize {
                expected: in_features,
                actual: input.len(),
            });
        }
        let weights = self.weight.bind(tape);
        let biases = self.bias.bind(tape);
        Ok(weights
            .chunks(in_features)
            .zip(&biases)
            .map(|(row, b)| {
                row.iter()
                    .zip(input)
                    .fold(b.identity(), |acc, (w, x)| &acc + &(w * x))
            })
            .collect())
    }

    fn parameters(&self) -> Vec<&Parameter> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter> {
        vec![&mut self.weight, &mut self.bias]
    }
}

impl fmt::Display for Linear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Linear(in_features={}, out_features={}, bias=True)",
            self.in_features(),
            self.out_features()
        )
    }
}
