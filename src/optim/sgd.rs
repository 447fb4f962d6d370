use tracing::trace;

use crate::{
    nn::Parameter,
    optim::{OptimError, Optimizer},
    tensor::Tensor,
};

/// Stochastic gradient descent with optional momentum and L2 weight decay.
///
/// For a gradient `g` of a parameter `p` one step computes
///
/// ```text
/// g = g + weight_decay * p
/// b = momentum * b + g        (b = g on the first step)
/// p = p - lr * b
/// ```
///
/// With both factors at 0 this is the plain update `p = p - lr * g`.
#[derive(Debug, Clone)]
pub struct Sgd {
    lr: f32,
    momentum: f32,
    weight_decay: f32,
    buffers: Vec<Option<Tensor>>,
}

impl Sgd {
    /// Plain gradient descent with learning rate `lr`.
    ///
    /// # Errors
    ///
    /// Returns an error if `lr` is negative or not finite.
    pub fn new(lr: f32) -> Result<Self, OptimError> {
        if !lr.is_finite() || lr < 0.0 {
            return Err(OptimError::LearningRate(lr));
        }
        Ok(Self {
            lr,
            momentum: 0.0,
            weight_decay: 0.0,
            buffers: Vec::new(),
        })
    }

    /// Use a momentum factor.
    ///
    /// # Errors
    ///
    /// Returns an error if `momentum` is negative or not finite.
    pub fn with_momentum(mut self, momentum: f32) -> Result<Self, OptimError> {
        if !momentum.is_finite() || momentum < 0.0 {
            return Err(OptimError::Momentum(momentum));
        }
        self.momentum = momentum;
        Ok(self)
    }

    /// Add an L2 penalty to every gradient.
    ///
    /// # Errors
    ///
    /// Returns an error if `weight_decay` is negative or not finite.
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Result<Self, OptimError> {
        if !weight_decay.is_finite() || weight_decay < 0.0 {
            return Err(OptimError::WeightDecay(weight_decay));
        }
        self.weight_decay = weight_decay;
        Ok(self)
    }

    /// The learning rate.
    pub fn lr(&self) -> f32 {
        self.lr
    }

    /// The momentum factor.
    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    /// The L2 penalty factor.
    pub fn weight_decay(&self) -> f32 {
        self.weight_decay
    }
}

impl Optimizer for Sgd {
    fn step(&mut self, params: &mut [&mut Parameter]) -> Result<(), OptimError> {
        if self.buffers.is_empty() {
            self.buffers = vec![None; params.len()];
        } else if self.buffers.len() != params.len() {
            return Err(OptimError::ParameterCount {
                expected: self.buffers.len(),
                actual: params.len(),
            });
        }

        for (param, buffer) in params.iter_mut().zip(self.buffers.iter_mut()) {
            let Some(grad) = param.grad() else {
                continue;
            };
            let mut direction = grad.clone();
            if self.weight_decay != 0.0 {
                direction = direction.add(&param.value().scale(self.weight_decay))?;
            }
            if self.momentum != 0.0 {
                let next = match buffer.take() {
                    Some(prev) => prev.scale(self.momentum).add(&direction)?,
                    None => direction,
                };
                direction = next.clone();
                *buffer = Some(next);
            }
            let updated = param.value().sub(&direction.scale(self.lr))?;
            trace!(name = param.name(), elems = updated.elems(), "sgd update");
            param.set_value(updated)?;
        }
        Ok(())
    }
}
