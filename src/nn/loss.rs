use std::fmt;

use crate::{
    autodiff::{Tape, Var},
    nn::{functional, NnError},
    tensor::Tensor,
};

/// How per-element squared errors are combined into one loss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Reduction {
    /// Average over elements.
    #[default]
    Mean,
    /// Sum over elements.
    Sum,
}

/// Mean squared error criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MseLoss {
    reduction: Reduction,
}

impl MseLoss {
    /// A criterion using the given reduction.
    pub fn new(reduction: Reduction) -> Self {
        Self { reduction }
    }

    /// The configured reduction.
    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Compare a prediction against target variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ or both are empty.
    pub fn forward<'t>(
        &self,
        prediction: &[Var<'t>],
        target: &[Var<'t>],
    ) -> Result<Var<'t>, NnError> {
        match self.reduction {
            Reduction::Mean => functional::mse_loss(prediction, target),
            Reduction::Sum => functional::sse_loss(prediction, target),
        }
    }

    /// Compare a prediction against a constant target tensor, lifting the target onto `tape`.
    ///
    /// # Errors
    ///
    /// Returns an error if the lengths differ or both are empty.
    pub fn against<'t>(
        &self,
        tape: &'t Tape,
        prediction: &[Var<'t>],
        target: &Tensor,
    ) -> Result<Var<'t>, NnError> {
        let target = tape.lift(target);
        self.forward(prediction, &target)
    }
}

impl fmt::Display for MseLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reduction {
            Reduction::Mean => write!(f, "MSELoss()"),
            Reduction::Sum => write!(f, "MSELoss(reduction='sum')"),
        }
    }
}
