//! Stateless operations on slices of tape variables.

use crate::{autodiff::Var, nn::NnError};

/// Apply the rectified linear unit to each element.
pub fn relu<'t>(input: &[Var<'t>]) -> Vec<Var<'t>> {
    input.iter().map(Var::relu).collect()
}

/// Sum of squared differences between `prediction` and `target`.
///
/// # Errors
///
/// Returns an error if the lengths differ or both are empty.
pub fn sse_loss<'t>(prediction: &[Var<'t>], target: &[Var<'t>]) -> Result<Var<'t>, NnError> {
    if prediction.len() != target.len() {
        return Err(NnError::TargetSize {
            prediction: prediction.len(),
            target: target.len(),
        });
    }
    let squares = prediction
        .iter()
        .zip(target)
        .map(|(p, t)| (p - t).square());
    squares
        .reduce(|acc, x| acc + x)
        .ok_or(NnError::EmptyPrediction)
}

/// Mean of squared differences between `prediction` and `target`.
///
/// # Errors
///
/// Returns an error if the lengths differ or both are empty.
pub fn mse_loss<'t>(prediction: &[Var<'t>], target: &[Var<'t>]) -> Result<Var<'t>, NnError> {
    let total = sse_loss(prediction, target)?;
    Ok(total.scale(1.0 / prediction.len() as f32))
}
