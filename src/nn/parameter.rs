use std::cell::RefCell;

use crate::{
    autodiff::{Gradients, Tape, Var},
    nn::NnError,
    tensor::Tensor,
};

/// A learnable tensor together with the gradient accumulated for it.
///
/// Binding a parameter lifts its values onto a tape and remembers where they landed, which is
/// what lets [`Parameter::accumulate_grad`] pick its own entries out of a [`Gradients`]. A
/// parameter may be bound several times in one pass, e.g. when a layer is applied twice.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    value: Tensor,
    grad: Option<Tensor>,
    bindings: RefCell<Vec<usize>>,
}

impl Parameter {
    /// Wrap `value` as a learnable parameter without a gradient.
    pub fn new(name: &'static str, value: Tensor) -> Self {
        Self {
            name,
            value,
            grad: None,
            bindings: RefCell::new(Vec::new()),
        }
    }

    /// Name of the parameter within its layer.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current value.
    pub fn value(&self) -> &Tensor {
        &self.value
    }

    /// Gradient accumulated since the last [`Parameter::zero_grad`], if any.
    pub fn grad(&self) -> Option<&Tensor> {
        self.grad.as_ref()
    }

    /// Lift the parameter onto `tape` and remember the position of its first element.
    pub fn bind<'t>(&self, tape: &'t Tape) -> Vec<Var<'t>> {
        let vars = tape.lift(&self.value);
        if let Some(first) = vars.first() {
            self.bindings.borrow_mut().push(first.index());
        }
        vars
    }

    /// Add the gradients of every binding since the last accumulation to the accumulated
    /// gradient.
    ///
    /// A parameter that has not been bound since its last accumulation is left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if `gradients` does not cover the bound variables.
    pub fn accumulate_grad(&mut self, gradients: &Gradients) -> Result<(), NnError> {
        let bindings = self.bindings.take();
        if bindings.is_empty() {
            return Ok(());
        }
        let elems = self.value.elems();
        let mut total = vec![0.0; elems];
        for start in bindings {
            let slice = gradients
                .slice(start, elems)
                .ok_or_else(|| NnError::MissingGradient(self.name.to_string()))?;
            for (t, g) in total.iter_mut().zip(slice) {
                *t += g;
            }
        }
        let grad = Tensor::new(self.value.shape(), &total)?;
        self.grad = Some(match self.grad.take() {
            Some(prev) => prev.add(&grad)?,
            None => grad,
        });
        Ok(())
    }

    /// Forget the accumulated gradient.
    pub fn zero_grad(&mut self) {
        self.grad = None;
    }

    /// Replace the value, keeping the shape.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` has a different shape.
    pub fn set_value(&mut self, value: Tensor) -> Result<(), NnError> {
        if value.shape() != self.value.shape() {
            return Err(NnError::LayerShape {
                name: self.name.to_string(),
                expected: self.value.shape().to_vec(),
                actual: value.shape().to_vec(),
            });
        }
        self.value = value;
        Ok(())
    }
}
