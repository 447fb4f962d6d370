//! Reverse-mode automatic differentiation on scalars. This implementation uses a tape to store
//! the computation graph.
//!
//! Tensors are brought onto the tape element by element with [`Tape::lift`], so every learnable
//! number becomes one [`Var`]. That keeps each node's local derivative a pair of plain floats.

use std::{
    cell::{Cell, RefCell},
    ops::{Add, Div, Mul, Neg, Sub},
    ptr,
};

use crate::tensor::Tensor;

/// A node in the computation graph holding the index of the nodes it depends on and the gradients
/// of the output with respect to each of the input.
#[derive(Debug)]
struct Node {
    from: [usize; 2],
    grad: [f32; 2],
}

/// A tape recording the computation graph where each element holds the local derivatives
/// of a variable with respect to variables that it directly depends on.
#[derive(Debug, Default)]
pub struct Tape {
    nodes: RefCell<Vec<Node>>,
    marked_position: Cell<usize>,
}

impl Tape {
    /// Get the number of nodes in the tape.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Check if the tape is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all nodes from the tape and forget the mark.
    pub fn clear(&self) {
        self.nodes.borrow_mut().clear();
        self.marked_position.set(0);
    }

    /// Save the current size of the tape.
    pub fn mark(&self) {
        self.marked_position.set(self.len());
    }

    /// Remove all nodes recorded after the last [`Tape::mark`].
    pub fn clean(&self) {
        let mut nodes = self.nodes.borrow_mut();
        let marked = self.marked_position.get().min(nodes.len());
        nodes.truncate(marked);
    }

    /// Add a node to the tape and return its index.
    fn add_node(&self, from_x: usize, from_y: usize, grad_x: f32, grad_y: f32) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        let index = nodes.len();
        nodes.push(Node {
            grad: [grad_x, grad_y],
            from: [from_x, from_y],
        });
        index
    }

    /// Add a variable to the tape and return it. A variable created this way does not depends on
    /// any other variable.
    pub fn var(&self, value: f32) -> Var<'_> {
        let index = {
            let id = self.len();
            self.add_node(id, id, 0.0, 0.0)
        };
        Var {
            value,
            index,
            tape: self,
        }
    }

    /// Add one independent variable per element of `tensor`, in row-major order. The variables
    /// occupy consecutive indices on the tape.
    pub fn lift(&self, tensor: &Tensor) -> Vec<Var<'_>> {
        tensor.iter().map(|x| self.var(x)).collect()
    }

    /// Sum the given variables. An empty slice sums to a fresh zero.
    pub fn sum<'t>(&'t self, vars: &[Var<'t>]) -> Var<'t> {
        match vars.split_first() {
            Some((first, rest)) => rest.iter().fold(first.identity(), |acc, v| &acc + v),
            None => self.var(0.0),
        }
    }
}

/// A variable in the computation graph. Operation on variables return new variables and do not
/// mutate the original ones.
#[derive(Debug, Clone, Copy)]
pub struct Var<'t> {
    value: f32,
    index: usize,
    tape: &'t Tape,
}

impl<'t> Var<'t> {
    /// The value computed in the forward pass.
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Position of this variable on its tape.
    pub fn index(&self) -> usize {
        self.index
    }

    fn unary(&self, value: f32, grad: f32) -> Self {
        Var {
            value,
            index: self.tape.add_node(self.index, self.index, grad, 0.0),
            tape: self.tape,
        }
    }

    fn binary(&self, rhs: &Self, value: f32, grad_x: f32, grad_y: f32) -> Self {
        assert!(
            ptr::eq(self.tape, rhs.tape),
            "variables must be recorded on the same tape"
        );
        Var {
            value,
            index: self.tape.add_node(self.index, rhs.index, grad_x, grad_y),
            tape: self.tape,
        }
    }

    /// Compute the gradient of this variable with respect to every variable on the tape.
    ///
    /// # Panics
    ///
    /// Panics if the tape was cleared or cleaned after this variable was recorded.
    pub fn backward(&self) -> Gradients {
        let nodes = self.tape.nodes.borrow();
        assert!(
            self.index < nodes.len(),
            "variable was recorded before the tape was cleared"
        );
        let mut gradients = vec![0.0; nodes.len()];
        gradients[self.index] = 1.0;
        // Nodes recorded after this one cannot contribute to it.
        for (idx, n) in nodes.iter().enumerate().take(self.index + 1).rev() {
            let adjoint = gradients[idx];
            if adjoint == 0.0 {
                continue;
            }
            gradients[n.from[0]] += n.grad[0] * adjoint;
            gradients[n.from[1]] += n.grad[1] * adjoint;
        }
        Gradients(gradients)
    }

    /// A copy of this variable recorded as a new node.
    pub fn identity(&self) -> Self {
        self.unary(self.value, 1.0)
    }

    /// The rectified linear unit. The derivative at 0 is taken to be 0.
    pub fn relu(&self) -> Self {
        if self.value > 0.0 {
            self.unary(self.value, 1.0)
        } else {
            self.unary(0.0, 0.0)
        }
    }

    /// The logistic function.
    pub fn sigmoid(&self) -> Self {
        let value = 1.0 / (1.0 + (-self.value).exp());
        self.unary(value, value * (1.0 - value))
    }

    /// The value multiplied by a constant.
    pub fn scale(&self, factor: f32) -> Self {
        self.unary(self.value * factor, factor)
    }

    /// The value squared.
    pub fn square(&self) -> Self {
        self.unary(self.value * self.value, 2.0 * self.value)
    }
}

impl<'t> Add for &Var<'t> {
    type Output = Var<'t>;

    fn add(self, rhs: Self) -> Self::Output {
        self.binary(rhs, self.value + rhs.value, 1.0, 1.0)
    }
}

impl<'t> Sub for &Var<'t> {
    type Output = Var<'t>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.binary(rhs, self.value - rhs.value, 1.0, -1.0)
    }
}

impl<'t> Mul for &Var<'t> {
    type Output = Var<'t>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.binary(rhs, self.value * rhs.value, rhs.value, self.value)
    }
}

impl<'t> Div for &Var<'t> {
    type Output = Var<'t>;

    fn div(self, rhs: Self) -> Self::Output {
        self.binary(
            rhs,
            self.value / rhs.value,
            1.0 / rhs.value,
            -self.value / (rhs.value * rhs.value),
        )
    }
}

impl<'t> Neg for &Var<'t> {
    type Output = Var<'t>;

    fn neg(self) -> Self::Output {
        self.unary(-self.value, -1.0)
    }
}

macro_rules! owned_binary_op {
    ($($trait:ident::$method:ident),*) => {
        $(
            impl<'t> $trait for Var<'t> {
                type Output = Var<'t>;

                fn $method(self, rhs: Self) -> Self::Output {
                    (&self).$method(&rhs)
                }
            }
        )*
    };
}

owned_binary_op!(Add::add, Sub::sub, Mul::mul, Div::div);

impl<'t> Neg for Var<'t> {
    type Output = Var<'t>;

    fn neg(self) -> Self::Output {
        -&self
    }
}

/// Adjoints of one output with respect to every variable on the tape, indexed by
/// [`Var::index`].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients(Vec<f32>);

impl Gradients {
    /// The gradient with respect to `var`.
    ///
    /// # Panics
    ///
    /// Panics if `var` was recorded after these gradients were computed.
    pub fn wrt(&self, var: &Var<'_>) -> f32 {
        self.0[var.index]
    }

    /// The gradient at a tape index.
    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    /// The gradients for `len` consecutive tape indices starting at `start`.
    pub fn slice(&self, start: usize, len: usize) -> Option<&[f32]> {
        self.0.get(start..start.checked_add(len)?)
    }

    /// Number of tape entries covered.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tape entries are covered.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
