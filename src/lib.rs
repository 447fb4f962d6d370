//! Tensors, scalar reverse-mode autodiff and just enough of a neural network toolkit to train a
//! two-layer perceptron with stochastic gradient descent.

#![deny(unsafe_code, rust_2018_idioms, rust_2021_compatibility)]
#![warn(missing_docs)]

pub mod autodiff;
mod error;
pub mod nn;
pub mod optim;
pub mod tensor;
pub mod tutorial;

pub use error::Error;
