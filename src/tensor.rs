//! An N-dimensional array of `f32`.

use std::{ops, sync::Arc};

use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

mod display;
mod error;
pub mod layout;

pub use error::TensorError;
pub use layout::Layout;

use layout::{broadcast_shape, IndexIter, Reshaped};

/// An immutable tensor of `f32` values.
///
/// Operations never mutate their operands. Views such as [`Tensor::view`] and
/// [`Tensor::transpose`] share the underlying buffer, everything else allocates a new one. For
/// convenience, binary operations are broadcasted and the arithmetic operators from [`std::ops`]
/// are implemented on references.
#[derive(Debug, Clone)]
pub struct Tensor {
    buffer: Arc<[f32]>,
    layout: Layout,
}

impl ops::Add<Self> for &Tensor {
    type Output = Tensor;

    fn add(self, other: Self) -> Self::Output {
        Tensor::add(self, other).expect("tensors can be broadcasted")
    }
}

impl ops::Sub<Self> for &Tensor {
    type Output = Tensor;

    fn sub(self, other: Self) -> Self::Output {
        Tensor::sub(self, other).expect("tensors can be broadcasted")
    }
}

impl ops::Mul<Self> for &Tensor {
    type Output = Tensor;

    fn mul(self, other: Self) -> Self::Output {
        Tensor::mul(self, other).expect("tensors can be broadcasted")
    }
}

impl ops::Div<Self> for &Tensor {
    type Output = Tensor;

    fn div(self, other: Self) -> Self::Output {
        Tensor::div(self, other).expect("tensors can be broadcasted")
    }
}

impl ops::Neg for &Tensor {
    type Output = Tensor;

    fn neg(self) -> Self::Output {
        self.map(|x| -x)
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.iter().eq(other.iter())
    }
}

impl From<f32> for Tensor {
    fn from(value: f32) -> Self {
        Self::scalar(value)
    }
}

impl From<Vec<f32>> for Tensor {
    fn from(data: Vec<f32>) -> Self {
        let layout = Layout::contiguous(&[data.len()]);
        Self {
            buffer: data.into(),
            layout,
        }
    }
}

impl<const N: usize> From<[f32; N]> for Tensor {
    fn from(data: [f32; N]) -> Self {
        Self {
            buffer: Arc::from(data.as_slice()),
            layout: Layout::contiguous(&[N]),
        }
    }
}

impl<const M: usize, const N: usize> From<[[f32; N]; M]> for Tensor {
    fn from(data: [[f32; N]; M]) -> Self {
        Self {
            buffer: data.iter().flatten().copied().collect(),
            layout: Layout::contiguous(&[M, N]),
        }
    }
}

impl<'a> IntoIterator for &'a Tensor {
    type Item = f32;
    type IntoIter = TensorIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        TensorIter {
            tensor: self,
            indices: self.layout.iter(),
        }
    }
}

impl Tensor {
    /// Create a tensor given its shape and data.
    ///
    /// The order of the elements in `data` is in increasing order of the last axis, then the
    /// second last, and so on.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` does not hold exactly as many elements as `shape` requires.
    pub fn new(shape: &[usize], data: &[f32]) -> Result<Self, TensorError> {
        let layout = Layout::contiguous(shape);
        if layout.elems() != data.len() {
            return Err(TensorError::ElementCount {
                expected: layout.elems(),
                actual: data.len(),
            });
        }
        Ok(Self {
            buffer: Arc::from(data),
            layout,
        })
    }

    /// Create a scalar holding the given value.
    ///
    /// This is a special tensor that has no shape.
    pub fn scalar(value: f32) -> Self {
        Self {
            buffer: Arc::from([value].as_slice()),
            layout: Layout::scalar(),
        }
    }

    /// Create a tensor given its shape filled with a single value.
    pub fn full(shape: &[usize], value: f32) -> Self {
        let layout = Layout::contiguous(shape);
        Self {
            buffer: vec![value; layout.elems()].into(),
            layout,
        }
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Create a tensor with values sampled uniformly from `[0, 1)`.
    pub fn rand<R>(shape: &[usize], rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::sample(shape, rng, rand::distributions::Standard)
    }

    /// Create a tensor with values sampled from the standard normal distribution.
    pub fn randn<R>(shape: &[usize], rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        Self::sample(shape, rng, StandardNormal)
    }

    /// Create a tensor with values sampled uniformly from `[low, high)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is empty, not finite, or too wide to represent.
    pub fn uniform<R>(
        shape: &[usize],
        low: f32,
        high: f32,
        rng: &mut R,
    ) -> Result<Self, TensorError>
    where
        R: Rng + ?Sized,
    {
        let finite = low.is_finite() && high.is_finite() && (high - low).is_finite();
        if !(finite && low < high) {
            return Err(TensorError::InvalidBounds { low, high });
        }
        Ok(Self::sample(shape, rng, Uniform::new(low, high)))
    }

    fn sample<R, D>(shape: &[usize], rng: &mut R, distribution: D) -> Self
    where
        R: Rng + ?Sized,
        D: Distribution<f32>,
    {
        let layout = Layout::contiguous(shape);
        let buffer = (0..layout.elems()).map(|_| distribution.sample(rng)).collect();
        Self { buffer, layout }
    }

    /// Return the shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        self.layout.shape()
    }

    /// Return the layout of the tensor.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Return the number of elements.
    pub fn elems(&self) -> usize {
        self.layout.elems()
    }

    /// Create row-major iterator over the tensor.
    #[must_use]
    pub fn iter(&self) -> TensorIter<'_> {
        self.into_iter()
    }

    /// Collect all elements of the tensor into a [`Vec`].
    #[must_use]
    pub fn ravel(&self) -> Vec<f32> {
        self.iter().collect()
    }

    /// Return the element at the given index, or [`None`] if it is out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f32> {
        if index.len() != self.layout.rank()
            || index.iter().zip(self.shape()).any(|(&i, &s)| i >= s)
        {
            return None;
        }
        Some(self.buffer[self.layout.translate(index)])
    }

    /// Return the value of a tensor holding exactly one element.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor holds more or fewer than one element.
    pub fn item(&self) -> Result<f32, TensorError> {
        match self.elems() {
            // Without offsets, the all-zeros index always sits at the start of the buffer.
            1 => Ok(self.buffer[0]),
            actual => Err(TensorError::ElementCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Add `other` to `self`, element-wise.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcasted.
    pub fn add(&self, other: &Self) -> Result<Self, TensorError> {
        self.broadcast(other, |x, y| x + y)
    }

    /// Subtract `other` from `self`, element-wise.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcasted.
    pub fn sub(&self, other: &Self) -> Result<Self, TensorError> {
        self.broadcast(other, |x, y| x - y)
    }

    /// Multiply `self` by `other`, element-wise.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcasted.
    pub fn mul(&self, other: &Self) -> Result<Self, TensorError> {
        self.broadcast(other, |x, y| x * y)
    }

    /// Divide `self` by `other`, element-wise.
    ///
    /// # Errors
    ///
    /// Returns an error if the shapes cannot be broadcasted.
    pub fn div(&self, other: &Self) -> Result<Self, TensorError> {
        self.broadcast(other, |x, y| x / y)
    }

    /// Multiply every element by `factor`.
    #[must_use]
    pub fn scale(&self, factor: f32) -> Self {
        self.map(|x| x * factor)
    }

    /// Apply the rectified linear unit to each element.
    #[must_use]
    pub fn relu(&self) -> Self {
        self.map(|x| x.max(0.0))
    }

    /// Square each element.
    #[must_use]
    pub fn square(&self) -> Self {
        self.map(|x| x * x)
    }

    /// Sum of all elements as a scalar tensor.
    #[must_use]
    pub fn sum(&self) -> Self {
        Self::scalar(self.iter().sum())
    }

    /// Arithmetic mean of all elements as a scalar tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensor has no elements.
    pub fn mean(&self) -> Result<Self, TensorError> {
        match self.elems() {
            0 => Err(TensorError::EmptyReduction),
            n => Ok(Self::scalar(self.iter().sum::<f32>() / n as f32)),
        }
    }

    /// Reduce along the given axes by summing all elements. Reduced axes are kept with size 1.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the axes does not exist.
    pub fn sum_axes(&self, axes: &[usize]) -> Result<Self, TensorError> {
        let (layout, reducer) = self.layout.reduce(axes)?;
        let mut buffer = vec![0.0; layout.elems()];
        for idx in &self.layout {
            buffer[reducer.translate(&idx)] += self.buffer[self.layout.translate(&idx)];
        }
        Ok(Self {
            buffer: buffer.into(),
            layout,
        })
    }

    /// Return the same elements under a different shape.
    ///
    /// The buffer is shared whenever the current layout is contiguous.
    ///
    /// # Errors
    ///
    /// Returns an error if the new shape holds a different number of elements.
    pub fn view(&self, shape: &[usize]) -> Result<Self, TensorError> {
        match self.layout.reshape(shape)? {
            Reshaped::InPlace(layout) => Ok(Self {
                buffer: Arc::clone(&self.buffer),
                layout,
            }),
            Reshaped::Copy => Ok(Self {
                buffer: self.iter().collect(),
                layout: Layout::contiguous(shape),
            }),
        }
    }

    /// Alias of [`Tensor::view`].
    ///
    /// # Errors
    ///
    /// Returns an error if the new shape holds a different number of elements.
    pub fn reshape(&self, shape: &[usize]) -> Result<Self, TensorError> {
        self.view(shape)
    }

    /// Swap two axes without copying.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the axes does not exist.
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self, TensorError> {
        Ok(Self {
            buffer: Arc::clone(&self.buffer),
            layout: self.layout.transpose(dim0, dim1)?,
        })
    }

    /// Matrix product for vectors and matrices.
    ///
    /// Supported operands are `[k] x [k]` (a scalar), `[m, k] x [k]`, `[k] x [k, n]` and
    /// `[m, k] x [k, n]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the inner dimensions disagree or an operand has more than 2 axes.
    pub fn matmul(&self, other: &Self) -> Result<Self, TensorError> {
        let mismatch =
            || TensorError::IncompatibleShapes(self.shape().to_vec(), other.shape().to_vec());
        let (m, k) = match *self.shape() {
            [k] => (None, k),
            [m, k] => (Some(m), k),
            _ => return Err(mismatch()),
        };
        let (k2, n) = match *other.shape() {
            [k] => (k, None),
            [k, n] => (k, Some(n)),
            _ => return Err(mismatch()),
        };
        if k != k2 {
            return Err(mismatch());
        }

        let lhs = |i: usize, p: usize| match m {
            Some(_) => self.buffer[self.layout.translate(&[i, p])],
            None => self.buffer[self.layout.translate(&[p])],
        };
        let rhs = |p: usize, j: usize| match n {
            Some(_) => other.buffer[other.layout.translate(&[p, j])],
            None => other.buffer[other.layout.translate(&[p])],
        };
        let rows = m.unwrap_or(1);
        let cols = n.unwrap_or(1);
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push((0..k).map(|p| lhs(i, p) * rhs(p, j)).sum());
            }
        }
        let shape: Vec<usize> = m.into_iter().chain(n).collect();
        Self::new(&shape, &data)
    }

    /// Apply `op` to each element.
    #[must_use]
    pub fn map<F>(&self, op: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            buffer: self.iter().map(op).collect(),
            layout: Layout::contiguous(self.shape()),
        }
    }

    /// Broadcast both tensors to a common shape and combine their elements with `op`.
    fn broadcast<F>(&self, other: &Self, op: F) -> Result<Self, TensorError>
    where
        F: Fn(f32, f32) -> f32,
    {
        let shape = broadcast_shape(self.shape(), other.shape())?;
        let lhs = self.layout.expand(&shape)?;
        let rhs = other.layout.expand(&shape)?;
        let layout = Layout::contiguous(&shape);
        let buffer = layout
            .iter()
            .map(|idx| {
                op(
                    self.buffer[lhs.translate(&idx)],
                    other.buffer[rhs.translate(&idx)],
                )
            })
            .collect();
        Ok(Self { buffer, layout })
    }
}

/// A row-major iterator over a tensor.
#[derive(Debug)]
pub struct TensorIter<'a> {
    tensor: &'a Tensor,
    indices: IndexIter<'a>,
}

impl Iterator for TensorIter<'_> {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        self.indices
            .next()
            .map(|idx| self.tensor.buffer[self.tensor.layout.translate(&idx)])
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn assert_floats_eq(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        assert!(
            a.iter()
                .zip(b.iter())
                .all(|(a, b)| (a - b).abs() <= f32::EPSILON),
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn new_checks_element_count() {
        assert_eq!(
            Tensor::new(&[2, 2], &[1.0, 2.0, 3.0]),
            Err(TensorError::ElementCount {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn arithmetics() {
        let t = Tensor::from([1.0, 2.0, 3.0]);
        assert_eq!((&t + &t).ravel(), vec![2.0, 4.0, 6.0]);
        assert_eq!((&t * &t).ravel(), vec![1.0, 4.0, 9.0]);
        assert_eq!((&t - &t).ravel(), vec![0.0, 0.0, 0.0]);
        assert_eq!((&t / &t).ravel(), vec![1.0, 1.0, 1.0]);
        assert_eq!((-&t).ravel(), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn broadcasted_add() {
        let t0 = Tensor::new(&[2, 3], &[0., 1., 2., 3., 4., 5.]).unwrap();
        let t1 = Tensor::new(&[2, 1], &[0., 1.]).unwrap();
        let res = &t0 + &t1;
        assert_eq!(res.shape(), &[2, 3]);
        assert_floats_eq(&res.ravel(), &[0., 1., 2., 4., 5., 6.]);

        let res = &t1 + &t0;
        assert_floats_eq(&res.ravel(), &[0., 1., 2., 4., 5., 6.]);

        let res = &t0 + &Tensor::scalar(1.0);
        assert_floats_eq(&res.ravel(), &[1., 2., 3., 4., 5., 6.]);

        assert!(t0.add(&Tensor::from([1.0, 2.0])).is_err());
    }

    #[test]
    fn reductions() {
        let t = Tensor::from([1.0, 2.0, 3.0]);
        assert_eq!(t.sum(), Tensor::scalar(6.0));
        assert_eq!(t.mean().unwrap(), Tensor::scalar(2.0));
        assert_eq!(Tensor::zeros(&[0]).mean(), Err(TensorError::EmptyReduction));

        let m = Tensor::new(&[2, 2], &[0., 1., 2., 3.]).unwrap();
        assert_floats_eq(&m.sum_axes(&[0]).unwrap().ravel(), &[2., 4.]);
        assert_floats_eq(&m.sum_axes(&[1]).unwrap().ravel(), &[1., 5.]);
        assert_eq!(m.sum_axes(&[0, 1]).unwrap().shape(), &[1, 1]);
    }

    #[test]
    fn view_shares_buffer() {
        let t = Tensor::from([1.0, 2.0, 3.0]);
        let v = t.view(&[3, 1]).unwrap();
        assert!(Arc::ptr_eq(&t.buffer, &v.buffer));
        assert_eq!(v.shape(), &[3, 1]);
        assert_eq!(v.elems(), t.elems());
        assert!(t.view(&[2, 2]).is_err());
    }

    #[test]
    fn view_of_transpose_copies() {
        let t = Tensor::new(&[2, 3], &[0., 1., 2., 3., 4., 5.]).unwrap();
        let v = t.transpose(0, 1).unwrap().view(&[6]).unwrap();
        assert_eq!(v.ravel(), vec![0., 3., 1., 4., 2., 5.]);
    }

    #[test]
    fn matmul() {
        let w = Tensor::new(&[2, 3], &[1., 0., -1., 2., 1., 0.]).unwrap();
        let x = Tensor::from([1.0, 2.0, 3.0]);
        let r = w.matmul(&x).unwrap();
        assert_eq!(r.shape(), &[2]);
        assert_floats_eq(&r.ravel(), &[-2., 4.]);

        let r = x.matmul(&x).unwrap();
        assert_eq!(r.shape(), &[] as &[usize]);
        assert_floats_eq(&r.ravel(), &[14.]);

        let r = w.matmul(&w.transpose(0, 1).unwrap()).unwrap();
        assert_eq!(r.shape(), &[2, 2]);
        assert_floats_eq(&r.ravel(), &[2., 2., 2., 5.]);

        assert!(x.matmul(&w).is_err());
    }

    #[test]
    fn generators() {
        let mut rng = StdRng::seed_from_u64(7);
        let r = Tensor::rand(&[2, 3], &mut rng);
        assert_eq!(r.shape(), &[2, 3]);
        assert!(r.iter().all(|x| (0.0..1.0).contains(&x)));

        let u = Tensor::uniform(&[100], -0.5, 0.5, &mut rng).unwrap();
        assert!(u.iter().all(|x| (-0.5..0.5).contains(&x)));
        assert!(Tensor::uniform(&[1], 1.0, 1.0, &mut rng).is_err());
        assert_eq!(
            Tensor::uniform(&[1], -f32::MAX, f32::MAX, &mut rng),
            Err(TensorError::InvalidBounds {
                low: -f32::MAX,
                high: f32::MAX
            })
        );

        assert_eq!(Tensor::zeros(&[2, 3]).ravel(), vec![0.0; 6]);
        assert_eq!(Tensor::ones(&[2, 3]).ravel(), vec![1.0; 6]);
    }

    #[test]
    fn item_and_get() {
        assert_eq!(Tensor::scalar(4.0).item(), Ok(4.0));
        assert_eq!(Tensor::from([4.0]).item(), Ok(4.0));
        assert!(Tensor::from([1.0, 2.0]).item().is_err());

        let m = Tensor::from([[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m.get(&[1, 0]), Some(3.0));
        assert_eq!(m.get(&[2, 0]), None);
        assert_eq!(m.get(&[0]), None);
    }
}
