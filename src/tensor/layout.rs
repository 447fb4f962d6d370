//! Describes how a tensor is laid out in its memory buffer.

use super::error::TensorError;

/// A layout maps an n-dimensional index to a position in a flat buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    /// The number of elements in each axis.
    shape: Box<[usize]>,

    /// The number of elements in the memory array that need to be skipped to move to the next
    /// element in each axis.
    strides: Box<[usize]>,
}

impl From<&[usize]> for Layout {
    fn from(shape: &[usize]) -> Self {
        Self::contiguous(shape)
    }
}

impl<const N: usize> From<&[usize; N]> for Layout {
    fn from(shape: &[usize; N]) -> Self {
        Self::contiguous(shape)
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = Box<[usize]>;
    type IntoIter = IndexIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        IndexIter {
            layout: self,
            index: Box::from(vec![0; self.shape.len()]),
            exhausted: self.elems() == 0,
        }
    }
}

impl Layout {
    /// Creates a contiguous row-major layout based on the given shape.
    pub fn contiguous(shape: &[usize]) -> Self {
        if shape.is_empty() {
            return Self::scalar();
        }
        // Go backwards through the shape to calculate the strides. The last strides is always 1.
        let mut strides = vec![1; shape.len()].into_boxed_slice();
        for idx in (0..shape.len() - 1).rev() {
            strides[idx] = strides[idx + 1] * shape[idx + 1];
        }
        Self {
            shape: Box::from(shape),
            strides,
        }
    }

    /// Returns the layout for a scalar, which has no shape nor strides.
    pub fn scalar() -> Self {
        Self::default()
    }

    /// The number of elements in each axis.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// The buffer step for each axis.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Returns the number of elements in the tensor having this layout.
    pub fn elems(&self) -> usize {
        self.shape.iter().product()
    }

    /// Whether walking indices in row-major order visits buffer positions `0, 1, 2, ...`.
    pub fn is_contiguous(&self) -> bool {
        let mut expected = 1;
        for (&size, &stride) in self.shape.iter().zip(self.strides.iter()).rev() {
            if size == 1 {
                continue;
            }
            if stride != expected {
                return false;
            }
            expected *= size;
        }
        true
    }

    /// Creates a row-major iterator over all indices of the tensor.
    pub fn iter(&self) -> IndexIter<'_> {
        self.into_iter()
    }

    /// Translates a tensor index into a position in the data buffer.
    pub fn translate(&self, index: &[usize]) -> usize {
        let index_it = index.iter().rev();
        let strides_it = self.strides.iter().rev();
        index_it.zip(strides_it).map(|(x, s)| x * s).sum()
    }

    /// Returns 2 layouts where the first is reduced layout and the second is the reducer layout.
    /// The reducer layout is used to map an index in the original tensor to a memory position in
    /// the reduced tensor.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the axes does not exist.
    #[allow(clippy::similar_names)]
    pub fn reduce(&self, axes: &[usize]) -> Result<(Self, Self), TensorError> {
        let mut reduced_shape = self.shape.to_vec();
        for &d in axes {
            let size = reduced_shape
                .get_mut(d)
                .ok_or(TensorError::UnknownDimension(d))?;
            *size = 1;
        }
        let reduced_layout = Self::contiguous(&reduced_shape);
        let mut reducer_layout = reduced_layout.clone();
        for &d in axes {
            // Zeroing the stride of a reduced axis maps every element along it onto the same
            // position of the reduced tensor.
            reducer_layout.strides[d] = 0;
        }
        Ok((reduced_layout, reducer_layout))
    }

    /// Returns a new layout where the dimensions are permuted.
    ///
    /// # Errors
    ///
    /// Returns an error if the permutation does not name every axis exactly once.
    pub fn permute(&self, permutation: &[usize]) -> Result<Self, TensorError> {
        let rank = self.shape.len();
        if permutation.len() != rank {
            return Err(TensorError::IncompatibleShapes(
                self.shape.to_vec(),
                permutation.to_vec(),
            ));
        }
        let mut seen = vec![false; rank];
        let mut shape = Vec::with_capacity(rank);
        let mut strides = Vec::with_capacity(rank);
        for &axis in permutation {
            if axis >= rank || seen[axis] {
                return Err(TensorError::UnknownDimension(axis));
            }
            seen[axis] = true;
            shape.push(self.shape[axis]);
            strides.push(self.strides[axis]);
        }
        Ok(Self {
            shape: Box::from(shape),
            strides: Box::from(strides),
        })
    }

    /// Returns a new layout with the two given axes swapped.
    ///
    /// # Errors
    ///
    /// Returns an error if one of the axes does not exist.
    pub fn transpose(&self, dim0: usize, dim1: usize) -> Result<Self, TensorError> {
        let rank = self.shape.len();
        for d in [dim0, dim1] {
            if d >= rank {
                return Err(TensorError::UnknownDimension(d));
            }
        }
        let mut permutation: Vec<_> = (0..rank).collect();
        permutation.swap(dim0, dim1);
        self.permute(&permutation)
    }

    /// Returns a new layout for a tensor with singleton dimensions expanded to a larger size.
    ///
    /// New dimensions are prepended at the front. Expanding never allocates; an expanded
    /// dimension gets a stride of 0 so every index along it reads the same element.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be expanded to the new shape.
    pub fn expand(&self, new_shape: &[usize]) -> Result<Self, TensorError> {
        let mismatch = || TensorError::IncompatibleShapes(self.shape.to_vec(), new_shape.to_vec());
        if new_shape.len() < self.shape.len() {
            return Err(mismatch());
        }
        let mut new_strides = vec![0; new_shape.len()];
        for dim in 0..self.shape.len() {
            let old_idx = self.shape.len() - dim - 1;
            let new_idx = new_shape.len() - dim - 1;
            if self.shape[old_idx] == new_shape[new_idx] {
                new_strides[new_idx] = self.strides[old_idx];
            } else if self.shape[old_idx] == 1 {
                new_strides[new_idx] = 0;
            } else {
                return Err(mismatch());
            }
        }
        Ok(Self {
            shape: Box::from(new_shape),
            strides: Box::from(new_strides),
        })
    }

    /// Returns a new layout for a tensor having the same number of elements but with a
    /// different shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the new shape holds a different number of elements.
    pub fn reshape(&self, new_shape: &[usize]) -> Result<Reshaped, TensorError> {
        if new_shape.iter().product::<usize>() != self.elems() {
            return Err(TensorError::ReshapeCount {
                from: self.shape.to_vec(),
                to: new_shape.to_vec(),
            });
        }
        if self.is_contiguous() {
            Ok(Reshaped::InPlace(Self::contiguous(new_shape)))
        } else {
            Ok(Reshaped::Copy)
        }
    }
}

/// Outcome of a reshape.
#[derive(Debug)]
pub enum Reshaped {
    /// The elements must be gathered into a new buffer first.
    Copy,
    /// The existing buffer can be reused with this layout.
    InPlace(Layout),
}

/// Computes the shape that two shapes broadcast to. Shapes are aligned from the trailing axis
/// and a size-1 axis stretches to match the other side.
///
/// # Errors
///
/// Returns an error if an axis differs in size and neither side is 1.
pub fn broadcast_shape(lhs: &[usize], rhs: &[usize]) -> Result<Vec<usize>, TensorError> {
    let rank = lhs.len().max(rhs.len());
    let mut shape = vec![0; rank];
    for i in 0..rank {
        let l = lhs.len().checked_sub(i + 1).map_or(1, |d| lhs[d]);
        let r = rhs.len().checked_sub(i + 1).map_or(1, |d| rhs[d]);
        shape[rank - i - 1] = match (l, r) {
            (1, d) | (d, 1) => d,
            (dl, dr) if dl == dr => dl,
            _ => return Err(TensorError::IncompatibleShapes(lhs.to_vec(), rhs.to_vec())),
        };
    }
    Ok(shape)
}

/// An iterator over a tensor's indices.
#[derive(Debug)]
pub struct IndexIter<'a> {
    layout: &'a Layout,
    index: Box<[usize]>,
    exhausted: bool,
}

impl Iterator for IndexIter<'_> {
    type Item = Box<[usize]>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let index = self.index.clone();
        for (i, &s) in self.layout.shape.iter().enumerate().rev() {
            self.index[i] += 1;
            if self.index[i] < s {
                return Some(index);
            }
            self.index[i] = 0;
        }
        self.exhausted = true;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_strides() {
        let layout = Layout::from(&[2, 3, 4]);
        assert_eq!(layout.elems(), 24);
        assert_eq!(layout.shape(), &[2, 3, 4]);
        assert_eq!(layout.strides(), &[12, 4, 1]);
        assert!(layout.is_contiguous());
    }

    #[test]
    fn scalar_yields_one_index() {
        let layout = Layout::scalar();
        let indices: Vec<_> = layout.iter().collect();
        assert_eq!(indices.len(), 1);
        assert!(indices[0].is_empty());
        assert_eq!(layout.elems(), 1);
    }

    #[test]
    fn empty_axis_yields_nothing() {
        let layout = Layout::from(&[2, 0]);
        assert_eq!(layout.iter().count(), 0);
    }

    #[test]
    fn transpose_is_not_contiguous() {
        let layout = Layout::from(&[2, 3]).transpose(0, 1).unwrap();
        assert_eq!(layout.shape(), &[3, 2]);
        assert_eq!(layout.strides(), &[1, 3]);
        assert!(!layout.is_contiguous());
        assert!(matches!(layout.reshape(&[6]), Ok(Reshaped::Copy)));
    }

    #[test]
    fn expand_sets_zero_strides() {
        let layout = Layout::from(&[2, 1]).expand(&[3, 2, 4]).unwrap();
        assert_eq!(layout.shape(), &[3, 2, 4]);
        assert_eq!(layout.strides(), &[0, 1, 0]);
        assert!(Layout::from(&[2, 3]).expand(&[3, 3]).is_err());
    }

    #[test]
    fn reduce_layouts() {
        let (reduced, reducer) = Layout::from(&[2, 3]).reduce(&[1]).unwrap();
        assert_eq!(reduced.shape(), &[2, 1]);
        assert_eq!(reducer.strides(), &[1, 0]);
        assert_eq!(
            Layout::from(&[2, 3]).reduce(&[2]),
            Err(TensorError::UnknownDimension(2))
        );
    }

    #[test]
    fn broadcast_shapes() {
        assert_eq!(broadcast_shape(&[2, 3], &[3]).unwrap(), vec![2, 3]);
        assert_eq!(broadcast_shape(&[3, 1, 3], &[2, 1]).unwrap(), vec![3, 2, 3]);
        assert_eq!(broadcast_shape(&[], &[2]).unwrap(), vec![2]);
        assert!(broadcast_shape(&[2, 3], &[2]).is_err());
    }

    #[test]
    fn reshape_rejects_count_mismatch() {
        let err = Layout::from(&[3]).reshape(&[2, 2]).unwrap_err();
        assert_eq!(
            err,
            TensorError::ReshapeCount {
                from: vec![3],
                to: vec![2, 2]
            }
        );
    }
}
