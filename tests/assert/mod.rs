#![allow(dead_code)]

use tinytorch::tensor::{Layout, Tensor};

pub fn assert_contiguous_layout(layout: &Layout, expected_shape: &[usize]) {
    let shape = layout.shape();
    let strides = layout.strides();
    assert_eq!(shape, expected_shape);
    assert_eq!(shape.len(), strides.len());
    if let Some(last) = strides.last() {
        assert_eq!(*last, 1);
    }
    for dim in (1..shape.len()).rev() {
        assert_eq!(strides[dim - 1], strides[dim] * shape[dim]);
    }
}

pub fn assert_reduced_layout(reduced: &Layout, reducer: &Layout, axes: &[usize], shape: &[usize]) {
    assert_contiguous_layout(reduced, shape);
    let mut strides = reduced.strides().to_vec();
    for &d in axes {
        strides[d] = 0;
    }
    assert_eq!(reducer.shape(), shape);
    assert_eq!(reducer.strides(), strides);
}

pub fn assert_expanded_layout(expanded: &Layout, original: &Layout, shape: &[usize]) {
    let offset = shape.len() - original.rank();
    assert_eq!(expanded.shape(), shape);
    for (dim, &stride) in expanded.strides().iter().enumerate() {
        let kept = dim
            .checked_sub(offset)
            .filter(|&d| original.shape()[d] == shape[dim]);
        match kept {
            Some(d) => assert_eq!(stride, original.strides()[d], "axis {dim}"),
            None => assert_eq!(stride, 0, "axis {dim}"),
        }
    }
}

pub fn assert_contiguous_tensor(tensor: &Tensor, data: &[f32], shape: &[usize]) {
    assert_contiguous_layout(tensor.layout(), shape);
    assert_eq!(tensor.ravel(), data);
}

/// Element-wise comparison with a tolerance relative to the larger magnitude, floored at 1.
pub fn assert_floats_close(actual: &[f32], expected: &[f32], tolerance: f32) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} != {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        let scale = a.abs().max(e.abs()).max(1.0);
        assert!(
            (a - e).abs() <= tolerance * scale,
            "{actual:?} != {expected:?}"
        );
    }
}
