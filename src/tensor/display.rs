//! Human-readable rendering of tensors, e.g. `tensor([[1., 2.],\n        [3., 4.]])`.

use std::fmt;

use super::Tensor;

const PREFIX: &str = "tensor(";
const PRECISION: usize = 4;

/// How every element of a tensor is printed. One mode is picked per tensor so columns line up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// All finite values are whole numbers: `1.`, `-3.`.
    Integral,
    /// Fixed point with four decimals: `0.4963`.
    Fixed,
    /// Scientific notation: `1.2346e+05`.
    Scientific,
}

impl Mode {
    fn pick(values: &[f32]) -> Self {
        let finite: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
        let nonzero = finite.iter().map(|v| v.abs()).filter(|&v| v > 0.0);
        let (min, max) = nonzero.fold((f32::INFINITY, 0f32), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if max >= 1e8 {
            return Self::Scientific;
        }
        if finite.iter().all(|v| v.fract() == 0.0) {
            return Self::Integral;
        }
        if min < 1e-4 || max / min > 1000.0 {
            Self::Scientific
        } else {
            Self::Fixed
        }
    }

    fn render(self, value: f32) -> String {
        if value.is_nan() {
            return "nan".to_string();
        }
        if value.is_infinite() {
            return if value > 0.0 { "inf" } else { "-inf" }.to_string();
        }
        match self {
            Self::Integral => format!("{value:.0}."),
            Self::Fixed => format!("{value:.PRECISION$}"),
            Self::Scientific => scientific(value),
        }
    }
}

/// Formats like `1.2346e+05`: a signed exponent of at least two digits.
fn scientific(value: f32) -> String {
    let raw = format!("{value:.PRECISION$e}");
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => raw,
    }
}

impl fmt::Display for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self.ravel();
        let mode = Mode::pick(&values);
        let cells: Vec<String> = values.iter().map(|&v| mode.render(v)).collect();
        let width = cells.iter().map(String::len).max().unwrap_or(0);

        f.write_str(PREFIX)?;
        if self.shape().is_empty() {
            f.write_str(&cells[0])?;
        } else {
            let mut cursor = 0;
            write_axis(f, self.shape(), 0, &cells, width, &mut cursor)?;
        }
        f.write_str(")")
    }
}

fn write_axis(
    f: &mut fmt::Formatter<'_>,
    shape: &[usize],
    axis: usize,
    cells: &[String],
    width: usize,
    cursor: &mut usize,
) -> fmt::Result {
    f.write_str("[")?;
    let last = axis + 1 == shape.len();
    for i in 0..shape[axis] {
        if i > 0 {
            if last {
                f.write_str(", ")?;
            } else {
                // Deeper nesting gets more blank lines between blocks, and the next block is
                // aligned under the opening bracket of this one.
                f.write_str(",")?;
                for _ in 0..shape.len() - axis - 1 {
                    f.write_str("\n")?;
                }
                write!(f, "{:indent$}", "", indent = PREFIX.len() + axis + 1)?;
            }
        }
        if last {
            write!(f, "{:>width$}", cells[*cursor])?;
            *cursor += 1;
        } else {
            write_axis(f, shape, axis + 1, cells, width, cursor)?;
        }
    }
    f.write_str("]")
}

#[cfg(test)]
mod tests {
    use crate::tensor::Tensor;

    #[test]
    fn integral_vector() {
        let t = Tensor::from([1.0, 2.0, 3.0]);
        assert_eq!(t.to_string(), "tensor([1., 2., 3.])");
    }

    #[test]
    fn scalar() {
        assert_eq!(Tensor::scalar(2.0).to_string(), "tensor(2.)");
        assert_eq!(Tensor::scalar(0.5).to_string(), "tensor(0.5000)");
    }

    #[test]
    fn column() {
        let t = Tensor::from([1.0, 2.0, 3.0]).view(&[3, 1]).unwrap();
        assert_eq!(t.to_string(), "tensor([[1.],\n        [2.],\n        [3.]])");
    }

    #[test]
    fn fixed_matrix_is_aligned() {
        let t = Tensor::from([[0.5, -0.25], [10.125, 0.0]]);
        assert_eq!(
            t.to_string(),
            "tensor([[ 0.5000, -0.2500],\n        [10.1250,  0.0000]])"
        );
    }

    #[test]
    fn rank_three_blocks() {
        let t = Tensor::ones(&[2, 1, 2]);
        assert_eq!(t.to_string(), "tensor([[[1., 1.]],\n\n        [[1., 1.]]])");
    }

    #[test]
    fn scientific_values() {
        let t = Tensor::from([1.5e-6, 2.0]);
        assert_eq!(t.to_string(), "tensor([1.5000e-06, 2.0000e+00])");
    }

    #[test]
    fn large_whole_numbers_are_scientific() {
        let t = Tensor::from([1e8, 1.0]);
        assert_eq!(t.to_string(), "tensor([1.0000e+08, 1.0000e+00])");
        assert_eq!(Tensor::from([1e7]).to_string(), "tensor([10000000.])");
    }

    #[test]
    fn empty() {
        let t = Tensor::zeros(&[0]);
        assert_eq!(t.to_string(), "tensor([])");
    }
}
