use crate::error::{BenchError, Result};

/// Square single-precision matrix, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    dim: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Deterministic ramp fill: the element at linear index `i` is
    /// `i as f32`. Two calls with the same dimension are bit-identical,
    /// which is what lets verification recompute its reference without
    /// persisting the operands.
    pub fn arange(dim: usize) -> Result<Self> {
        let len = checked_len("matrix.arange", dim)?;
        Ok(Self {
            dim,
            data: (0..len).map(|i| i as f32).collect(),
        })
    }

    pub fn from_vec(dim: usize, data: Vec<f32>) -> Result<Self> {
        let len = checked_len("matrix.from_vec", dim)?;
        if data.len() != len {
            return Err(BenchError::InvalidArgument {
                op: "matrix.from_vec",
                msg: format!(
                    "expected {} elements for dimension {}, got {}",
                    len,
                    dim,
                    data.len()
                ),
            });
        }
        Ok(Self { dim, data })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.dim && col < self.dim {
            Some(self.data[row * self.dim + col])
        } else {
            None
        }
    }
}

fn checked_len(op: &'static str, dim: usize) -> Result<usize> {
    if dim == 0 {
        return Err(BenchError::InvalidArgument {
            op,
            msg: "dimension must be at least 1".to_string(),
        });
    }
    dim.checked_mul(dim).ok_or_else(|| BenchError::InvalidArgument {
        op,
        msg: format!("dimension {dim} overflows element count"),
    })
}
