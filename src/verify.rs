use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};
use crate::kernels;

/// Outcome of an elementwise comparison: the number of elements whose
/// absolute difference from the reference exceeded the tolerance, and
/// the largest difference seen anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub mismatches: usize,
    pub max_abs_diff: f32,
}

impl VerificationResult {
    pub fn all_correct(&self) -> bool {
        self.mismatches == 0
    }
}

pub fn verify_elementwise(
    actual: &[f32],
    expected: &[f32],
    tolerance: f32,
) -> Result<VerificationResult> {
    if actual.len() != expected.len() {
        return Err(BenchError::InvalidArgument {
            op: "verify.elementwise",
            msg: format!(
                "length mismatch: actual={} expected={}",
                actual.len(),
                expected.len()
            ),
        });
    }
    let mut mismatches = 0;
    let mut max_abs_diff = 0.0f32;
    for (got, want) in actual.iter().zip(expected.iter()) {
        let diff = (got - want).abs();
        if diff > max_abs_diff {
            max_abs_diff = diff;
        }
        if diff > tolerance {
            mismatches += 1;
        }
    }
    Ok(VerificationResult {
        mismatches,
        max_abs_diff,
    })
}

/// Recomputes the expected product through the reference kernel and
/// compares `c` against it elementwise. Operands shorter than `n * n`
/// elements are rejected before the recompute.
pub fn verify_matmul(
    c: &[f32],
    a: &[f32],
    b: &[f32],
    n: usize,
    tolerance: f32,
) -> Result<VerificationResult> {
    let len = n.checked_mul(n).ok_or_else(|| BenchError::InvalidArgument {
        op: "verify.matmul",
        msg: format!("dimension {n} overflows element count"),
    })?;
    if a.len() < len || b.len() < len {
        return Err(BenchError::InvalidArgument {
            op: "verify.matmul",
            msg: format!(
                "operands hold {} and {} elements, need {len}",
                a.len(),
                b.len()
            ),
        });
    }
    let expected = kernels::matmul_kernel(a, b, n, n, n);
    verify_elementwise(c, &expected, tolerance)
}
