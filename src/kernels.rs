use crate::error::{BenchError, Result};
use crate::matrix::Matrix;

/// Device source for the square matmul kernel: one work item per output
/// element, indexed (row, col), each performing the full k reduction.
pub const MATMUL_SRC: &str = r#"
    __kernel void matmul(
        __global const float *a,
        __global const float *b,
        __global float *c,
        const int N
    ) {
        int row = get_global_id(0);
        int col = get_global_id(1);
        float sum = 0.0f;
        for (int k=0; k<N; ++k) {
            sum += a[row * N + k] * b[k * N + col];
        }
        c[row * N + col] = sum;
    }
"#;

pub const MATMUL_ENTRY: &str = "matmul";

/// Device source for the elementwise vector add, one work item per element.
pub const VECTOR_ADD_SRC: &str = r#"
    __kernel void add(
        __global const float* a,
        __global const float* b,
        __global float* c
    ) {
        int i = get_global_id(0);
        c[i] = a[i] + b[i];
    }
"#;

pub const VECTOR_ADD_ENTRY: &str = "add";

/// Sequential reference matmul over raw row-major slices, `(row, col, k)`
/// iteration order, plain f32 accumulation. Slices must hold at least
/// `m * k` / `k * n` elements.
pub fn matmul_kernel(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0;
            for p in 0..k {
                acc += a[i * k + p] * b[p * n + j];
            }
            out[i * n + j] = acc;
        }
    }
    out
}

pub fn add_kernel(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

/// Typed square multiply used by the CPU backend and the verifier.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.dim() != b.dim() {
        return Err(BenchError::InvalidArgument {
            op: "kernels.multiply",
            msg: format!("dimension mismatch: {} vs {}", a.dim(), b.dim()),
        });
    }
    let n = a.dim();
    Matrix::from_vec(n, matmul_kernel(a.as_slice(), b.as_slice(), n, n, n))
}
