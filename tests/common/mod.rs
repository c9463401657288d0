#![allow(dead_code)]

pub fn assert_approx_eq(actual: &[f32], expected: &[f32], tol: f32) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Length mismatch: actual={} expected={}",
        actual.len(),
        expected.len()
    );
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (*a - *e).abs() <= tol,
            "Mismatch at index {}: actual={} expected={} with tol={}",
            i,
            a,
            e,
            tol
        );
    }
}

/// Independent matmul oracle: (row, k, col) loop order with f64
/// accumulation, rounded to f32 once at the end.
pub fn matmul(
    left: &[f32],
    left_rows: usize,
    left_cols: usize,
    right: &[f32],
    right_rows: usize,
    right_cols: usize,
) -> Vec<f32> {
    assert_eq!(left_cols, right_rows);
    let mut acc = vec![0.0f64; left_rows * right_cols];
    for i in 0..left_rows {
        for k in 0..left_cols {
            let scale = left[i * left_cols + k] as f64;
            for j in 0..right_cols {
                acc[i * right_cols + j] += scale * right[k * right_cols + j] as f64;
            }
        }
    }
    acc.into_iter().map(|value| value as f32).collect()
}
