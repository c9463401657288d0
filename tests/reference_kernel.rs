mod common;

use common::{assert_approx_eq, matmul};
use gemmbench::kernels::{add_kernel, matmul_kernel, multiply};
use gemmbench::matrix::Matrix;

#[test]
fn reference_matches_independent_reduction_for_small_sizes() {
    for n in [1usize, 2, 3, 5, 8] {
        let a = Matrix::arange(n).expect("operand a");
        let b = Matrix::arange(n).expect("operand b");
        let out = matmul_kernel(a.as_slice(), b.as_slice(), n, n, n);
        let expected = matmul(a.as_slice(), n, n, b.as_slice(), n, n);
        assert_approx_eq(&out, &expected, 1e-3);
    }
}

#[test]
fn reference_matches_independent_reduction_at_bench_dimension() {
    let n = 32;
    let a = Matrix::arange(n).expect("operand a");
    let b = Matrix::arange(n).expect("operand b");
    let out = matmul_kernel(a.as_slice(), b.as_slice(), n, n, n);
    let expected = matmul(a.as_slice(), n, n, b.as_slice(), n, n);
    // Products here reach ~1.7e7, past the f32 exact-integer range, so
    // the two accumulation orders may differ by a few ulp (one ulp is 2
    // at that magnitude).
    assert_approx_eq(&out, &expected, 64.0);
}

#[test]
fn reference_handles_rectangular_shapes() {
    // 2x3 times 3x2.
    let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
    let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
    let out = matmul_kernel(&a, &b, 2, 3, 2);
    assert_approx_eq(&out, &[58.0, 64.0, 139.0, 154.0], 1e-6);
}

#[test]
fn arange_generation_is_deterministic() {
    let first = Matrix::arange(32).expect("first matrix");
    let second = Matrix::arange(32).expect("second matrix");
    assert_eq!(first.as_slice(), second.as_slice());
    assert_eq!(first.as_slice()[0], 0.0);
    assert_eq!(first.as_slice()[1], 1.0);
    assert_eq!(first.as_slice()[1023], 1023.0);
    assert_eq!(first.numel(), 1024);
}

#[test]
fn corner_element_matches_closed_form_at_bench_dimension() {
    // C[0][0] = sum(k * 32k, k in 0..32) = 32 * 10416 = 333312; every
    // partial sum is an integer below 2^24, so the f32 result is exact.
    let a = Matrix::arange(32).expect("operand a");
    let b = Matrix::arange(32).expect("operand b");
    let c = multiply(&a, &b).expect("multiply");
    assert_eq!(c.get(0, 0), Some(333312.0));
}

#[test]
fn one_by_one_multiply_is_the_scalar_product() {
    let a = Matrix::from_vec(1, vec![3.0]).expect("left scalar");
    let b = Matrix::from_vec(1, vec![4.0]).expect("right scalar");
    let c = multiply(&a, &b).expect("multiply");
    assert_eq!(c.get(0, 0), Some(12.0));
}

#[test]
fn multiply_rejects_mismatched_dimensions() {
    let a = Matrix::arange(2).expect("operand a");
    let b = Matrix::arange(3).expect("operand b");
    let err = multiply(&a, &b).expect_err("dimension mismatch must fail");
    assert!(err.to_string().contains("kernels.multiply"));
}

#[test]
fn matrix_constructors_reject_bad_arguments() {
    assert!(Matrix::arange(0).is_err());
    assert!(Matrix::arange(usize::MAX).is_err());
    assert!(Matrix::from_vec(2, vec![1.0, 2.0, 3.0]).is_err());
    assert!(Matrix::arange(2).expect("matrix").get(2, 0).is_none());
}

#[test]
fn add_kernel_sums_elementwise() {
    let out = add_kernel(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
    assert_eq!(out, vec![5.0, 7.0, 9.0]);
}
