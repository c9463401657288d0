use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use gemmbench::device::SimDevice;
use gemmbench::harness::{run_accelerated, RunConfig};
use gemmbench::kernels::multiply;
use gemmbench::matrix::Matrix;

fn bench_matmul(c: &mut Criterion) {
    let mut group = c.benchmark_group("matmul");
    for n in [32usize, 64] {
        let a = Matrix::arange(n).expect("operand a");
        let b_ = Matrix::arange(n).expect("operand b");
        group.bench_function(format!("reference_{n}"), |b| {
            b.iter(|| multiply(&a, &b_).expect("multiply"));
        });
    }
    group.bench_function("sim_pipeline_32", |b| {
        let config = RunConfig::default();
        b.iter_batched(
            SimDevice::new,
            |mut device| {
                run_accelerated(&mut device, &config).expect("run");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_matmul);
criterion_main!(benches);
