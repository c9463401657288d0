use std::time::Instant;

use log::info;

use crate::device::{BufferAccess, ComputeDevice};
use crate::error::{BenchError, Result};
use crate::kernels;
use crate::matrix::Matrix;
use crate::report::RunReport;
use crate::timing::{elapsed_ms, StageLog};
use crate::verify::{verify_elementwise, verify_matmul};

/// Explicit run configuration; nothing here is process-global. The
/// default is the reference configuration: 32x32 operands, absolute
/// tolerance 1e-3.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunConfig {
    pub dimension: usize,
    pub tolerance: f32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dimension: 32,
            tolerance: 1e-3,
        }
    }
}

impl RunConfig {
    /// Configuration for the vector-add pipeline: 1024 elements, same
    /// tolerance.
    pub fn vector_add() -> Self {
        Self {
            dimension: 1024,
            tolerance: 1e-3,
        }
    }

    fn validate(&self, op: &'static str) -> Result<()> {
        if self.dimension == 0 {
            return Err(BenchError::InvalidArgument {
                op,
                msg: "dimension must be at least 1".to_string(),
            });
        }
        if self.tolerance <= 0.0 || !self.tolerance.is_finite() {
            return Err(BenchError::InvalidArgument {
                op,
                msg: format!("tolerance must be positive and finite, got {}", self.tolerance),
            });
        }
        Ok(())
    }
}

/// Runs the multiply on the sequential reference backend. The single
/// timed stage is the multiply itself; the total also covers operand
/// generation and verification.
pub fn run_reference(config: &RunConfig) -> Result<RunReport> {
    config.validate("harness.run_reference")?;
    info!("reference matmul run, dimension {}", config.dimension);
    let total_start = Instant::now();
    let a = Matrix::arange(config.dimension)?;
    let b = Matrix::arange(config.dimension)?;
    let mut stages = StageLog::new();
    let c = stages.time("compute", || kernels::multiply(&a, &b))?;
    let verification = verify_matmul(
        c.as_slice(),
        a.as_slice(),
        b.as_slice(),
        config.dimension,
        config.tolerance,
    )?;
    Ok(RunReport {
        name: "matmul".to_string(),
        backend: "cpu".to_string(),
        detail: Some("sequential, (row, col, k) loop order".to_string()),
        stages: stages.into_records(),
        verification,
        total_ms: elapsed_ms(total_start),
    })
}

/// Runs the multiply through a device-compute collaborator. The six
/// stages are timed independently, in order; any collaborator failure
/// aborts the run before later stages execute. The result is verified
/// against a host recompute of the reference.
pub fn run_accelerated(device: &mut dyn ComputeDevice, config: &RunConfig) -> Result<RunReport> {
    config.validate("harness.run_accelerated")?;
    let n = config.dimension;
    info!("accelerated matmul run on {}, dimension {n}", device.backend());
    let total_start = Instant::now();
    // Operand construction also checks that n * n fits in usize.
    let a = Matrix::arange(n)?;
    let b = Matrix::arange(n)?;
    let len = a.numel();
    let mut stages = StageLog::new();

    stages.time("setup", || {
        device.acquire_context()?;
        device.build_program(kernels::MATMUL_SRC)?;
        device.create_kernel(kernels::MATMUL_ENTRY)
    })?;
    let (buf_a, buf_b, buf_c) = stages.time("buffer alloc", || {
        let buf_a = device.create_buffer(BufferAccess::ReadOnly, len)?;
        let buf_b = device.create_buffer(BufferAccess::ReadOnly, len)?;
        let buf_c = device.create_buffer(BufferAccess::WriteOnly, len)?;
        Ok((buf_a, buf_b, buf_c))
    })?;
    stages.time("transfer in", || {
        device.write_buffer(buf_a, a.as_slice())?;
        device.write_buffer(buf_b, b.as_slice())
    })?;
    stages.time("arg binding", || {
        device.set_buffer_arg(0, buf_a)?;
        device.set_buffer_arg(1, buf_b)?;
        device.set_buffer_arg(2, buf_c)?;
        device.set_scalar_arg(3, n as i32)
    })?;
    stages.time("execute", || {
        device.enqueue(&[n, n])?;
        device.finish()
    })?;
    let mut out = vec![0.0f32; len];
    stages.time("transfer out", || device.read_buffer(buf_c, &mut out))?;

    let verification = verify_matmul(&out, a.as_slice(), b.as_slice(), n, config.tolerance)?;
    Ok(RunReport {
        name: "matmul".to_string(),
        backend: device.backend().to_string(),
        detail: device.describe(),
        stages: stages.into_records(),
        verification,
        total_ms: elapsed_ms(total_start),
    })
}

/// Runs the elementwise vector add through a device-compute
/// collaborator: constant operands 1.0 and 2.0, a 1-d dispatch, and the
/// same stage vocabulary as the matmul pipeline.
pub fn run_vector_add(device: &mut dyn ComputeDevice, config: &RunConfig) -> Result<RunReport> {
    config.validate("harness.run_vector_add")?;
    let len = config.dimension;
    info!("vector add run on {}, {len} elements", device.backend());
    let total_start = Instant::now();
    let a = vec![1.0f32; len];
    let b = vec![2.0f32; len];
    let mut stages = StageLog::new();

    stages.time("setup", || {
        device.acquire_context()?;
        device.build_program(kernels::VECTOR_ADD_SRC)?;
        device.create_kernel(kernels::VECTOR_ADD_ENTRY)
    })?;
    let (buf_a, buf_b, buf_c) = stages.time("buffer alloc", || {
        let buf_a = device.create_buffer(BufferAccess::ReadOnly, len)?;
        let buf_b = device.create_buffer(BufferAccess::ReadOnly, len)?;
        let buf_c = device.create_buffer(BufferAccess::WriteOnly, len)?;
        Ok((buf_a, buf_b, buf_c))
    })?;
    stages.time("transfer in", || {
        device.write_buffer(buf_a, &a)?;
        device.write_buffer(buf_b, &b)
    })?;
    stages.time("arg binding", || {
        device.set_buffer_arg(0, buf_a)?;
        device.set_buffer_arg(1, buf_b)?;
        device.set_buffer_arg(2, buf_c)
    })?;
    stages.time("execute", || {
        device.enqueue(&[len])?;
        device.finish()
    })?;
    let mut out = vec![0.0f32; len];
    stages.time("transfer out", || device.read_buffer(buf_c, &mut out))?;

    let expected = kernels::add_kernel(&a, &b);
    let verification = verify_elementwise(&out, &expected, config.tolerance)?;
    Ok(RunReport {
        name: "vector add".to_string(),
        backend: device.backend().to_string(),
        detail: device.describe(),
        stages: stages.into_records(),
        verification,
        total_ms: elapsed_ms(total_start),
    })
}
