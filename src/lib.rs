pub mod device;
pub mod error;
pub mod harness;
pub mod kernels;
pub mod matrix;
pub mod report;
pub mod timing;
pub mod verify;

#[cfg(feature = "opencl")]
pub mod opencl;

pub use device::{BufferAccess, BufferHandle, ComputeDevice, DeviceOp, SimDevice};
pub use error::{BenchError, Result};
pub use harness::{run_accelerated, run_reference, run_vector_add, RunConfig};
pub use matrix::Matrix;
pub use report::RunReport;
pub use timing::{elapsed_ms, StageLog, StageRecord};
pub use verify::{verify_elementwise, verify_matmul, VerificationResult};
