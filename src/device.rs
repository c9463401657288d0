use std::collections::BTreeMap;

use log::debug;

use crate::error::{BenchError, Result};
use crate::kernels;

/// Operations of the device-compute collaborator. Errors carry the name
/// of the operation that failed, and fault injection on [`SimDevice`] is
/// keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOp {
    AcquireContext,
    BuildProgram,
    CreateKernel,
    CreateBuffer,
    WriteBuffer,
    SetArg,
    Enqueue,
    Finish,
    ReadBuffer,
}

impl DeviceOp {
    pub fn name(self) -> &'static str {
        match self {
            DeviceOp::AcquireContext => "device.acquire_context",
            DeviceOp::BuildProgram => "device.build_program",
            DeviceOp::CreateKernel => "device.create_kernel",
            DeviceOp::CreateBuffer => "device.create_buffer",
            DeviceOp::WriteBuffer => "device.write_buffer",
            DeviceOp::SetArg => "device.set_arg",
            DeviceOp::Enqueue => "device.enqueue",
            DeviceOp::Finish => "device.finish",
            DeviceOp::ReadBuffer => "device.read_buffer",
        }
    }
}

/// Kernel-side access mode for a device buffer, mirroring the direction
/// of data flow. Host transfers are unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAccess {
    ReadOnly,
    WriteOnly,
}

/// Opaque handle to a device buffer, valid for the device that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferHandle(pub(crate) usize);

/// Capability set of an external compute device: context acquisition,
/// program compilation, buffer traffic, argument binding and kernel
/// dispatch. Every call is attempted exactly once; any non-success
/// status surfaces as [`BenchError::Device`] naming the operation, and
/// the caller aborts the run.
pub trait ComputeDevice {
    /// Short backend name for reports.
    fn backend(&self) -> &'static str;

    /// Platform/device identification, available once a context is
    /// acquired.
    fn describe(&self) -> Option<String> {
        None
    }

    fn acquire_context(&mut self) -> Result<()>;

    fn build_program(&mut self, source: &str) -> Result<()>;

    fn create_kernel(&mut self, entry: &str) -> Result<()>;

    fn create_buffer(&mut self, access: BufferAccess, len: usize) -> Result<BufferHandle>;

    /// Blocking host-to-device copy.
    fn write_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()>;

    fn set_buffer_arg(&mut self, index: u32, handle: BufferHandle) -> Result<()>;

    fn set_scalar_arg(&mut self, index: u32, value: i32) -> Result<()>;

    /// Launches the bound kernel over an N-dimensional global range, one
    /// work item per index.
    fn enqueue(&mut self, global: &[usize]) -> Result<()>;

    /// Blocks until all enqueued work has completed.
    fn finish(&mut self) -> Result<()>;

    /// Blocking device-to-host copy.
    fn read_buffer(&mut self, handle: BufferHandle, out: &mut [f32]) -> Result<()>;
}

#[derive(Debug)]
struct SimBuffer {
    access: BufferAccess,
    data: Vec<f32>,
}

#[derive(Debug, Clone, Copy)]
enum SimArg {
    Buffer(usize),
    Scalar(i32),
}

/// In-process device that executes the kernels this crate ships on the
/// host. It follows the same stateful protocol as a real backend
/// (context before program, program before kernel, kernel before args)
/// and can be armed to fail at any single operation, which is how the
/// fatal-error paths are exercised without accelerator hardware.
#[derive(Debug, Default)]
pub struct SimDevice {
    acquired: bool,
    source: Option<String>,
    entry: Option<String>,
    buffers: Vec<SimBuffer>,
    args: BTreeMap<u32, SimArg>,
    fail_at: Option<DeviceOp>,
    enqueues: usize,
}

impl SimDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that reports a non-success status whenever `op` is
    /// invoked.
    pub fn failing_at(op: DeviceOp) -> Self {
        Self {
            fail_at: Some(op),
            ..Self::default()
        }
    }

    /// Number of buffers created since the last context acquisition.
    pub fn buffer_count(&self) -> usize {
        self.buffers.len()
    }

    /// Access mode of the `index`-th buffer created, in creation order.
    pub fn buffer_access(&self, index: usize) -> Option<BufferAccess> {
        self.buffers.get(index).map(|buffer| buffer.access)
    }

    /// Number of dispatches that reached the device across its lifetime.
    pub fn enqueue_count(&self) -> usize {
        self.enqueues
    }

    fn check_fault(&self, op: DeviceOp) -> Result<()> {
        if self.fail_at == Some(op) {
            return Err(BenchError::Device {
                op: op.name(),
                detail: "injected device failure".to_string(),
            });
        }
        Ok(())
    }

    fn require_acquired(&self, op: DeviceOp) -> Result<()> {
        if !self.acquired {
            return Err(BenchError::Device {
                op: op.name(),
                detail: "context not acquired".to_string(),
            });
        }
        Ok(())
    }

    fn arg_buffer(&self, op: DeviceOp, index: u32) -> Result<usize> {
        match self.args.get(&index) {
            Some(SimArg::Buffer(slot)) => Ok(*slot),
            Some(SimArg::Scalar(_)) => Err(BenchError::Device {
                op: op.name(),
                detail: format!("kernel arg {index} is bound to a scalar, expected a buffer"),
            }),
            None => Err(BenchError::Device {
                op: op.name(),
                detail: format!("kernel arg {index} is not bound"),
            }),
        }
    }

    fn arg_scalar(&self, op: DeviceOp, index: u32) -> Result<i32> {
        match self.args.get(&index) {
            Some(SimArg::Scalar(value)) => Ok(*value),
            Some(SimArg::Buffer(_)) => Err(BenchError::Device {
                op: op.name(),
                detail: format!("kernel arg {index} is bound to a buffer, expected a scalar"),
            }),
            None => Err(BenchError::Device {
                op: op.name(),
                detail: format!("kernel arg {index} is not bound"),
            }),
        }
    }

    fn require_len(&self, op: DeviceOp, slot: usize, needed: usize) -> Result<()> {
        let have = self.buffers[slot].data.len();
        if have < needed {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("buffer {slot} holds {have} elements, kernel needs {needed}"),
            });
        }
        Ok(())
    }

    fn run_matmul(&mut self, global: &[usize]) -> Result<()> {
        let op = DeviceOp::Enqueue;
        if global.len() != 2 {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("matmul expects a 2-d global range, got {global:?}"),
            });
        }
        let n_arg = self.arg_scalar(op, 3)?;
        if n_arg < 0 {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("kernel dimension must be non-negative, got {n_arg}"),
            });
        }
        let n = n_arg as usize;
        if global[0] != n || global[1] != n {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("global range {global:?} does not match kernel dimension {n}"),
            });
        }
        let a_slot = self.arg_buffer(op, 0)?;
        let b_slot = self.arg_buffer(op, 1)?;
        let c_slot = self.arg_buffer(op, 2)?;
        let len = n * n;
        self.require_len(op, a_slot, len)?;
        self.require_len(op, b_slot, len)?;
        self.require_len(op, c_slot, len)?;

        let a = self.buffers[a_slot].data.clone();
        let b = self.buffers[b_slot].data.clone();
        let out = &mut self.buffers[c_slot].data;
        for row in 0..n {
            for col in 0..n {
                let mut sum = 0.0f32;
                for k in 0..n {
                    sum += a[row * n + k] * b[k * n + col];
                }
                out[row * n + col] = sum;
            }
        }
        Ok(())
    }

    fn run_add(&mut self, global: &[usize]) -> Result<()> {
        let op = DeviceOp::Enqueue;
        if global.len() != 1 {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("add expects a 1-d global range, got {global:?}"),
            });
        }
        let len = global[0];
        let a_slot = self.arg_buffer(op, 0)?;
        let b_slot = self.arg_buffer(op, 1)?;
        let c_slot = self.arg_buffer(op, 2)?;
        self.require_len(op, a_slot, len)?;
        self.require_len(op, b_slot, len)?;
        self.require_len(op, c_slot, len)?;

        let a = self.buffers[a_slot].data.clone();
        let b = self.buffers[b_slot].data.clone();
        let out = &mut self.buffers[c_slot].data;
        for i in 0..len {
            out[i] = a[i] + b[i];
        }
        Ok(())
    }
}

impl ComputeDevice for SimDevice {
    fn backend(&self) -> &'static str {
        "sim"
    }

    fn describe(&self) -> Option<String> {
        if self.acquired {
            Some("in-process simulated device".to_string())
        } else {
            None
        }
    }

    fn acquire_context(&mut self) -> Result<()> {
        self.check_fault(DeviceOp::AcquireContext)?;
        self.acquired = true;
        self.source = None;
        self.entry = None;
        self.buffers.clear();
        self.args.clear();
        debug!("sim device context acquired");
        Ok(())
    }

    fn build_program(&mut self, source: &str) -> Result<()> {
        let op = DeviceOp::BuildProgram;
        self.check_fault(op)?;
        self.require_acquired(op)?;
        self.source = Some(source.to_string());
        Ok(())
    }

    fn create_kernel(&mut self, entry: &str) -> Result<()> {
        let op = DeviceOp::CreateKernel;
        self.check_fault(op)?;
        let source = self.source.as_deref().ok_or_else(|| BenchError::Device {
            op: op.name(),
            detail: "no program built".to_string(),
        })?;
        // Same failure a real backend reports for an unknown entry point.
        if !source.contains(&format!("__kernel void {entry}")) {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("kernel entry point {entry} not found in program"),
            });
        }
        self.entry = Some(entry.to_string());
        Ok(())
    }

    fn create_buffer(&mut self, access: BufferAccess, len: usize) -> Result<BufferHandle> {
        let op = DeviceOp::CreateBuffer;
        self.check_fault(op)?;
        self.require_acquired(op)?;
        if len == 0 {
            return Err(BenchError::Device {
                op: op.name(),
                detail: "buffer length must be at least 1".to_string(),
            });
        }
        self.buffers.push(SimBuffer {
            access,
            data: vec![0.0f32; len],
        });
        Ok(BufferHandle(self.buffers.len() - 1))
    }

    fn write_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()> {
        let op = DeviceOp::WriteBuffer;
        self.check_fault(op)?;
        let buffer = self.buffers.get_mut(handle.0).ok_or_else(|| BenchError::Device {
            op: op.name(),
            detail: format!("unknown buffer handle {}", handle.0),
        })?;
        if data.len() > buffer.data.len() {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!(
                    "write of {} elements exceeds buffer of {}",
                    data.len(),
                    buffer.data.len()
                ),
            });
        }
        buffer.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn set_buffer_arg(&mut self, index: u32, handle: BufferHandle) -> Result<()> {
        let op = DeviceOp::SetArg;
        self.check_fault(op)?;
        if self.entry.is_none() {
            return Err(BenchError::Device {
                op: op.name(),
                detail: "no kernel created".to_string(),
            });
        }
        if handle.0 >= self.buffers.len() {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!("unknown buffer handle {}", handle.0),
            });
        }
        self.args.insert(index, SimArg::Buffer(handle.0));
        Ok(())
    }

    fn set_scalar_arg(&mut self, index: u32, value: i32) -> Result<()> {
        let op = DeviceOp::SetArg;
        self.check_fault(op)?;
        if self.entry.is_none() {
            return Err(BenchError::Device {
                op: op.name(),
                detail: "no kernel created".to_string(),
            });
        }
        self.args.insert(index, SimArg::Scalar(value));
        Ok(())
    }

    fn enqueue(&mut self, global: &[usize]) -> Result<()> {
        self.check_fault(DeviceOp::Enqueue)?;
        let entry = self.entry.clone().ok_or_else(|| BenchError::Device {
            op: DeviceOp::Enqueue.name(),
            detail: "no kernel created".to_string(),
        })?;
        self.enqueues += 1;
        match entry.as_str() {
            kernels::MATMUL_ENTRY => self.run_matmul(global),
            kernels::VECTOR_ADD_ENTRY => self.run_add(global),
            other => Err(BenchError::Device {
                op: DeviceOp::Enqueue.name(),
                detail: format!("no simulation for kernel entry point {other}"),
            }),
        }
    }

    fn finish(&mut self) -> Result<()> {
        // Dispatch runs synchronously on the host, so there is nothing
        // left to wait for.
        self.check_fault(DeviceOp::Finish)
    }

    fn read_buffer(&mut self, handle: BufferHandle, out: &mut [f32]) -> Result<()> {
        let op = DeviceOp::ReadBuffer;
        self.check_fault(op)?;
        let buffer = self.buffers.get(handle.0).ok_or_else(|| BenchError::Device {
            op: op.name(),
            detail: format!("unknown buffer handle {}", handle.0),
        })?;
        if out.len() > buffer.data.len() {
            return Err(BenchError::Device {
                op: op.name(),
                detail: format!(
                    "read of {} elements exceeds buffer of {}",
                    out.len(),
                    buffer.data.len()
                ),
            });
        }
        out.copy_from_slice(&buffer.data[..out.len()]);
        Ok(())
    }
}
