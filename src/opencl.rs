//! OpenCL backend for the benchmark pipeline.
//!
//! Implements [`ComputeDevice`] over the `opencl3` crate against the
//! first GPU device found during platform enumeration. All native
//! handles are released in drop order (buffers, kernel, program, queue,
//! context), so resources are reclaimed on the abort path as well as
//! after a completed run.

use std::fmt;

use log::{debug, info};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::device::{Device, CL_DEVICE_TYPE_GPU};
use opencl3::kernel::Kernel;
use opencl3::memory::{Buffer, ClMem, CL_MEM_READ_ONLY, CL_MEM_WRITE_ONLY};
use opencl3::platform::get_platforms;
use opencl3::program::Program;
use opencl3::types::{cl_uint, CL_BLOCKING};

use crate::device::{BufferAccess, BufferHandle, ComputeDevice, DeviceOp};
use crate::error::{BenchError, Result};

/// Holds the acquired runtime handles. Queue is declared before context
/// so it is released first.
struct ClContext {
    queue: CommandQueue,
    context: Context,
}

/// [`ComputeDevice`] over a physical OpenCL GPU.
#[derive(Default)]
pub struct ClDevice {
    buffers: Vec<Buffer<f32>>,
    kernel: Option<Kernel>,
    program: Option<Program>,
    context: Option<ClContext>,
    platform_name: String,
    device_name: String,
}

impl fmt::Debug for ClDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClDevice")
            .field("platform_name", &self.platform_name)
            .field("device_name", &self.device_name)
            .field("acquired", &self.context.is_some())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

impl ClDevice {
    /// Creates an inert device; discovery happens in
    /// [`ComputeDevice::acquire_context`] so the harness can time it.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }
}

fn no_context(op: &'static str) -> BenchError {
    BenchError::Device {
        op,
        detail: "context not acquired".to_string(),
    }
}

fn no_kernel(op: &'static str) -> BenchError {
    BenchError::Device {
        op,
        detail: "no kernel created".to_string(),
    }
}

fn unknown_handle(op: &'static str, handle: BufferHandle) -> BenchError {
    BenchError::Device {
        op,
        detail: format!("unknown buffer handle {}", handle.0),
    }
}

impl ComputeDevice for ClDevice {
    fn backend(&self) -> &'static str {
        "opencl"
    }

    fn describe(&self) -> Option<String> {
        if self.context.is_some() {
            Some(format!("{} / {}", self.platform_name, self.device_name))
        } else {
            None
        }
    }

    fn acquire_context(&mut self) -> Result<()> {
        let op = DeviceOp::AcquireContext.name();
        let platforms = get_platforms().map_err(|e| BenchError::Device {
            op,
            detail: format!("failed to get platforms: {e}"),
        })?;
        if platforms.is_empty() {
            return Err(BenchError::Device {
                op,
                detail: "no OpenCL platforms found".to_string(),
            });
        }
        for platform in &platforms {
            let platform_name = platform.name().unwrap_or_default();
            debug!("checking OpenCL platform: {platform_name}");
            let device_ids = platform.get_devices(CL_DEVICE_TYPE_GPU).unwrap_or_default();
            if let Some(device_id) = device_ids.first() {
                let device = Device::new(*device_id);
                let device_name = device.name().unwrap_or_default();
                info!("selected OpenCL device: {device_name} on {platform_name}");
                let context = Context::from_device(&device).map_err(|e| BenchError::Device {
                    op,
                    detail: format!("failed to create context: {e}"),
                })?;
                let queue = CommandQueue::create_default_with_properties(&context, 0, 0)
                    .map_err(|e| BenchError::Device {
                        op,
                        detail: format!("failed to create command queue: {e}"),
                    })?;
                self.buffers.clear();
                self.kernel = None;
                self.program = None;
                self.context = Some(ClContext { queue, context });
                self.platform_name = platform_name;
                self.device_name = device_name;
                return Ok(());
            }
        }
        Err(BenchError::Device {
            op,
            detail: "no GPU device found on any platform".to_string(),
        })
    }

    fn build_program(&mut self, source: &str) -> Result<()> {
        let op = DeviceOp::BuildProgram.name();
        let ctx = self.context.as_ref().ok_or_else(|| no_context(op))?;
        // On failure the error carries the compiler build log.
        let program = Program::create_and_build_from_source(&ctx.context, source, "")
            .map_err(|e| BenchError::Device {
                op,
                detail: format!("program build failed: {e}"),
            })?;
        self.program = Some(program);
        Ok(())
    }

    fn create_kernel(&mut self, entry: &str) -> Result<()> {
        let op = DeviceOp::CreateKernel.name();
        let program = self.program.as_ref().ok_or_else(|| BenchError::Device {
            op,
            detail: "no program built".to_string(),
        })?;
        let kernel = Kernel::create(program, entry).map_err(|e| BenchError::Device {
            op,
            detail: format!("failed to create kernel {entry}: {e}"),
        })?;
        self.kernel = Some(kernel);
        Ok(())
    }

    fn create_buffer(&mut self, access: BufferAccess, len: usize) -> Result<BufferHandle> {
        let op = DeviceOp::CreateBuffer.name();
        let ctx = self.context.as_ref().ok_or_else(|| no_context(op))?;
        let flags = match access {
            BufferAccess::ReadOnly => CL_MEM_READ_ONLY,
            BufferAccess::WriteOnly => CL_MEM_WRITE_ONLY,
        };
        let buffer =
            unsafe { Buffer::<f32>::create(&ctx.context, flags, len, std::ptr::null_mut()) }
                .map_err(|e| BenchError::Device {
                    op,
                    detail: format!("failed to create buffer of {len} elements: {e}"),
                })?;
        self.buffers.push(buffer);
        Ok(BufferHandle(self.buffers.len() - 1))
    }

    fn write_buffer(&mut self, handle: BufferHandle, data: &[f32]) -> Result<()> {
        let op = DeviceOp::WriteBuffer.name();
        let ctx = self.context.as_ref().ok_or_else(|| no_context(op))?;
        let buffer = self
            .buffers
            .get_mut(handle.0)
            .ok_or_else(|| unknown_handle(op, handle))?;
        unsafe { ctx.queue.enqueue_write_buffer(buffer, CL_BLOCKING, 0, data, &[]) }.map_err(
            |e| BenchError::Device {
                op,
                detail: format!("write failed: {e}"),
            },
        )?;
        Ok(())
    }

    fn set_buffer_arg(&mut self, index: u32, handle: BufferHandle) -> Result<()> {
        let op = DeviceOp::SetArg.name();
        let kernel = self.kernel.as_ref().ok_or_else(|| no_kernel(op))?;
        let buffer = self
            .buffers
            .get(handle.0)
            .ok_or_else(|| unknown_handle(op, handle))?;
        unsafe { kernel.set_arg(index, &buffer.get()) }.map_err(|e| BenchError::Device {
            op,
            detail: format!("failed to set buffer arg {index}: {e}"),
        })?;
        Ok(())
    }

    fn set_scalar_arg(&mut self, index: u32, value: i32) -> Result<()> {
        let op = DeviceOp::SetArg.name();
        let kernel = self.kernel.as_ref().ok_or_else(|| no_kernel(op))?;
        unsafe { kernel.set_arg(index, &value) }.map_err(|e| BenchError::Device {
            op,
            detail: format!("failed to set scalar arg {index}: {e}"),
        })?;
        Ok(())
    }

    fn enqueue(&mut self, global: &[usize]) -> Result<()> {
        let op = DeviceOp::Enqueue.name();
        let ctx = self.context.as_ref().ok_or_else(|| no_context(op))?;
        let kernel = self.kernel.as_ref().ok_or_else(|| no_kernel(op))?;
        unsafe {
            ctx.queue.enqueue_nd_range_kernel(
                kernel.get(),
                global.len() as cl_uint,
                std::ptr::null(),
                global.as_ptr(),
                std::ptr::null(),
                &[],
            )
        }
        .map_err(|e| BenchError::Device {
            op,
            detail: format!("failed to enqueue kernel: {e}"),
        })?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let op = DeviceOp::Finish.name();
        let ctx = self.context.as_ref().ok_or_else(|| no_context(op))?;
        ctx.queue.finish().map_err(|e| BenchError::Device {
            op,
            detail: format!("wait for completion failed: {e}"),
        })
    }

    fn read_buffer(&mut self, handle: BufferHandle, out: &mut [f32]) -> Result<()> {
        let op = DeviceOp::ReadBuffer.name();
        let ctx = self.context.as_ref().ok_or_else(|| no_context(op))?;
        let buffer = self
            .buffers
            .get(handle.0)
            .ok_or_else(|| unknown_handle(op, handle))?;
        unsafe { ctx.queue.enqueue_read_buffer(buffer, CL_BLOCKING, 0, out, &[]) }.map_err(
            |e| BenchError::Device {
                op,
                detail: format!("read failed: {e}"),
            },
        )?;
        Ok(())
    }
}
