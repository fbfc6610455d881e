//! Compute-dispatch boundary.
//!
//! Synthesis and extraction are expressed as pure per-cell kernels evaluated
//! over a 2D domain with no cross-cell dependency. That invariant is what
//! lets a backend run cells in any order, on any number of threads, or hand
//! the kernel to an external compute executor later. The core depends only
//! on this trait, never on a particular backend.

use crate::error::TerrainError;
use rayon::prelude::*;

/// Executes a pure kernel over every cell of a `width x height` domain and
/// returns the results in row-major order (`y * width + x`). Synchronous
/// from the caller's perspective; the returned buffer is the readback.
pub trait ComputeBackend: Send + Sync {
    fn dispatch<T, K>(
        &self,
        width: usize,
        height: usize,
        kernel: K,
    ) -> Result<Vec<T>, TerrainError>
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync;
}

/// Multi-threaded backend over the rayon thread pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for CpuBackend {
    fn dispatch<T, K>(&self, width: usize, height: usize, kernel: K) -> Result<Vec<T>, TerrainError>
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync,
    {
        Ok((0..width * height)
            .into_par_iter()
            .map(|idx| kernel(idx % width, idx / width))
            .collect())
    }
}

/// Single-threaded backend. Useful as a reference implementation: any
/// conforming backend must produce the identical buffer for a pure kernel.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialBackend;

impl SerialBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeBackend for SerialBackend {
    fn dispatch<T, K>(&self, width: usize, height: usize, kernel: K) -> Result<Vec<T>, TerrainError>
    where
        T: Send,
        K: Fn(usize, usize) -> T + Sync,
    {
        let mut out = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                out.push(kernel(x, y));
            }
        }
        Ok(out)
    }
}
