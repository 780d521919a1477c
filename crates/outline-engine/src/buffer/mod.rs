//! Vertex geometry on the device.
//!
//! `GpuBuffer` owns a vertex array/buffer pair uploaded once; `Vertex<N>` is
//! the CPU-side layout it is built from.

mod object;
mod vertex;

pub use object::GpuBuffer;
pub use vertex::{Vertex, Vertex2};
