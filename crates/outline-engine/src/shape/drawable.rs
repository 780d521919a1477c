use std::rc::Rc;

use anyhow::Result;

use crate::buffer::{GpuBuffer, Vertex};
use crate::device::Gl;

use super::Topology;

/// Drawable geometry: a shared [`GpuBuffer`] plus the topology it is drawn with.
///
/// Shapes hold no per-frame state. Several shapes may draw the same buffer
/// with different topologies; the buffer lives as long as the longest-lived
/// shape referencing it.
#[derive(Debug, Clone)]
pub struct Shape {
    buffer: Rc<GpuBuffer>,
    topology: Topology,
}

impl Shape {
    /// Uploads `vertices` into a new buffer drawn as a closed line loop.
    pub fn new<const N: usize>(gl: &Gl, vertices: &[Vertex<N>]) -> Result<Self> {
        Self::with_topology(gl, vertices, Topology::LineLoop)
    }

    /// Uploads `vertices` into a new buffer drawn with `topology`.
    pub fn with_topology<const N: usize>(
        gl: &Gl,
        vertices: &[Vertex<N>],
        topology: Topology,
    ) -> Result<Self> {
        let buffer = GpuBuffer::new(gl, vertices)?;
        Ok(Self::from_buffer(Rc::new(buffer), topology))
    }

    /// Draws an existing buffer.
    pub fn from_buffer(buffer: Rc<GpuBuffer>, topology: Topology) -> Self {
        if buffer.vertex_count() < topology.min_vertices() {
            log::debug!(
                "{topology:?} shape over {} vertices draws nothing",
                buffer.vertex_count()
            );
        }
        Self { buffer, topology }
    }

    /// Another shape over the same buffer, drawn with `topology`.
    pub fn share(&self, topology: Topology) -> Self {
        Self {
            buffer: Rc::clone(&self.buffer),
            topology,
        }
    }

    /// Binds the buffer, then issues the draw command.
    ///
    /// Uses whatever program is current on the device; activating it is the
    /// caller's job.
    pub fn draw(&self) {
        self.buffer.bind();
        self.execute();
    }

    /// Issues the draw command over `[0, vertex_count)` without binding.
    pub fn execute(&self) {
        self.buffer
            .gl()
            .draw_arrays(self.topology, 0, self.buffer.draw_count());
    }

    #[inline]
    pub fn topology(&self) -> Topology {
        self.topology
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.buffer.vertex_count()
    }

    #[inline]
    pub fn buffer(&self) -> &Rc<GpuBuffer> {
        &self.buffer
    }
}
