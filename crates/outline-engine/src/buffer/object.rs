use std::fmt;

use anyhow::{anyhow, Result};

use crate::device::{BufferId, Gl, VertexArrayId};
use crate::shader::POSITION_ATTRIBUTE;

use super::Vertex;

/// Vertex array + vertex buffer pair holding immutable geometry.
///
/// Vertex data is uploaded once, at construction, with static usage; there is
/// no update path. The type is neither `Clone` nor `Copy`: each device object
/// has exactly one owner, and geometry shared between shapes goes through
/// `Rc<GpuBuffer>`. Dropping the last owner deletes both objects once.
pub struct GpuBuffer {
    gl: Gl,
    vertex_array: VertexArrayId,
    buffer: BufferId,
    /// Validated to fit the `count` argument of a draw call.
    vertex_count: i32,
    components: usize,
}

/// Vertex count as a draw-call range length.
fn draw_count(len: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| anyhow!("{len} vertices exceed the draw range of {}", i32::MAX))
}

impl GpuBuffer {
    /// Uploads `vertices` and declares them as the position attribute.
    ///
    /// Fails when the vertices cannot be drawn in one call or the device
    /// cannot allocate the objects.
    pub fn new<const N: usize>(gl: &Gl, vertices: &[Vertex<N>]) -> Result<Self> {
        const { assert!(N >= 1 && N <= 4, "vertex attributes have 1 to 4 components") };
        let vertex_count = draw_count(vertices.len())?;

        let vertex_array = gl
            .create_vertex_array()
            .ok_or_else(|| anyhow!("failed to create vertex array object"))?;
        let Some(buffer) = gl.create_buffer() else {
            gl.delete_vertex_array(vertex_array);
            return Err(anyhow!("failed to create vertex buffer object"));
        };

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_array_buffer(Some(buffer));
        gl.array_buffer_data_static(bytemuck::cast_slice(vertices));

        let (index, _) = POSITION_ATTRIBUTE;
        gl.vertex_attrib_pointer_f32(index, N as i32, size_of::<Vertex<N>>() as i32, 0);
        gl.enable_vertex_attrib_array(index);

        log::debug!(
            "uploaded {} vertices ({} bytes) into {vertex_array:?}/{buffer:?}",
            vertices.len(),
            size_of_val(vertices),
        );

        Ok(Self {
            gl: gl.clone(),
            vertex_array,
            buffer,
            vertex_count,
            components: N,
        })
    }

    /// Makes this vertex array the active one. Idempotent.
    #[inline]
    pub fn bind(&self) {
        self.gl.bind_vertex_array(Some(self.vertex_array));
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count as usize
    }

    /// Vertex count as passed to `draw_arrays`.
    #[inline]
    pub fn draw_count(&self) -> i32 {
        self.vertex_count
    }

    /// Position components per vertex.
    #[inline]
    pub fn components(&self) -> usize {
        self.components
    }

    #[inline]
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    #[inline]
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Device the objects live on.
    #[inline]
    pub fn gl(&self) -> &Gl {
        &self.gl
    }
}

impl Drop for GpuBuffer {
    fn drop(&mut self) {
        self.gl.delete_vertex_array(self.vertex_array);
        self.gl.delete_buffer(self.buffer);
        log::debug!("released {:?}/{:?}", self.vertex_array, self.buffer);
    }
}

impl fmt::Debug for GpuBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpuBuffer")
            .field("vertex_array", &self.vertex_array)
            .field("buffer", &self.buffer)
            .field("vertex_count", &self.vertex_count)
            .field("components", &self.components)
            .finish_non_exhaustive()
    }
}
