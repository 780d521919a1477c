use std::fmt;
use std::num::NonZeroU32;
use std::rc::Rc;

use crate::shader::StageKind;
use crate::shape::Topology;

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(NonZeroU32);

        impl $name {
            /// Wraps a raw device name. Returns `None` for `0`.
            #[inline]
            pub fn new(raw: u32) -> Option<Self> {
                NonZeroU32::new(raw).map(Self)
            }

            #[inline]
            pub fn get(self) -> u32 {
                self.0.get()
            }
        }

        impl From<NonZeroU32> for $name {
            #[inline]
            fn from(raw: NonZeroU32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for NonZeroU32 {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

object_id!(
    /// Device name of a shader object.
    ShaderId
);
object_id!(
    /// Device name of a program object.
    ProgramId
);
object_id!(
    /// Device name of a vertex array object.
    VertexArrayId
);
object_id!(
    /// Device name of a buffer object.
    BufferId
);

/// Shared handle to the graphics device.
///
/// The device is bound to the thread that owns the context; `Rc` keeps every
/// value holding a `Gl` on that thread.
pub type Gl = Rc<dyn GlDevice>;

/// Capability interface over the OpenGL 3.2 core surface used by the engine.
///
/// Creation calls return `None` when the device cannot allocate an object.
/// Everything else mirrors the corresponding GL entry point: calls are
/// blocking and operate on the context's current binding state.
pub trait GlDevice {
    // ── shader objects ────────────────────────────────────────────────────

    fn create_shader(&self, kind: StageKind) -> Option<ShaderId>;
    fn shader_source(&self, shader: ShaderId, source: &str);
    fn compile_shader(&self, shader: ShaderId);
    fn shader_compile_status(&self, shader: ShaderId) -> bool;
    fn shader_info_log(&self, shader: ShaderId) -> String;
    fn delete_shader(&self, shader: ShaderId);

    // ── program objects ───────────────────────────────────────────────────

    fn create_program(&self) -> Option<ProgramId>;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    fn bind_attrib_location(&self, program: ProgramId, index: u32, name: &str);
    fn bind_frag_data_location(&self, program: ProgramId, color: u32, name: &str);
    fn link_program(&self, program: ProgramId);
    fn program_link_status(&self, program: ProgramId) -> bool;
    fn program_info_log(&self, program: ProgramId) -> String;
    fn use_program(&self, program: Option<ProgramId>);
    fn delete_program(&self, program: ProgramId);

    // ── vertex arrays / buffers ───────────────────────────────────────────

    fn create_vertex_array(&self) -> Option<VertexArrayId>;
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    fn create_buffer(&self) -> Option<BufferId>;
    /// Binds `buffer` to the array-buffer target.
    fn bind_array_buffer(&self, buffer: Option<BufferId>);
    /// Uploads `data` into the bound array buffer with static-draw usage.
    fn array_buffer_data_static(&self, data: &[u8]);
    fn delete_buffer(&self, buffer: BufferId);

    /// Declares float attribute `index` of the bound vertex array, sourced from
    /// the bound array buffer.
    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&self, index: u32);

    // ── drawing ───────────────────────────────────────────────────────────

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32);

    fn clear_color(&self, rgba: [f32; 4]);
    /// Clears the color buffer.
    fn clear(&self);
    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
}
