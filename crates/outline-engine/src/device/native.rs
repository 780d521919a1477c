use glow::HasContext;

use crate::shader::StageKind;
use crate::shape::Topology;

use super::{BufferId, GlDevice, ProgramId, ShaderId, VertexArrayId};

/// OpenGL device backed by `glow`.
///
/// Every call is forwarded to the loaded function table. The context the table
/// was loaded from must stay current on the calling thread for the lifetime of
/// this value; `GlContext` guarantees that for the windows it creates.
pub struct GlowDevice {
    gl: glow::Context,
}

impl GlowDevice {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }
}

fn stage_enum(kind: StageKind) -> u32 {
    match kind {
        StageKind::Vertex => glow::VERTEX_SHADER,
        StageKind::Fragment => glow::FRAGMENT_SHADER,
        StageKind::Geometry => glow::GEOMETRY_SHADER,
    }
}

fn topology_enum(topology: Topology) -> u32 {
    match topology {
        Topology::Points => glow::POINTS,
        Topology::Lines => glow::LINES,
        Topology::LineStrip => glow::LINE_STRIP,
        Topology::LineLoop => glow::LINE_LOOP,
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn shader(id: ShaderId) -> glow::NativeShader {
    glow::NativeShader(id.into())
}

fn program(id: ProgramId) -> glow::NativeProgram {
    glow::NativeProgram(id.into())
}

fn vertex_array(id: VertexArrayId) -> glow::NativeVertexArray {
    glow::NativeVertexArray(id.into())
}

fn buffer(id: BufferId) -> glow::NativeBuffer {
    glow::NativeBuffer(id.into())
}

// Safety (all blocks below): handles originate from this device and the
// context is current on this thread, see the type-level contract.
impl GlDevice for GlowDevice {
    fn create_shader(&self, kind: StageKind) -> Option<ShaderId> {
        match unsafe { self.gl.create_shader(stage_enum(kind)) } {
            Ok(s) => Some(s.0.into()),
            Err(e) => {
                log::error!("glCreateShader({}) failed: {e}", kind.label());
                None
            }
        }
    }

    fn shader_source(&self, id: ShaderId, source: &str) {
        unsafe { self.gl.shader_source(shader(id), source) }
    }

    fn compile_shader(&self, id: ShaderId) {
        unsafe { self.gl.compile_shader(shader(id)) }
    }

    fn shader_compile_status(&self, id: ShaderId) -> bool {
        unsafe { self.gl.get_shader_compile_status(shader(id)) }
    }

    fn shader_info_log(&self, id: ShaderId) -> String {
        unsafe { self.gl.get_shader_info_log(shader(id)) }
    }

    fn delete_shader(&self, id: ShaderId) {
        unsafe { self.gl.delete_shader(shader(id)) }
    }

    fn create_program(&self) -> Option<ProgramId> {
        match unsafe { self.gl.create_program() } {
            Ok(p) => Some(p.0.into()),
            Err(e) => {
                log::error!("glCreateProgram failed: {e}");
                None
            }
        }
    }

    fn attach_shader(&self, p: ProgramId, s: ShaderId) {
        unsafe { self.gl.attach_shader(program(p), shader(s)) }
    }

    fn bind_attrib_location(&self, p: ProgramId, index: u32, name: &str) {
        unsafe { self.gl.bind_attrib_location(program(p), index, name) }
    }

    fn bind_frag_data_location(&self, p: ProgramId, color: u32, name: &str) {
        unsafe { self.gl.bind_frag_data_location(program(p), color, name) }
    }

    fn link_program(&self, p: ProgramId) {
        unsafe { self.gl.link_program(program(p)) }
    }

    fn program_link_status(&self, p: ProgramId) -> bool {
        unsafe { self.gl.get_program_link_status(program(p)) }
    }

    fn program_info_log(&self, p: ProgramId) -> String {
        unsafe { self.gl.get_program_info_log(program(p)) }
    }

    fn use_program(&self, p: Option<ProgramId>) {
        unsafe { self.gl.use_program(p.map(program)) }
    }

    fn delete_program(&self, p: ProgramId) {
        unsafe { self.gl.delete_program(program(p)) }
    }

    fn create_vertex_array(&self) -> Option<VertexArrayId> {
        match unsafe { self.gl.create_vertex_array() } {
            Ok(v) => Some(v.0.into()),
            Err(e) => {
                log::error!("glGenVertexArrays failed: {e}");
                None
            }
        }
    }

    fn bind_vertex_array(&self, v: Option<VertexArrayId>) {
        unsafe { self.gl.bind_vertex_array(v.map(vertex_array)) }
    }

    fn delete_vertex_array(&self, v: VertexArrayId) {
        unsafe { self.gl.delete_vertex_array(vertex_array(v)) }
    }

    fn create_buffer(&self) -> Option<BufferId> {
        match unsafe { self.gl.create_buffer() } {
            Ok(b) => Some(b.0.into()),
            Err(e) => {
                log::error!("glGenBuffers failed: {e}");
                None
            }
        }
    }

    fn bind_array_buffer(&self, b: Option<BufferId>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, b.map(buffer)) }
    }

    fn array_buffer_data_static(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn delete_buffer(&self, b: BufferId) {
        unsafe { self.gl.delete_buffer(buffer(b)) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(topology_enum(topology), first, count) }
    }

    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT) }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }
}
