use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::shader::StageKind;
use crate::shape::Topology;

use super::glsl_check;
use super::{BufferId, GlDevice, ProgramId, ShaderId, VertexArrayId};

/// Device object categories tracked by [`RecordingDevice`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ObjectKind {
    Shader,
    Program,
    VertexArray,
    Buffer,
}

/// One recorded `draw_arrays` call with the binding state it observed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DrawCall {
    pub topology: Topology,
    pub first: i32,
    pub count: i32,
    pub vertex_array: Option<VertexArrayId>,
    pub program: Option<ProgramId>,
}

/// Layout recorded for one vertex attribute slot of a vertex array.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttribLayout {
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
    pub buffer: Option<BufferId>,
    pub enabled: bool,
}

#[derive(Debug)]
struct ShaderObject {
    kind: StageKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Copy, Clone)]
struct AttachedStage {
    kind: StageKind,
    compiled: bool,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<AttachedStage>,
    attrib_locations: HashMap<String, u32>,
    frag_data_locations: HashMap<String, u32>,
    linked: bool,
    log: String,
}

#[derive(Debug, Default)]
struct VertexArrayObject {
    attribs: BTreeMap<u32, AttribLayout>,
}

#[derive(Debug, Default)]
struct BufferObject {
    data: Vec<u8>,
    uploads: usize,
}

#[derive(Debug, Default)]
struct State {
    next_name: u32,
    out_of_memory: bool,

    shaders: HashMap<ShaderId, ShaderObject>,
    programs: HashMap<ProgramId, ProgramObject>,
    vertex_arrays: HashMap<VertexArrayId, VertexArrayObject>,
    buffers: HashMap<BufferId, BufferObject>,

    bound_vertex_array: Option<VertexArrayId>,
    bound_array_buffer: Option<BufferId>,
    current_program: Option<ProgramId>,
    clear_color: [f32; 4],
    viewport: (i32, i32, i32, i32),

    allocations: usize,
    deletions: HashMap<(ObjectKind, u32), usize>,
    draws: Vec<DrawCall>,
    clears: usize,
    errors: Vec<String>,
}

impl State {
    fn allocate(&mut self) -> Option<u32> {
        if self.out_of_memory {
            return None;
        }
        self.next_name += 1;
        self.allocations += 1;
        Some(self.next_name)
    }

    fn error(&mut self, message: String) {
        log::warn!("recording device: {message}");
        self.errors.push(message);
    }

    fn deleted(&mut self, kind: ObjectKind, name: u32, was_live: bool) {
        if !was_live {
            self.error(format!("delete of unknown {kind:?} {name}"));
        }
        *self.deletions.entry((kind, name)).or_default() += 1;
    }
}

/// In-memory device that records every call instead of talking to a driver.
///
/// Semantics follow GL closely enough to exercise the engine without a GPU:
/// - names are allocated monotonically and never reused
/// - compilation runs a structural GLSL check and produces driver-style logs
/// - linking succeeds iff a compiled vertex stage and a compiled fragment
///   stage are attached
/// - buffer uploads are stored and can be read back
/// - misuse (unknown names, double deletes, drawing without a vertex array)
///   is recorded in [`errors`](Self::errors) instead of aborting
#[derive(Debug, Default)]
pub struct RecordingDevice {
    state: RefCell<State>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_*` call fail while `enabled`.
    pub fn set_out_of_memory(&self, enabled: bool) {
        self.state.borrow_mut().out_of_memory = enabled;
    }

    /// Total number of successful object allocations.
    pub fn allocations(&self) -> usize {
        self.state.borrow().allocations
    }

    /// Number of live objects of `kind`.
    pub fn live(&self, kind: ObjectKind) -> usize {
        let s = self.state.borrow();
        match kind {
            ObjectKind::Shader => s.shaders.len(),
            ObjectKind::Program => s.programs.len(),
            ObjectKind::VertexArray => s.vertex_arrays.len(),
            ObjectKind::Buffer => s.buffers.len(),
        }
    }

    /// How many times the object `name` of `kind` has been deleted.
    pub fn deletions(&self, kind: ObjectKind, name: u32) -> usize {
        self.state
            .borrow()
            .deletions
            .get(&(kind, name))
            .copied()
            .unwrap_or(0)
    }

    /// Bytes most recently uploaded into `buffer`, if it is live.
    pub fn buffer_data(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).map(|b| b.data.clone())
    }

    /// Number of uploads performed into `buffer`.
    pub fn buffer_uploads(&self, buffer: BufferId) -> usize {
        self.state
            .borrow()
            .buffers
            .get(&buffer)
            .map_or(0, |b| b.uploads)
    }

    pub fn attrib_layout(&self, vertex_array: VertexArrayId, index: u32) -> Option<AttribLayout> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|v| v.attribs.get(&index).copied())
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.state.borrow().bound_vertex_array
    }

    pub fn bound_array_buffer(&self) -> Option<BufferId> {
        self.state.borrow().bound_array_buffer
    }

    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    pub fn viewport_value(&self) -> (i32, i32, i32, i32) {
        self.state.borrow().viewport
    }

    /// Number of `clear` calls.
    pub fn clears(&self) -> usize {
        self.state.borrow().clears
    }

    /// Stage kinds attached to a live program, in attach order.
    pub fn attached_stages(&self, program: ProgramId) -> Vec<StageKind> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.attached.iter().map(|a| a.kind).collect())
            .unwrap_or_default()
    }

    pub fn attrib_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.attrib_locations.get(name).copied())
    }

    pub fn frag_data_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.frag_data_locations.get(name).copied())
    }

    /// Source text submitted for a live shader.
    pub fn shader_text(&self, shader: ShaderId) -> Option<String> {
        self.state.borrow().shaders.get(&shader).map(|s| s.source.clone())
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state.borrow().draws.clone()
    }

    /// Misuse recorded so far.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }
}

impl GlDevice for RecordingDevice {
    fn create_shader(&self, kind: StageKind) -> Option<ShaderId> {
        let mut s = self.state.borrow_mut();
        let id = ShaderId::new(s.allocate()?)?;
        s.shaders.insert(
            id,
            ShaderObject {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        log::trace!("create {} {id:?}", kind.label());
        Some(id)
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        let mut s = self.state.borrow_mut();
        match s.shaders.get_mut(&shader) {
            Some(obj) => obj.source = source.to_owned(),
            None => s.error(format!("shader_source on unknown {shader:?}")),
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        let mut s = self.state.borrow_mut();
        match s.shaders.get_mut(&shader) {
            Some(obj) => match glsl_check::check(&obj.source) {
                Ok(()) => {
                    obj.compiled = true;
                    obj.log.clear();
                }
                Err(log) => {
                    obj.compiled = false;
                    obj.log = log;
                }
            },
            None => s.error(format!("compile_shader on unknown {shader:?}")),
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut s = self.state.borrow_mut();
        let was_live = s.shaders.remove(&shader).is_some();
        s.deleted(ObjectKind::Shader, shader.get(), was_live);
    }

    fn create_program(&self) -> Option<ProgramId> {
        let mut s = self.state.borrow_mut();
        let id = ProgramId::new(s.allocate()?)?;
        s.programs.insert(id, ProgramObject::default());
        Some(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut s = self.state.borrow_mut();
        let stage = s.shaders.get(&shader).map(|obj| AttachedStage {
            kind: obj.kind,
            compiled: obj.compiled,
        });
        match (stage, s.programs.get_mut(&program)) {
            (Some(stage), Some(p)) => p.attached.push(stage),
            _ => s.error(format!("attach_shader({program:?}, {shader:?}) on unknown object")),
        }
    }

    fn bind_attrib_location(&self, program: ProgramId, index: u32, name: &str) {
        let mut s = self.state.borrow_mut();
        match s.programs.get_mut(&program) {
            Some(p) => {
                p.attrib_locations.insert(name.to_owned(), index);
            }
            None => s.error(format!("bind_attrib_location on unknown {program:?}")),
        }
    }

    fn bind_frag_data_location(&self, program: ProgramId, color: u32, name: &str) {
        let mut s = self.state.borrow_mut();
        match s.programs.get_mut(&program) {
            Some(p) => {
                p.frag_data_locations.insert(name.to_owned(), color);
            }
            None => s.error(format!("bind_frag_data_location on unknown {program:?}")),
        }
    }

    fn link_program(&self, program: ProgramId) {
        let mut s = self.state.borrow_mut();
        let Some(p) = s.programs.get_mut(&program) else {
            s.error(format!("link_program on unknown {program:?}"));
            return;
        };

        let mut log = String::new();
        if p.attached.iter().any(|a| !a.compiled) {
            log.push_str("error: attached shader is not compiled\n");
        }
        for kind in [StageKind::Vertex, StageKind::Fragment] {
            if !p.attached.iter().any(|a| a.kind == kind && a.compiled) {
                log.push_str(&format!("error: no compiled {} attached\n", kind.label()));
            }
        }

        p.linked = log.is_empty();
        p.log = log;
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramId) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut s = self.state.borrow_mut();
        if let Some(id) = program {
            match s.programs.get(&id) {
                Some(p) if p.linked => {}
                Some(_) => return s.error(format!("use_program on unlinked {id:?}")),
                None => return s.error(format!("use_program on unknown {id:?}")),
            }
        }
        s.current_program = program;
    }

    fn delete_program(&self, program: ProgramId) {
        let mut s = self.state.borrow_mut();
        let was_live = s.programs.remove(&program).is_some();
        if s.current_program == Some(program) {
            s.current_program = None;
        }
        s.deleted(ObjectKind::Program, program.get(), was_live);
    }

    fn create_vertex_array(&self) -> Option<VertexArrayId> {
        let mut s = self.state.borrow_mut();
        let id = VertexArrayId::new(s.allocate()?)?;
        s.vertex_arrays.insert(id, VertexArrayObject::default());
        Some(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        let mut s = self.state.borrow_mut();
        if let Some(id) = vertex_array {
            if !s.vertex_arrays.contains_key(&id) {
                return s.error(format!("bind_vertex_array on unknown {id:?}"));
            }
        }
        s.bound_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut s = self.state.borrow_mut();
        let was_live = s.vertex_arrays.remove(&vertex_array).is_some();
        if s.bound_vertex_array == Some(vertex_array) {
            s.bound_vertex_array = None;
        }
        s.deleted(ObjectKind::VertexArray, vertex_array.get(), was_live);
    }

    fn create_buffer(&self) -> Option<BufferId> {
        let mut s = self.state.borrow_mut();
        let id = BufferId::new(s.allocate()?)?;
        s.buffers.insert(id, BufferObject::default());
        Some(id)
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        let mut s = self.state.borrow_mut();
        if let Some(id) = buffer {
            if !s.buffers.contains_key(&id) {
                return s.error(format!("bind_array_buffer on unknown {id:?}"));
            }
        }
        s.bound_array_buffer = buffer;
    }

    fn array_buffer_data_static(&self, data: &[u8]) {
        let mut s = self.state.borrow_mut();
        let Some(id) = s.bound_array_buffer else {
            return s.error("buffer upload with no array buffer bound".to_owned());
        };
        if let Some(b) = s.buffers.get_mut(&id) {
            b.data = data.to_vec();
            b.uploads += 1;
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut s = self.state.borrow_mut();
        let was_live = s.buffers.remove(&buffer).is_some();
        if s.bound_array_buffer == Some(buffer) {
            s.bound_array_buffer = None;
        }
        s.deleted(ObjectKind::Buffer, buffer.get(), was_live);
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut s = self.state.borrow_mut();
        if !(1..=4).contains(&components) {
            return s.error(format!("vertex_attrib_pointer with {components} components"));
        }
        let buffer = s.bound_array_buffer;
        let Some(vao) = s.bound_vertex_array else {
            return s.error("vertex_attrib_pointer with no vertex array bound".to_owned());
        };
        if let Some(v) = s.vertex_arrays.get_mut(&vao) {
            let enabled = v.attribs.get(&index).is_some_and(|a| a.enabled);
            v.attribs.insert(
                index,
                AttribLayout {
                    components,
                    stride,
                    offset,
                    buffer,
                    enabled,
                },
            );
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut s = self.state.borrow_mut();
        let Some(vao) = s.bound_vertex_array else {
            return s.error("enable_vertex_attrib_array with no vertex array bound".to_owned());
        };
        match s.vertex_arrays.get_mut(&vao).and_then(|v| v.attribs.get_mut(&index)) {
            Some(layout) => layout.enabled = true,
            None => s.error(format!("enable_vertex_attrib_array({index}) before its pointer")),
        }
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        let mut s = self.state.borrow_mut();
        if s.bound_vertex_array.is_none() {
            s.error("draw_arrays with no vertex array bound".to_owned());
        }
        let call = DrawCall {
            topology,
            first,
            count,
            vertex_array: s.bound_vertex_array,
            program: s.current_program,
        };
        s.draws.push(call);
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.state.borrow_mut().clear_color = rgba;
    }

    fn clear(&self) {
        self.state.borrow_mut().clears += 1;
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.state.borrow_mut().viewport = (x, y, width, height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_across_object_kinds() {
        let dev = RecordingDevice::new();
        let a = dev.create_buffer().unwrap().get();
        let b = dev.create_vertex_array().unwrap().get();
        let c = dev.create_program().unwrap().get();
        assert!(a != b && b != c && a != c);
        assert_eq!(dev.allocations(), 3);
    }

    #[test]
    fn out_of_memory_fails_every_creation() {
        let dev = RecordingDevice::new();
        dev.set_out_of_memory(true);
        assert!(dev.create_shader(StageKind::Vertex).is_none());
        assert!(dev.create_program().is_none());
        assert!(dev.create_vertex_array().is_none());
        assert!(dev.create_buffer().is_none());
        assert_eq!(dev.allocations(), 0);

        dev.set_out_of_memory(false);
        assert!(dev.create_buffer().is_some());
    }

    #[test]
    fn double_delete_is_recorded() {
        let dev = RecordingDevice::new();
        let buf = dev.create_buffer().unwrap();
        dev.delete_buffer(buf);
        dev.delete_buffer(buf);
        assert_eq!(dev.deletions(ObjectKind::Buffer, buf.get()), 2);
        assert_eq!(dev.errors().len(), 1);
    }

    #[test]
    fn link_requires_both_compiled_stages() {
        let dev = RecordingDevice::new();
        let program = dev.create_program().unwrap();
        let vs = dev.create_shader(StageKind::Vertex).unwrap();
        dev.shader_source(vs, "#version 150\nin vec2 position; void main(){gl_Position=vec4(position,0,1);}");
        dev.compile_shader(vs);
        assert!(dev.shader_compile_status(vs));
        dev.attach_shader(program, vs);

        dev.link_program(program);
        assert!(!dev.program_link_status(program));
        assert!(dev.program_info_log(program).contains("fragment shader"));
    }

    #[test]
    fn draw_records_binding_state() {
        let dev = RecordingDevice::new();
        let vao = dev.create_vertex_array().unwrap();
        dev.bind_vertex_array(Some(vao));
        dev.draw_arrays(Topology::LineLoop, 0, 4);

        assert_eq!(
            dev.draw_calls(),
            vec![DrawCall {
                topology: Topology::LineLoop,
                first: 0,
                count: 4,
                vertex_array: Some(vao),
                program: None,
            }]
        );
        assert!(dev.errors().is_empty());
    }

    #[test]
    fn deleting_bound_objects_clears_bindings() {
        let dev = RecordingDevice::new();
        let vao = dev.create_vertex_array().unwrap();
        let buf = dev.create_buffer().unwrap();
        dev.bind_vertex_array(Some(vao));
        dev.bind_array_buffer(Some(buf));

        dev.delete_vertex_array(vao);
        dev.delete_buffer(buf);

        assert_eq!(dev.bound_vertex_array(), None);
        assert_eq!(dev.bound_array_buffer(), None);
        assert_eq!(dev.live(ObjectKind::VertexArray), 0);
        assert_eq!(dev.live(ObjectKind::Buffer), 0);
    }
}
