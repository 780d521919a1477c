use crate::device::{GlDevice, ShaderId};

use super::info_log::{log_outcome, InfoLog};

/// Programmable pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
    Geometry,
}

impl StageKind {
    /// Human-readable label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            StageKind::Vertex => "vertex shader",
            StageKind::Fragment => "fragment shader",
            StageKind::Geometry => "geometry shader",
        }
    }
}

/// Source text for one stage. Consumed by compilation, never stored.
#[derive(Debug, Copy, Clone)]
pub struct ShaderSource<'a> {
    pub kind: StageKind,
    pub text: &'a str,
}

impl<'a> ShaderSource<'a> {
    #[inline]
    pub fn new(kind: StageKind, text: &'a str) -> Self {
        Self { kind, text }
    }

    #[inline]
    pub fn vertex(text: &'a str) -> Self {
        Self::new(StageKind::Vertex, text)
    }

    #[inline]
    pub fn fragment(text: &'a str) -> Self {
        Self::new(StageKind::Fragment, text)
    }

    #[inline]
    pub fn geometry(text: &'a str) -> Self {
        Self::new(StageKind::Geometry, text)
    }
}

/// Result of compiling one stage.
///
/// Owns the device shader object and deletes it on drop, whether or not the
/// stage compiled and whether or not it was attached to a program. A program
/// keeps attached stages alive on the device side, so the guard never needs
/// to outlive program assembly.
pub struct CompiledStage<'gl> {
    gl: &'gl dyn GlDevice,
    id: Option<ShaderId>,
    kind: StageKind,
    compiled: bool,
    log: InfoLog,
}

impl CompiledStage<'_> {
    /// Device object, `None` if the device could not allocate one.
    #[inline]
    pub fn id(&self) -> Option<ShaderId> {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    #[inline]
    pub fn log(&self) -> &InfoLog {
        &self.log
    }
}

impl Drop for CompiledStage<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.gl.delete_shader(id);
            log::trace!("deleted {} {id:?}", self.kind.label());
        }
    }
}

/// Compiles one stage and surfaces its diagnostics.
///
/// A failed compilation is not an error here: the returned stage reports
/// `is_compiled() == false` and the caller decides what to do with it.
pub fn compile_stage<'gl>(gl: &'gl dyn GlDevice, source: ShaderSource<'_>) -> CompiledStage<'gl> {
    let kind = source.kind;
    let what = format!("{} compilation", kind.label());

    let Some(id) = gl.create_shader(kind) else {
        let log = InfoLog::new(format!("failed to create {} object", kind.label()));
        log_outcome(module_path!(), &what, false, &log);
        return CompiledStage {
            gl,
            id: None,
            kind,
            compiled: false,
            log,
        };
    };

    gl.shader_source(id, source.text);
    gl.compile_shader(id);

    let compiled = gl.shader_compile_status(id);
    let log = InfoLog::new(gl.shader_info_log(id));
    log_outcome(module_path!(), &what, compiled, &log);

    CompiledStage {
        gl,
        id: Some(id),
        kind,
        compiled,
        log,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ObjectKind, RecordingDevice};

    const FRAGMENT: &str = "#version 150\nout vec4 fragment; void main(){fragment=vec4(0,0,0,1);}";

    #[test]
    fn compiled_stage_is_deleted_on_drop() {
        let dev = RecordingDevice::new();
        let stage = compile_stage(&dev, ShaderSource::fragment(FRAGMENT));
        assert!(stage.is_compiled());
        assert!(stage.log().is_empty());
        assert_eq!(dev.live(ObjectKind::Shader), 1);

        let id = stage.id().unwrap();
        drop(stage);
        assert_eq!(dev.live(ObjectKind::Shader), 0);
        assert_eq!(dev.deletions(ObjectKind::Shader, id.get()), 1);
    }

    #[test]
    fn source_text_is_submitted_verbatim() {
        let dev = RecordingDevice::new();
        let stage = compile_stage(&dev, ShaderSource::new(StageKind::Fragment, FRAGMENT));
        let id = stage.id().unwrap();
        assert_eq!(dev.shader_text(id).as_deref(), Some(FRAGMENT));

        drop(stage);
        assert_eq!(dev.shader_text(id), None);
    }

    #[test]
    fn failed_stage_keeps_log_and_is_still_deleted() {
        let dev = RecordingDevice::new();
        let stage = compile_stage(&dev, ShaderSource::fragment("#version 150\nvoid main(){ x = 1 }"));
        assert!(!stage.is_compiled());
        assert!(!stage.log().is_empty());
        assert_eq!(stage.kind(), StageKind::Fragment);

        drop(stage);
        assert_eq!(dev.live(ObjectKind::Shader), 0);
        assert!(dev.errors().is_empty());
    }

    #[test]
    fn allocation_failure_reports_a_failed_stage() {
        let dev = RecordingDevice::new();
        dev.set_out_of_memory(true);
        let stage = compile_stage(&dev, ShaderSource::vertex("#version 150\nvoid main(){}"));
        assert!(stage.id().is_none());
        assert!(!stage.is_compiled());
        assert!(stage.log().as_str().contains("vertex shader"));
    }

    #[test]
    fn labels_name_their_own_stage() {
        assert_eq!(StageKind::Vertex.label(), "vertex shader");
        assert_eq!(StageKind::Fragment.label(), "fragment shader");
        assert_eq!(StageKind::Geometry.label(), "geometry shader");
    }
}
