use std::fmt;

use crate::device::{Gl, ProgramId};

use super::info_log::{log_outcome, InfoLog};
use super::stage::{compile_stage, ShaderSource, StageKind};

/// Vertex attribute index bound to the position input before linking.
///
/// Vertex shaders must name their position input `position`.
pub const POSITION_ATTRIBUTE: (u32, &str) = (0, "position");

/// Color output index bound to the fragment output before linking.
///
/// Fragment shaders must name their output `fragment`.
pub const FRAGMENT_OUTPUT: (u32, &str) = (0, "fragment");

/// Diagnostics of one stage taking part in a program build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub kind: StageKind,
    /// Compiled successfully and was therefore attached.
    pub attached: bool,
    pub log: InfoLog,
}

/// Diagnostics of a whole program build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Stages in the order they were compiled. Absent sources do not appear.
    pub stages: Vec<StageReport>,
    pub linked: bool,
    pub link_log: InfoLog,
}

impl BuildReport {
    pub fn stage(&self, kind: StageKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.kind == kind)
    }

    /// True when no step produced any diagnostic text.
    pub fn is_clean(&self) -> bool {
        self.link_log.is_empty() && self.stages.iter().all(|s| s.log.is_empty())
    }
}

/// Linked shader program, or the invalid sentinel.
///
/// A failed build does not produce an error value: it produces an invalid
/// program (`raw() == 0`) carrying the diagnostics of every step. Invalid
/// programs are never bound. A valid program deletes its device object on
/// drop.
pub struct Program {
    gl: Gl,
    id: Option<ProgramId>,
    report: BuildReport,
}

impl Program {
    /// Raw handle value of the invalid sentinel.
    pub const INVALID: u32 = 0;

    /// Compiles the given stages and links them into a program.
    ///
    /// `None` skips a stage entirely. A stage that fails to compile is left
    /// out and linking is still attempted; a link failure yields the invalid
    /// sentinel.
    pub fn build(gl: &Gl, vertex: Option<&str>, fragment: Option<&str>) -> Self {
        let sources = [
            vertex.map(ShaderSource::vertex),
            fragment.map(ShaderSource::fragment),
        ];
        Self::build_stages(gl, sources.into_iter().flatten())
    }

    /// Like [`build`](Self::build) for an arbitrary set of stages.
    pub fn build_stages<'a>(gl: &Gl, sources: impl IntoIterator<Item = ShaderSource<'a>>) -> Self {
        let mut report = BuildReport::default();

        let Some(id) = gl.create_program() else {
            report.link_log = InfoLog::new("failed to create program object");
            log_outcome(module_path!(), "program link", false, &report.link_log);
            return Self::with_report(gl, None, report);
        };

        for source in sources {
            let stage = compile_stage(&**gl, source);
            let attached = match stage.id() {
                Some(shader) if stage.is_compiled() => {
                    gl.attach_shader(id, shader);
                    true
                }
                _ => false,
            };
            report.stages.push(StageReport {
                kind: stage.kind(),
                attached,
                log: stage.log().clone(),
            });
        }

        let (index, name) = POSITION_ATTRIBUTE;
        gl.bind_attrib_location(id, index, name);
        let (color, name) = FRAGMENT_OUTPUT;
        gl.bind_frag_data_location(id, color, name);

        gl.link_program(id);
        report.linked = gl.program_link_status(id);
        report.link_log = InfoLog::new(gl.program_info_log(id));
        log_outcome(module_path!(), "program link", report.linked, &report.link_log);

        if report.linked {
            log::debug!("built {id:?}");
            Self::with_report(gl, Some(id), report)
        } else {
            gl.delete_program(id);
            Self::with_report(gl, None, report)
        }
    }

    /// The invalid sentinel, without any device object behind it.
    pub fn invalid(gl: &Gl) -> Self {
        Self::with_report(gl, None, BuildReport::default())
    }

    fn with_report(gl: &Gl, id: Option<ProgramId>, report: BuildReport) -> Self {
        Self {
            gl: gl.clone(),
            id,
            report,
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.id.is_some()
    }

    #[inline]
    pub fn id(&self) -> Option<ProgramId> {
        self.id
    }

    /// Raw device handle; [`Program::INVALID`] for the sentinel.
    #[inline]
    pub fn raw(&self) -> u32 {
        self.id.map_or(Self::INVALID, ProgramId::get)
    }

    #[inline]
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Makes this program current for subsequent draws.
    ///
    /// Returns `false` without touching the device for the invalid sentinel.
    pub fn use_program(&self) -> bool {
        match self.id {
            Some(id) => {
                self.gl.use_program(Some(id));
                true
            }
            None => false,
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.gl.delete_program(id);
            log::debug!("deleted {id:?}");
        }
    }
}

impl fmt::Debug for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::device::{ObjectKind, RecordingDevice};

    const VERTEX: &str =
        "#version 150\nin vec2 position; void main(){gl_Position=vec4(position,0,1);}";
    const FRAGMENT: &str = "#version 150\nout vec4 fragment; void main(){fragment=vec4(0,0,0,1);}";
    const BROKEN_FRAGMENT: &str =
        "#version 150\nout vec4 fragment void main(){fragment=vec4(0,0,0,1);}";

    fn device() -> (Rc<RecordingDevice>, Gl) {
        let dev = Rc::new(RecordingDevice::new());
        let gl: Gl = dev.clone();
        (dev, gl)
    }

    #[test]
    fn valid_stages_link_into_a_program() {
        let (dev, gl) = device();
        let program = Program::build(&gl, Some(VERTEX), Some(FRAGMENT));

        assert!(program.is_valid());
        assert_ne!(program.raw(), Program::INVALID);
        assert!(program.report().linked);
        assert!(program.report().is_clean());

        let id = program.id().unwrap();
        assert_eq!(
            dev.attached_stages(id),
            vec![StageKind::Vertex, StageKind::Fragment]
        );
        // Stage objects never outlive the build.
        assert_eq!(dev.live(ObjectKind::Shader), 0);
        assert!(dev.errors().is_empty());
    }

    #[test]
    fn fixed_locations_are_bound_before_linking() {
        let (dev, gl) = device();
        let program = Program::build(&gl, Some(VERTEX), Some(FRAGMENT));
        let id = program.id().unwrap();

        assert_eq!(dev.attrib_location(id, "position"), Some(0));
        assert_eq!(dev.frag_data_location(id, "fragment"), Some(0));
    }

    #[test]
    fn invalid_vertex_stage_yields_sentinel() {
        let (dev, gl) = device();
        let broken_vertex = "#version 150\nin vec2 position void main(){}";
        let program = Program::build(&gl, Some(broken_vertex), Some(FRAGMENT));

        assert!(!program.is_valid());
        assert_eq!(program.raw(), 0);

        let vertex = program.report().stage(StageKind::Vertex).unwrap();
        assert!(!vertex.attached);
        assert!(!vertex.log.is_empty());
        assert!(program.report().stage(StageKind::Fragment).unwrap().attached);
        assert!(!program.report().linked);

        // The program object was released after the failed link.
        assert_eq!(dev.live(ObjectKind::Program), 0);
        assert_eq!(dev.live(ObjectKind::Shader), 0);
    }

    #[test]
    fn fragment_syntax_error_yields_sentinel_with_fragment_log() {
        let (_dev, gl) = device();
        let program = Program::build(&gl, Some(VERTEX), Some(BROKEN_FRAGMENT));

        assert_eq!(program.raw(), 0);
        let fragment = program.report().stage(StageKind::Fragment).unwrap();
        assert!(!fragment.log.is_empty());
        assert!(program.report().stage(StageKind::Vertex).unwrap().log.is_empty());
    }

    #[test]
    fn absent_stage_is_skipped_but_program_is_allocated() {
        let (dev, gl) = device();
        let program = Program::build(&gl, None, Some(FRAGMENT));

        assert!(program.report().stage(StageKind::Vertex).is_none());
        assert_eq!(program.report().stages.len(), 1);
        // One program object plus the fragment stage object.
        assert_eq!(dev.allocations(), 2);
        assert!(!program.is_valid());
    }

    #[test]
    fn no_sources_still_allocates_and_releases_a_program() {
        let (dev, gl) = device();
        let program = Program::build(&gl, None, None);

        assert!(program.report().stages.is_empty());
        assert_eq!(dev.allocations(), 1);
        assert_eq!(dev.live(ObjectKind::Program), 0);
        assert!(!program.report().link_log.is_empty());
    }

    #[test]
    fn sentinel_is_never_bound() {
        let (dev, gl) = device();
        let program = Program::build(&gl, Some(VERTEX), Some(BROKEN_FRAGMENT));

        assert!(!program.use_program());
        assert_eq!(dev.current_program(), None);
        assert!(dev.errors().is_empty());
    }

    #[test]
    fn use_program_binds_and_drop_deletes_once() {
        let (dev, gl) = device();
        let program = Program::build(&gl, Some(VERTEX), Some(FRAGMENT));
        let id = program.id().unwrap();

        assert!(program.use_program());
        assert_eq!(dev.current_program(), Some(id));

        drop(program);
        assert_eq!(dev.deletions(ObjectKind::Program, id.get()), 1);
        assert_eq!(dev.live(ObjectKind::Program), 0);
    }

    #[test]
    fn allocation_failure_yields_sentinel() {
        let (dev, gl) = device();
        dev.set_out_of_memory(true);
        let program = Program::build(&gl, Some(VERTEX), Some(FRAGMENT));

        assert!(!program.is_valid());
        assert!(program.report().stages.is_empty());
        assert!(!program.report().link_log.is_empty());
    }

    #[test]
    fn geometry_stage_joins_the_build() {
        let (dev, gl) = device();
        let geometry = "#version 150\n\
                        layout(points) in;\n\
                        layout(line_strip, max_vertices = 2) out;\n\
                        void main() {\n\
                          gl_Position = gl_in[0].gl_Position; EmitVertex();\n\
                          gl_Position = gl_in[0].gl_Position + vec4(0.1, 0, 0, 0); EmitVertex();\n\
                          EndPrimitive();\n\
                        }\n";
        let program = Program::build_stages(
            &gl,
            [
                ShaderSource::vertex(VERTEX),
                ShaderSource::geometry(geometry),
                ShaderSource::fragment(FRAGMENT),
            ],
        );

        assert!(program.is_valid());
        assert!(program.report().stage(StageKind::Geometry).unwrap().attached);
        assert_eq!(
            dev.attached_stages(program.id().unwrap()),
            vec![StageKind::Vertex, StageKind::Geometry, StageKind::Fragment]
        );
        assert_eq!(dev.live(ObjectKind::Shader), 0);
    }

    #[test]
    fn geometry_stage_alone_does_not_link() {
        let (_dev, gl) = device();
        let geometry = "#version 150\nlayout(points) in;\nvoid main() { EmitVertex(); }\n";
        let program = Program::build_stages(&gl, [ShaderSource::geometry(geometry)]);

        assert!(!program.is_valid());
        assert!(program.report().stage(StageKind::Geometry).unwrap().attached);
        assert!(!program.report().linked);
    }

    #[test]
    fn rebuilding_after_a_failure_succeeds() {
        let (_dev, gl) = device();
        let first = Program::build(&gl, Some(VERTEX), Some(BROKEN_FRAGMENT));
        assert!(!first.is_valid());

        let second = Program::build(&gl, Some(VERTEX), Some(FRAGMENT));
        assert!(second.is_valid());
    }
}
