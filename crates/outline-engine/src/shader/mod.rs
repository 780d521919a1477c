//! Shader program build pipeline.
//!
//! Source text → per-stage compilation (`stage`) → linking with fixed
//! attribute/output locations (`program`). Failures never abort: they leave
//! diagnostics on the `log` channel and in the program's [`BuildReport`],
//! and a failed link yields the invalid sentinel program.

mod info_log;
mod load;
mod program;
mod stage;

pub use info_log::InfoLog;
pub use load::{load_program, read_shader_source};
pub use program::{BuildReport, Program, StageReport, FRAGMENT_OUTPUT, POSITION_ATTRIBUTE};
pub use stage::{compile_stage, CompiledStage, ShaderSource, StageKind};
