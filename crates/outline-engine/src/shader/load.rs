use std::path::Path;

use anyhow::{Context, Result};

use crate::device::Gl;

use super::Program;

/// Reads a shader source file into memory.
pub fn read_shader_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("can't read shader source {}", path.display()))
}

/// Reads both stage sources from disk and builds a program from them.
///
/// Unreadable files are logged and yield the invalid sentinel; both files are
/// read (and reported) before deciding.
pub fn load_program(gl: &Gl, vertex: &Path, fragment: &Path) -> Program {
    let vertex_src = read_shader_source(vertex);
    let fragment_src = read_shader_source(fragment);

    match (vertex_src, fragment_src) {
        (Ok(v), Ok(f)) => Program::build(gl, Some(&v), Some(&f)),
        (v, f) => {
            for err in [v.err(), f.err()].into_iter().flatten() {
                log::error!("{err:#}");
            }
            Program::invalid(gl)
        }
    }
}
