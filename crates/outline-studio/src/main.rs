//! Outline studio: draws a square outline with its corner points.
//!
//! Usage: `outline-studio [VERTEX_SHADER FRAGMENT_SHADER]`. Without paths the
//! embedded pass-through shaders are used.

use std::path::PathBuf;

use anyhow::{bail, Result};
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::keyboard::{Key, NamedKey};

use outline_engine::buffer::Vertex2;
use outline_engine::core::{App, AppControl, FrameCtx};
use outline_engine::device::{Gl, GlInit};
use outline_engine::logging::{init_logging, LoggingConfig};
use outline_engine::shader::{load_program, Program};
use outline_engine::shape::{Shape, Topology};
use outline_engine::window::{RedrawMode, Runtime, RuntimeConfig};

const VERTEX_SHADER: &str = include_str!("../shaders/point.vert");
const FRAGMENT_SHADER: &str = include_str!("../shaders/point.frag");

const SQUARE: [Vertex2; 4] = [
    Vertex2::new([-0.5, -0.5]),
    Vertex2::new([0.5, -0.5]),
    Vertex2::new([0.5, 0.5]),
    Vertex2::new([-0.5, 0.5]),
];

enum ShaderOrigin {
    Embedded,
    Files { vertex: PathBuf, fragment: PathBuf },
}

impl ShaderOrigin {
    fn from_args(mut args: impl Iterator<Item = String>) -> Result<Self> {
        match (args.next(), args.next(), args.next()) {
            (None, _, _) => Ok(Self::Embedded),
            (Some(vertex), Some(fragment), None) => Ok(Self::Files {
                vertex: vertex.into(),
                fragment: fragment.into(),
            }),
            _ => bail!("usage: outline-studio [VERTEX_SHADER FRAGMENT_SHADER]"),
        }
    }
}

/// GL-owning state, released in `on_exit` while the context is current.
struct Scene {
    program: Program,
    shapes: Vec<Shape>,
}

struct Studio {
    shaders: ShaderOrigin,
    scene: Option<Scene>,
}

impl App for Studio {
    fn init(&mut self, gl: &Gl) -> Result<()> {
        let program = match &self.shaders {
            ShaderOrigin::Embedded => Program::build(gl, Some(VERTEX_SHADER), Some(FRAGMENT_SHADER)),
            ShaderOrigin::Files { vertex, fragment } => load_program(gl, vertex, fragment),
        };
        if !program.is_valid() {
            log::warn!("shader program failed to build; frames will only be cleared");
        }

        let outline = Shape::new(gl, &SQUARE)?;
        let corners = outline.share(Topology::Points);

        self.scene = Some(Scene {
            program,
            shapes: vec![outline, corners],
        });
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && event.logical_key == Key::Named(NamedKey::Escape) =>
            {
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(scene) = &self.scene else {
            return AppControl::Continue;
        };

        if scene.program.use_program() {
            for shape in &scene.shapes {
                shape.draw();
            }
        }
        AppControl::Continue
    }

    fn on_exit(&mut self) {
        self.scene = None;
    }
}

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let shaders = ShaderOrigin::from_args(std::env::args().skip(1))?;

    let config = RuntimeConfig {
        title: "outline".to_string(),
        initial_size: LogicalSize::new(640.0, 640.0),
        redraw: RedrawMode::OnEvent,
    };

    Runtime::run(config, GlInit::default(), Studio { shaders, scene: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn no_arguments_use_embedded_shaders() {
        assert!(matches!(ShaderOrigin::from_args(args(&[])).unwrap(), ShaderOrigin::Embedded));
    }

    #[test]
    fn shader_paths_come_in_pairs() {
        let origin = ShaderOrigin::from_args(args(&["a.vert", "a.frag"])).unwrap();
        assert!(matches!(
            origin,
            ShaderOrigin::Files { ref vertex, ref fragment }
                if vertex.ends_with("a.vert") && fragment.ends_with("a.frag")
        ));

        assert!(ShaderOrigin::from_args(args(&["a.vert"])).is_err());
        assert!(ShaderOrigin::from_args(args(&["a", "b", "c"])).is_err());
    }
}
