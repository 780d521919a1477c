use anyhow::{Context, Result};

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::core::{App, AppControl, FrameCtx};
use crate::device::{Gl, GlContext, GlInit};

/// When the runtime redraws the window.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RedrawMode {
    /// Sleep until an event arrives; redraw only when the platform asks.
    #[default]
    OnEvent,
    /// Request a new frame as soon as the previous one was presented.
    Continuous,
}

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub redraw: RedrawMode,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "outline".to_string(),
            initial_size: LogicalSize::new(640.0, 480.0),
            redraw: RedrawMode::OnEvent,
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window with a GL context and drives `app` until the window
    /// closes or the app asks to exit.
    pub fn run<A>(config: RuntimeConfig, gl_init: GlInit, app: A) -> Result<()>
    where
        A: App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gl_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        state.failure.take().map_or(Ok(()), Err)
    }
}

/// Clears the frame and hands it to the app.
fn render_frame<A: App>(
    app: &mut A,
    gl: &Gl,
    clear_color: [f32; 4],
    size: PhysicalSize<u32>,
    frame_index: u64,
) -> AppControl {
    gl.clear_color(clear_color);
    gl.clear();

    let mut ctx = FrameCtx {
        gl,
        size,
        frame_index,
    };
    app.on_frame(&mut ctx)
}

/// Releases everything in dependency order: the app first (after its
/// `on_exit` hook, while the context is still alive), then the device
/// handle, then the context the device belongs to.
///
/// Generic over the context so teardown order can be checked without a
/// window.
fn release<A: App, C>(app: &mut Option<A>, gl: &mut Option<Gl>, context: &mut Option<C>) {
    if let Some(mut app) = app.take() {
        if context.is_some() {
            app.on_exit();
        }
        drop(app);
    }
    *gl = None;
    *context = None;
}

struct AppState<A: App> {
    config: RuntimeConfig,
    gl_init: GlInit,

    /// `None` once released; GL-owning app state never outlives `context`.
    app: Option<A>,
    context: Option<GlContext>,
    gl: Option<Gl>,
    frame_index: u64,

    exit_requested: bool,
    failure: Option<anyhow::Error>,
}

impl<A: App> AppState<A> {
    fn new(config: RuntimeConfig, gl_init: GlInit, app: A) -> Self {
        Self {
            config,
            gl_init,
            app: Some(app),
            context: None,
            gl: None,
            frame_index: 0,
            exit_requested: false,
            failure: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn release(&mut self) {
        release(&mut self.app, &mut self.gl, &mut self.context);
    }

    fn create_context(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let context = GlContext::new(event_loop, attrs, self.gl_init.clone())
            .context("failed to create window with GL context")?;
        let gl = context.gl();
        self.context = Some(context);
        self.gl = Some(gl.clone());

        let Some(app) = self.app.as_mut() else {
            return Ok(());
        };
        if let Err(e) = app.init(&gl) {
            // A partially initialized app may already own GL objects.
            drop(gl);
            self.release();
            return Err(e.context("application init failed"));
        }

        if let Some(context) = &self.context {
            context.window().request_redraw();
        }
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(app), Some(context), Some(gl)) =
            (self.app.as_mut(), self.context.as_ref(), self.gl.as_ref())
        else {
            return;
        };

        let control = render_frame(
            app,
            gl,
            context.clear_color(),
            context.size(),
            self.frame_index,
        );
        self.frame_index = self.frame_index.wrapping_add(1);

        if let Err(e) = context.present() {
            self.fail(event_loop, e);
            return;
        }
        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A: App> Drop for AppState<A> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<A: App> ApplicationHandler for AppState<A> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.context.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_context(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        if self.config.redraw == RedrawMode::Continuous {
            if let Some(context) = &self.context {
                context.window().request_redraw();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let control = self
            .app
            .as_mut()
            .map_or(AppControl::Continue, |app| app.on_window_event(&event));
        if control == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.request_exit(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Some(context) = self.context.as_mut() {
                    context.resize(new_size);
                    context.window().request_redraw();
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(context) = self.context.as_mut() {
                    let new_size = context.window().inner_size();
                    context.resize(new_size);
                    context.window().request_redraw();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.release();
        log::debug!("runtime exiting after {} frames", self.frame_index);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::buffer::Vertex2;
    use crate::device::{DrawCall, ObjectKind, RecordingDevice};
    use crate::shader::Program;
    use crate::shape::{Shape, Topology};

    struct Outline {
        program: Option<Program>,
        shapes: Vec<Shape>,
        frames_before_exit: u64,
    }

    impl App for Outline {
        fn init(&mut self, gl: &Gl) -> Result<()> {
            self.program = Some(Program::build(
                gl,
                Some("#version 150\nin vec2 position; void main(){gl_Position=vec4(position,0,1);}"),
                Some("#version 150\nout vec4 fragment; void main(){fragment=vec4(0,0,0,1);}"),
            ));
            let square = [
                Vertex2::new([-0.5, -0.5]),
                Vertex2::new([0.5, -0.5]),
                Vertex2::new([0.5, 0.5]),
                Vertex2::new([-0.5, 0.5]),
            ];
            let outline = Shape::new(gl, &square)?;
            self.shapes = vec![outline.share(Topology::Points), outline];
            Ok(())
        }

        fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
            if self.program.as_ref().is_some_and(Program::use_program) {
                for shape in &self.shapes {
                    shape.draw();
                }
            }
            if ctx.frame_index + 1 >= self.frames_before_exit {
                AppControl::Exit
            } else {
                AppControl::Continue
            }
        }

        fn on_exit(&mut self) {
            self.shapes.clear();
            self.program = None;
        }
    }

    #[test]
    fn frames_clear_then_draw_with_the_active_program() {
        let dev = Rc::new(RecordingDevice::new());
        let gl: Gl = dev.clone();
        let mut app = Outline {
            program: None,
            shapes: Vec::new(),
            frames_before_exit: 2,
        };
        app.init(&gl).unwrap();

        let size = PhysicalSize::new(640, 640);
        let white = [1.0, 1.0, 1.0, 0.0];
        assert_eq!(render_frame(&mut app, &gl, white, size, 0), AppControl::Continue);
        assert_eq!(render_frame(&mut app, &gl, white, size, 1), AppControl::Exit);

        assert_eq!(dev.clears(), 2);
        assert_eq!(dev.clear_color_value(), white);

        let program = app.program.as_ref().and_then(Program::id);
        let calls = dev.draw_calls();
        assert_eq!(calls.len(), 4);
        assert!(calls.iter().all(|c: &DrawCall| c.program == program && c.count == 4));
        assert_eq!(calls[0].topology, Topology::Points);
        assert_eq!(calls[1].topology, Topology::LineLoop);

        app.on_exit();
        assert!(dev.errors().is_empty());
        assert_eq!(dev.live(ObjectKind::Buffer), 0);
        assert_eq!(dev.live(ObjectKind::Program), 0);
    }

    #[test]
    fn failed_program_skips_drawing() {
        let dev = Rc::new(RecordingDevice::new());
        let gl: Gl = dev.clone();
        let mut app = Outline {
            program: Some(Program::invalid(&gl)),
            shapes: vec![Shape::new(&gl, &[Vertex2::new([0.0, 0.0])]).unwrap()],
            frames_before_exit: 10,
        };

        let control = render_frame(&mut app, &gl, [0.0; 4], PhysicalSize::new(1, 1), 0);
        assert_eq!(control, AppControl::Continue);
        assert!(dev.draw_calls().is_empty());
        assert_eq!(dev.clears(), 1);
    }

    #[test]
    fn default_config_waits_for_events() {
        let config = RuntimeConfig::default();
        assert_eq!(config.redraw, RedrawMode::OnEvent);
        assert_eq!(config.initial_size, LogicalSize::new(640.0, 480.0));
    }

    /// Stands in for `GlContext`: records which device objects were still
    /// alive when it was dropped.
    struct StandInContext {
        dev: Rc<RecordingDevice>,
        live_at_drop: LiveCounts,
    }

    impl Drop for StandInContext {
        fn drop(&mut self) {
            self.live_at_drop.set(Some((
                self.dev.live(ObjectKind::Program),
                self.dev.live(ObjectKind::VertexArray),
                self.dev.live(ObjectKind::Buffer),
            )));
        }
    }

    type LiveCounts = Rc<Cell<Option<(usize, usize, usize)>>>;

    fn context_for(dev: &Rc<RecordingDevice>) -> (StandInContext, LiveCounts) {
        let live_at_drop = Rc::new(Cell::new(None));
        let context = StandInContext {
            dev: dev.clone(),
            live_at_drop: live_at_drop.clone(),
        };
        (context, live_at_drop)
    }

    /// Keeps the default `on_exit`, so its GL objects go away only when the
    /// app itself is dropped.
    struct Holder {
        program: Option<Program>,
        shape: Option<Shape>,
        fail_init: bool,
        dropped: Rc<Cell<bool>>,
    }

    impl Holder {
        fn new(fail_init: bool) -> Self {
            Self {
                program: None,
                shape: None,
                fail_init,
                dropped: Rc::new(Cell::new(false)),
            }
        }
    }

    impl App for Holder {
        fn init(&mut self, gl: &Gl) -> Result<()> {
            let line = [Vertex2::new([0.0, 0.0]), Vertex2::new([1.0, 1.0])];
            self.shape = Some(Shape::new(gl, &line)?);
            if self.fail_init {
                anyhow::bail!("shader directory missing");
            }
            self.program = Some(Program::build(
                gl,
                Some("#version 150\nin vec2 position; void main(){gl_Position=vec4(position,0,1);}"),
                Some("#version 150\nout vec4 fragment; void main(){fragment=vec4(0,0,0,1);}"),
            ));
            Ok(())
        }

        fn on_frame(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
            AppControl::Continue
        }
    }

    impl Drop for Holder {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[test]
    fn release_drops_app_objects_before_the_context() {
        let dev = Rc::new(RecordingDevice::new());
        let gl: Gl = dev.clone();
        let (context, live_at_drop) = context_for(&dev);

        let mut holder = Holder::new(false);
        holder.init(&gl).unwrap();
        assert!(holder.program.as_ref().is_some_and(Program::is_valid));
        assert_eq!(dev.live(ObjectKind::Program), 1);

        let mut app = Some(holder);
        let mut gl = Some(gl);
        let mut context = Some(context);
        release(&mut app, &mut gl, &mut context);

        assert!(app.is_none() && gl.is_none() && context.is_none());
        assert_eq!(live_at_drop.get(), Some((0, 0, 0)));
        assert!(dev.errors().is_empty());
    }

    #[test]
    fn failed_init_still_releases_partial_state_first() {
        let dev = Rc::new(RecordingDevice::new());
        let gl: Gl = dev.clone();
        let (context, live_at_drop) = context_for(&dev);

        let mut holder = Holder::new(true);
        assert!(holder.init(&gl).is_err());
        assert_eq!(dev.live(ObjectKind::Buffer), 1);

        release(&mut Some(holder), &mut Some(gl), &mut Some(context));
        assert_eq!(live_at_drop.get(), Some((0, 0, 0)));
    }

    #[test]
    fn on_exit_runs_only_while_a_context_exists() {
        struct Counting(Rc<Cell<u32>>);

        impl App for Counting {
            fn init(&mut self, _gl: &Gl) -> Result<()> {
                Ok(())
            }

            fn on_frame(&mut self, _ctx: &mut FrameCtx<'_>) -> AppControl {
                AppControl::Continue
            }

            fn on_exit(&mut self) {
                self.0.set(self.0.get() + 1);
            }
        }

        let dev = Rc::new(RecordingDevice::new());
        let calls = Rc::new(Cell::new(0));

        let (context, _) = context_for(&dev);
        release(&mut Some(Counting(calls.clone())), &mut None, &mut Some(context));
        assert_eq!(calls.get(), 1);

        release(&mut Some(Counting(calls.clone())), &mut None, &mut None::<StandInContext>);
        assert_eq!(calls.get(), 1);

        let holder = Holder::new(false);
        let dropped = holder.dropped.clone();
        release(&mut Some(holder), &mut None, &mut None::<StandInContext>);
        assert!(dropped.get());
    }
}
