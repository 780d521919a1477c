use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use glow::HasContext;
use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use super::{Gl, GlDevice, GlInit, GlowDevice};

/// Owns a window together with its current OpenGL context and surface.
///
/// This type is the low-level rendering context:
/// - creates the window and picks a framebuffer config
/// - creates the GL context, makes it current and loads `glow`
/// - clears, resizes and presents the window surface
///
/// Fields drop in declaration order: the device first, then surface, context
/// and finally the window they were created for. Anything still holding a
/// [`Gl`] clone must be dropped before this value.
pub struct GlContext {
    /// Device bound to `context`.
    gl: Rc<GlowDevice>,

    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,

    clear_color: [f32; 4],

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
}

impl GlContext {
    /// Creates a window with a current GL context.
    pub fn new(
        event_loop: &ActiveEventLoop,
        attributes: WindowAttributes,
        init: GlInit,
    ) -> Result<Self> {
        let GlInit {
            version: (major, minor),
            core_profile,
            vsync,
            clear_color,
        } = init;

        let template = ConfigTemplateBuilder::new().with_alpha_size(8);
        let (window, config) = DisplayBuilder::new()
            .with_window_attributes(Some(attributes))
            .build(event_loop, template, |configs| {
                configs
                    .reduce(|best, c| if c.num_samples() > best.num_samples() { c } else { best })
                    .expect("glutin only invokes the picker with at least one config")
            })
            .map_err(|e| anyhow!("failed to create window and GL config: {e}"))?;

        let window = window.context("display builder did not create a window")?;
        let raw_window_handle = window
            .window_handle()
            .map_err(|e| anyhow!("window has no native handle: {e}"))?
            .as_raw();

        let display = config.display();
        let profile = if core_profile {
            GlProfile::Core
        } else {
            GlProfile::Compatibility
        };
        let context_attributes = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .with_profile(profile)
            .build(Some(raw_window_handle));

        let not_current = unsafe { display.create_context(&config, &context_attributes) }
            .map_err(|e| anyhow!("failed to create OpenGL {major}.{minor} context: {e}"))?;

        let surface_attributes = window
            .build_surface_attributes(Default::default())
            .map_err(|e| anyhow!("failed to describe window surface: {e}"))?;
        let surface = unsafe { display.create_window_surface(&config, &surface_attributes) }
            .map_err(|e| anyhow!("failed to create window surface: {e}"))?;

        let context = not_current
            .make_current(&surface)
            .map_err(|e| anyhow!("failed to make GL context current: {e}"))?;

        let interval = if vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            log::warn!("failed to set swap interval: {e}");
        }

        // The context is current on this thread from here on.
        let raw = unsafe {
            glow::Context::from_loader_function_cstr(|name| display.get_proc_address(name))
        };
        let version = unsafe { raw.get_parameter_string(glow::VERSION) };
        log::info!("OpenGL context ready: {version}");

        let size = window.inner_size();
        let gl = Rc::new(GlowDevice::new(raw));
        let ctx = Self {
            gl,
            surface,
            context,
            window,
            clear_color,
            size,
        };
        apply_viewport(&*ctx.gl, ctx.size);
        Ok(ctx)
    }

    /// Returns a shared handle to the device.
    pub fn gl(&self) -> Gl {
        self.gl.clone()
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Resizes the surface and the viewport.
    ///
    /// A zero-sized surface cannot be configured; in that case only internal
    /// state is updated until the next non-zero size arrives.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;

        let (Some(w), Some(h)) = (NonZeroU32::new(new_size.width), NonZeroU32::new(new_size.height))
        else {
            return;
        };
        self.surface.resize(&self.context, w, h);
        apply_viewport(&*self.gl, self.size);
    }

    /// Color the frame is cleared to before the app draws.
    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    /// Presents the frame by swapping buffers.
    pub fn present(&self) -> Result<()> {
        self.window.pre_present_notify();
        self.surface
            .swap_buffers(&self.context)
            .map_err(|e| anyhow!("failed to swap buffers: {e}"))
    }
}

/// Maps the whole drawable to clip space. Sizes beyond `i32::MAX` saturate;
/// no real surface gets there.
fn apply_viewport(gl: &dyn GlDevice, size: PhysicalSize<u32>) {
    let w = i32::try_from(size.width).unwrap_or(i32::MAX);
    let h = i32::try_from(size.height).unwrap_or(i32::MAX);
    gl.viewport(0, 0, w, h);
}
