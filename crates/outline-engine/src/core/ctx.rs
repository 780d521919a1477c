use winit::dpi::PhysicalSize;

use crate::device::Gl;

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a> {
    /// Device of the window being drawn.
    pub gl: &'a Gl,

    /// Drawable size in physical pixels.
    pub size: PhysicalSize<u32>,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

impl FrameCtx<'_> {
    /// Width over height; `1.0` while the surface is zero-sized.
    pub fn aspect_ratio(&self) -> f32 {
        if self.size.width == 0 || self.size.height == 0 {
            return 1.0;
        }
        self.size.width as f32 / self.size.height as f32
    }
}
