use anyhow::Result;
use winit::event::WindowEvent;

use crate::device::Gl;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// All callbacks run on the thread owning the GL context.
pub trait App {
    /// Called once the GL context is current, before the first frame.
    ///
    /// Build programs and upload geometry here. An error stops the runtime.
    fn init(&mut self, gl: &Gl) -> Result<()>;

    /// Called for window events, before the runtime handles them.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw, after the frame was cleared and before it is
    /// presented. Activate a program and draw shapes here.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called while the GL context is still current, right before it is
    /// destroyed; also after a failed `init`. The app itself is dropped
    /// next, still ahead of the context, so GL-owning fields need no manual
    /// release.
    fn on_exit(&mut self) {}
}
