//! Graphics device layer.
//!
//! This module is responsible for:
//! - the `GlDevice` capability interface every engine operation goes through
//! - the `glow` backend and the in-memory `RecordingDevice`
//! - creating a window with a current OpenGL context and presenting frames

mod api;
mod context;
mod glsl_check;
mod init;
mod native;
mod recording;

pub use api::{BufferId, Gl, GlDevice, ProgramId, ShaderId, VertexArrayId};
pub use context::GlContext;
pub use init::GlInit;
pub use native::GlowDevice;
pub use recording::{AttribLayout, DrawCall, ObjectKind, RecordingDevice};
