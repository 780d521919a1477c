//! Outline engine crate.
//!
//! A small OpenGL 3.2 core harness: it opens a window with a GL context,
//! builds shader programs from GLSL sources and draws vertex buffers as line
//! loops or other primitive topologies.
//!
//! Everything GL-facing goes through [`device::GlDevice`], so the shader,
//! buffer and shape layers run unchanged against the recording device used
//! in tests.

pub mod device;
pub mod shader;
pub mod buffer;
pub mod shape;
pub mod core;
pub mod window;

pub mod logging;
