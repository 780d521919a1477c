//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the window's GL context, and drives an
//! [`App`](crate::core::App) through them.

mod runtime;

pub use runtime::{RedrawMode, Runtime, RuntimeConfig};
