//! Core engine-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! applications: an [`App`] is initialized once with the device handle and
//! then driven frame by frame through a [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
