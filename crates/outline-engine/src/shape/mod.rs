//! Drawable shapes.
//!
//! A [`Shape`] pairs shared device geometry with a [`Topology`] tag selecting
//! the primitive its draw command emits.

mod drawable;
mod topology;

pub use drawable::Shape;
pub use topology::Topology;
