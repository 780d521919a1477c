use bytemuck::{Pod, Zeroable};

/// Vertex with `N` floating-point position components.
///
/// Transparent over `[f32; N]`: no padding, so a slice of vertices is a
/// tightly packed float array ready for upload.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex<const N: usize> {
    pub position: [f32; N],
}

/// Two-component vertex used for flat line art.
pub type Vertex2 = Vertex<2>;

impl<const N: usize> Vertex<N> {
    #[inline]
    pub const fn new(position: [f32; N]) -> Self {
        Self { position }
    }
}

impl<const N: usize> From<[f32; N]> for Vertex<N> {
    #[inline]
    fn from(position: [f32; N]) -> Self {
        Self { position }
    }
}
