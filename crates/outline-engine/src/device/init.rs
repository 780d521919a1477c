/// Initialization parameters for the GL layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or driver requirement exists.
#[derive(Debug, Clone)]
pub struct GlInit {
    /// Requested context version as `(major, minor)`.
    ///
    /// Shaders written against `#version 150` need at least 3.2.
    pub version: (u8, u8),

    /// Request a core-profile context.
    pub core_profile: bool,

    /// Synchronize buffer swaps with the display refresh.
    pub vsync: bool,

    /// Color the surface is cleared to before each frame (RGBA).
    pub clear_color: [f32; 4],
}

impl Default for GlInit {
    fn default() -> Self {
        Self {
            version: (3, 2),
            core_profile: true,
            vsync: true,
            clear_color: [1.0, 1.0, 1.0, 0.0],
        }
    }
}
