/// How a draw command interprets its vertex range.
///
/// This is the single extension axis of [`Shape`](super::Shape): adding a
/// primitive kind means adding a variant here and mapping it in each device
/// backend.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    /// Closed polyline: the last vertex connects back to the first.
    #[default]
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Topology {
    /// Smallest vertex count that produces any primitive.
    pub fn min_vertices(self) -> usize {
        match self {
            Topology::Points => 1,
            Topology::Lines | Topology::LineStrip | Topology::LineLoop => 2,
            Topology::Triangles | Topology::TriangleStrip | Topology::TriangleFan => 3,
        }
    }
}
