//! Screen-space triangle input

use glam::{Vec2, Vec3};

/// A vertex after projection: x and y in normalized device coordinates,
/// z is the value written to the depth buffer and w the clip-space w used
/// for perspective correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub position: Vec3,
    pub w: f32,
}

impl ScreenVertex {
    /// Create a vertex with an explicit clip-space w
    pub const fn new(position: Vec3, w: f32) -> Self {
        Self { position, w }
    }

    /// Create a vertex with no perspective (w = 1)
    pub const fn from_xyz(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: Vec3::new(x, y, z),
            w: 1.0,
        }
    }

    #[inline]
    pub fn xy(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.y)
    }
}

impl From<Vec3> for ScreenVertex {
    fn from(position: Vec3) -> Self {
        Self { position, w: 1.0 }
    }
}

/// Three screen-space vertices
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [ScreenVertex; 3],
}

impl Triangle {
    pub const fn new(v0: ScreenVertex, v1: ScreenVertex, v2: ScreenVertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Twice the signed area in NDC units. Positive for counter-clockwise
    /// winding with y up.
    #[inline]
    pub fn signed_area2(&self) -> f32 {
        let [v0, v1, v2] = self.vertices;
        (v1.xy() - v0.xy()).perp_dot(v2.xy() - v0.xy())
    }

    /// Zero-area triangles have no well-defined planes
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.signed_area2() == 0.0
    }

    /// Centroid in NDC
    pub fn centroid(&self) -> Vec2 {
        let [v0, v1, v2] = self.vertices;
        (v0.xy() + v1.xy() + v2.xy()) / 3.0
    }
}
