//! Plane-equation interpolation of depth and vertex attributes
//!
//! Each interpolated quantity is a plane `c(x, y) = gx * x + gy * y + c00`
//! fitted through the three vertices. Attributes are perspective-correct:
//! the plane of `c / w` is divided by the plane of `1 / w` at every lane.
//! Depth is already affine in screen space and uses its plane directly.

use crate::lane::{lane_columns, lane_rows, F32x16};
use crate::math::ndc_scale;
use crate::vertex::Triangle;
use log::debug;

/// Number of attribute slots
pub const MAX_PARAMS: usize = 16;

/// A single plane through three (x, y, value) points
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearInterpolator {
    gx: f32,
    gy: f32,
    c00: f32,
}

impl LinearInterpolator {
    /// Fit the plane through `values` at the triangle's vertex positions.
    /// Zero-area triangles produce non-finite coefficients.
    pub fn new(triangle: &Triangle, values: [f32; 3]) -> Self {
        let [v0, v1, v2] = triangle.vertices;
        let a = v1.position.x - v0.position.x;
        let b = v1.position.y - v0.position.y;
        let c = v2.position.x - v0.position.x;
        let d = v2.position.y - v0.position.y;
        let e = values[1] - values[0];
        let f = values[2] - values[0];

        // Cramer's rule on [a b; c d] * [gx gy]^T = [e f]^T
        let det = a * d - b * c;
        let gx = (e * d - b * f) / det;
        let gy = (a * f - e * c) / det;

        Self {
            gx,
            gy,
            c00: values[0] - v0.position.x * gx - v0.position.y * gy,
        }
    }

    /// Plane value at a single point
    #[inline]
    pub fn value_at(&self, x: f32, y: f32) -> f32 {
        x * self.gx + y * self.gy + self.c00
    }

    /// Plane value at every lane position
    #[inline]
    pub fn values_at(&self, x: F32x16, y: F32x16) -> F32x16 {
        x * F32x16::splat(self.gx) + y * F32x16::splat(self.gy) + F32x16::splat(self.c00)
    }

    /// `(d/dx, d/dy)` in NDC units
    pub fn gradient(&self) -> (f32, f32) {
        (self.gx, self.gy)
    }
}

/// Depth and attribute planes for the current triangle
#[derive(Debug, Clone)]
pub struct ParameterInterpolator {
    x_step: F32x16,
    y_step: F32x16,
    triangle: Option<Triangle>,
    depth: LinearInterpolator,
    one_over_w: LinearInterpolator,
    params: [LinearInterpolator; MAX_PARAMS],
    param_count: usize,
}

impl ParameterInterpolator {
    /// Create an interpolator for a `width` x `height` pixel target. Lane
    /// offsets are cached in NDC units.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "target must have a non-zero size");
        let scale = ndc_scale(width, height);

        Self {
            x_step: lane_columns() * F32x16::splat(scale.x),
            y_step: lane_rows() * F32x16::splat(scale.y),
            triangle: None,
            depth: LinearInterpolator::default(),
            one_over_w: LinearInterpolator::default(),
            params: [LinearInterpolator::default(); MAX_PARAMS],
            param_count: 0,
        }
    }

    /// Replace the current triangle. Attribute slots from the previous
    /// triangle are discarded.
    pub fn set_up_triangle(&mut self, triangle: Triangle) {
        let [v0, v1, v2] = triangle.vertices;
        if triangle.is_degenerate() {
            debug!("zero-area triangle set up; planes are undefined");
        }

        self.depth = LinearInterpolator::new(
            &triangle,
            [v0.position.z, v1.position.z, v2.position.z],
        );
        self.one_over_w = LinearInterpolator::new(&triangle, [1.0 / v0.w, 1.0 / v1.w, 1.0 / v2.w]);
        self.triangle = Some(triangle);
        self.param_count = 0;
    }

    /// Set attribute slot `index` to the per-vertex values `c`
    pub fn set_up_param(&mut self, index: usize, c: [f32; 3]) {
        assert!(index < MAX_PARAMS, "parameter index {} out of range", index);
        let Some(triangle) = self.triangle.as_ref() else {
            panic!("set_up_param called before set_up_triangle");
        };
        let [v0, v1, v2] = triangle.vertices;

        self.params[index] =
            LinearInterpolator::new(triangle, [c[0] / v0.w, c[1] / v1.w, c[2] / v2.w]);
        self.param_count = self.param_count.max(index + 1);
    }

    /// Number of attribute slots that `compute_params` fills
    #[inline]
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn triangle(&self) -> Option<&Triangle> {
        self.triangle.as_ref()
    }

    /// Evaluate every configured attribute at the 16 lanes of the block whose
    /// top-left pixel is at NDC `(x, y)`. Writes `param_count()` entries of
    /// `out_params` and returns the interpolated depth.
    pub fn compute_params(&self, x: f32, y: f32, out_params: &mut [F32x16; MAX_PARAMS]) -> F32x16 {
        assert!(self.triangle.is_some(), "compute_params called before set_up_triangle");
        let xs = self.x_step + F32x16::splat(x);
        let ys = self.y_step + F32x16::splat(y);

        let w = self.one_over_w.values_at(xs, ys).recip();
        for (out, plane) in out_params.iter_mut().zip(&self.params[..self.param_count]) {
            *out = plane.values_at(xs, ys) * w;
        }

        self.depth.values_at(xs, ys)
    }
}
