//! Per-block pixel shading stage
//!
//! `PixelShader` turns one 4x4 block of a set-up triangle into pixels:
//! interpolate, early depth test, run the shading program, quantize,
//! optionally blend, and write the surviving lanes to the target.

use crate::color::{blend_over, pack_channels, quantize_channel};
use crate::config::{BlendMode, StageConfig};
use crate::interpolator::{ParameterInterpolator, MAX_PARAMS};
use crate::lane::{F32x16, I32x16, LaneMask};
use crate::math::{ndc_scale, pixel_to_ndc};
use crate::program::ShadingProgram;
use crate::target::RenderTarget;
use crate::vertex::{ScreenVertex, Triangle};
use glam::{Vec2, Vec3};
use log::{debug, trace};

/// Block counters since creation or the last `reset_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadeStats {
    /// Calls to `shade_block`
    pub blocks_submitted: u64,
    /// Blocks whose every lane failed the depth test
    pub blocks_culled: u64,
    /// Blocks that went through the alpha blend path
    pub blocks_blended: u64,
    /// Blocks that reached the color write
    pub blocks_written: u64,
}

/// Shading stage bound to one render target and one shading program.
///
/// Setup (`set_up_triangle`, `set_up_param`) and shading must be sequenced
/// by the caller. The stage holds its target exclusively; sharing a frame
/// between stages needs a `RenderTarget` that hands out disjoint blocks.
pub struct PixelShader<T, P> {
    target: T,
    program: P,
    interpolator: ParameterInterpolator,
    ndc_scale: Vec2,
    config: StageConfig,
    stats: ShadeStats,
}

impl<T: RenderTarget, P: ShadingProgram> PixelShader<T, P> {
    /// Create a stage with depth test and blending disabled
    pub fn new(target: T, program: P) -> Self {
        let (width, height) = (target.width(), target.height());

        Self {
            interpolator: ParameterInterpolator::new(width, height),
            ndc_scale: ndc_scale(width, height),
            target,
            program,
            config: StageConfig::default(),
            stats: ShadeStats::default(),
        }
    }

    /// Create a stage with an explicit configuration
    pub fn with_config(target: T, program: P, config: StageConfig) -> Self {
        let mut stage = Self::new(target, program);
        stage.set_config(config);
        stage
    }

    pub fn config(&self) -> StageConfig {
        self.config
    }

    pub fn set_config(&mut self, config: StageConfig) {
        assert!(
            !config.depth_test || self.target.has_depth(),
            "depth test enabled on a target without a depth buffer"
        );
        debug!("stage config: {:?}", config);
        self.config = config;
    }

    pub fn enable_depth_test(&mut self, enable: bool) {
        self.set_config(StageConfig {
            depth_test: enable,
            ..self.config
        });
    }

    pub fn enable_blend(&mut self, enable: bool) {
        self.set_config(StageConfig {
            blend: if enable { BlendMode::Alpha } else { BlendMode::Opaque },
            ..self.config
        });
    }

    #[inline]
    pub fn is_depth_test_enabled(&self) -> bool {
        self.config.depth_test
    }

    #[inline]
    pub fn is_blend_enabled(&self) -> bool {
        self.config.blend_enabled()
    }

    /// Set up a triangle from NDC (x, y, z) vertices without perspective
    pub fn set_up_triangle(&mut self, v1: Vec3, v2: Vec3, v3: Vec3) {
        self.set_up_triangle_perspective(v1.into(), v2.into(), v3.into());
    }

    /// Set up a triangle whose vertices carry clip-space w
    pub fn set_up_triangle_perspective(
        &mut self,
        v1: ScreenVertex,
        v2: ScreenVertex,
        v3: ScreenVertex,
    ) {
        debug!(
            "triangle ({}, {}) ({}, {}) ({}, {})",
            v1.position.x,
            v1.position.y,
            v2.position.x,
            v2.position.y,
            v3.position.x,
            v3.position.y
        );
        self.interpolator.set_up_triangle(Triangle::new(v1, v2, v3));
    }

    /// Bind per-vertex values `c1, c2, c3` to attribute slot `index`
    pub fn set_up_param(&mut self, index: usize, c1: f32, c2: f32, c3: f32) {
        self.interpolator.set_up_param(index, [c1, c2, c3]);
    }

    /// Shade the block whose top-left pixel is `(left, top)`.
    ///
    /// `mask` selects the lanes inside the triangle. Returns the lanes that
    /// were written, which is always a subset of `mask` and empty when the
    /// whole block is occluded. An empty `mask` counts as submitted and
    /// touches nothing.
    pub fn shade_block(
        &mut self,
        left: usize,
        top: usize,
        uniforms: &P::Uniforms,
        mut mask: LaneMask,
    ) -> LaneMask {
        self.stats.blocks_submitted += 1;
        if mask.is_empty() {
            return LaneMask::NONE;
        }

        let origin = pixel_to_ndc(left, top, self.ndc_scale);
        let mut params = [F32x16::ZERO; MAX_PARAMS];
        let depth = self.interpolator.compute_params(origin.x, origin.y, &mut params);

        if self.config.depth_test {
            let stored = self.target.read_depth_block(left, top);

            // Early Z: lanes that fail the depth test drop out of the mask
            mask &= depth.lt(stored);
            if mask.is_empty() {
                trace!("block ({}, {}) occluded", left, top);
                self.stats.blocks_culled += 1;
                return LaneMask::NONE;
            }

            self.target.write_depth_block_masked(left, top, mask, depth);
        }

        let mut color = [F32x16::ZERO; 4];
        let param_count = self.interpolator.param_count();
        self.program
            .shade_pixels(&params[..param_count], &mut color, uniforms, mask);

        let r = quantize_channel(color[0]);
        let g = quantize_channel(color[1]);
        let b = quantize_channel(color[2]);

        // Skip blending when every live lane is opaque
        let translucent = color[3].lt(F32x16::ONE) & mask;
        let pixels = if self.config.blend_enabled() && !translucent.is_empty() {
            self.stats.blocks_blended += 1;
            let alpha = quantize_channel(color[3]) & I32x16::splat(0xff);
            let dest = self.target.read_color_block(left, top);
            blend_over(r, g, b, alpha, dest)
        } else {
            pack_channels(r, g, b)
        };

        self.target.write_color_block_masked(left, top, mask, pixels);
        self.stats.blocks_written += 1;
        mask
    }

    pub fn stats(&self) -> ShadeStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = ShadeStats::default();
    }

    pub fn interpolator(&self) -> &ParameterInterpolator {
        &self.interpolator
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn into_target(self) -> T {
        self.target
    }

    pub fn program(&self) -> &P {
        &self.program
    }
}
