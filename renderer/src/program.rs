//! Shading programs: per-block color computation plugged into a stage

use crate::lane::{F32x16, LaneMask};

/// Computes the color of a block's live pixels.
///
/// `params` holds one lane vector per configured attribute slot. The
/// program must fill `color` with R, G, B, A in `[0, 1]` for every lane set
/// in `mask`; lanes outside the mask may hold anything but must not fault.
/// Programs must not have other side effects.
pub trait ShadingProgram {
    /// Caller-defined data shared by every block of a draw
    type Uniforms: ?Sized;

    fn shade_pixels(
        &self,
        params: &[F32x16],
        color: &mut [F32x16; 4],
        uniforms: &Self::Uniforms,
        mask: LaneMask,
    );
}

impl<P: ShadingProgram + ?Sized> ShadingProgram for &P {
    type Uniforms = P::Uniforms;

    #[inline]
    fn shade_pixels(
        &self,
        params: &[F32x16],
        color: &mut [F32x16; 4],
        uniforms: &Self::Uniforms,
        mask: LaneMask,
    ) {
        (**self).shade_pixels(params, color, uniforms, mask)
    }
}

/// Fills every pixel with the RGBA uniform
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatColor;

impl ShadingProgram for FlatColor {
    type Uniforms = [f32; 4];

    fn shade_pixels(
        &self,
        _params: &[F32x16],
        color: &mut [F32x16; 4],
        uniforms: &[f32; 4],
        _mask: LaneMask,
    ) {
        for (out, &value) in color.iter_mut().zip(uniforms) {
            *out = F32x16::splat(value);
        }
    }
}

/// Gouraud shading: attributes 0-2 are R, G, B. Attribute 3, if set up,
/// is alpha; otherwise alpha is 1. The uniform scales alpha.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexColor;

impl ShadingProgram for VertexColor {
    type Uniforms = f32;

    fn shade_pixels(
        &self,
        params: &[F32x16],
        color: &mut [F32x16; 4],
        opacity: &f32,
        _mask: LaneMask,
    ) {
        for (channel, out) in color.iter_mut().take(3).enumerate() {
            *out = params.get(channel).copied().unwrap_or(F32x16::ZERO);
        }
        let alpha = params.get(3).copied().unwrap_or(F32x16::ONE);
        color[3] = alpha * F32x16::splat(*opacity);
    }
}

/// Checkerboard over texture coordinates in attributes 0 and 1
#[derive(Debug, Clone, Copy, Default)]
pub struct Checkerboard;

#[derive(Debug, Clone, Copy)]
pub struct CheckerUniforms {
    /// Squares per unit of texture coordinate
    pub scale: f32,
    pub even: [f32; 4],
    pub odd: [f32; 4],
}

impl ShadingProgram for Checkerboard {
    type Uniforms = CheckerUniforms;

    fn shade_pixels(
        &self,
        params: &[F32x16],
        color: &mut [F32x16; 4],
        uniforms: &CheckerUniforms,
        _mask: LaneMask,
    ) {
        assert!(params.len() >= 2, "checkerboard needs u and v attributes");
        let scale = F32x16::splat(uniforms.scale);
        let u = (params[0] * scale).floor();
        let v = (params[1] * scale).floor();

        // (u + v) mod 2, without branching per lane
        let sum = u + v;
        let parity = sum - (sum * F32x16::splat(0.5)).floor() * F32x16::splat(2.0);
        let odd = parity.gt(F32x16::splat(0.5));

        for (channel, out) in color.iter_mut().enumerate() {
            *out = F32x16::select(
                odd,
                F32x16::splat(uniforms.odd[channel]),
                F32x16::splat(uniforms.even[channel]),
            );
        }
    }
}
