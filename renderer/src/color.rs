//! Packed pixel colors and fixed-point blending
//!
//! Pixels are packed as `0x00RRGGBB`: red in bits 16-23, green in 8-15,
//! blue in 0-7.

use crate::lane::{F32x16, I32x16};

/// Pack RGB values into a 32-bit color
#[inline]
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Split a packed color into (r, g, b)
#[inline]
pub const fn unpack_rgb(color: u32) -> (u8, u8, u8) {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

/// Quantize a `[0, 1]` float channel to `0..=255`: clamp, scale by 255,
/// truncate.
#[inline]
pub fn quantize_channel(channel: F32x16) -> I32x16 {
    (channel.clamp01() * F32x16::splat(255.0)).to_i32()
}

/// Extract the 8-bit channel at bit offset `shift`
#[inline]
pub fn unpack_channel(packed: I32x16, shift: u32) -> I32x16 {
    (packed >> shift) & I32x16::splat(0xff)
}

/// Pack three 8-bit channel vectors into pixels
#[inline]
pub fn pack_channels(r: I32x16, g: I32x16, b: I32x16) -> I32x16 {
    b | (g << 8) | (r << 16)
}

/// `(src * alpha + dst * (255 - alpha)) >> 8`
///
/// The shift divides by 256 rather than 255, so an opaque source comes out
/// slightly darker and a transparent one slightly darker than the
/// destination. Output stays bit-exact with that rounding.
#[inline]
pub fn blend_channel(src: I32x16, dst: I32x16, alpha: I32x16, one_minus_alpha: I32x16) -> I32x16 {
    ((src * alpha) + (dst * one_minus_alpha)) >> 8
}

/// Blend quantized source channels over packed destination pixels using
/// the quantized alpha.
pub fn blend_over(r: I32x16, g: I32x16, b: I32x16, alpha: I32x16, dest: I32x16) -> I32x16 {
    let one_minus_alpha = I32x16::splat(255) - alpha;

    let new_r = blend_channel(r, unpack_channel(dest, 16), alpha, one_minus_alpha);
    let new_g = blend_channel(g, unpack_channel(dest, 8), alpha, one_minus_alpha);
    let new_b = blend_channel(b, unpack_channel(dest, 0), alpha, one_minus_alpha);
    pack_channels(new_r, new_g, new_b)
}
