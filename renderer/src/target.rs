//! Render targets: the color and depth buffers a shading stage writes to

use crate::error::{TargetError, TargetResult};
use crate::lane::{F32x16, I32x16, LaneMask, BLOCK_HEIGHT, BLOCK_WIDTH};
use crate::surface::{ColorBuffer, DepthBuffer};

/// Block-granular access to a color buffer and a depth buffer.
///
/// Block coordinates are the top-left pixel of a block and must leave the
/// whole block inside the target. Masked writes only touch lanes set in
/// the mask.
pub trait RenderTarget {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Whether a depth buffer is attached
    fn has_depth(&self) -> bool;

    fn read_depth_block(&self, x: usize, y: usize) -> F32x16;
    fn write_depth_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: F32x16);

    /// Packed `0x00RRGGBB` pixels
    fn read_color_block(&self, x: usize, y: usize) -> I32x16;
    fn write_color_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: I32x16);
}

impl<T: RenderTarget + ?Sized> RenderTarget for &mut T {
    #[inline]
    fn width(&self) -> usize {
        (**self).width()
    }

    #[inline]
    fn height(&self) -> usize {
        (**self).height()
    }

    #[inline]
    fn has_depth(&self) -> bool {
        (**self).has_depth()
    }

    #[inline]
    fn read_depth_block(&self, x: usize, y: usize) -> F32x16 {
        (**self).read_depth_block(x, y)
    }

    #[inline]
    fn write_depth_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: F32x16) {
        (**self).write_depth_block_masked(x, y, mask, values)
    }

    #[inline]
    fn read_color_block(&self, x: usize, y: usize) -> I32x16 {
        (**self).read_color_block(x, y)
    }

    #[inline]
    fn write_color_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: I32x16) {
        (**self).write_color_block_masked(x, y, mask, values)
    }
}

/// A color buffer with an optional depth buffer
#[derive(Debug, Clone)]
pub struct FrameTarget {
    color: ColorBuffer,
    depth: Option<DepthBuffer>,
}

impl FrameTarget {
    /// Create a color-only target cleared to black. It must hold at least
    /// one block; blocks that would cross the right or bottom edge cannot be
    /// shaded.
    pub fn new(width: usize, height: usize) -> TargetResult<Self> {
        if width == 0 || height == 0 {
            return Err(TargetError::EmptyDimensions);
        }
        if width < BLOCK_WIDTH || height < BLOCK_HEIGHT {
            return Err(TargetError::TooSmall { width, height });
        }

        Ok(Self {
            color: ColorBuffer::new(width, height, 0),
            depth: None,
        })
    }

    /// Attach a depth buffer cleared to infinitely far
    pub fn with_depth(mut self) -> Self {
        self.depth = Some(DepthBuffer::new(
            self.color.width(),
            self.color.height(),
            f32::INFINITY,
        ));
        self
    }

    pub fn color(&self) -> &ColorBuffer {
        &self.color
    }

    pub fn color_mut(&mut self) -> &mut ColorBuffer {
        &mut self.color
    }

    pub fn depth(&self) -> Option<&DepthBuffer> {
        self.depth.as_ref()
    }

    pub fn depth_mut(&mut self) -> Option<&mut DepthBuffer> {
        self.depth.as_mut()
    }

    /// Clear the color buffer
    pub fn clear(&mut self, color: u32) {
        self.color.clear(color);
    }

    /// Clear the depth buffer, if any
    pub fn clear_depth(&mut self, value: f32) {
        if let Some(depth) = self.depth.as_mut() {
            depth.clear(value);
        }
    }

    fn depth_buffer(&self) -> &DepthBuffer {
        match self.depth.as_ref() {
            Some(depth) => depth,
            None => panic!("render target has no depth buffer"),
        }
    }
}

impl RenderTarget for FrameTarget {
    #[inline]
    fn width(&self) -> usize {
        self.color.width()
    }

    #[inline]
    fn height(&self) -> usize {
        self.color.height()
    }

    #[inline]
    fn has_depth(&self) -> bool {
        self.depth.is_some()
    }

    fn read_depth_block(&self, x: usize, y: usize) -> F32x16 {
        F32x16(self.depth_buffer().read_block(x, y))
    }

    fn write_depth_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: F32x16) {
        match self.depth.as_mut() {
            Some(depth) => depth.write_block_masked(x, y, mask, &values.0),
            None => panic!("render target has no depth buffer"),
        }
    }

    fn read_color_block(&self, x: usize, y: usize) -> I32x16 {
        I32x16::from_bits(self.color.read_block(x, y))
    }

    fn write_color_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: I32x16) {
        self.color.write_block_masked(x, y, mask, &values.to_bits());
    }
}
