//! 2D pixel buffers with block-granular access

use crate::lane::{LaneMask, BLOCK_HEIGHT, BLOCK_WIDTH, LANES};
use alloc::vec;
use alloc::vec::Vec;

/// A row-major `width` x `height` buffer
#[derive(Debug, Clone)]
pub struct Surface<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

/// Packed `0x00RRGGBB` pixels
pub type ColorBuffer = Surface<u32>;

/// Depth values, smaller is nearer
pub type DepthBuffer = Surface<f32>;

impl<T: Copy> Surface<T> {
    /// Create a buffer with every pixel set to `fill`
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            data: vec![fill; width * height],
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Set every pixel to `value`
    pub fn clear(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Get pixel at (x, y)
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<T> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.width + x])
        } else {
            None
        }
    }

    /// Set pixel at (x, y); out-of-bounds writes are ignored
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Whether the block with top-left pixel (x, y) lies inside the buffer
    #[inline]
    pub fn contains_block(&self, x: usize, y: usize) -> bool {
        x + BLOCK_WIDTH <= self.width && y + BLOCK_HEIGHT <= self.height
    }

    #[inline]
    fn assert_block(&self, x: usize, y: usize) {
        assert!(
            self.contains_block(x, y),
            "block at ({}, {}) is outside {}x{} surface",
            x,
            y,
            self.width,
            self.height
        );
    }

    #[inline]
    fn lane_index(&self, x: usize, y: usize, lane: usize) -> usize {
        (y + lane / BLOCK_WIDTH) * self.width + x + lane % BLOCK_WIDTH
    }

    /// Read the block with top-left pixel (x, y), one value per lane
    pub fn read_block(&self, x: usize, y: usize) -> [T; LANES] {
        self.assert_block(x, y);
        core::array::from_fn(|lane| self.data[self.lane_index(x, y, lane)])
    }

    /// Write the lanes of `values` selected by `mask`; other pixels are
    /// left untouched.
    pub fn write_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: &[T; LANES]) {
        self.assert_block(x, y);
        for lane in mask.iter() {
            let idx = self.lane_index(x, y, lane);
            self.data[idx] = values[lane];
        }
    }

    /// Set every pixel of a block to `value`
    pub fn fill_block(&mut self, x: usize, y: usize, value: T) {
        self.write_block_masked(x, y, LaneMask::ALL, &[value; LANES]);
    }

    /// Raw row-major pixel data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}
