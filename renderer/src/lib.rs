//! Block shading stage for a tile-based software rasterizer
//!
//! Given a triangle already set up in screen space, shades 4x4 pixel blocks:
//! interpolates depth and vertex attributes across 16 lanes, culls occluded
//! lanes with an early depth test, runs a pluggable shading program, and
//! writes (optionally alpha-blended) packed pixels to a render target.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod color;
pub mod config;
pub mod error;
pub mod interpolator;
pub mod lane;
pub mod math;
pub mod program;
pub mod stage;
pub mod surface;
pub mod target;
pub mod vertex;

pub use config::{BlendMode, StageConfig};
pub use error::{TargetError, TargetResult};
pub use interpolator::{LinearInterpolator, ParameterInterpolator, MAX_PARAMS};
pub use lane::{F32x16, I32x16, LaneMask, BLOCK_HEIGHT, BLOCK_WIDTH, LANES};
pub use program::{CheckerUniforms, Checkerboard, FlatColor, ShadingProgram, VertexColor};
pub use stage::{PixelShader, ShadeStats};
pub use surface::{ColorBuffer, DepthBuffer, Surface};
pub use target::{FrameTarget, RenderTarget};
pub use vertex::{ScreenVertex, Triangle};
