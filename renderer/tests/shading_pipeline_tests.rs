//! End-to-end tests for the block shading stage
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blockshade::math::{ndc_scale, pixel_to_ndc};
use blockshade::{
    F32x16, FlatColor, FrameTarget, I32x16, LaneMask, ParameterInterpolator, PixelShader,
    RenderTarget, ScreenVertex, ShadingProgram, StageConfig, Triangle, VertexColor, BLOCK_HEIGHT,
    BLOCK_WIDTH, LANES, MAX_PARAMS,
};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Records the first three attributes it was given and outputs white
#[derive(Default)]
struct Probe {
    seen: Cell<Option<[F32x16; 3]>>,
}

impl ShadingProgram for Probe {
    type Uniforms = ();

    fn shade_pixels(&self, params: &[F32x16], color: &mut [F32x16; 4], _: &(), _: LaneMask) {
        self.seen.set(Some([params[0], params[1], params[2]]));
        *color = [F32x16::ONE; 4];
    }
}

/// Coverage mask of a block: lanes whose pixel corner is inside the
/// triangle by edge functions
fn coverage_mask(
    tri: &Triangle,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
) -> LaneMask {
    let scale = ndc_scale(width, height);
    let [a, b, c] = tri.vertices.map(|v| v.xy());
    let area = tri.signed_area2();
    let edge = |p0: Vec2, p1: Vec2, p: Vec2| (p1 - p0).perp_dot(p - p0) * area.signum();

    let mut mask = LaneMask::NONE;
    for lane in 0..LANES {
        let p = pixel_to_ndc(left + lane % BLOCK_WIDTH, top + lane / BLOCK_WIDTH, scale);
        if edge(a, b, p) >= 0.0 && edge(b, c, p) >= 0.0 && edge(c, a, p) >= 0.0 {
            mask |= LaneMask::lane(lane);
        }
    }
    mask
}

/// Shade every block of the target that the triangle covers. The triangle
/// and its attributes must already be set up on the stage.
fn draw_blocks<T: RenderTarget, P: ShadingProgram>(
    stage: &mut PixelShader<T, P>,
    tri: &Triangle,
    uniforms: &P::Uniforms,
) {
    let (width, height) = (stage.target().width(), stage.target().height());
    for top in (0..=height - BLOCK_HEIGHT).step_by(BLOCK_HEIGHT) {
        for left in (0..=width - BLOCK_WIDTH).step_by(BLOCK_WIDTH) {
            let mask = coverage_mask(tri, left, top, width, height);
            if !mask.is_empty() {
                stage.shade_block(left, top, uniforms, mask);
            }
        }
    }
}

fn draw<T: RenderTarget, P: ShadingProgram>(
    stage: &mut PixelShader<T, P>,
    tri: &Triangle,
    uniforms: &P::Uniforms,
) {
    let [v1, v2, v3] = tri.vertices;
    stage.set_up_triangle_perspective(v1, v2, v3);
    draw_blocks(stage, tri, uniforms);
}

fn reference_triangle() -> Triangle {
    Triangle::new(
        ScreenVertex::from_xyz(-1.0, -1.0, 0.5),
        ScreenVertex::from_xyz(1.0, -1.0, 0.2),
        ScreenVertex::from_xyz(0.0, 1.0, 0.8),
    )
}

#[test_log::test]
fn test_centroid_scenario() {
    // On a 4x6 target, lane 10 of block (0, 0) is pixel (2, 2) at NDC (0, -1/3)
    let target = FrameTarget::new(4, 6).unwrap().with_depth();
    let config = StageConfig::from_options("depth");
    let mut stage = PixelShader::with_config(target, Probe::default(), config);
    stage.set_up_triangle(
        Vec3::new(-1.0, -1.0, 0.5),
        Vec3::new(1.0, -1.0, 0.2),
        Vec3::new(0.0, 1.0, 0.8),
    );
    stage.set_up_param(0, 1.0, 0.0, 0.0);
    stage.set_up_param(1, 0.0, 1.0, 0.0);
    stage.set_up_param(2, 0.0, 0.0, 1.0);

    let written = stage.shade_block(0, 0, &(), LaneMask::ALL);
    assert!(written.contains(10));

    let seen = stage.program().seen.get().unwrap();
    for attribute in seen {
        assert!((attribute.lane(10) - 1.0 / 3.0).abs() < 1e-5, "{}", attribute.lane(10));
    }

    let depth = stage.target().depth().unwrap().get(2, 2).unwrap();
    assert!((depth - 0.5).abs() < 1e-5, "{}", depth);
}

#[test_log::test]
fn test_occluded_block_leaves_buffers_unchanged() {
    let mut target = FrameTarget::new(8, 8).unwrap().with_depth();
    target.clear_depth(0.1);
    target.clear(0x00336699);
    let before = target.clone();

    let config = StageConfig::from_options("depth");
    let mut stage = PixelShader::with_config(&mut target, FlatColor, config);
    stage.set_up_triangle(
        Vec3::new(-1.0, -1.0, 0.5),
        Vec3::new(3.0, -1.0, 0.5),
        Vec3::new(-1.0, 3.0, 0.5),
    );
    for (left, top) in [(0, 0), (4, 0), (0, 4), (4, 4)] {
        assert_eq!(stage.shade_block(left, top, &[1.0; 4], LaneMask::ALL), LaneMask::NONE);
    }
    assert_eq!(stage.stats().blocks_culled, 4);

    assert_eq!(target.color().as_slice(), before.color().as_slice());
    assert_eq!(target.depth().unwrap().as_slice(), before.depth().unwrap().as_slice());
}

#[test]
fn test_interpolator_reproduces_vertex_values() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut interp = ParameterInterpolator::new(64, 64);
    let mut params = [F32x16::ZERO; MAX_PARAMS];

    for _ in 0..64 {
        let mut vertex = || {
            let position = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(0.0..1.0),
            );
            ScreenVertex::new(position, rng.random_range(0.5..4.5))
        };
        let tri = Triangle::new(vertex(), vertex(), vertex());
        if tri.signed_area2().abs() < 0.2 {
            continue;
        }
        let values: [f32; 3] = std::array::from_fn(|_| rng.random_range(0.0..10.0));

        interp.set_up_triangle(tri);
        interp.set_up_param(0, values);
        for (v, expected) in tri.vertices.iter().zip(values) {
            let depth = interp.compute_params(v.position.x, v.position.y, &mut params);
            let got = params[0].lane(0);
            let tolerance = 1e-3 * expected.max(1.0);
            assert!((got - expected).abs() < tolerance, "{} != {}", got, expected);
            assert!((depth.lane(0) - v.position.z).abs() < 1e-3);
        }
    }
}

#[test_log::test]
fn test_early_z_mask_is_subset_and_protects_other_lanes() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..32 {
        let mut target = FrameTarget::new(4, 4).unwrap().with_depth();
        for y in 0..4 {
            for x in 0..4 {
                target.depth_mut().unwrap().set(x, y, rng.random_range(0.0..1.0));
                target.color_mut().set(x, y, rng.random::<u32>() & 0x00FF_FFFF);
            }
        }
        let before = target.clone();
        let input = LaneMask::from_bits(rng.random());
        let z = rng.random_range(0.0..1.0);

        let config = StageConfig::from_options("depth");
        let mut stage = PixelShader::with_config(&mut target, FlatColor, config);
        stage.set_up_triangle(
            Vec3::new(-1.0, -1.0, z),
            Vec3::new(3.0, -1.0, z),
            Vec3::new(-1.0, 3.0, z),
        );
        let written = stage.shade_block(0, 0, &[0.0, 1.0, 0.0, 1.0], input);
        assert!(written.is_subset_of(input));

        for lane in 0..LANES {
            let (x, y) = (lane % BLOCK_WIDTH, lane / BLOCK_WIDTH);
            let old_depth = before.depth().unwrap().get(x, y).unwrap();
            if written.contains(lane) {
                assert!(input.contains(lane) && z < old_depth);
                assert_eq!(target.color().get(x, y), Some(0x00FF00));
                assert_eq!(target.depth().unwrap().get(x, y), Some(z));
            } else {
                assert_eq!(target.color().get(x, y), before.color().get(x, y));
                assert_eq!(target.depth().unwrap().get(x, y), Some(old_depth));
            }
        }
    }
}

#[test]
fn test_zero_alpha_keeps_destination() {
    let mut target = FrameTarget::new(4, 4).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for y in 0..4 {
        for x in 0..4 {
            target.color_mut().set(x, y, rng.random::<u32>() & 0x00FF_FFFF);
        }
    }
    let before = target.clone();

    let config = StageConfig::from_options("blend=alpha");
    let mut stage = PixelShader::with_config(&mut target, FlatColor, config);
    stage.set_up_triangle(
        Vec3::new(-1.0, -1.0, 0.5),
        Vec3::new(3.0, -1.0, 0.5),
        Vec3::new(-1.0, 3.0, 0.5),
    );
    stage.shade_block(0, 0, &[1.0, 1.0, 1.0, 0.0], LaneMask::ALL);

    for (&new, &old) in target.color().as_slice().iter().zip(before.color().as_slice()) {
        for shift in [0, 8, 16] {
            let (n, o) = ((new >> shift) & 0xff, (old >> shift) & 0xff);
            // dst * 255 >> 8 loses at most one step
            assert!(n <= o && o - n <= 1, "{:#x} vs {:#x}", new, old);
        }
    }
}

#[test]
fn test_full_alpha_writes_source_exactly() {
    let mut target = FrameTarget::new(4, 4).unwrap();
    target.clear(0x00FFFFFF);
    let config = StageConfig::from_options("blend=alpha");
    let mut stage = PixelShader::with_config(&mut target, FlatColor, config);
    stage.set_up_triangle(
        Vec3::new(-1.0, -1.0, 0.5),
        Vec3::new(3.0, -1.0, 0.5),
        Vec3::new(-1.0, 3.0, 0.5),
    );
    stage.shade_block(0, 0, &[0.5, 0.25, 0.0, 1.0], LaneMask::ALL);
    assert_eq!(stage.stats().blocks_blended, 0);

    // 127.5 and 63.75 truncate
    let expected = (127 << 16) | (63 << 8);
    assert!(target.color().as_slice().iter().all(|&c| c == expected));
}

#[test]
fn test_opaque_blend_matches_no_blend() {
    let tri = Triangle::new(
        ScreenVertex::new(Vec3::new(-0.9, -0.8, 0.3), 1.0),
        ScreenVertex::new(Vec3::new(0.95, -0.2, 0.6), 2.5),
        ScreenVertex::new(Vec3::new(-0.1, 0.9, 0.4), 0.8),
    );
    let render = |options: &str| {
        let mut target = FrameTarget::new(16, 16).unwrap();
        target.clear(0x00102030);
        let config = StageConfig::from_options(options);
        let mut stage = PixelShader::with_config(&mut target, VertexColor, config);
        let [v1, v2, v3] = tri.vertices;
        stage.set_up_triangle_perspective(v1, v2, v3);
        stage.set_up_param(0, 1.0, 0.0, 0.0);
        stage.set_up_param(1, 0.0, 1.0, 0.0);
        stage.set_up_param(2, 0.0, 0.0, 1.0);
        draw_blocks(&mut stage, &tri, &1.0);
        let stats = stage.stats();
        (target, stats)
    };

    let (blended, blend_stats) = render("blend=alpha");
    let (opaque, opaque_stats) = render("blend=opaque");
    assert!(blend_stats.blocks_written > 0);
    assert_eq!(blend_stats.blocks_blended, 0);
    assert_eq!(blend_stats, opaque_stats);
    assert_eq!(blended.color().as_slice(), opaque.color().as_slice());
}

#[test_log::test]
fn test_nearer_triangle_wins_in_either_order() {
    let near = Triangle::new(
        ScreenVertex::from_xyz(-1.0, -1.0, 0.2),
        ScreenVertex::from_xyz(1.0, -1.0, 0.2),
        ScreenVertex::from_xyz(-1.0, 1.0, 0.2),
    );
    let far = Triangle::new(
        ScreenVertex::from_xyz(-1.0, -1.0, 0.7),
        ScreenVertex::from_xyz(1.0, -1.0, 0.7),
        ScreenVertex::from_xyz(-1.0, 1.0, 0.7),
    );
    let red = [1.0, 0.0, 0.0, 1.0];
    let blue = [0.0, 0.0, 1.0, 1.0];

    let render = |first: (&Triangle, [f32; 4]), second: (&Triangle, [f32; 4])| {
        let mut target = FrameTarget::new(8, 8).unwrap().with_depth();
        let config = StageConfig::from_options("depth");
        let mut stage = PixelShader::with_config(&mut target, FlatColor, config);
        draw(&mut stage, first.0, &first.1);
        draw(&mut stage, second.0, &second.1);
        target
    };

    let near_last = render((&far, blue), (&near, red));
    let near_first = render((&near, red), (&far, blue));
    assert_eq!(near_last.color().as_slice(), near_first.color().as_slice());
    assert_eq!(near_first.color().get(0, 0), Some(0xFF0000));
    assert_eq!(near_first.depth().unwrap().get(0, 0), Some(0.2));
    // Outside both triangles
    assert_eq!(near_first.color().get(7, 7), Some(0));
    assert_eq!(near_first.depth().unwrap().get(7, 7), Some(f32::INFINITY));
}

#[test]
fn test_coverage_draw_only_touches_covered_pixels() {
    let tri = reference_triangle();
    let mut target = FrameTarget::new(16, 16).unwrap();
    let mut stage = PixelShader::new(&mut target, FlatColor);
    draw(&mut stage, &tri, &[1.0, 1.0, 1.0, 1.0]);
    let written = stage.stats().blocks_written;
    assert!(written > 0);

    let scale = ndc_scale(16, 16);
    for y in 0..16 {
        for x in 0..16 {
            let p = pixel_to_ndc(x, y, scale);
            let [a, b, c] = tri.vertices.map(|v| v.xy());
            let inside = (b - a).perp_dot(p - a) >= 0.0
                && (c - b).perp_dot(p - b) >= 0.0
                && (a - c).perp_dot(p - c) >= 0.0;
            let expected = if inside { 0xFFFFFF } else { 0 };
            assert_eq!(target.color().get(x, y), Some(expected), "pixel ({}, {})", x, y);
        }
    }
}

type EventLog = Rc<RefCell<Vec<&'static str>>>;

/// Forwards to a `FrameTarget` and logs each block access
struct RecordingTarget {
    inner: FrameTarget,
    events: EventLog,
}

impl RenderTarget for RecordingTarget {
    fn width(&self) -> usize {
        self.inner.width()
    }

    fn height(&self) -> usize {
        self.inner.height()
    }

    fn has_depth(&self) -> bool {
        self.inner.has_depth()
    }

    fn read_depth_block(&self, x: usize, y: usize) -> F32x16 {
        self.events.borrow_mut().push("read_depth");
        self.inner.read_depth_block(x, y)
    }

    fn write_depth_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: F32x16) {
        self.events.borrow_mut().push("write_depth");
        self.inner.write_depth_block_masked(x, y, mask, values)
    }

    fn read_color_block(&self, x: usize, y: usize) -> I32x16 {
        self.events.borrow_mut().push("read_color");
        self.inner.read_color_block(x, y)
    }

    fn write_color_block_masked(&mut self, x: usize, y: usize, mask: LaneMask, values: I32x16) {
        self.events.borrow_mut().push("write_color");
        self.inner.write_color_block_masked(x, y, mask, values)
    }
}

/// Flat color that logs when it runs
struct RecordingProgram {
    events: EventLog,
}

impl ShadingProgram for RecordingProgram {
    type Uniforms = [f32; 4];

    fn shade_pixels(
        &self,
        params: &[F32x16],
        color: &mut [F32x16; 4],
        uniforms: &[f32; 4],
        mask: LaneMask,
    ) {
        self.events.borrow_mut().push("shade");
        FlatColor.shade_pixels(params, color, uniforms, mask);
    }
}

fn shade_recorded(stored_depth: f32, color: [f32; 4]) -> Vec<&'static str> {
    let events = EventLog::default();
    let mut inner = FrameTarget::new(4, 4).unwrap().with_depth();
    inner.clear_depth(stored_depth);
    let target = RecordingTarget {
        inner,
        events: events.clone(),
    };
    let program = RecordingProgram {
        events: events.clone(),
    };

    let config = StageConfig::from_options("depth blend=alpha");
    let mut stage = PixelShader::with_config(target, program, config);
    stage.set_up_triangle(
        Vec3::new(-1.0, -1.0, 0.5),
        Vec3::new(3.0, -1.0, 0.5),
        Vec3::new(-1.0, 3.0, 0.5),
    );
    stage.shade_block(0, 0, &color, LaneMask::ALL);

    events.take()
}

#[test_log::test]
fn test_depth_is_committed_before_shading() {
    assert_eq!(
        shade_recorded(1.0, [1.0, 0.0, 0.0, 0.5]),
        ["read_depth", "write_depth", "shade", "read_color", "write_color"]
    );
    // Opaque output skips the destination read
    assert_eq!(
        shade_recorded(1.0, [1.0, 0.0, 0.0, 1.0]),
        ["read_depth", "write_depth", "shade", "write_color"]
    );
}

#[test_log::test]
fn test_occluded_block_only_reads_depth() {
    assert_eq!(shade_recorded(0.1, [1.0, 0.0, 0.0, 0.5]), ["read_depth"]);
}
