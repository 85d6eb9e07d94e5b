//! Shading property suites

use alloc::vec;
use alloc::vec::Vec;
use blockshade::{
    CheckerUniforms, Checkerboard, F32x16, FlatColor, FrameTarget, LaneMask, ParameterInterpolator,
    PixelShader, RenderTarget, ScreenVertex, ShadingProgram, StageConfig, Triangle, VertexColor,
    LANES, MAX_PARAMS,
};
use glam::Vec3;

use crate::{TestCase, TestResult, TestSuite};

const EPSILON: f32 = 1e-4;

static INTERPOLATION_TESTS: &[TestCase] = &[
    TestCase {
        name: "vertex_exactness",
        category: "interpolation",
        run: vertex_exactness,
    },
    TestCase {
        name: "centroid_average",
        category: "interpolation",
        run: centroid_average,
    },
    TestCase {
        name: "perspective_midpoint",
        category: "interpolation",
        run: perspective_midpoint,
    },
];

static DEPTH_TESTS: &[TestCase] = &[
    TestCase {
        name: "early_z_subset",
        category: "depth",
        run: early_z_subset,
    },
    TestCase {
        name: "occluded_block",
        category: "depth",
        run: occluded_block,
    },
];

static BLEND_TESTS: &[TestCase] = &[
    TestCase {
        name: "zero_alpha",
        category: "blend",
        run: zero_alpha,
    },
    TestCase {
        name: "full_alpha",
        category: "blend",
        run: full_alpha,
    },
    TestCase {
        name: "opaque_short_circuit",
        category: "blend",
        run: opaque_short_circuit,
    },
];

static PROGRAM_TESTS: &[TestCase] = &[
    TestCase {
        name: "checkerboard",
        category: "program",
        run: checkerboard,
    },
];

/// Every shading suite, in run order
pub fn default_suites() -> Vec<TestSuite> {
    vec![
        TestSuite::new("interpolation", INTERPOLATION_TESTS),
        TestSuite::new("depth", DEPTH_TESTS),
        TestSuite::new("blend", BLEND_TESTS),
        TestSuite::new("program", PROGRAM_TESTS),
    ]
}

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

/// Triangle covering the whole NDC square at constant depth
fn cover<T: RenderTarget, P: ShadingProgram>(stage: &mut PixelShader<T, P>, z: f32) {
    stage.set_up_triangle(
        Vec3::new(-1.0, -1.0, z),
        Vec3::new(3.0, -1.0, z),
        Vec3::new(-1.0, 3.0, z),
    );
}

fn vertex_exactness() -> TestResult {
    let tri = Triangle::new(
        ScreenVertex::new(Vec3::new(-0.7, -0.4, 0.1), 1.0),
        ScreenVertex::new(Vec3::new(0.6, -0.9, 0.9), 2.0),
        ScreenVertex::new(Vec3::new(0.2, 0.8, 0.4), 0.5),
    );
    let values = [3.0, -2.0, 7.5];
    let mut interp = ParameterInterpolator::new(32, 32);
    interp.set_up_triangle(tri);
    interp.set_up_param(0, values);

    let mut params = [F32x16::ZERO; MAX_PARAMS];
    let ok = tri.vertices.iter().zip(values).all(|(v, expected)| {
        let depth = interp.compute_params(v.position.x, v.position.y, &mut params);
        (params[0].lane(0) - expected).abs() < 1e-3 && (depth.lane(0) - v.position.z).abs() < 1e-3
    });
    TestResult::check(ok)
}

fn centroid_average() -> TestResult {
    let Ok(target) = FrameTarget::new(4, 6) else {
        return TestResult::Fail;
    };
    let mut interp = ParameterInterpolator::new(target.width(), target.height());
    interp.set_up_triangle(Triangle::new(
        ScreenVertex::from_xyz(-1.0, -1.0, 0.5),
        ScreenVertex::from_xyz(1.0, -1.0, 0.2),
        ScreenVertex::from_xyz(0.0, 1.0, 0.8),
    ));
    interp.set_up_param(0, [1.0, 0.0, 0.0]);
    interp.set_up_param(1, [0.0, 1.0, 0.0]);
    interp.set_up_param(2, [0.0, 0.0, 1.0]);

    // Lane 10 of block (0, 0) is pixel (2, 2), the centroid in NDC
    let mut params = [F32x16::ZERO; MAX_PARAMS];
    let depth = interp.compute_params(-1.0, -1.0, &mut params);
    let ok = close(depth.lane(10), 0.5) && params[..3].iter().all(|p| close(p.lane(10), 1.0 / 3.0));
    TestResult::check(ok)
}

fn perspective_midpoint() -> TestResult {
    // Halfway along the first edge, w = 1 and w = 3 weight the attribute 3:1
    let mut interp = ParameterInterpolator::new(16, 16);
    interp.set_up_triangle(Triangle::new(
        ScreenVertex::new(Vec3::new(-1.0, -1.0, 0.5), 1.0),
        ScreenVertex::new(Vec3::new(1.0, -1.0, 0.5), 3.0),
        ScreenVertex::new(Vec3::new(-1.0, 1.0, 0.5), 1.0),
    ));
    interp.set_up_param(0, [0.0, 1.0, 0.0]);

    let mut params = [F32x16::ZERO; MAX_PARAMS];
    interp.compute_params(0.0, -1.0, &mut params);
    TestResult::check(close(params[0].lane(0), 0.25))
}

fn early_z_subset() -> TestResult {
    let Ok(target) = FrameTarget::new(4, 4) else {
        return TestResult::Fail;
    };
    let mut target = target.with_depth();
    if let Some(depth) = target.depth_mut() {
        for (i, z) in [0.2, 0.8].iter().enumerate() {
            for y in 0..4 {
                depth.set(i * 2, y, *z);
                depth.set(i * 2 + 1, y, *z);
            }
        }
    }

    let config = StageConfig::from_options("depth");
    let mut stage = PixelShader::with_config(target, FlatColor, config);
    cover(&mut stage, 0.5);
    let input = LaneMask::from_bits(0b0110_0110_0110_0110);
    let written = stage.shade_block(0, 0, &[1.0; 4], input);

    let target = stage.into_target();
    let untouched = (0..LANES)
        .filter(|&lane| !written.contains(lane))
        .all(|lane| target.color().get(lane % 4, lane / 4) == Some(0));
    let narrowed = written.bits() == 0b0100_0100_0100_0100;
    TestResult::check(written.is_subset_of(input) && narrowed && untouched)
}

fn occluded_block() -> TestResult {
    let Ok(target) = FrameTarget::new(4, 4) else {
        return TestResult::Fail;
    };
    let mut target = target.with_depth();
    target.clear_depth(0.1);
    target.clear(0x00404040);

    let config = StageConfig::from_options("depth");
    let mut stage = PixelShader::with_config(target, FlatColor, config);
    cover(&mut stage, 0.5);
    let written = stage.shade_block(0, 0, &[1.0; 4], LaneMask::ALL);
    let culled = stage.stats().blocks_culled == 1;

    let target = stage.into_target();
    let color_kept = target.color().as_slice().iter().all(|&c| c == 0x00404040);
    let depth_kept = target.depth().is_some_and(|d| d.as_slice().iter().all(|&z| z == 0.1));
    TestResult::check(written.is_empty() && culled && color_kept && depth_kept)
}

fn blend_once(dest: u32, color: [f32; 4]) -> Option<FrameTarget> {
    let mut target = FrameTarget::new(4, 4).ok()?;
    target.clear(dest);
    let config = StageConfig::from_options("blend=alpha");
    let mut stage = PixelShader::with_config(target, FlatColor, config);
    cover(&mut stage, 0.5);
    stage.shade_block(0, 0, &color, LaneMask::ALL);
    Some(stage.into_target())
}

fn zero_alpha() -> TestResult {
    let dest = 0x00C86432;
    let Some(target) = blend_once(dest, [1.0, 1.0, 1.0, 0.0]) else {
        return TestResult::Fail;
    };
    let ok = target.color().as_slice().iter().all(|&c| {
        [0, 8, 16].iter().all(|&shift| {
            let (got, want) = ((c >> shift) & 0xff, (dest >> shift) & 0xff);
            want - got <= 1
        })
    });
    TestResult::check(ok)
}

fn full_alpha() -> TestResult {
    let Some(target) = blend_once(0x00FFFFFF, [0.5, 0.25, 0.0, 1.0]) else {
        return TestResult::Fail;
    };
    TestResult::check(target.color().as_slice().iter().all(|&c| c == 0x007F3F00))
}

fn render_vertex_color(options: &str) -> Option<(FrameTarget, u64)> {
    let mut target = FrameTarget::new(4, 4).ok()?;
    target.clear(0x00123456);
    let config = StageConfig::from_options(options);
    let mut stage = PixelShader::with_config(target, VertexColor, config);
    cover(&mut stage, 0.5);
    stage.set_up_param(0, 1.0, 0.0, 0.5);
    stage.set_up_param(1, 0.0, 1.0, 0.5);
    stage.set_up_param(2, 0.3, 0.3, 0.3);
    stage.shade_block(0, 0, &1.0, LaneMask::from_bits(0x0FF0));
    let blended = stage.stats().blocks_blended;
    Some((stage.into_target(), blended))
}

fn opaque_short_circuit() -> TestResult {
    let (Some((with_blend, blended)), Some((without, _))) =
        (render_vertex_color("blend=alpha"), render_vertex_color(""))
    else {
        return TestResult::Fail;
    };
    TestResult::check(blended == 0 && with_blend.color().as_slice() == without.color().as_slice())
}

fn checkerboard() -> TestResult {
    let Ok(target) = FrameTarget::new(4, 4) else {
        return TestResult::Fail;
    };
    let mut stage = PixelShader::new(target, Checkerboard);
    cover(&mut stage, 0.5);
    // u and v follow pixel x and y
    stage.set_up_param(0, 0.0, 8.0, 0.0);
    stage.set_up_param(1, 0.0, 0.0, 8.0);

    let uniforms = CheckerUniforms {
        scale: 1.0,
        even: [1.0, 1.0, 1.0, 1.0],
        odd: [0.0, 0.0, 0.0, 1.0],
    };
    stage.shade_block(0, 0, &uniforms, LaneMask::ALL);

    let target = stage.into_target();
    let ok = (0..LANES).all(|lane| {
        let (x, y) = (lane % 4, lane / 4);
        let expected = if (x + y) % 2 == 0 { 0x00FFFFFF } else { 0 };
        target.color().get(x, y) == Some(expected)
    });
    TestResult::check(ok)
}
