use gs_raster::backend::SoftwareBackend;
use gs_raster::caps::{AlphaTest, DepthTest, TextureFunction};
use gs_raster::memory::{pixel_address, SwizzleSet};
use gs_raster::psm::{DepthFormat, FramebufferFormat, TextureFormat};
use gs_raster::{Draw, PipelineCaps, PrimVertex};

const FB_ADDR: u32 = 0;
const DEPTH_ADDR: u32 = 0x10_0000;
const TEX_ADDR: u32 = 0x08_0000;
const BUF_WIDTH: u32 = 64;

fn draw() -> Draw<SoftwareBackend> {
    let mut draw = Draw::new(SoftwareBackend::new(SwizzleSet::row_major(), 1024));
    draw.set_framebuffer_params(FB_ADDR, BUF_WIDTH, 0xFFFF_FFFF);
    draw.set_depthbuffer_params(DEPTH_ADDR, BUF_WIDTH);
    draw
}

fn fb_address(draw: &Draw<SoftwareBackend>, x: i32, y: i32) -> u32 {
    let table = draw.backend().swizzle().get(FramebufferFormat::Ct32);
    pixel_address(table, FB_ADDR, BUF_WIDTH, x, y)
}

fn depth_address(draw: &Draw<SoftwareBackend>, x: i32, y: i32) -> u32 {
    let table = draw.backend().swizzle().get(DepthFormat::Z32);
    pixel_address(table, DEPTH_ADDR, BUF_WIDTH, x, y)
}

fn triangle(points: [(f32, f32); 3], z: u32, rgba: [u8; 4]) -> [PrimVertex; 3] {
    points.map(|(x, y)| PrimVertex::solid(x, y, z, rgba))
}

fn pixel(draw: &Draw<SoftwareBackend>, x: i32, y: i32) -> u32 {
    draw.backend().memory().read32(fb_address(draw, x, y))
}

#[test]
fn solid_triangle_writes_packed_color() {
    let mut draw = draw();
    let depth_at = depth_address(&draw, 10, 10);
    draw.backend_mut().memory_mut().write32(depth_at, 0xDEAD_BEEF);

    draw.set_pipeline_caps(PipelineCaps {
        framebuffer_format: FramebufferFormat::Ct32,
        depthbuffer_format: DepthFormat::Z32,
        alpha_test: AlphaTest::Always,
        depth_test: DepthTest::Always,
        write_depth: false,
        has_alpha_blending: false,
        ..PipelineCaps::default()
    });
    draw.add_vertices(&triangle([(0.0, 0.0), (32.0, 0.0), (0.0, 32.0)], 0, [255, 0, 0, 255]));
    draw.flush_frame();

    assert_eq!(pixel(&draw, 10, 10), 0xFF00_00FF);
    assert_eq!(draw.backend().memory().read32(depth_at), 0xDEAD_BEEF);
    // Outside the triangle.
    assert_eq!(pixel(&draw, 31, 31), 0);
    assert_eq!(draw.stats().draws, 1);
}

#[test]
fn depth_tested_overlap_keeps_nearer_triangle() {
    let mut draw = draw();
    draw.set_pipeline_caps(PipelineCaps {
        depth_test: DepthTest::GEqual,
        write_depth: true,
        ..PipelineCaps::default()
    });

    // One batch: the first triangle passes against the cleared depth buffer and commits
    // its depth, the second is further away where they overlap.
    draw.add_vertices(&triangle([(0.0, 0.0), (16.0, 0.0), (0.0, 16.0)], 0x8000_0000, [0, 255, 0, 255]));
    draw.add_vertices(&triangle([(8.0, 0.0), (24.0, 0.0), (8.0, 16.0)], 0x4000_0000, [255, 0, 0, 255]));
    draw.flush_frame();

    assert_eq!(draw.stats().draws, 1);
    let green = 0xFF00_FF00;
    let red = 0xFF00_00FF;
    // Overlap: second triangle fails the depth test.
    assert_eq!(pixel(&draw, 9, 1), green);
    // First triangle only.
    assert_eq!(pixel(&draw, 2, 2), green);
    // Second triangle only.
    assert_eq!(pixel(&draw, 20, 1), red);

    let depth = draw.backend().memory().read32(depth_address(&draw, 20, 1));
    assert!((0x3FFF_F000..=0x4000_1000).contains(&depth), "depth {depth:#x}");
}

#[test]
fn decal_texture_is_copied() {
    let mut draw = draw();
    let table = draw.backend().swizzle().get(TextureFormat::Ct32);
    let left = pixel_address(table, TEX_ADDR, BUF_WIDTH, 0, 0);
    let right = pixel_address(table, TEX_ADDR, BUF_WIDTH, 1, 0);
    let memory = draw.backend_mut().memory_mut();
    memory.write32(left, 0x8000_00FF);
    memory.write32(right, 0xFFFF_0000);

    draw.set_pipeline_caps(PipelineCaps {
        has_texture: true,
        texture_format: TextureFormat::Ct32,
        texture_function: TextureFunction::Decal,
        texture_has_alpha: true,
        ..PipelineCaps::default()
    });
    draw.set_texture_params(TEX_ADDR, BUF_WIDTH, 2, 1, 0);

    let corner = |x: f32, y: f32| PrimVertex {
        s: x / 8.0,
        t: 0.0,
        ..PrimVertex::solid(x, y, 0, [255, 255, 255, 255])
    };
    draw.add_vertices(&[corner(0.0, 0.0), corner(8.0, 0.0), corner(0.0, 8.0)]);
    draw.add_vertices(&[corner(8.0, 0.0), corner(8.0, 8.0), corner(0.0, 8.0)]);
    draw.flush_frame();

    assert_eq!(pixel(&draw, 1, 1), 0x8000_00FF);
    assert_eq!(pixel(&draw, 6, 6), 0xFFFF_0000);
}

#[test]
fn memory_survives_storage_recycling() {
    let mut draw = Draw::new(SoftwareBackend::new(SwizzleSet::row_major(), 6));
    draw.set_framebuffer_params(FB_ADDR, BUF_WIDTH, 0xFFFF_FFFF);

    let quad_row = |y: f32, rgba| {
        let mut v = triangle([(0.0, y), (4.0, y), (0.0, y + 4.0)], 0, rgba).to_vec();
        v.extend(triangle([(4.0, y), (4.0, y + 4.0), (0.0, y + 4.0)], 0, rgba));
        v
    };
    draw.add_vertices(&quad_row(0.0, [1, 2, 3, 4]));
    // Storage is full: this append submits the first frame.
    draw.add_vertices(&quad_row(4.0, [5, 6, 7, 8]));
    assert_eq!(draw.backend().frames_submitted(), 1);
    draw.flush_frame();

    assert_eq!(pixel(&draw, 1, 1), 0x0403_0201);
    assert_eq!(pixel(&draw, 1, 5), 0x0807_0605);
    assert_eq!(draw.stats().frames, 2);

    let backend = draw.into_backend();
    assert_eq!(backend.frames_submitted(), 2);
}
