//! Headless smoke run of the wgpu draw path.
//!
//! Draws one solid triangle into GS memory on the GPU, reads memory back and checks
//! the packed pixel against the software rasterizer.

use anyhow::{bail, Result};
use gs_raster::backend::{DrawBackend, SoftwareBackend, WgpuBackend};
use gs_raster::caps::DepthTest;
use gs_raster::device::{Gpu, GpuInit};
use gs_raster::logging::{init_logging, LoggingConfig};
use gs_raster::memory::{pixel_address, GsMemory, SwizzleSet};
use gs_raster::psm::FramebufferFormat;
use gs_raster::{Draw, DrawConfig, PipelineCaps, PrimVertex};

const FB_ADDR: u32 = 0;
const DEPTH_ADDR: u32 = 0x10_0000;
const BUF_WIDTH: u32 = 64;
const PROBE: (i32, i32) = (10, 10);

fn record<B: DrawBackend>(draw: &mut Draw<B>) {
    draw.set_framebuffer_params(FB_ADDR, BUF_WIDTH, 0xFFFF_FFFF);
    draw.set_depthbuffer_params(DEPTH_ADDR, BUF_WIDTH);
    draw.set_pipeline_caps(PipelineCaps {
        depth_test: DepthTest::Always,
        write_depth: false,
        ..PipelineCaps::default()
    });
    let red = [255, 0, 0, 255];
    draw.add_vertices(&[
        PrimVertex::solid(0.0, 0.0, 0, red),
        PrimVertex::solid(32.0, 0.0, 0, red),
        PrimVertex::solid(0.0, 32.0, 0, red),
    ]);
    draw.flush_frame();
}

fn probe(memory: &GsMemory, swizzle: &SwizzleSet) -> u32 {
    let table = swizzle.get(FramebufferFormat::Ct32);
    memory.read32(pixel_address(table, FB_ADDR, BUF_WIDTH, PROBE.0, PROBE.1))
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let swizzle = SwizzleSet::row_major();
    let config = DrawConfig::default();

    let mut reference = Draw::new(SoftwareBackend::new(swizzle.clone(), config.max_vertex_count));
    record(&mut reference);
    let expected = probe(reference.backend().memory(), &swizzle);

    let gpu = Gpu::new_headless_blocking(GpuInit::default())?;
    let info = gpu.adapter_info();
    log::info!("probing on {} ({:?})", info.name, info.backend);

    let mut backend = WgpuBackend::new(&gpu, &swizzle, &config);
    backend.upload_memory(&GsMemory::new());
    let mut draw = Draw::new(backend);
    record(&mut draw);

    let memory = draw.backend_mut().read_memory()?;
    let actual = probe(&memory, &swizzle);
    log::info!(
        "pixel {:?}: gpu {actual:#010x}, software {expected:#010x}, {} passes",
        PROBE,
        draw.backend().passes_recorded()
    );

    if actual != expected {
        bail!("gpu pixel {actual:#010x} differs from software {expected:#010x}");
    }
    Ok(())
}
