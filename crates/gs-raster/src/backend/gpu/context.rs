//! GPU copies of GS memory, the swizzle tables and the CLUT.

use std::collections::HashMap;
use std::sync::mpsc;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;

use crate::backend::CLUT_ENTRIES;
use crate::memory::{GsMemory, SwizzleSet, GS_RAM_SIZE};
use crate::psm::Psm;

/// Shared resources every draw binds: the memory buffer and the lookup images.
///
/// The owner of GS memory keeps this in sync with the emulated state (uploads before
/// drawing, readback after the frame has retired).
pub struct DrawContext {
    memory: wgpu::Buffer,
    swizzle_views: HashMap<Psm, wgpu::TextureView>,
    clut: wgpu::Texture,
    clut_view: wgpu::TextureView,
}

impl DrawContext {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, swizzle: &SwizzleSet) -> Self {
        let memory = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gs memory"),
            size: GS_RAM_SIZE as u64,
            usage: wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST
                | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let swizzle_views = Psm::ALL
            .iter()
            .map(|&psm| {
                let table = swizzle.get(psm);
                let storage = table.storage();
                let texture = device.create_texture_with_data(
                    queue,
                    &wgpu::TextureDescriptor {
                        label: Some("gs swizzle table"),
                        size: wgpu::Extent3d {
                            width: storage.page_width(),
                            height: storage.page_height(),
                            depth_or_array_layers: 1,
                        },
                        mip_level_count: 1,
                        sample_count: 1,
                        dimension: wgpu::TextureDimension::D2,
                        format: wgpu::TextureFormat::R32Uint,
                        usage: wgpu::TextureUsages::TEXTURE_BINDING,
                        view_formats: &[],
                    },
                    wgpu::util::TextureDataOrder::LayerMajor,
                    bytemuck::cast_slice(table.offsets()),
                );
                (psm, texture.create_view(&wgpu::TextureViewDescriptor::default()))
            })
            .collect();

        let clut = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gs clut"),
            size: wgpu::Extent3d {
                width: CLUT_ENTRIES as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R32Uint,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let clut_view = clut.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            memory,
            swizzle_views,
            clut,
            clut_view,
        }
    }

    pub fn memory_buffer(&self) -> &wgpu::Buffer {
        &self.memory
    }

    pub fn swizzle_view(&self, psm: impl Into<Psm>) -> &wgpu::TextureView {
        let psm = psm.into();
        self.swizzle_views
            .get(&psm)
            .unwrap_or_else(|| panic!("no swizzle table uploaded for {psm:?}"))
    }

    pub fn clut_view(&self) -> &wgpu::TextureView {
        &self.clut_view
    }

    /// Replaces the whole GPU copy of GS memory.
    pub fn upload_memory(&self, queue: &wgpu::Queue, memory: &GsMemory) {
        queue.write_buffer(&self.memory, 0, bytemuck::cast_slice(memory.words()));
    }

    /// Writes `words` starting at byte address `address` (4-byte aligned).
    pub fn write_memory(&self, queue: &wgpu::Queue, address: u32, words: &[u32]) {
        assert!(address % 4 == 0, "unaligned memory upload at 0x{address:X}");
        assert!(
            address as usize + words.len() * 4 <= GS_RAM_SIZE as usize,
            "memory upload past the end of GS memory"
        );
        queue.write_buffer(&self.memory, address as u64, bytemuck::cast_slice(words));
    }

    /// Replaces the CLUT: 16-bit entries, one per texel.
    pub fn upload_clut(&self, queue: &wgpu::Queue, entries: &[u32]) {
        assert_eq!(entries.len(), CLUT_ENTRIES, "CLUT upload size");
        queue.write_texture(
            self.clut.as_image_copy(),
            bytemuck::cast_slice(entries),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(CLUT_ENTRIES as u32 * 4),
                rows_per_image: None,
            },
            wgpu::Extent3d {
                width: CLUT_ENTRIES as u32,
                height: 1,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Copies GS memory back to the CPU, waiting for all submitted work.
    pub fn read_memory(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<GsMemory> {
        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gs memory readback"),
            size: GS_RAM_SIZE as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("gs memory readback encoder"),
        });
        encoder.copy_buffer_to_buffer(&self.memory, 0, &staging, 0, GS_RAM_SIZE as u64);
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |res| {
            let _ = tx.send(res);
        });
        device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .context("device poll failed during memory readback")?;
        rx.recv()
            .context("readback callback dropped")?
            .context("failed to map memory readback buffer")?;

        let mut memory = GsMemory::new();
        {
            let mapped = slice.get_mapped_range();
            memory
                .words_mut()
                .copy_from_slice(bytemuck::cast_slice(&mapped[..]));
        }
        staging.unmap();
        Ok(memory)
    }
}
