// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use wgpu::{Limits, PollType, Trace};

use super::Error as WgpuError;
use super::pixel_format::required_features;
use super::sampler::{self, WgpuSampler};
use super::texture::{self, WgpuTexture};
use crate::array::descriptor::ArrayDescriptor;
use crate::bindings::sampler::SamplerConfig;
use crate::device::{CopyRegion, Device, ImageInfo, TextureKind};
use crate::error::Error;
use crate::pixel_formats::PixelFormat;

/// Keeps the device making progress on submitted work and pending buffer maps.
struct PollThread {
    trigger: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl PollThread {
    fn spawn(device: wgpu::Device) -> Self {
        let (trigger, receiver): (Sender<()>, Receiver<()>) = mpsc::channel();
        let thread = thread::Builder::new()
            .name("wgpu_poll".to_string())
            .spawn(move || {
                // Exits once the trigger is dropped
                while receiver.recv().is_ok() {
                    // Poll until the queue is empty
                    let _ = device.poll(PollType::Wait);
                }
            })
            .expect("Failed to spawn wgpu polling thread");
        PollThread {
            trigger: Some(trigger),
            thread: Some(thread),
        }
    }

    fn set_needs_poll(&self) {
        if let Some(trigger) = &self.trigger {
            let _ = trigger.send(());
        }
    }
}

impl Drop for PollThread {
    fn drop(&mut self) {
        drop(self.trigger.take());
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

/**
A [`Device`] backed by a wgpu adapter.

Submissions are made from whatever thread calls in, which for array work is the
graphics context.  A background thread polls the device after every submission.
*/
pub struct WgpuDevice {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    samplers: Mutex<HashMap<SamplerConfig, WgpuSampler>>,
    next_id: AtomicU64,
    poll: PollThread,
}

impl WgpuDevice {
    /**
    Picks the default adapter and opens a device on it.

    Fails with [`WgpuError::NoSuchAdapter`] on machines without a usable adapter.
    */
    pub async fn new(label: &str) -> Result<Self, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::from_env_or_default());
        let options = wgpu::RequestAdapterOptions {
            power_preference: Default::default(),
            force_fallback_adapter: false,
            compatible_surface: None,
        };
        let adapter = instance
            .request_adapter(&options)
            .await
            .map_err(WgpuError::from)?;
        logwise::info_sync!(
            "wgpu adapter {info}",
            info = logwise::privacy::LogIt(&adapter.get_info())
        );

        let mut limits = Limits::downlevel_defaults();
        //array layer count is the limit we actually run into
        limits.max_texture_array_layers = adapter.limits().max_texture_array_layers;
        let descriptor = wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: adapter.features() & wgpu::Features::TEXTURE_FORMAT_16BIT_NORM,
            required_limits: limits,
            memory_hints: Default::default(),
            trace: Trace::Off,
        };
        let (device, queue) = adapter
            .request_device(&descriptor)
            .await
            .map_err(WgpuError::from)?;
        let poll = PollThread::spawn(device.clone());
        Ok(WgpuDevice {
            adapter,
            device,
            queue,
            samplers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            poll,
        })
    }

    pub fn wgpu_device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Signal the polling thread that GPU work may be ready
    pub fn set_needs_poll(&self) {
        self.poll.set_needs_poll();
    }

    /**
    Reads one mip level of one slice back to the CPU, tightly packed.

    Resolves once the GPU has finished every copy submitted before the call.
    */
    pub async fn read_slice(
        &self,
        texture: &WgpuTexture,
        slice: u32,
        mip: u32,
    ) -> Result<Vec<u8>, Error> {
        let extent = texture.extent().mip(mip);
        let row_bytes = texture.format().bytes_per_row(extent.width);
        let padded_row_bytes = texture::aligned_bytes_per_row(row_bytes);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("read_slice"),
            });
        let buffer = texture::encode_readback(&self.device, &mut encoder, texture, slice, mip);
        self.queue.submit(std::iter::once(encoder.finish()));

        let (sender, mapped) = r#continue::continuation();
        buffer.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            sender.send(result);
        });
        self.set_needs_poll();
        mapped.await.map_err(WgpuError::from)?;

        let data = texture::unpad_rows(
            &buffer.slice(..).get_mapped_range(),
            row_bytes as usize,
            padded_row_bytes as usize,
            extent.height as usize,
        );
        buffer.unmap();
        Ok(data)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_format(&self, format: PixelFormat) -> Result<(), Error> {
        if self.device.features().contains(required_features(format)) {
            Ok(())
        } else {
            Err(Error::UnsupportedFormat { format })
        }
    }

    fn check_extent(&self, info: &ImageInfo) -> Result<(), Error> {
        if info.extent.width == 0 || info.extent.height == 0 {
            return Err(Error::EmptyExtent);
        }
        let edge = info.extent.width.max(info.extent.height);
        let limit = self.device.limits().max_texture_dimension_2d;
        if edge > limit {
            return Err(Error::TooLarge { edge, limit });
        }
        Ok(())
    }
}

impl Debug for WgpuDevice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuDevice")
            .field("adapter", &self.adapter.get_info().name)
            .finish()
    }
}

impl Device for WgpuDevice {
    type Texture = WgpuTexture;
    type Sampler = WgpuSampler;

    fn create_array_texture(
        &self,
        descriptor: &ArrayDescriptor,
        debug_name: &str,
    ) -> Result<WgpuTexture, Error> {
        let info = ImageInfo {
            extent: descriptor.extent(),
            format: descriptor.allocation_format(),
            mip_count: descriptor.mip_count,
        };
        self.check_extent(&info)?;
        self.check_format(info.format)?;
        let limit = self.device.limits().max_texture_array_layers;
        if descriptor.slice_count > limit {
            return Err(Error::TooManySlices {
                slices: descriptor.slice_count,
                limit,
            });
        }
        let usage = wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::TEXTURE_BINDING;
        let texture = self.device.create_texture(&texture::texture_descriptor(
            debug_name,
            &info,
            descriptor.slice_count,
            usage,
        ));
        Ok(WgpuTexture::new(
            texture,
            self.next_id(),
            TextureKind::Array2D,
            info,
            descriptor.slice_count,
        ))
    }

    fn create_image(
        &self,
        info: &ImageInfo,
        mips: &[Vec<u8>],
        debug_name: &str,
    ) -> Result<WgpuTexture, Error> {
        self.check_extent(info)?;
        self.check_format(info.format)?;
        for mip in 0..info.mip_count {
            let expected = info.mip_byte_len(mip);
            let actual = mips.get(mip as usize).map_or(0, Vec::len);
            if actual != expected {
                return Err(Error::PixelDataSize {
                    mip,
                    expected,
                    actual,
                });
            }
        }
        let usage = wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::TEXTURE_BINDING;
        let texture = self
            .device
            .create_texture(&texture::texture_descriptor(debug_name, info, 1, usage));
        texture::upload_mips(&self.queue, &texture, info, mips);
        self.queue.submit(std::iter::empty());
        self.set_needs_poll();
        Ok(WgpuTexture::new(
            texture,
            self.next_id(),
            TextureKind::Image2D,
            *info,
            1,
        ))
    }

    fn release_texture(&self, texture: WgpuTexture) {
        if !texture.destroy() {
            logwise::warn_sync!(
                "wgpu texture {texture} released twice",
                texture = logwise::privacy::LogIt(&texture)
            );
        }
    }

    fn sampler(&self, config: &SamplerConfig) -> WgpuSampler {
        let mut samplers = self
            .samplers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        samplers
            .entry(*config)
            .or_insert_with(|| sampler::create(&self.device, config))
            .clone()
    }

    fn copy_regions(&self, destination: &WgpuTexture, regions: &[CopyRegion<WgpuTexture>]) {
        if regions.is_empty() {
            return;
        }
        let _copy_guard = logwise::profile_begin!("wgpu_copy_regions");
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("copy_regions"),
            });
        texture::encode_copies(&mut encoder, destination, regions);
        self.queue.submit(std::iter::once(encoder.finish()));
        self.set_needs_poll();
    }
}
