//! Texture loading and GPU texture resources.
//!
//! Loading is split in two: cloneable loader handles hold decoded pixel
//! data in a write-once slot that the render loop polls without locking,
//! and [`GpuTexture`] owns the uploaded wgpu resources. Fetching bytes is
//! the caller's job; hand the bytes to the loader whenever they arrive and
//! the next frame picks the texture up.

use std::sync::{Arc, OnceLock};

use crate::error::{EngineError, EngineResult};

/// Default UV rectangle: two triangles covering the unit square, matching
/// the vertex order the primitive geometries emit per quad.
pub const DEFAULT_UV_RECT: [f32; 12] = [
    0.0, 0.0, //
    0.0, 1.0, //
    1.0, 0.0, //
    0.0, 1.0, //
    1.0, 1.0, //
    1.0, 0.0,
];

/// Cube face order for [`CubeTextureLoader::decode_faces`]: +x, -x, +y,
/// -y, +z, -z.
pub const CUBE_FACE_COUNT: usize = 6;

/// Decoded RGBA8 pixel data, ready for upload.
#[derive(Clone, Debug)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PixelImage {
    pub fn decode(bytes: &[u8], label: &str) -> EngineResult<Self> {
        let img = image::load_from_memory(bytes).map_err(|source| EngineError::TextureDecode {
            label: label.to_string(),
            source,
        })?;
        let rgba = img.to_rgba8();
        Ok(Self {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    /// A single opaque black pixel, bound while the real texture loads.
    /// Black is the additive identity in the shaders, so an unready
    /// texture contributes nothing to the fragment color.
    pub fn placeholder() -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![0, 0, 0, 255],
        }
    }
}

/// Where a loader currently stands. The slot is write-once, so `Ready`
/// and `Failed` are final.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Ready,
    Failed,
}

/// Cloneable handle to an in-flight 2D texture load.
#[derive(Clone, Debug)]
pub struct Texture2dLoader {
    slot: Arc<OnceLock<Result<PixelImage, String>>>,
    uv_rect: [f32; 12],
}

impl Texture2dLoader {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(OnceLock::new()),
            uv_rect: DEFAULT_UV_RECT,
        }
    }

    pub fn with_uv_rect(uv_rect: [f32; 12]) -> Self {
        Self {
            slot: Arc::new(OnceLock::new()),
            uv_rect,
        }
    }

    /// The per-quad UV rectangle tiled across the mesh.
    pub fn uv_rect(&self) -> &[f32; 12] {
        &self.uv_rect
    }

    /// Decodes image bytes into the slot. Call this from wherever the
    /// bytes arrive; every clone of the handle observes the result.
    /// Filling an already-resolved slot is a no-op.
    pub fn decode(&self, bytes: &[u8], label: &str) -> EngineResult<()> {
        match PixelImage::decode(bytes, label) {
            Ok(img) => {
                let _ = self.slot.set(Ok(img));
                Ok(())
            }
            Err(err) => {
                let _ = self.slot.set(Err(err.to_string()));
                Err(err)
            }
        }
    }

    /// Marks the load as failed without decoding, e.g. when the fetch
    /// itself errored.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.slot.set(Err(message.into()));
    }

    pub fn state(&self) -> LoadState {
        match self.slot.get() {
            None => LoadState::Pending,
            Some(Ok(_)) => LoadState::Ready,
            Some(Err(_)) => LoadState::Failed,
        }
    }

    pub fn image(&self) -> Option<&PixelImage> {
        self.slot.get().and_then(|r| r.as_ref().ok())
    }

    pub fn error(&self) -> Option<&str> {
        self.slot.get().and_then(|r| r.as_ref().err()).map(String::as_str)
    }
}

impl Default for Texture2dLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle to an in-flight cube texture load (six faces).
#[derive(Clone, Debug)]
pub struct CubeTextureLoader {
    slot: Arc<OnceLock<Result<Vec<PixelImage>, String>>>,
}

impl CubeTextureLoader {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(OnceLock::new()),
        }
    }

    /// Decodes the six faces in +x, -x, +y, -y, +z, -z order. Any face
    /// failing to decode, or sized differently from the first, fails the
    /// whole cube.
    pub fn decode_faces(&self, faces: &[&[u8]; CUBE_FACE_COUNT], label: &str) -> EngineResult<()> {
        let mut images: Vec<PixelImage> = Vec::with_capacity(CUBE_FACE_COUNT);
        for (i, bytes) in faces.iter().enumerate() {
            let img = match PixelImage::decode(bytes, &format!("{label}[{i}]")) {
                Ok(img) => img,
                Err(err) => {
                    let _ = self.slot.set(Err(err.to_string()));
                    return Err(err);
                }
            };
            if let Some(first) = images.first() {
                if (img.width, img.height) != (first.width, first.height) {
                    let err = EngineError::CubeFaceSizeMismatch {
                        index: i,
                        width: img.width,
                        height: img.height,
                        expected_width: first.width,
                        expected_height: first.height,
                    };
                    let _ = self.slot.set(Err(err.to_string()));
                    return Err(err);
                }
            }
            images.push(img);
        }
        let _ = self.slot.set(Ok(images));
        Ok(())
    }

    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.slot.set(Err(message.into()));
    }

    pub fn state(&self) -> LoadState {
        match self.slot.get() {
            None => LoadState::Pending,
            Some(Ok(_)) => LoadState::Ready,
            Some(Err(_)) => LoadState::Failed,
        }
    }

    pub fn faces(&self) -> Option<&[PixelImage]> {
        self.slot.get().and_then(|r| r.as_deref().ok())
    }
}

impl Default for CubeTextureLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// A GPU texture with its view and sampler.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GpuTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Depth attachment sized to the surface.
    pub fn depth(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = default_sampler(device);
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads decoded pixels as a 2D sRGB texture.
    pub fn from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &PixelImage,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: img.width,
            height: img.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, img, 0);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = default_sampler(device);
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Uploads six equally-sized faces as a cube texture. Faces are layers
    /// 0..6 in +x, -x, +y, -y, +z, -z order.
    pub fn cube_from_pixels(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        faces: &[PixelImage],
        label: &str,
    ) -> Self {
        debug_assert_eq!(faces.len(), CUBE_FACE_COUNT);
        let (width, height) = (faces[0].width, faces[0].height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: CUBE_FACE_COUNT as u32,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, face) in faces.iter().enumerate() {
            write_layer(queue, &texture, face, layer as u32);
        }
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = default_sampler(device);
        Self {
            texture,
            view,
            sampler,
        }
    }

    /// One black pixel, bound while a 2D texture is pending.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        Self::from_pixels(device, queue, &PixelImage::placeholder(), label)
    }

    /// Six black pixels, bound while a cube texture is pending.
    pub fn placeholder_cube(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Self {
        let faces = vec![PixelImage::placeholder(); CUBE_FACE_COUNT];
        Self::cube_from_pixels(device, queue, &faces, label)
    }
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, img: &PixelImage, layer: u32) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            aspect: wgpu::TextureAspect::All,
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
        },
        &img.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * img.width),
            rows_per_image: Some(img.height),
        },
        wgpu::Extent3d {
            width: img.width,
            height: img.height,
            depth_or_array_layers: 1,
        },
    );
}

fn default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
