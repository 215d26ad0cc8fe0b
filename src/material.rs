//! Mesh surface description: colors, textures, and their GPU buffers.

use wgpu::util::DeviceExt;

use crate::{
    error::{EngineError, EngineResult},
    geometry::Geometry,
    texture::{CubeTextureLoader, GpuTexture, LoadState, Texture2dLoader, DEFAULT_UV_RECT},
};

/// An RGB color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// From 8-bit channel values.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// From a packed `0xRRGGBB` value.
    pub fn hex(hex: u32) -> Self {
        Self::rgb8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

/// What paints the surface. Color and texture are mutually exclusive; a
/// material is exactly one of these.
#[derive(Clone, Debug)]
pub enum Paint {
    /// One color for every vertex.
    Solid(Color),
    /// One color per face (`triangles_per_face` consecutive triangles).
    /// Faces past the end of the list fall back to black.
    FaceColors(Vec<Color>),
    /// A 2D texture; vertex colors stay black so the texture alone shows.
    Texture(Texture2dLoader),
    /// A cube texture sampled by position direction.
    CubeTexture(CubeTextureLoader),
}

/// Which pipeline family a material draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProgramKind {
    Mesh,
    InstancedMesh,
    CubeMesh,
    Background,
}

/// Geometry-independent surface description plus lazily derived GPU state.
///
/// The color and UV vertex buffers are derived from the paired geometry on
/// first upload. While a texture load is pending the material binds a one
/// pixel black placeholder and swaps in the real texture on the frame the
/// load reports ready.
#[derive(Debug)]
pub struct Material {
    paint: Paint,
    color_buffer: Option<wgpu::Buffer>,
    uv_buffer: Option<wgpu::Buffer>,
    texture: Option<GpuTexture>,
    bind_group: Option<wgpu::BindGroup>,
    real_texture_bound: bool,
}

impl Material {
    pub fn solid(color: Color) -> Self {
        Self::with_paint(Paint::Solid(color))
    }

    pub fn face_colors(colors: Vec<Color>) -> Self {
        Self::with_paint(Paint::FaceColors(colors))
    }

    pub fn texture(loader: Texture2dLoader) -> Self {
        Self::with_paint(Paint::Texture(loader))
    }

    pub fn cube_texture(loader: CubeTextureLoader) -> Self {
        Self::with_paint(Paint::CubeTexture(loader))
    }

    /// At most one texture per material. An empty list yields a plain
    /// white material; more than one is rejected, use a texture atlas.
    pub fn from_textures(mut loaders: Vec<Texture2dLoader>) -> EngineResult<Self> {
        match loaders.len() {
            0 => Ok(Self::solid(Color::WHITE)),
            1 => Ok(Self::texture(loaders.remove(0))),
            n => Err(EngineError::UnsupportedTextureArray(n)),
        }
    }

    fn with_paint(paint: Paint) -> Self {
        Self {
            paint,
            color_buffer: None,
            uv_buffer: None,
            texture: None,
            bind_group: None,
            real_texture_bound: false,
        }
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }

    pub fn program_kind(&self) -> ProgramKind {
        match self.paint {
            Paint::CubeTexture(_) => ProgramKind::CubeMesh,
            _ => ProgramKind::Mesh,
        }
    }

    /// Per-vertex RGB values for `geometry`, following the face-coloring
    /// rule: each run of `triangles_per_face` triangles takes the next
    /// color, faces past the end of the color list are black, and texture
    /// paints yield all black so only the sampled texel contributes.
    pub fn derive_vertex_colors(&self, geometry: &Geometry) -> Vec<f32> {
        let vertex_count = geometry.vertex_count() as usize;
        let tpf = geometry.triangles_per_face().max(1) as usize;
        let mut out = vec![0.0f32; vertex_count * 3];
        match &self.paint {
            Paint::Solid(color) => {
                for chunk in out.chunks_exact_mut(3) {
                    chunk.copy_from_slice(&color.to_array());
                }
            }
            Paint::FaceColors(colors) => {
                for (v, chunk) in out.chunks_exact_mut(3).enumerate() {
                    let face = (v / 3) / tpf;
                    if let Some(color) = colors.get(face) {
                        chunk.copy_from_slice(&color.to_array());
                    }
                }
            }
            Paint::Texture(_) | Paint::CubeTexture(_) => {}
        }
        out
    }

    /// Per-vertex UV coordinates: the texture's declared UV rectangle
    /// tiled across the whole vertex stream.
    pub fn derive_uvs(&self, geometry: &Geometry) -> Vec<f32> {
        let uv_rect = match &self.paint {
            Paint::Texture(loader) => loader.uv_rect(),
            _ => &DEFAULT_UV_RECT,
        };
        let len = geometry.vertex_count() as usize * 2;
        (0..len).map(|i| uv_rect[i % uv_rect.len()]).collect()
    }

    /// Creates the color and UV buffers and the initial bind group (with
    /// a placeholder texture when the load has not resolved). Idempotent;
    /// call [`Material::refresh`] each frame for the texture swap.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        geometry: &Geometry,
    ) {
        self.upload_buffers(device, geometry);
        if self.bind_group.is_none() {
            self.bind_texture(device, queue, layout);
        }
    }

    /// Creates only the color and UV vertex buffers. The instanced
    /// pipeline carries no texture bind group, so instanced materials
    /// stop here.
    pub fn upload_buffers(&mut self, device: &wgpu::Device, geometry: &Geometry) {
        if self.color_buffer.is_none() {
            let colors = self.derive_vertex_colors(geometry);
            self.color_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("material colors"),
                contents: bytemuck::cast_slice(&colors),
                usage: wgpu::BufferUsages::VERTEX,
            }));
        }
        if self.uv_buffer.is_none() {
            let uvs = self.derive_uvs(geometry);
            self.uv_buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("material uvs"),
                contents: bytemuck::cast_slice(&uvs),
                usage: wgpu::BufferUsages::VERTEX,
            }));
        }
    }

    /// Polls a pending texture load and rebinds when it has resolved.
    /// Returns `true` when the bind group changed. A failed load keeps the
    /// placeholder bound; the loader carries the error.
    pub fn refresh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> bool {
        if self.real_texture_bound || self.bind_group.is_none() {
            return false;
        }
        let ready = match &self.paint {
            Paint::Texture(loader) => loader.state() == LoadState::Ready,
            Paint::CubeTexture(loader) => loader.state() == LoadState::Ready,
            _ => return false,
        };
        if !ready {
            return false;
        }
        self.bind_texture(device, queue, layout);
        true
    }

    fn bind_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) {
        let (texture, real) = match &self.paint {
            Paint::CubeTexture(loader) => match loader.faces() {
                Some(faces) => (
                    GpuTexture::cube_from_pixels(device, queue, faces, "material cube"),
                    true,
                ),
                None => (
                    GpuTexture::placeholder_cube(device, queue, "material cube placeholder"),
                    false,
                ),
            },
            Paint::Texture(loader) => match loader.image() {
                Some(img) => (
                    GpuTexture::from_pixels(device, queue, img, "material texture"),
                    true,
                ),
                None => (
                    GpuTexture::placeholder(device, queue, "material placeholder"),
                    false,
                ),
            },
            _ => (
                GpuTexture::placeholder(device, queue, "material placeholder"),
                // Solid and face colors never swap textures.
                true,
            ),
        };
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&texture.sampler),
                },
            ],
            label: Some("material bind group"),
        }));
        self.texture = Some(texture);
        self.real_texture_bound = real;
    }

    pub fn color_buffer(&self) -> Option<&wgpu::Buffer> {
        self.color_buffer.as_ref()
    }

    pub fn uv_buffer(&self) -> Option<&wgpu::Buffer> {
        self.uv_buffer.as_ref()
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Releases GPU buffers and the bind group. Returns `false` when
    /// nothing was held.
    pub fn dispose(&mut self) -> bool {
        let had_any =
            self.color_buffer.is_some() || self.uv_buffer.is_some() || self.bind_group.is_some();
        if let Some(buffer) = self.color_buffer.take() {
            buffer.destroy();
        }
        if let Some(buffer) = self.uv_buffer.take() {
            buffer.destroy();
        }
        self.bind_group = None;
        self.texture = None;
        self.real_texture_bound = false;
        had_any
    }
}
