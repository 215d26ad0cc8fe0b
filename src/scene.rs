//! Scene: ordered object list plus the optional skybox background.

use uuid::Uuid;

use crate::{
    error::{EngineError, EngineResult},
    geometry::Geometry,
    mesh::SceneObject,
    pipelines::Pipelines,
    renderer::FrameReport,
    texture::{CubeTextureLoader, GpuTexture, LoadState},
};

/// The skybox slot. GPU initialization is deferred until the cube texture
/// reports ready; until then the background simply isn't drawn.
#[derive(Debug)]
pub struct Background {
    geometry: Geometry,
    loader: CubeTextureLoader,
    texture: Option<GpuTexture>,
    bind_group: Option<wgpu::BindGroup>,
}

impl Background {
    pub fn new(loader: CubeTextureLoader) -> Self {
        Self {
            geometry: Geometry::cuboid(1.0, 1.0, 1.0),
            loader,
            texture: None,
            bind_group: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.bind_group.is_some()
    }

    /// Polls the loader and creates GPU state on the frame it resolves.
    pub fn update(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, pipelines: &Pipelines) {
        if self.bind_group.is_some() || self.loader.state() != LoadState::Ready {
            return;
        }
        let Some(faces) = self.loader.faces() else {
            return;
        };
        self.geometry.upload(device);
        let texture = GpuTexture::cube_from_pixels(device, queue, faces, "background cube");
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &pipelines.cube_texture_layout,
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
            label: Some("background bind group"),
        }));
        self.texture = Some(texture);
    }

    pub fn render(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        report: &mut FrameReport,
    ) -> EngineResult<()> {
        let positions = self
            .geometry
            .buffer()
            .ok_or(EngineError::MissingRenderResource("background positions"))?;
        let bind_group = self
            .bind_group
            .as_ref()
            .ok_or(EngineError::MissingRenderResource("background bind group"))?;

        pass.set_bind_group(1, bind_group, &[]);
        pass.set_vertex_buffer(0, positions.slice(..));
        let vertices = self.geometry.vertex_count();
        pass.draw(0..vertices, 0..1);
        report.record_background(vertices);
        Ok(())
    }

    pub fn dispose(&mut self) -> bool {
        let had_any = self.bind_group.is_some();
        self.bind_group = None;
        self.texture = None;
        self.geometry.dispose() || had_any
    }
}

/// Insertion-ordered collection of renderable objects. Order is render
/// order; overlap correctness comes from the depth test, not sorting.
#[derive(Default)]
pub struct Scene {
    objects: Vec<Box<dyn SceneObject>>,
    background: Option<Background>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            background: None,
        }
    }

    /// Appends an object, running its one-time GPU initialization first.
    /// Returns the object's identifier for later [`Scene::remove`].
    pub fn add(
        &mut self,
        mut object: Box<dyn SceneObject>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
    ) -> EngineResult<Uuid> {
        object.update(device, queue, pipelines)?;
        let uuid = object.uuid();
        self.objects.push(object);
        Ok(uuid)
    }

    /// Detaches an object by identifier without disposing its GPU
    /// resources. Removing a non-member is a no-op returning `None`.
    pub fn remove(&mut self, uuid: Uuid) -> Option<Box<dyn SceneObject>> {
        let index = self.objects.iter().position(|o| o.uuid() == uuid)?;
        Some(self.objects.remove(index))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Box<dyn SceneObject>] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [Box<dyn SceneObject>] {
        &mut self.objects
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = Some(background);
    }

    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn background_mut(&mut self) -> Option<&mut Background> {
        self.background.as_mut()
    }

    /// Releases the GPU resources of every object and the background.
    /// Objects stay in the list; teardown is expected to drop the scene
    /// right after.
    pub fn dispose_all(&mut self) {
        for object in &mut self.objects {
            object.dispose();
        }
        if let Some(background) = &mut self.background {
            background.dispose();
        }
    }
}
