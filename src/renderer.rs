//! Frame orchestration: prepare scene GPU state, record, submit.

use crate::{
    camera::{Camera, CameraResources},
    context::GpuContext,
    error::EngineResult,
    pipelines::Pipelines,
    scene::Scene,
    texture::GpuTexture,
};

/// What one frame actually did, for instrumentation and assertions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub draw_calls: u32,
    pub vertices: u32,
    pub instances: u32,
    pub background_drawn: bool,
}

impl FrameReport {
    pub(crate) fn record_draw(&mut self, vertices: u32, instances: u32) {
        self.draw_calls += 1;
        self.vertices += vertices;
        self.instances += instances;
    }

    pub(crate) fn record_background(&mut self, vertices: u32) {
        self.draw_calls += 1;
        self.vertices += vertices;
        self.background_drawn = true;
    }
}

/// Owns the pipelines, camera GPU state, and depth buffer; drives frames.
///
/// A frame has two phases: `prepare` mutates (matrix recomputation, lazy
/// material derivation, instance re-uploads, the single camera uniform
/// write), then `render_to_view` only records draws. The camera uniform
/// buffer is shared by every pipeline, so it is written exactly once per
/// frame before any draw.
#[derive(Debug)]
pub struct Renderer {
    pub pipelines: Pipelines,
    pub camera_resources: CameraResources,
    depth_texture: GpuTexture,
    clear_color: wgpu::Color,
}

impl Renderer {
    /// Compiles all shader programs and creates camera and depth
    /// resources. A shader or pipeline validation failure is fatal; no
    /// partial renderer is returned.
    pub async fn new(gpu: &GpuContext, camera: &Camera) -> EngineResult<Self> {
        let camera_resources = CameraResources::new(&gpu.device, camera);
        let pipelines = Pipelines::new(
            &gpu.device,
            gpu.config.format,
            &camera_resources.bind_group_layout,
        )
        .await?;
        let depth_texture = GpuTexture::depth(
            &gpu.device,
            gpu.config.width,
            gpu.config.height,
            "depth texture",
        );
        Ok(Self {
            pipelines,
            camera_resources,
            depth_texture,
            clear_color: wgpu::Color::BLACK,
        })
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) {
        self.clear_color = color;
    }

    /// Recreates the depth buffer for new surface dimensions. The caller
    /// resizes the surface itself (and the camera aspect) separately.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = GpuTexture::depth(device, width, height, "depth texture");
    }

    /// Phase one: all GPU uploads for this frame. Writes camera uniforms,
    /// lazily initializes the background, and updates every object.
    pub fn prepare(
        &mut self,
        gpu: &GpuContext,
        scene: &mut Scene,
        camera: &Camera,
    ) -> EngineResult<()> {
        self.camera_resources.write(&gpu.queue, camera);
        if let Some(background) = scene.background_mut() {
            background.update(&gpu.device, &gpu.queue, &self.pipelines);
        }
        for object in scene.objects_mut() {
            object.update(&gpu.device, &gpu.queue, &self.pipelines)?;
        }
        Ok(())
    }

    /// Phase two: records clear, skybox, then every object in insertion
    /// order, and submits. The skybox is drawn first with its depth
    /// forced to the far plane, so it ends up behind everything.
    pub fn render_to_view(
        &self,
        gpu: &GpuContext,
        scene: &Scene,
        view: &wgpu::TextureView,
    ) -> EngineResult<FrameReport> {
        let mut report = FrameReport::default();
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            pass.set_bind_group(0, &self.camera_resources.bind_group, &[]);

            if let Some(background) = scene.background().filter(|b| b.is_ready()) {
                pass.set_pipeline(self.pipelines.background());
                background.render(&mut pass, &mut report)?;
            }

            for object in scene.objects() {
                pass.set_pipeline(self.pipelines.for_object(object.program_kind(), object.side()));
                object.render(&mut pass, &mut report)?;
            }
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        Ok(report)
    }

    /// A full frame against the window surface.
    pub fn render(
        &mut self,
        gpu: &GpuContext,
        scene: &mut Scene,
        camera: &Camera,
    ) -> EngineResult<FrameReport> {
        self.prepare(gpu, scene, camera)?;

        let surface = gpu
            .surface
            .as_ref()
            .ok_or(crate::error::EngineError::MissingRenderResource("surface"))?;
        let frame = surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let report = self.render_to_view(gpu, scene, &view)?;
        frame.present();
        Ok(report)
    }
}
