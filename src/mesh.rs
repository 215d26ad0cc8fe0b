//! Scene objects: the [`SceneObject`] capability trait and [`Mesh`].

use uuid::Uuid;
use wgpu::util::DeviceExt;

use crate::{
    error::{EngineError, EngineResult},
    geometry::Geometry,
    material::{Material, ProgramKind},
    math::{Euler, Matrix4, Vector3},
    pipelines::Pipelines,
    renderer::FrameReport,
};

/// Which faces a pipeline rasterizes for an object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

/// What a scene holds and a renderer draws.
///
/// `update` runs in the prepare phase (GPU uploads allowed), `render`
/// only records into an already-open pass.
pub trait SceneObject {
    fn uuid(&self) -> Uuid;
    fn side(&self) -> Side;
    fn program_kind(&self) -> ProgramKind;

    /// Creates missing GPU resources and refreshes per-frame data. Called
    /// once when the object joins a scene, then before every frame.
    fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
    ) -> EngineResult<()>;

    /// Binds buffers and records the draw. The matching pipeline is
    /// already set by the renderer.
    fn render(&self, pass: &mut wgpu::RenderPass<'_>, report: &mut FrameReport)
        -> EngineResult<()>;

    /// Releases GPU resources. Returns `false` when nothing was held.
    fn dispose(&mut self) -> bool;
}

/// A geometry / material pair with a world transform.
#[derive(Debug)]
pub struct Mesh {
    pub geometry: Geometry,
    pub material: Material,
    pub position: Vector3,
    pub rotation: Euler,
    pub scale: Vector3,
    /// When set, the model matrix is recomposed from position, rotation
    /// and scale each frame. Turn off to drive `matrix` by hand.
    pub matrix_auto_update: bool,
    pub side: Side,
    matrix: Matrix4,
    uuid: Uuid,
    matrix_buffer: Option<wgpu::Buffer>,
}

impl Mesh {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            geometry,
            material,
            position: Vector3::ZERO,
            rotation: Euler::ZERO,
            scale: Vector3::ONE,
            matrix_auto_update: true,
            side: Side::Front,
            matrix: Matrix4::IDENTITY,
            uuid: Uuid::new_v4(),
            matrix_buffer: None,
        }
    }

    pub fn matrix(&self) -> Matrix4 {
        self.matrix
    }

    /// Overrides the model matrix. Only sticks while `matrix_auto_update`
    /// is off.
    pub fn set_matrix(&mut self, matrix: Matrix4) {
        self.matrix = matrix;
    }

    pub fn update_matrix(&mut self) {
        self.matrix = Matrix4::compose(self.position, self.rotation, self.scale);
    }
}

impl SceneObject for Mesh {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn side(&self) -> Side {
        self.side
    }

    fn program_kind(&self) -> ProgramKind {
        self.material.program_kind()
    }

    fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipelines: &Pipelines,
    ) -> EngineResult<()> {
        if self.matrix_auto_update {
            self.update_matrix();
        }

        self.geometry.upload(device);

        let layout = match self.program_kind() {
            ProgramKind::CubeMesh => &pipelines.cube_texture_layout,
            _ => &pipelines.texture_layout,
        };
        self.material.upload(device, queue, layout, &self.geometry);
        self.material.refresh(device, queue, layout);

        match &self.matrix_buffer {
            Some(buffer) => {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(&self.matrix.elements));
            }
            None => {
                self.matrix_buffer =
                    Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("mesh matrix"),
                        contents: bytemuck::cast_slice(&self.matrix.elements),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    }));
            }
        }
        Ok(())
    }

    fn render(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        report: &mut FrameReport,
    ) -> EngineResult<()> {
        let positions = self
            .geometry
            .buffer()
            .ok_or(EngineError::MissingRenderResource("geometry positions"))?;
        let colors = self
            .material
            .color_buffer()
            .ok_or(EngineError::MissingRenderResource("material colors"))?;
        let uvs = self
            .material
            .uv_buffer()
            .ok_or(EngineError::MissingRenderResource("material uvs"))?;
        let matrix = self
            .matrix_buffer
            .as_ref()
            .ok_or(EngineError::MissingRenderResource("model matrix"))?;
        let bind_group = self
            .material
            .bind_group()
            .ok_or(EngineError::MissingRenderResource("material bind group"))?;

        pass.set_bind_group(1, bind_group, &[]);
        pass.set_vertex_buffer(0, positions.slice(..));
        pass.set_vertex_buffer(1, colors.slice(..));
        pass.set_vertex_buffer(2, uvs.slice(..));
        pass.set_vertex_buffer(3, matrix.slice(..));

        let vertices = self.geometry.vertex_count();
        pass.draw(0..vertices, 0..1);
        report.record_draw(vertices, 1);
        Ok(())
    }

    fn dispose(&mut self) -> bool {
        let mut any = false;
        if let Some(buffer) = self.matrix_buffer.take() {
            buffer.destroy();
            any = true;
        }
        any |= self.geometry.dispose();
        any |= self.material.dispose();
        any
    }
}
