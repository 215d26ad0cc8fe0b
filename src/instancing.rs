//! Instanced meshes: many transforms and colors, one draw call.

use uuid::Uuid;
use wgpu::util::DeviceExt;

use crate::{
    error::{EngineError, EngineResult},
    geometry::Geometry,
    material::{Material, ProgramKind},
    math::Matrix4,
    mesh::{SceneObject, Side},
    pipelines::Pipelines,
    renderer::FrameReport,
};

/// Floats per interleaved instance record: a model matrix and a color.
const INSTANCE_FLOATS: usize = 19;

/// A mesh drawn `count` times in one call, each instance with its own
/// model matrix and color.
///
/// Both per-instance arrays always hold exactly `count` entries; they can
/// only be written through the index setters, so the invariant cannot
/// break. Edits set a dirty flag and the whole instance buffer is
/// re-uploaded on the next update.
///
/// The material only contributes its vertex color stream; instanced draws
/// bind no texture.
#[derive(Debug)]
pub struct InstancedMesh {
    pub geometry: Geometry,
    pub material: Material,
    pub side: Side,
    count: u32,
    matrices: Vec<Matrix4>,
    colors: Vec<[f32; 3]>,
    dirty: bool,
    instance_buffer: Option<wgpu::Buffer>,
    uuid: Uuid,
}

impl InstancedMesh {
    pub fn new(geometry: Geometry, material: Material, count: u32) -> Self {
        Self {
            geometry,
            material,
            side: Side::Front,
            count,
            matrices: vec![Matrix4::IDENTITY; count as usize],
            colors: vec![[1.0, 1.0, 1.0]; count as usize],
            dirty: true,
            instance_buffer: None,
            uuid: Uuid::new_v4(),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn matrix_at(&self, index: usize) -> Option<Matrix4> {
        self.matrices.get(index).copied()
    }

    pub fn color_at(&self, index: usize) -> Option<[f32; 3]> {
        self.colors.get(index).copied()
    }

    /// Writes the transform of one instance. Out-of-range indices are
    /// ignored with a warning.
    pub fn set_matrix_at(&mut self, index: usize, matrix: Matrix4) {
        match self.matrices.get_mut(index) {
            Some(slot) => {
                *slot = matrix;
                self.dirty = true;
            }
            None => log::warn!("instance index {index} out of range (count {})", self.count),
        }
    }

    /// Writes the color of one instance. Out-of-range indices are ignored
    /// with a warning.
    pub fn set_color_at(&mut self, index: usize, color: [f32; 3]) {
        match self.colors.get_mut(index) {
            Some(slot) => {
                *slot = color;
                self.dirty = true;
            }
            None => log::warn!("instance index {index} out of range (count {})", self.count),
        }
    }

    fn instance_data(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.count as usize * INSTANCE_FLOATS);
        for (matrix, color) in self.matrices.iter().zip(&self.colors) {
            data.extend_from_slice(&matrix.elements);
            data.extend_from_slice(color);
        }
        data
    }
}

impl SceneObject for InstancedMesh {
    fn uuid(&self) -> Uuid {
        self.uuid
    }

    fn side(&self) -> Side {
        self.side
    }

    fn program_kind(&self) -> ProgramKind {
        ProgramKind::InstancedMesh
    }

    fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        _pipelines: &Pipelines,
    ) -> EngineResult<()> {
        self.geometry.upload(device);
        // No texture bind group: the instanced pipeline has no group 1.
        self.material.upload_buffers(device, &self.geometry);

        match &self.instance_buffer {
            Some(buffer) => {
                if self.dirty {
                    queue.write_buffer(buffer, 0, bytemuck::cast_slice(&self.instance_data()));
                    self.dirty = false;
                }
            }
            None => {
                self.instance_buffer =
                    Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("instance records"),
                        contents: bytemuck::cast_slice(&self.instance_data()),
                        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                    }));
                self.dirty = false;
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
        let instances = self
            .instance_buffer
            .as_ref()
            .ok_or(EngineError::MissingRenderResource("instance records"))?;

        pass.set_vertex_buffer(0, positions.slice(..));
        pass.set_vertex_buffer(1, colors.slice(..));
        pass.set_vertex_buffer(2, uvs.slice(..));
        pass.set_vertex_buffer(3, instances.slice(..));

        let vertices = self.geometry.vertex_count();
        pass.draw(0..vertices, 0..self.count);
        report.record_draw(vertices, self.count);
        Ok(())
    }

    fn dispose(&mut self) -> bool {
        let mut any = false;
        if let Some(buffer) = self.instance_buffer.take() {
            buffer.destroy();
            any = true;
        }
        any |= self.geometry.dispose();
        any |= self.material.dispose();
        any
    }
}
