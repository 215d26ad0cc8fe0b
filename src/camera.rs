//! Perspective camera and its GPU uniform resources.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::{
    error::{EngineError, EngineResult},
    math::{Euler, Matrix4, Vector3},
};

/// Converts GL clip space (depth -1..1) to the 0..1 depth range the
/// surface expects. Multiplied in when composing camera uniforms so the
/// projection matrix itself keeps the classic GL form.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4 = Matrix4::from_cols_array([
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

/// A perspective camera.
///
/// Orientation comes from either the Euler `rotation` or, once
/// [`Camera::look_at`] has been called, the stored look-at target. The
/// target wins until [`Camera::clear_target`].
#[derive(Clone, Debug)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3,
    pub rotation: Euler,
    target: Option<Vector3>,
    projection_matrix: Matrix4,
    rotation_matrix: Matrix4,
}

impl Camera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> EngineResult<Self> {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vector3::ZERO,
            rotation: Euler::ZERO,
            target: None,
            projection_matrix: Matrix4::IDENTITY,
            rotation_matrix: Matrix4::IDENTITY,
        };
        camera.update_projection_matrix()?;
        Ok(camera)
    }

    /// Rebuilds the projection from the current parameters. Rejected
    /// parameters leave the previous projection in place.
    pub fn update_projection_matrix(&mut self) -> EngineResult<()> {
        if !(self.fov > 0.0 && self.fov < 180.0)
            || !(self.aspect > 0.0)
            || self.near == self.far
        {
            log::warn!(
                "rejecting projection update: fov {}, aspect {}, near {}, far {}",
                self.fov,
                self.aspect,
                self.near,
                self.far
            );
            return Err(EngineError::DegenerateProjection {
                fov: self.fov,
                aspect: self.aspect,
                near: self.near,
                far: self.far,
            });
        }
        self.projection_matrix = Matrix4::perspective(self.fov, self.aspect, self.near, self.far);
        Ok(())
    }

    pub fn set_aspect(&mut self, aspect: f32) -> EngineResult<()> {
        self.aspect = aspect;
        self.update_projection_matrix()
    }

    /// Orients the camera towards `target` with +Y up. The camera position
    /// must differ from the target; a zero offset degenerates the basis.
    pub fn look_at(&mut self, target: Vector3) {
        let up = Vector3::UNIT_Y;
        let z_axis = (self.position - target).normalize();
        let x_axis = up.cross(z_axis).normalize();
        let y_axis = z_axis.cross(x_axis).normalize();

        // Orthonormal basis, so the inverse always exists here.
        if let Some(inverse) = Matrix4::from_basis(x_axis, y_axis, z_axis).inverse() {
            self.rotation_matrix = inverse;
        }
        self.target = Some(target);
    }

    pub fn target(&self) -> Option<Vector3> {
        self.target
    }

    /// Drops the look-at target; orientation falls back to `rotation`.
    pub fn clear_target(&mut self) {
        self.target = None;
    }

    pub fn projection_matrix(&self) -> Matrix4 {
        self.projection_matrix
    }

    /// World-to-camera rotation, without translation. The skybox is drawn
    /// with this alone so it never parallax-shifts.
    pub fn rotation_matrix(&self) -> Matrix4 {
        if self.target.is_some() {
            self.rotation_matrix
        } else {
            // Inverse of a pure rotation is its transpose.
            Matrix4::from_euler(self.rotation).transpose()
        }
    }

    /// Full world-to-camera transform.
    pub fn view_matrix(&self) -> Matrix4 {
        self.rotation_matrix() * Matrix4::from_translation(-self.position)
    }
}

/// Camera data in shader layout, shared by every pipeline at group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct CameraUniform {
    view_proj: [[f32; 4]; 4],
    rot_proj: [[f32; 4]; 4],
    view_pos: [f32; 4],
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Matrix4::IDENTITY.to_cols_array_2d(),
            rot_proj: Matrix4::IDENTITY.to_cols_array_2d(),
            view_pos: [0.0; 4],
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera) {
        let proj = OPENGL_TO_WGPU_MATRIX * camera.projection_matrix();
        self.view_proj = (proj * camera.view_matrix()).to_cols_array_2d();
        self.rot_proj = (proj * camera.rotation_matrix()).to_cols_array_2d();
        self.view_pos = [camera.position.x, camera.position.y, camera.position.z, 1.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// The GPU-side camera state: uniform buffer and bind group. Written once
/// per frame before any draw.
#[derive(Debug)]
pub struct CameraResources {
    pub uniform: CameraUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl CameraResources {
    pub fn new(device: &wgpu::Device, camera: &Camera) -> Self {
        let mut uniform = CameraUniform::new();
        uniform.update_view_proj(camera);

        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("camera buffer"),
            contents: bytemuck::cast_slice(&[uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
            label: Some("camera_bind_group_layout"),
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
            label: Some("camera_bind_group"),
        });

        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    /// Recomputes the uniform from `camera` and uploads it.
    pub fn write(&mut self, queue: &wgpu::Queue, camera: &Camera) {
        self.uniform.update_view_proj(camera);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}
