//! Triangle-list geometry and its GPU vertex buffer.

use wgpu::util::DeviceExt;

use crate::math::Vector3;

/// Flat triangle-list positions plus the owned GPU position buffer.
///
/// Positions are `[x, y, z]` triples, three per triangle, no index
/// buffer. `triangles_per_face` tells materials how many consecutive
/// triangles share one face color.
#[derive(Debug)]
pub struct Geometry {
    positions: Vec<f32>,
    triangles_per_face: u32,
    center_offset: Option<Vector3>,
    buffer: Option<wgpu::Buffer>,
}

impl Geometry {
    pub fn new(positions: Vec<f32>, triangles_per_face: u32) -> Self {
        debug_assert_eq!(positions.len() % 9, 0, "positions must form whole triangles");
        Self {
            positions,
            triangles_per_face,
            center_offset: None,
            buffer: None,
        }
    }

    /// Like [`Geometry::new`], but shifts all vertices so their mean sits
    /// at the origin. The applied offset is recorded and can be queried
    /// with [`Geometry::center_offset`].
    pub fn new_centered(mut positions: Vec<f32>, triangles_per_face: u32) -> Self {
        let offset = centroid(&positions);
        for chunk in positions.chunks_exact_mut(3) {
            chunk[0] -= offset.x;
            chunk[1] -= offset.y;
            chunk[2] -= offset.z;
        }
        let mut geometry = Self::new(positions, triangles_per_face);
        geometry.center_offset = Some(offset);
        geometry
    }

    /// Axis-aligned cuboid of 12 triangles (36 vertices), centered at the
    /// origin with extents `±width`, `±height`, `±depth`.
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        #[rustfmt::skip]
        let unit: [f32; 108] = [
            // front
            -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
            -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
            // back
             1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,
             1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,
            // top
            -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
            -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
            // bottom
            -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
            -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
            // right
             1.0, -1.0,  1.0,   1.0,  1.0,  1.0,   1.0, -1.0, -1.0,
             1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,
            // left
            -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,  -1.0, -1.0,  1.0,
            -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,
        ];
        let positions = unit
            .chunks_exact(3)
            .flat_map(|v| [v[0] * width, v[1] * height, v[2] * depth])
            .collect();
        Self::new(positions, 2)
    }

    /// Double-sided quad in the XY plane (front and back faces, 12
    /// vertices) with extents `±width`, `±depth`.
    pub fn plane(width: f32, depth: f32) -> Self {
        #[rustfmt::skip]
        let unit: [f32; 36] = [
            // front
            -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
            -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,   1.0, -1.0,  1.0,
            // back
             1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,
             1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,
        ];
        let positions = unit
            .chunks_exact(3)
            .flat_map(|v| [v[0] * width, v[1] * depth, v[2]])
            .collect();
        Self::new(positions, 2)
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn vertex_count(&self) -> u32 {
        (self.positions.len() / 3) as u32
    }

    pub fn triangle_count(&self) -> u32 {
        (self.positions.len() / 9) as u32
    }

    pub fn triangles_per_face(&self) -> u32 {
        self.triangles_per_face
    }

    pub fn center_offset(&self) -> Option<Vector3> {
        self.center_offset
    }

    /// Creates the GPU position buffer. Uploading again without a dispose
    /// in between is a no-op.
    pub fn upload(&mut self, device: &wgpu::Device) {
        if self.buffer.is_some() {
            return;
        }
        self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("geometry positions"),
            contents: bytemuck::cast_slice(&self.positions),
            usage: wgpu::BufferUsages::VERTEX,
        }));
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// Releases the GPU buffer. Returns `false` when there was nothing to
    /// release, so a second call is an observable no-op.
    pub fn dispose(&mut self) -> bool {
        match self.buffer.take() {
            Some(buffer) => {
                buffer.destroy();
                true
            }
            None => false,
        }
    }
}

fn centroid(positions: &[f32]) -> Vector3 {
    let n = (positions.len() / 3).max(1) as f32;
    let mut sum = Vector3::ZERO;
    for chunk in positions.chunks_exact(3) {
        sum += Vector3::new(chunk[0], chunk[1], chunk[2]);
    }
    sum * (1.0 / n)
}
