//! Pipeline families, vertex buffer layouts, and bind group layouts.
//!
//! One WGSL module per program kind. Face culling is baked into a
//! pipeline, so every scene-object family carries one pipeline per
//! renderable side.

use crate::{
    error::{EngineError, EngineResult},
    material::ProgramKind,
    mesh::Side,
    texture::GpuTexture,
};

/// Positions: slot 0, three floats per vertex.
const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 0,
    format: wgpu::VertexFormat::Float32x3,
}];

/// Vertex colors: slot 1.
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 1,
    format: wgpu::VertexFormat::Float32x3,
}];

/// UV coordinates: slot 2.
const UV_ATTRS: [wgpu::VertexAttribute; 1] = [wgpu::VertexAttribute {
    offset: 0,
    shader_location: 2,
    format: wgpu::VertexFormat::Float32x2,
}];

/// One model matrix per draw, stepped per instance (locations 3..=6).
const MODEL_MATRIX_ATTRS: [wgpu::VertexAttribute; 4] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x4,
    },
    wgpu::VertexAttribute {
        offset: 16,
        shader_location: 4,
        format: wgpu::VertexFormat::Float32x4,
    },
    wgpu::VertexAttribute {
        offset: 32,
        shader_location: 5,
        format: wgpu::VertexFormat::Float32x4,
    },
    wgpu::VertexAttribute {
        offset: 48,
        shader_location: 6,
        format: wgpu::VertexFormat::Float32x4,
    },
];

/// Instanced record: model matrix plus a color (location 7).
const INSTANCED_ATTRS: [wgpu::VertexAttribute; 5] = [
    MODEL_MATRIX_ATTRS[0],
    MODEL_MATRIX_ATTRS[1],
    MODEL_MATRIX_ATTRS[2],
    MODEL_MATRIX_ATTRS[3],
    wgpu::VertexAttribute {
        offset: 64,
        shader_location: 7,
        format: wgpu::VertexFormat::Float32x3,
    },
];

pub fn position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &POSITION_ATTRS,
    }
}

pub fn color_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &COLOR_ATTRS,
    }
}

pub fn uv_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 8,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &UV_ATTRS,
    }
}

/// Single-matrix instance buffer used by non-instanced meshes.
pub fn model_matrix_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 64,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &MODEL_MATRIX_ATTRS,
    }
}

/// Interleaved matrix + color records used by instanced meshes.
pub fn instanced_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 76,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCED_ATTRS,
    }
}

pub fn texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    sampled_texture_layout(device, wgpu::TextureViewDimension::D2, "texture_bind_group_layout")
}

pub fn cube_texture_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    sampled_texture_layout(
        device,
        wgpu::TextureViewDimension::Cube,
        "cube_texture_bind_group_layout",
    )
}

fn sampled_texture_layout(
    device: &wgpu::Device,
    view_dimension: wgpu::TextureViewDimension,
    label: &str,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some(label),
    })
}

const SIDES: [Side; 3] = [Side::Front, Side::Back, Side::Double];

fn side_index(side: Side) -> usize {
    match side {
        Side::Front => 0,
        Side::Back => 1,
        Side::Double => 2,
    }
}

/// The primitive vertex tables wind outward faces clockwise, so under
/// `FrontFace::Ccw` the outward faces are wgpu back faces. Showing an
/// object's front therefore culls wgpu-front (interior) faces.
fn cull_mode(side: Side) -> Option<wgpu::Face> {
    match side {
        Side::Front => Some(wgpu::Face::Front),
        Side::Back => Some(wgpu::Face::Back),
        Side::Double => None,
    }
}

/// All compiled render pipelines plus the material bind group layouts.
#[derive(Debug)]
pub struct Pipelines {
    pub texture_layout: wgpu::BindGroupLayout,
    pub cube_texture_layout: wgpu::BindGroupLayout,
    mesh: [wgpu::RenderPipeline; 3],
    instanced: [wgpu::RenderPipeline; 3],
    cube: [wgpu::RenderPipeline; 3],
    background: wgpu::RenderPipeline,
}

impl Pipelines {
    /// Compiles every shader module and builds all pipelines. Validation
    /// errors are captured through error scopes and surfaced instead of
    /// panicking the device.
    pub async fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        camera_layout: &wgpu::BindGroupLayout,
    ) -> EngineResult<Self> {
        let mesh_shader =
            compile_shader(device, "mesh shader", include_str!("mesh_shader.wgsl")).await?;
        let instanced_shader = compile_shader(
            device,
            "instanced shader",
            include_str!("instanced_shader.wgsl"),
        )
        .await?;
        let cube_shader =
            compile_shader(device, "cube shader", include_str!("cube_shader.wgsl")).await?;
        let background_shader = compile_shader(
            device,
            "background shader",
            include_str!("background_shader.wgsl"),
        )
        .await?;

        let texture_layout = texture_bind_group_layout(device);
        let cube_texture_layout = cube_texture_bind_group_layout(device);

        let mesh_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mesh pipeline layout"),
                bind_group_layouts: &[camera_layout, &texture_layout],
                push_constant_ranges: &[],
            });
        let instanced_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("instanced pipeline layout"),
                bind_group_layouts: &[camera_layout],
                push_constant_ranges: &[],
            });
        let cube_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("cube pipeline layout"),
                bind_group_layouts: &[camera_layout, &cube_texture_layout],
                push_constant_ranges: &[],
            });

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let object_depth = wgpu::DepthStencilState {
            format: GpuTexture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };
        // The skybox forces its depth to the far plane, LessEqual lets it
        // pass against the cleared depth buffer.
        let background_depth = wgpu::DepthStencilState {
            format: GpuTexture::DEPTH_FORMAT,
            depth_write_enabled: false,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        };

        let mesh = SIDES.map(|side| {
            mk_render_pipeline(
                device,
                &mesh_pipeline_layout,
                color_format,
                object_depth.clone(),
                cull_mode(side),
                &[
                    position_layout(),
                    color_layout(),
                    uv_layout(),
                    model_matrix_layout(),
                ],
                &mesh_shader,
                "mesh pipeline",
            )
        });
        let instanced = SIDES.map(|side| {
            mk_render_pipeline(
                device,
                &instanced_pipeline_layout,
                color_format,
                object_depth.clone(),
                cull_mode(side),
                &[
                    position_layout(),
                    color_layout(),
                    uv_layout(),
                    instanced_layout(),
                ],
                &instanced_shader,
                "instanced pipeline",
            )
        });
        let cube = SIDES.map(|side| {
            mk_render_pipeline(
                device,
                &cube_pipeline_layout,
                color_format,
                object_depth.clone(),
                cull_mode(side),
                &[
                    position_layout(),
                    color_layout(),
                    uv_layout(),
                    model_matrix_layout(),
                ],
                &cube_shader,
                "cube pipeline",
            )
        });
        let background = mk_render_pipeline(
            device,
            &cube_pipeline_layout,
            color_format,
            background_depth,
            None,
            &[position_layout()],
            &background_shader,
            "background pipeline",
        );

        if let Some(error) = device.pop_error_scope().await {
            return Err(EngineError::ShaderLink {
                label: "pipelines".to_string(),
                message: error.to_string(),
            });
        }

        Ok(Self {
            texture_layout,
            cube_texture_layout,
            mesh,
            instanced,
            cube,
            background,
        })
    }

    pub fn for_object(&self, kind: ProgramKind, side: Side) -> &wgpu::RenderPipeline {
        let i = side_index(side);
        match kind {
            ProgramKind::Mesh => &self.mesh[i],
            ProgramKind::InstancedMesh => &self.instanced[i],
            ProgramKind::CubeMesh => &self.cube[i],
            ProgramKind::Background => &self.background,
        }
    }

    pub fn background(&self) -> &wgpu::RenderPipeline {
        &self.background
    }
}

async fn compile_shader(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> EngineResult<wgpu::ShaderModule> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(error) = device.pop_error_scope().await {
        return Err(EngineError::ShaderCompile {
            label: label.to_string(),
            message: error.to_string(),
        });
    }
    Ok(module)
}

#[allow(clippy::too_many_arguments)]
fn mk_render_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    color_format: wgpu::TextureFormat,
    depth: wgpu::DepthStencilState,
    cull_mode: Option<wgpu::Face>,
    vertex_layouts: &[wgpu::VertexBufferLayout],
    shader: &wgpu::ShaderModule,
    label: &str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: vertex_layouts,
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(wgpu::BlendState {
                    alpha: wgpu::BlendComponent::REPLACE,
                    color: wgpu::BlendComponent::REPLACE,
                }),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(depth),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
