//! Engine error taxonomy.

use thiserror::Error;

/// Everything that can go wrong between scene setup and a presented frame.
///
/// Math-level singularities are not represented here: matrix inversion
/// returns `Option` and callers decide. An unready texture is not an error
/// either, the renderer binds a placeholder until the load resolves.
#[derive(Debug, Error)]
pub enum EngineError {
    /// WGSL compilation failed for the named shader module.
    #[error("shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    /// Pipeline creation failed after the shaders compiled.
    #[error("pipeline '{label}' failed validation: {message}")]
    ShaderLink { label: String, message: String },

    /// A draw was requested before the object's GPU resources were created.
    #[error("missing GPU resource for render: {0}")]
    MissingRenderResource(&'static str),

    /// Rejected projection parameters; the previous projection matrix is
    /// kept.
    #[error("degenerate projection: fov {fov}, aspect {aspect}, near {near}, far {far}")]
    DegenerateProjection {
        fov: f32,
        aspect: f32,
        near: f32,
        far: f32,
    },

    /// Materials accept at most one texture.
    #[error("array textures are not supported ({0} textures given)")]
    UnsupportedTextureArray(usize),

    /// Cube texture faces must all share one size.
    #[error(
        "cube face {index} is {width}x{height}, expected {expected_width}x{expected_height}"
    )]
    CubeFaceSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// Image bytes could not be decoded.
    #[error("failed to decode texture '{label}': {source}")]
    TextureDecode {
        label: String,
        #[source]
        source: image::ImageError,
    },

    #[error("no suitable GPU adapter found")]
    AdapterNotFound,

    #[error("surface creation failed: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub type EngineResult<T> = Result<T, EngineError>;
