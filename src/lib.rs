//! lumen-ngin: a small cross-platform real-time 3D rendering engine.
//!
//! Renders a scene of meshes under a perspective camera with wgpu, on
//! native and on the web. Each frame recomputes object transforms, polls
//! texture loads, uploads camera uniforms once, and issues one draw call
//! per object (instanced objects draw all their copies in that one call).
//!
//! The usual entry point is [`engine::run`] with an [`engine::EngineHook`]
//! that builds a [`scene::Scene`] in `on_load` and mutates it per frame in
//! `on_update`. The lower layers ([`context::GpuContext`],
//! [`renderer::Renderer`]) can also be driven directly, e.g. headless.

pub mod camera;
pub mod context;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod instancing;
pub mod material;
pub mod math;
pub mod mesh;
pub mod pipelines;
pub mod renderer;
pub mod scene;
pub mod texture;

pub use camera::Camera;
pub use context::GpuContext;
pub use engine::{run, EngineHook, EngineState};
pub use error::{EngineError, EngineResult};
pub use geometry::Geometry;
pub use instancing::InstancedMesh;
pub use material::{Color, Material, Paint, ProgramKind};
pub use math::{Euler, Matrix3, Matrix4, Quaternion, Vector2, Vector3, Vector4};
pub use mesh::{Mesh, SceneObject, Side};
pub use renderer::{FrameReport, Renderer};
pub use scene::{Background, Scene};
pub use texture::{CubeTextureLoader, GpuTexture, LoadState, PixelImage, Texture2dLoader};
