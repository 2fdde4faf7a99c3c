//! WebGPU rendering module
//!
//! The scene is rebuilt from engine state every frame as one triangle list.

pub mod pipeline;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::RenderState;
pub use scene::{SceneOptions, build_scene};
pub use vertex::Vertex;
