/// Skyfolio Core Library - Scene model and update loop
///
/// This library provides the renderer-independent parts of the scroll-reactive
/// star scene: geometry generators, materials and lights, the perspective
/// camera, scene assembly, orbit controls and the per-frame update loop.

pub mod animation;
pub mod assembler;
pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod light;
pub mod material;
pub mod random;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use animation::{
    FrameDeltas, FrameLoop, LoopState, Renderer, ScrollResponse, ScrollThrottle, Stage,
};
pub use assembler::{assemble, Assembly, SceneHandles};
pub use camera::{PerspectiveCamera, ProjectedPoint, Viewport};
pub use config::StageConfig;
pub use controls::OrbitControls;
pub use error::{ConfigError, LoopError};
pub use geometry::{Geometry, LineSegment, LineSet, Mesh, Triangle, Vertex};
pub use light::Light;
pub use material::{Color, Material, StandardMaterial, TextureRef};
pub use scene::{Background, ObjectId, Scene, SceneObject};
pub use transform::{RotationState, Transform};
