//! Exports a scene's visible meshes, particle emitters and smoke volumes into a
//! line-oriented `.scene` file, with one `.ply` file per mesh and a material catalog.

pub mod config;
pub mod error;
pub mod export;
pub mod material_manager;
pub mod math;
pub mod model;
pub mod project;
pub mod scene_graph;

pub use config::{ExportConfig, PlyFormat};
pub use error::ExportError;
pub use project::Project;
