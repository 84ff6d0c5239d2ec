//! Writing a scene out as a `.scene` file with `.ply` geometry next to it.

pub mod catalog;
pub mod components;
pub mod driver;
pub mod ply;
pub mod walker;

pub use catalog::write_materials;
pub use driver::run;
pub use ply::write_geometry;
pub use walker::export_scene;
