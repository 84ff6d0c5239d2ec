use id_arena::Id;
use serde::Deserialize;

use crate::material_manager::MaterialId;
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// What kind of data an object carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectData {
    #[default]
    Empty,
    Mesh(SceneModelId),
    Camera,
    Light,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParticleSystem {
    pub count: u32,
    pub lifetime: f32,
}

/// Smoke simulation modifier. Only domain modifiers carry a density; flow
/// modifiers leave it unset.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SmokeModifier {
    #[serde(default)]
    pub density: Option<f32>,
}

pub struct Object3D {
    pub name: String,
    pub hidden: bool,
    pub transform: Transform,
    pub data: ObjectData,
    pub material_slots: Vec<MaterialId>,
    pub particle_systems: Vec<ParticleSystem>,
    pub smoke: Option<SmokeModifier>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            hidden: false,
            transform: Transform::default(),
            data: ObjectData::Empty,
            material_slots: Vec::new(),
            particle_systems: Vec::new(),
            smoke: None,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
