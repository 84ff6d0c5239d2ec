use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use serde::Deserialize;
use std::collections::HashMap;

use crate::material_manager::MaterialManager;
use crate::math::axes;
use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{Object3D, ObjectData, ObjectId, ParticleSystem, SmokeModifier};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};

/// Custom object properties the authoring tool stores in a node's `extras`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NodeExtras {
    hidden: bool,
    particle_systems: Vec<ParticleSystem>,
    smoke: Option<SmokeModifier>,
}

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    /// All objects in insertion order, regardless of hierarchy.
    pub fn objects(&self) -> impl Iterator<Item = (ObjectId, &Object3D)> {
        self.objects.iter()
    }

    /// Adds a model, renaming it with a `.001`-style suffix if another model already
    /// has its name. Geometry files are named after models, so names must be unique.
    pub fn add_model(&mut self, mut model: Model) -> SceneModelId {
        let unique_name = self.unique_model_name(&model.name);
        if unique_name != model.name {
            log::debug!("Renaming model {} to {}", model.name, unique_name);
            model.name = unique_name;
        }

        self.models.alloc(SceneModel::new(model))
    }

    fn unique_model_name(&self, name: &str) -> String {
        let taken = |candidate: &str| {
            self.models
                .iter()
                .any(|(_, scene_model)| scene_model.model.name == candidate)
        };

        if !taken(name) {
            return name.to_string();
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{name}.{suffix:03}");
            if !taken(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    pub fn get_model(&self, id: SceneModelId) -> Option<&Model> {
        self.models.get(id).map(|scene_model| &scene_model.model)
    }

    pub fn spawn_gltf_scene(
        &mut self,
        material_manager: &MaterialManager,
        buffers: Buffers,
        scene: &gltf::Scene,
    ) -> anyhow::Result<()> {
        for node in scene.nodes() {
            self.spawn_gltf_node(material_manager, buffers, &node, None)?;
        }

        self.update_transforms();

        Ok(())
    }

    fn spawn_gltf_node(
        &mut self,
        material_manager: &MaterialManager,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
    ) -> anyhow::Result<ObjectId> {
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        let mut object = Object3D::new(node_name.clone());

        let (translation, rotation, scale) = node.transform().decomposed();
        object.transform.set_transform(
            axes::position_from_gltf(translation.into()),
            axes::rotation_from_gltf(Quat::from_array(rotation)),
            axes::scale_from_gltf(scale.into()),
        );

        let extras = parse_extras(node);
        object.hidden = extras.hidden;
        object.particle_systems = extras.particle_systems;
        object.smoke = extras.smoke;

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{}_mesh", node_name));

                    let model = Model::from_gltf(material_manager, mesh_name, mesh, buffers)?;
                    let model_id = self.add_model(model);
                    self.gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            if let Some(model) = self.get_model(model_id) {
                object.material_slots = model.materials.clone();
            }
            object.data = ObjectData::Mesh(model_id);
        } else if node.camera().is_some() {
            object.data = ObjectData::Camera;
        } else if node.light().is_some() {
            object.data = ObjectData::Light;
        }

        let object_id = self.add_object(object);

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(material_manager, buffers, &child, Some(object_id))?;
        }

        Ok(object_id)
    }

    /// Updates all object transforms in hierarchical order
    pub fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY, false);
        }
    }

    fn update_object_transform_recursive(
        &self,
        object_id: ObjectId,
        parent_world_matrix: Mat4,
        parent_changed: bool,
    ) {
        if let Some(object) = self.objects.get(object_id) {
            let changed = parent_changed || object.transform.is_world_dirty();
            if changed {
                let local_matrix = *object.transform.get_local_matrix();
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix, changed);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    /// Sets the parent of an object and updates child relationships
    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_extras(node: &gltf::Node) -> NodeExtras {
    let Some(raw) = node.extras() else {
        return NodeExtras::default();
    };

    serde_json::from_str(raw.get()).unwrap_or_else(|err| {
        log::warn!(
            "Ignoring malformed extras on node {}: {}",
            node.name().unwrap_or("Unnamed"),
            err
        );
        NodeExtras::default()
    })
}
