use std::collections::HashMap;

use id_arena::{Arena, Id};

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    /// File path of the base color image, as the project refers to it.
    pub base_color_texture: Option<String>,
}

impl Material {
    // No reflectance model is read from the project, so these are fixed.
    pub const ROUGHNESS: f32 = 0.5;
    pub const METAL_MASK: u32 = 0;

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color_texture: None,
        }
    }

    pub fn with_base_color_texture(mut self, path: impl Into<String>) -> Self {
        self.base_color_texture = Some(path.into());
        self
    }
}

pub type MaterialId = Id<Material>;

pub struct MaterialManager {
    materials: Arena<Material>,
    materials_by_gltf: HashMap<usize, MaterialId>,
}

impl MaterialManager {
    pub fn new() -> Self {
        Self {
            materials: Arena::new(),
            materials_by_gltf: HashMap::new(),
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.alloc(material)
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id)
    }

    pub fn get_gltf_material(&self, gltf_index: usize) -> Option<MaterialId> {
        self.materials_by_gltf.get(&gltf_index).copied()
    }

    pub fn load_all_materials_from_gltf(&mut self, document: &gltf::Document) {
        for material in document.materials() {
            let Some(gltf_index) = material.index() else {
                continue;
            };

            if self.materials_by_gltf.contains_key(&gltf_index) {
                continue;
            }

            let material_name = material.name().unwrap_or("Unnamed material");

            let base_color_texture = material
                .pbr_metallic_roughness()
                .base_color_texture()
                .and_then(|info| match info.texture().source().source() {
                    gltf::image::Source::Uri { uri, .. } => Some(decode_uri(uri)),
                    // Embedded images have no file to point at
                    gltf::image::Source::View { .. } => None,
                });

            let id = self.add_material(Material {
                name: material_name.to_string(),
                base_color_texture,
            });
            self.materials_by_gltf.insert(gltf_index, id);
        }

        log::debug!("Loaded {} materials", self.materials.len());
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter().map(|(_, material)| material)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.len() == 0
    }
}

impl Default for MaterialManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Image URIs are percent-encoded; the catalog wants the file path.
fn decode_uri(uri: &str) -> String {
    match urlencoding::decode(uri) {
        Ok(path) => path.into_owned(),
        Err(err) => {
            log::warn!("Keeping undecodable image URI {}: {}", uri, err);
            uri.to_string()
        }
    }
}
