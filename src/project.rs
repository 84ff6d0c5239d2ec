use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::material_manager::MaterialManager;
use crate::scene_graph::Scene;

/// An opened project: the active scene, every material in the file, and where the
/// file lives on disk.
pub struct Project {
    pub scene: Scene,
    pub materials: MaterialManager,
    /// `None` for a project that has never been saved.
    pub source_path: Option<PathBuf>,
}

impl Project {
    pub fn new(scene: Scene, materials: MaterialManager, source_path: impl Into<PathBuf>) -> Self {
        Self {
            scene,
            materials,
            source_path: Some(source_path.into()),
        }
    }

    pub fn unsaved(scene: Scene, materials: MaterialManager) -> Self {
        Self {
            scene,
            materials,
            source_path: None,
        }
    }

    /// Opens a glTF project and spawns its default scene (or the first one).
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();

        // Only buffers are needed; images are referenced by path, never decoded
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)
            .with_context(|| format!("Failed to open project {}", path.display()))?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)
            .with_context(|| format!("Failed to read buffers of {}", path.display()))?;

        let mut materials = MaterialManager::new();
        materials.load_all_materials_from_gltf(&document);

        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .context("No scenes in gltf")?;

        let mut scene = Scene::new();
        scene
            .spawn_gltf_scene(&materials, &buffers, &gltf_scene)
            .with_context(|| format!("Failed to load scene from {}", path.display()))?;

        log::info!(
            "Loaded {} with {} objects, {} models and {} materials",
            path.display(),
            scene.objects.len(),
            scene.models.len(),
            materials.len()
        );

        Ok(Self::new(scene, materials, path))
    }
}
