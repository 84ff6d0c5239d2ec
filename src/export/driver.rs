use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::{IoResultExt, Result};
use crate::export::walker;
use crate::project::Project;

pub const SCENE_EXTENSION: &str = "scene";

/// Exports `project` next to its source file, or into `config.output_dir`.
///
/// A project that has never been saved has nowhere to export to; that is not an
/// error and nothing is written. Running two exports into the same directory at
/// the same time is not supported.
pub fn run(project: &Project, config: &ExportConfig) -> Result<Option<PathBuf>> {
    let Some(source_path) = project.source_path.as_deref() else {
        log::info!("Project has not been saved yet, nothing to export");
        return Ok(None);
    };

    // Texture paths are resolved against the project directory, which has to be
    // absolute even when the project was opened through a relative path
    let source_path = std::path::absolute(source_path).with_path(source_path)?;

    let output_name = output_name(&source_path);
    let project_dir = project_dir(&source_path);
    let output_dir = config.output_dir.as_deref().unwrap_or(project_dir);

    let scene_path = walker::export_scene(
        &project.scene,
        &project.materials,
        output_dir,
        &output_name,
        Some(project_dir),
        config,
    )?;

    Ok(Some(scene_path))
}

/// File name up to its first dot, with the scene extension: `level.blend.gltf`
/// becomes `level.scene`.
pub fn output_name(source_path: &Path) -> String {
    let file_name = source_path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();

    format!("{stem}.{SCENE_EXTENSION}")
}

pub fn project_dir(source_path: &Path) -> &Path {
    source_path.parent().unwrap_or_else(|| Path::new(""))
}
