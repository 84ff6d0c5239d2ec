//! The material catalog that closes every scene file.

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use crate::export::components::Fixed;
use crate::material_manager::Material;

/// Marker the authoring tool puts in front of paths relative to the project file.
pub const PROJECT_RELATIVE_MARKER: &str = "//";

pub fn write_materials<'a, W: Write>(
    w: &mut W,
    materials: impl IntoIterator<Item = &'a Material>,
    project_dir: Option<&Path>,
) -> io::Result<()> {
    for material in materials {
        writeln!(w, "material")?;
        writeln!(w, "\tname {}", material.name)?;

        match &material.base_color_texture {
            Some(path) => writeln!(w, "\tbaseColorTexture {}", project_relative(path, project_dir))?,
            None => writeln!(w, "\tbaseColorTexture NONE")?,
        }

        writeln!(w, "\troughness {}", Fixed(Material::ROUGHNESS))?;
        writeln!(w, "\tmetalMask {}", Material::METAL_MASK)?;
    }

    Ok(())
}

/// Rewrites a texture path relative to the project directory where possible.
///
/// A leading `//` marker is dropped. An absolute path inside `project_dir` loses that
/// prefix. Anything else comes back unchanged.
pub fn project_relative(path: &str, project_dir: Option<&Path>) -> String {
    if let Some(stripped) = path.strip_prefix(PROJECT_RELATIVE_MARKER) {
        return stripped.to_string();
    }

    if let Some(project_dir) = project_dir {
        if let Ok(relative) = Path::new(path).strip_prefix(project_dir) {
            return relative.to_string_lossy().into_owned();
        }
    }

    path.to_string()
}

/// Resolves a texture path the way the authoring tool would open it: marked and
/// relative paths are taken from the project directory.
pub fn resolve_absolute(path: &str, project_dir: Option<&Path>) -> PathBuf {
    let relative = path.strip_prefix(PROJECT_RELATIVE_MARKER).unwrap_or(path);
    let relative = Path::new(relative);

    let joined = match project_dir {
        Some(project_dir) if relative.is_relative() => project_dir.join(relative),
        _ => relative.to_path_buf(),
    };

    normalize(&joined)
}

/// Lexically folds `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }

    normalized
}
