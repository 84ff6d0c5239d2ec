//! Turns every exportable object of a scene into a record of the scene file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::config::ExportConfig;
use crate::error::{ExportError, IoResultExt, Result};
use crate::export::{catalog, components, ply};
use crate::material_manager::MaterialManager;
use crate::model::Model;
use crate::scene_graph::{Object3D, ObjectData, Scene};

/// Record type of an exported object, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectClass {
    Particles,
    Smoke,
    Mesh,
}

impl ObjectClass {
    pub fn classify(object: &Object3D) -> ObjectClass {
        if !object.particle_systems.is_empty() {
            ObjectClass::Particles
        } else if object.smoke.is_some() {
            ObjectClass::Smoke
        } else {
            ObjectClass::Mesh
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            ObjectClass::Particles => "particles",
            ObjectClass::Smoke => "smoke",
            ObjectClass::Mesh => "mesh",
        }
    }
}

/// Destination of one export: the scene stream plus where side files go.
pub struct ExportTarget<'a, W: Write> {
    pub writer: &'a mut W,
    /// Path of the scene file, used to attribute stream errors.
    pub scene_path: &'a Path,
    pub output_dir: &'a Path,
    pub project_dir: Option<&'a Path>,
}

/// Creates `<output_dir>/<output_name>` and writes all object records followed by the
/// material catalog into it.
pub fn export_scene(
    scene: &Scene,
    materials: &MaterialManager,
    output_dir: &Path,
    output_name: &str,
    project_dir: Option<&Path>,
    config: &ExportConfig,
) -> Result<PathBuf> {
    let scene_path = output_dir.join(output_name);
    log::info!("Exporting scene to {}", scene_path.display());

    let file = File::create(&scene_path).with_path(&scene_path)?;
    let mut writer = BufWriter::new(file);

    let mut target = ExportTarget {
        writer: &mut writer,
        scene_path: &scene_path,
        output_dir,
        project_dir,
    };

    let records = write_objects(&mut target, scene, materials, config)?;
    catalog::write_materials(target.writer, materials.materials(), project_dir)
        .with_path(&scene_path)?;

    writer.flush().with_path(&scene_path)?;

    log::info!(
        "Exported {} objects and {} materials",
        records,
        materials.len()
    );

    Ok(scene_path)
}

/// Writes one record per visible mesh object, in scene order. Returns the number of
/// records written.
pub fn write_objects<W: Write>(
    target: &mut ExportTarget<'_, W>,
    scene: &Scene,
    materials: &MaterialManager,
    config: &ExportConfig,
) -> Result<usize> {
    scene.update_transforms();

    let mut records = 0;

    for (_, object) in scene.objects() {
        if object.hidden {
            log::debug!("Skipping hidden object {}", object.name);
            continue;
        }

        let ObjectData::Mesh(model_id) = object.data else {
            log::debug!("Skipping {} ({:?})", object.name, object.data);
            continue;
        };

        let model = scene
            .get_model(model_id)
            .ok_or_else(|| ExportError::MissingGeometry {
                object: object.name.clone(),
            })?;

        write_record(target, object, model, materials, config)?;
        records += 1;
    }

    Ok(records)
}

fn write_record<W: Write>(
    target: &mut ExportTarget<'_, W>,
    object: &Object3D,
    model: &Model,
    materials: &MaterialManager,
    config: &ExportConfig,
) -> Result<()> {
    let class = ObjectClass::classify(object);
    let scene_path = target.scene_path;
    let w = &mut *target.writer;

    match class {
        ObjectClass::Particles => {
            let particle_system = &object.particle_systems[0];
            let texture_file = object
                .material_slots
                .first()
                .and_then(|id| materials.get(*id))
                .and_then(|material| material.base_color_texture.as_deref())
                .map(|path| catalog::resolve_absolute(path, target.project_dir));

            writeln!(w, "{}", class.header()).with_path(scene_path)?;
            components::write_particles(w, particle_system, texture_file.as_deref())
                .with_path(scene_path)?;
        }
        ObjectClass::Smoke => {
            let density = components::smoke_density(object)?;

            writeln!(w, "{}", class.header()).with_path(scene_path)?;
            components::write_smoke(w, density).with_path(scene_path)?;
        }
        ObjectClass::Mesh => {
            let material = components::first_material(object, materials)?;

            writeln!(w, "{}", class.header()).with_path(scene_path)?;
            components::write_mesh(w, &model.name, &material.name).with_path(scene_path)?;

            ply::write_geometry(object, model, target.output_dir, config.ply_format)?;
        }
    }

    components::write_transform(w, &object.transform.get_world_matrix()).with_path(scene_path)?;
    components::write_bounding_box(w, &model.bounding_box).with_path(scene_path)?;

    Ok(())
}
