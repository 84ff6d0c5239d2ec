//! Fixed-template text blocks that make up an object record.
//!
//! Every writer here only formats; anything that can be missing is resolved by the
//! helpers at the bottom before a block is started, so a failing object never
//! leaves half a block behind.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::error::{ExportError, Result};
use crate::material_manager::{Material, MaterialManager};
use crate::math::{axes, bounds::AABB};
use crate::scene_graph::{Object3D, ParticleSystem};

/// Fixed-point float with six fractional digits and exact integer digits, the way
/// `%f` prints it. Negative zero keeps its sign.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub f32);

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

pub fn write_transform<W: Write>(w: &mut W, world_matrix: &Mat4) -> io::Result<()> {
    let (scale, rotation, translation) = axes::decompose(world_matrix);

    let pos = axes::convert_position(translation);
    let rot = axes::convert_rotation(rotation);
    let scaling = axes::convert_scale(scale);

    writeln!(w, "\ttransform")?;
    writeln!(
        w,
        "\t\tpos {} {} {} ",
        Fixed(pos.x),
        Fixed(pos.y),
        Fixed(pos.z)
    )?;
    writeln!(
        w,
        "\t\trotation {} {} {} {} ",
        Fixed(rot.x),
        Fixed(rot.y),
        Fixed(rot.z),
        Fixed(rot.w)
    )?;
    writeln!(
        w,
        "\t\tscaling {} {} {}",
        Fixed(scaling.x),
        Fixed(scaling.y),
        Fixed(scaling.z)
    )
}

/// Folds the converted corners of the object-local box. An empty box contributes
/// no corners.
pub fn converted_bounds(local_bounds: &AABB) -> AABB {
    if local_bounds.is_empty() {
        return AABB::EMPTY;
    }

    AABB::from_points(local_bounds.corners().map(axes::convert_position))
}

pub fn write_bounding_box<W: Write>(w: &mut W, local_bounds: &AABB) -> io::Result<()> {
    let AABB { min, max } = converted_bounds(local_bounds);

    writeln!(w, "\tboundingBox")?;
    writeln!(w, "\t\tmin {}", vector(min))?;
    writeln!(w, "\t\tmax {}", vector(max))
}

pub fn write_particles<W: Write>(
    w: &mut W,
    particle_system: &ParticleSystem,
    texture_file: Option<&Path>,
) -> io::Result<()> {
    writeln!(w, "\tcount {}", particle_system.count)?;
    writeln!(w, "\tlifetime {}", Fixed(particle_system.lifetime))?;

    if let Some(texture_file) = texture_file {
        writeln!(w, "\ttextureFile {}", texture_file.display())?;
    }

    Ok(())
}

pub fn write_smoke<W: Write>(w: &mut W, density: f32) -> io::Result<()> {
    writeln!(w, "\tdensity {}", Fixed(density))
}

pub fn write_mesh<W: Write>(w: &mut W, geometry_name: &str, material_name: &str) -> io::Result<()> {
    writeln!(w, "\tpath\t{}.ply", geometry_name)?;
    writeln!(w, "\tmaterialName {}", material_name)
}

fn vector(v: Vec3) -> String {
    format!("{} {} {}", Fixed(v.x), Fixed(v.y), Fixed(v.z))
}

/// Material in the object's first slot.
pub fn first_material<'a>(
    object: &Object3D,
    materials: &'a MaterialManager,
) -> Result<&'a Material> {
    object
        .material_slots
        .first()
        .and_then(|id| materials.get(*id))
        .ok_or_else(|| ExportError::MissingMaterialSlot {
            object: object.name.clone(),
        })
}

pub fn smoke_density(object: &Object3D) -> Result<f32> {
    object
        .smoke
        .as_ref()
        .and_then(|smoke| smoke.density)
        .ok_or_else(|| ExportError::MissingModifier {
            object: object.name.clone(),
        })
}
