//! Geometry side files in the Polygon File Format.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{WriteBytesExt, LE};
use glam::{Mat4, Vec3};

use crate::config::PlyFormat;
use crate::error::{ExportError, IoResultExt, Result};
use crate::export::components::Fixed;
use crate::math::axes;
use crate::model::Model;
use crate::scene_graph::Object3D;

/// Triangulated geometry ready to be written, already in the target axis convention.
#[derive(Debug, Clone, PartialEq)]
pub struct PlyMesh {
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub triangles: Vec<[u32; 3]>,
}

impl PlyMesh {
    /// Triangulates a copy of `model` and places it with `world_matrix`.
    pub fn from_model(model: &Model, world_matrix: &Mat4) -> Result<Self> {
        let vertex_count = model.positions.len();
        let triangles = model.triangulate();

        if let Some(&index) = triangles
            .iter()
            .flatten()
            .find(|&&index| index as usize >= vertex_count)
        {
            return Err(ExportError::InvalidGeometry {
                model: model.name.clone(),
                index,
                vertex_count,
            });
        }

        if let Some(normals) = &model.normals {
            if normals.len() != vertex_count {
                return Err(ExportError::MismatchedNormals {
                    model: model.name.clone(),
                    normal_count: normals.len(),
                    vertex_count,
                });
            }
        }

        let positions = model
            .positions
            .iter()
            .map(|p| axes::convert_position(world_matrix.transform_point3(*p)))
            .collect();

        let normal_matrix = world_matrix.inverse().transpose();
        let normals = model.normals.as_ref().map(|normals| {
            normals
                .iter()
                .map(|n| {
                    axes::convert_position(normal_matrix.transform_vector3(*n).normalize_or_zero())
                })
                .collect()
        });

        Ok(Self {
            positions,
            normals,
            triangles,
        })
    }

    pub fn write<W: Write>(&self, w: &mut W, format: PlyFormat) -> io::Result<()> {
        self.write_header(w, format)?;

        match format {
            PlyFormat::Ascii => self.write_ascii_body(w),
            PlyFormat::BinaryLittleEndian => self.write_binary_body(w),
        }
    }

    fn write_header<W: Write>(&self, w: &mut W, format: PlyFormat) -> io::Result<()> {
        writeln!(w, "ply")?;
        writeln!(w, "format {} 1.0", format.header_name())?;
        writeln!(w, "comment Created by scene-exporter")?;
        writeln!(w, "element vertex {}", self.positions.len())?;
        writeln!(w, "property float x")?;
        writeln!(w, "property float y")?;
        writeln!(w, "property float z")?;
        if self.normals.is_some() {
            writeln!(w, "property float nx")?;
            writeln!(w, "property float ny")?;
            writeln!(w, "property float nz")?;
        }
        writeln!(w, "element face {}", self.triangles.len())?;
        writeln!(w, "property list uchar uint vertex_indices")?;
        writeln!(w, "end_header")
    }

    fn write_ascii_body<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (i, p) in self.positions.iter().enumerate() {
            write!(w, "{} {} {}", Fixed(p.x), Fixed(p.y), Fixed(p.z))?;
            if let Some(n) = self.normals.as_ref().map(|normals| normals[i]) {
                write!(w, " {} {} {}", Fixed(n.x), Fixed(n.y), Fixed(n.z))?;
            }
            writeln!(w)?;
        }

        for [a, b, c] in &self.triangles {
            writeln!(w, "3 {a} {b} {c}")?;
        }

        Ok(())
    }

    fn write_binary_body<W: Write>(&self, w: &mut W) -> io::Result<()> {
        for (i, p) in self.positions.iter().enumerate() {
            for value in p.to_array() {
                w.write_f32::<LE>(value)?;
            }
            if let Some(n) = self.normals.as_ref().map(|normals| normals[i]) {
                for value in n.to_array() {
                    w.write_f32::<LE>(value)?;
                }
            }
        }

        for triangle in &self.triangles {
            w.write_u8(3)?;
            for &index in triangle {
                w.write_u32::<LE>(index)?;
            }
        }

        Ok(())
    }
}

/// Writes `<output_dir>/<model name>.ply` with the object's geometry in its local space.
///
/// The object's world matrix is held at identity for the duration of the write and
/// restored afterwards, whether or not the write succeeded.
pub fn write_geometry(
    object: &Object3D,
    model: &Model,
    output_dir: &Path,
    format: PlyFormat,
) -> Result<PathBuf> {
    let path = output_dir.join(format!("{}.ply", model.name));

    let _local_space = object.transform.override_world(Mat4::IDENTITY);
    let world_matrix = *object.transform.get_world_matrix();

    let mesh = PlyMesh::from_model(model, &world_matrix)?;

    let file = File::create(&path).with_path(&path)?;
    let mut writer = BufWriter::new(file);
    mesh.write(&mut writer, format).with_path(&path)?;
    writer.flush().with_path(&path)?;

    log::debug!(
        "Wrote {} ({} vertices, {} triangles)",
        path.display(),
        mesh.positions.len(),
        mesh.triangles.len()
    );

    Ok(path)
}
