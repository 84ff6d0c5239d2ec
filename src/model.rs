use anyhow::bail;
use glam::Vec3;
use gltf::buffer;
use itertools::Itertools;

use crate::math::{axes, bounds::AABB};
use crate::material_manager::{MaterialId, MaterialManager};

pub type Buffers<'a> = &'a [buffer::Data];

/// Polygon geometry of a single mesh data block.
///
/// Faces keep whatever arity the source had; [`Model::triangulate`] splits them
/// for writers that only understand triangles.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    pub positions: Vec<Vec3>,
    pub normals: Option<Vec<Vec3>>,
    pub faces: Vec<Vec<u32>>,
    pub bounding_box: AABB,
    /// Materials in primitive order, without repeats.
    pub materials: Vec<MaterialId>,
}

impl Model {
    pub fn new(name: impl Into<String>, positions: Vec<Vec3>, faces: Vec<Vec<u32>>) -> Self {
        let bounding_box = AABB::from_points(positions.iter().copied());

        Self {
            name: name.into(),
            positions,
            normals: None,
            faces,
            bounding_box,
            materials: Vec::new(),
        }
    }

    pub fn from_gltf(
        material_manager: &MaterialManager,
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> anyhow::Result<Model> {
        let mut model = Model {
            name: name.into(),
            ..Default::default()
        };
        let mut normals = Vec::new();
        let mut all_have_normals = true;

        for primitive in mesh.primitives() {
            let mode = primitive.mode();
            if matches!(
                mode,
                gltf::mesh::Mode::Points | gltf::mesh::Mode::Lines | gltf::mesh::Mode::LineLoop
                    | gltf::mesh::Mode::LineStrip
            ) {
                log::warn!(
                    "Skipping primitive {} of {}: unsupported mode {:?}",
                    primitive.index(),
                    model.name,
                    mode
                );
                continue;
            }

            let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));

            let Some(position_reader) = reader.read_positions() else {
                bail!(
                    "Primitive {} of {} has no positions",
                    primitive.index(),
                    model.name
                );
            };

            let vertex_offset = model.positions.len() as u32;
            model
                .positions
                .extend(position_reader.map(|p| axes::position_from_gltf(Vec3::from(p))));
            let vertex_count = model.positions.len() as u32 - vertex_offset;

            match reader.read_normals() {
                Some(normal_reader) if all_have_normals => {
                    normals.extend(normal_reader.map(|n| axes::position_from_gltf(Vec3::from(n))))
                }
                _ => all_have_normals = false,
            }

            let indices = match reader.read_indices() {
                Some(index_reader) => index_reader.into_u32().collect::<Vec<u32>>(),
                None => (0..vertex_count).collect(),
            };

            let faces = faces_from_primitive(mode, &indices)
                .into_iter()
                .map(|face| face.into_iter().map(|index| index + vertex_offset).collect());
            model.faces.extend(faces);

            if let Some(material_index) = primitive.material().index() {
                if let Some(material_id) = material_manager.get_gltf_material(material_index) {
                    if !model.materials.contains(&material_id) {
                        model.materials.push(material_id);
                    }
                }
            }
        }

        if all_have_normals && normals.len() == model.positions.len() {
            model.normals = Some(normals);
        }

        model.bounding_box = AABB::from_points(model.positions.iter().copied());

        Ok(model)
    }

    /// Fan-triangulates every face. Faces with fewer than three corners are dropped.
    pub fn triangulate(&self) -> Vec<[u32; 3]> {
        self.faces
            .iter()
            .filter(|face| face.len() >= 3)
            .flat_map(|face| {
                let first = face[0];
                face[1..]
                    .iter()
                    .tuple_windows()
                    .map(move |(&b, &c)| [first, b, c])
            })
            .collect()
    }
}

fn faces_from_primitive(mode: gltf::mesh::Mode, indices: &[u32]) -> Vec<Vec<u32>> {
    match mode {
        gltf::mesh::Mode::Triangles => indices.chunks_exact(3).map(<[u32]>::to_vec).collect(),
        // A fan is already a polygon in fan order
        gltf::mesh::Mode::TriangleFan if indices.len() >= 3 => vec![indices.to_vec()],
        gltf::mesh::Mode::TriangleStrip => indices
            .windows(3)
            .enumerate()
            .map(|(i, window)| {
                if i % 2 == 0 {
                    vec![window[0], window[1], window[2]]
                } else {
                    vec![window[1], window[0], window[2]]
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}
