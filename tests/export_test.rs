use std::fs;
use std::path::{Path, PathBuf};

use glam::{Mat4, Quat, Vec3};
use scene_exporter::export;
use scene_exporter::material_manager::{Material, MaterialManager};
use scene_exporter::model::Model;
use scene_exporter::scene_graph::{Object3D, ObjectData, ObjectId, ParticleSystem, Scene, SmokeModifier};
use scene_exporter::{ExportConfig, ExportError, PlyFormat, Project};

fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR"))
        .join("scene_exporter")
        .join(name);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cube(name: &str) -> Model {
    let positions = vec![
        Vec3::new(-1.0, -1.0, -1.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(1.0, 1.0, -1.0),
        Vec3::new(-1.0, 1.0, -1.0),
        Vec3::new(-1.0, -1.0, 1.0),
        Vec3::new(1.0, -1.0, 1.0),
        Vec3::new(1.0, 1.0, 1.0),
        Vec3::new(-1.0, 1.0, 1.0),
    ];
    let faces = vec![
        vec![0, 3, 2, 1],
        vec![4, 5, 6, 7],
        vec![0, 1, 5, 4],
        vec![1, 2, 6, 5],
        vec![2, 3, 7, 6],
        vec![3, 0, 4, 7],
    ];
    Model::new(name, positions, faces)
}

struct Fixture {
    scene: Scene,
    materials: MaterialManager,
}

impl Fixture {
    fn new() -> Self {
        Self {
            scene: Scene::new(),
            materials: MaterialManager::new(),
        }
    }

    fn add_mesh_object(&mut self, name: &str, model: Model, translation: Vec3) -> ObjectId {
        let model_id = self.scene.add_model(model);
        let mut object = Object3D::new(name);
        object.data = ObjectData::Mesh(model_id);
        object.transform.set_translation(translation);
        self.scene.add_object(object)
    }

    fn object_mut(&mut self, id: ObjectId) -> &mut Object3D {
        self.scene.get_object_mut(id).unwrap()
    }

    fn export(self, dir: &Path) -> Result<String, ExportError> {
        self.export_with(dir, &ExportConfig::default())
    }

    fn export_with(self, dir: &Path, config: &ExportConfig) -> Result<String, ExportError> {
        let project = Project::new(self.scene, self.materials, dir.join("level.blend"));
        let scene_path = export::run(&project, config)?.expect("saved project exports");
        Ok(fs::read_to_string(scene_path).unwrap())
    }
}

fn parse_vector(line: &str) -> [f32; 3] {
    let values: Vec<f32> = line
        .split_whitespace()
        .skip(1)
        .map(|v| v.parse().unwrap())
        .collect();
    [values[0], values[1], values[2]]
}

/// `(min, max)` of every bounding box block, in record order.
fn bounds_lines(text: &str) -> Vec<([f32; 3], [f32; 3])> {
    let mins = text.lines().filter(|l| l.starts_with("\t\tmin ")).map(parse_vector);
    let maxs = text.lines().filter(|l| l.starts_with("\t\tmax ")).map(parse_vector);
    mins.zip(maxs).collect()
}

#[test]
fn single_cube_end_to_end() {
    let dir = output_dir("single_cube_end_to_end");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Mat"));
    let cube = fixture.add_mesh_object("Cube", cube("CubeMesh"), Vec3::new(1.0, 2.0, 3.0));
    fixture.object_mut(cube).material_slots.push(mat);

    let text = fixture.export(&dir).unwrap();

    assert_eq!(
        text,
        "mesh\n\
         \tpath\tCubeMesh.ply\n\
         \tmaterialName Mat\n\
         \ttransform\n\
         \t\tpos 1.000000 -3.000000 2.000000 \n\
         \t\trotation -0.000000 0.000000 0.000000 -1.000000 \n\
         \t\tscaling 1.000000 1.000000 1.000000\n\
         \tboundingBox\n\
         \t\tmin -1.000000 -1.000000 -1.000000\n\
         \t\tmax 1.000000 1.000000 1.000000\n\
         material\n\
         \tname Mat\n\
         \tbaseColorTexture NONE\n\
         \troughness 0.500000\n\
         \tmetalMask 0\n"
    );

    let ply = fs::read_to_string(dir.join("CubeMesh.ply")).unwrap();
    assert!(ply.starts_with("ply\nformat ascii 1.0\n"));
    assert!(ply.contains("element vertex 8\n"));
    assert!(ply.contains("element face 12\n"));
    assert!(dir.join("level.scene").exists());
}

#[test]
fn mesh_record_has_one_path_and_material_before_transform() {
    let dir = output_dir("mesh_record_shape");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Stone"));
    for i in 0..3 {
        let id = fixture.add_mesh_object(
            &format!("Rock{i}"),
            cube(&format!("Rock{i}")),
            Vec3::splat(i as f32),
        );
        fixture.object_mut(id).material_slots.push(mat);
    }

    let text = fixture.export(&dir).unwrap();

    let records: Vec<&str> = text
        .split("mesh\n")
        .skip(1)
        .map(|record| record.split("\ttransform\n").next().unwrap())
        .collect();
    assert_eq!(records.len(), 3);
    for record in records {
        assert_eq!(record.lines().filter(|l| l.starts_with("\tpath\t")).count(), 1);
        assert_eq!(
            record.lines().filter(|l| l.starts_with("\tmaterialName ")).count(),
            1
        );
    }
}

#[test]
fn hidden_objects_are_not_exported() {
    let build = |hidden: bool| {
        let mut fixture = Fixture::new();
        let mat = fixture.materials.add_material(Material::new("Mat"));
        let shown = fixture.add_mesh_object("Shown", cube("Shown"), Vec3::ZERO);
        let secret = fixture.add_mesh_object("Secret", cube("Secret"), Vec3::X);
        fixture.object_mut(shown).material_slots.push(mat);
        fixture.object_mut(secret).material_slots.push(mat);
        fixture.object_mut(secret).hidden = hidden;
        fixture
    };

    let dir = output_dir("hidden_objects_hidden");
    let text = build(true).export(&dir).unwrap();
    assert!(!text.contains("Secret"));
    assert_eq!(text.matches("mesh\n").count(), 1);
    assert!(!dir.join("Secret.ply").exists());

    let dir = output_dir("hidden_objects_shown");
    let text = build(false).export(&dir).unwrap();
    assert!(text.contains("\tpath\tSecret.ply\n"));
    assert_eq!(text.matches("mesh\n").count(), 2);
}

#[test]
fn missing_material_slot_fails_export() {
    let dir = output_dir("missing_material_slot");
    let mut fixture = Fixture::new();
    fixture.add_mesh_object("Bare", cube("Bare"), Vec3::ZERO);

    let err = fixture.export(&dir).unwrap_err();
    assert!(matches!(err, ExportError::MissingMaterialSlot { ref object } if object == "Bare"));

    let partial = fs::read_to_string(dir.join("level.scene")).unwrap_or_default();
    assert!(!partial.contains("mesh"));
}

#[test]
fn particles_win_over_smoke() {
    let dir = output_dir("particles_win_over_smoke");
    let mut fixture = Fixture::new();
    let sparks = fixture
        .materials
        .add_material(Material::new("Sparks").with_base_color_texture("//tex/spark.png"));
    let id = fixture.add_mesh_object("Emitter", cube("EmitterMesh"), Vec3::ZERO);
    let emitter = fixture.object_mut(id);
    emitter.material_slots.push(sparks);
    emitter.particle_systems.push(ParticleSystem {
        count: 500,
        lifetime: 50.0,
    });
    emitter.smoke = Some(SmokeModifier { density: Some(1.0) });

    let text = fixture.export(&dir).unwrap();

    assert!(text.starts_with("particles\n\tcount 500\n\tlifetime 50.000000\n"));
    let texture_line = format!("\ttextureFile {}\n", dir.join("tex").join("spark.png").display());
    assert!(text.contains(&texture_line));
    assert!(!text.contains("smoke\n"));
    assert!(!text.contains("\tpath\t"));
    assert!(text.contains("\tbaseColorTexture tex/spark.png\n"));
    // Particle and smoke objects get no geometry file
    assert!(!dir.join("EmitterMesh.ply").exists());
}

#[test]
fn smoke_record_and_missing_domain() {
    let dir = output_dir("smoke_record");
    let mut fixture = Fixture::new();
    let id = fixture.add_mesh_object("Fog", cube("FogMesh"), Vec3::ZERO);
    fixture.object_mut(id).smoke = Some(SmokeModifier { density: Some(0.25) });

    let text = fixture.export(&dir).unwrap();
    assert!(text.starts_with("smoke\n\tdensity 0.250000\n\ttransform\n"));

    let dir = output_dir("smoke_missing_domain");
    let mut fixture = Fixture::new();
    let id = fixture.add_mesh_object("Flow", cube("FlowMesh"), Vec3::ZERO);
    fixture.object_mut(id).smoke = Some(SmokeModifier::default());

    let err = fixture.export(&dir).unwrap_err();
    assert!(matches!(err, ExportError::MissingModifier { ref object } if object == "Flow"));
}

#[test]
fn non_mesh_objects_are_skipped() {
    let dir = output_dir("non_mesh_objects");
    let mut fixture = Fixture::new();
    for (name, data) in [
        ("Camera", ObjectData::Camera),
        ("Sun", ObjectData::Light),
        ("Empty", ObjectData::Empty),
    ] {
        let mut object = Object3D::new(name);
        object.data = data;
        fixture.scene.add_object(object);
    }
    fixture.materials.add_material(Material::new("Mat"));

    let text = fixture.export(&dir).unwrap();
    assert!(text.starts_with("material\n"));
}

#[test]
fn bounding_boxes_are_ordered() {
    let dir = output_dir("bounding_boxes_are_ordered");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Mat"));
    for i in 0..4 {
        let mut model = cube(&format!("Box{i}"));
        for p in &mut model.positions {
            *p *= Vec3::new(1.0 + i as f32, 0.5, 2.0 - i as f32 * 0.3);
        }
        model = Model::new(model.name.clone(), model.positions, model.faces);
        let id = fixture.add_mesh_object(&format!("Box{i}"), model, Vec3::ZERO);
        fixture.object_mut(id).material_slots.push(mat);
    }

    let text = fixture.export(&dir).unwrap();

    let bounds = bounds_lines(&text);
    assert_eq!(bounds.len(), 4);
    for (min, max) in bounds {
        for axis in 0..3 {
            assert!(min[axis] <= max[axis], "{min:?} > {max:?}");
        }
    }
}

#[test]
fn world_transform_is_restored_after_failed_geometry_write() {
    let dir = output_dir("transform_restored");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Mat"));
    let mut broken = cube("Broken");
    broken.faces.push(vec![0, 1, 42]);
    let id = fixture.add_mesh_object("Broken", broken, Vec3::new(4.0, 5.0, 6.0));
    fixture.object_mut(id).material_slots.push(mat);

    let project = Project::new(fixture.scene, fixture.materials, dir.join("level.blend"));
    let err = export::run(&project, &ExportConfig::default()).unwrap_err();
    assert!(matches!(err, ExportError::InvalidGeometry { index: 42, .. }));

    let object = project.scene.get_object(id).unwrap();
    assert_eq!(
        *object.transform.get_world_matrix(),
        Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0))
    );
}

#[test]
fn unwritable_geometry_path_is_an_io_error() {
    let dir = output_dir("unwritable_geometry");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Mat"));
    let id = fixture.add_mesh_object("Cube", cube("missing_dir/Cube"), Vec3::X);
    fixture.object_mut(id).material_slots.push(mat);

    let project = Project::new(fixture.scene, fixture.materials, dir.join("level.blend"));
    let err = export::run(&project, &ExportConfig::default()).unwrap_err();
    assert!(matches!(err, ExportError::Io { ref path, .. } if path.ends_with("Cube.ply")));

    let object = project.scene.get_object(id).unwrap();
    assert_eq!(*object.transform.get_world_matrix(), Mat4::from_translation(Vec3::X));
}

#[test]
fn child_objects_export_world_position() {
    let dir = output_dir("child_world_position");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Mat"));

    let parent = fixture.scene.add_object(Object3D::new("Root"));
    fixture.scene.set_object_transform(
        parent,
        Vec3::new(10.0, 0.0, 0.0),
        Quat::IDENTITY,
        Vec3::ONE,
    );
    let child = fixture.add_mesh_object("Child", cube("Child"), Vec3::new(0.0, 0.0, 1.0));
    fixture.object_mut(child).material_slots.push(mat);
    fixture.scene.set_object_parent(child, Some(parent));

    let text = fixture.export(&dir).unwrap();
    assert!(text.contains("\t\tpos 10.000000 -1.000000 0.000000 \n"));
}

#[test]
fn binary_geometry_when_configured() {
    let dir = output_dir("binary_geometry");
    let mut fixture = Fixture::new();
    let mat = fixture.materials.add_material(Material::new("Mat"));
    let id = fixture.add_mesh_object("Cube", cube("Cube"), Vec3::ZERO);
    fixture.object_mut(id).material_slots.push(mat);

    let config = ExportConfig {
        ply_format: PlyFormat::BinaryLittleEndian,
        output_dir: None,
    };
    fixture.export_with(&dir, &config).unwrap();

    let bytes = fs::read(dir.join("Cube.ply")).unwrap();
    assert!(bytes.starts_with(b"ply\nformat binary_little_endian 1.0\n"));
}

#[test]
fn unsaved_project_writes_nothing() {
    let mut fixture = Fixture::new();
    fixture.add_mesh_object("Cube", cube("Cube"), Vec3::ZERO);

    let project = Project::unsaved(fixture.scene, fixture.materials);
    assert!(export::run(&project, &ExportConfig::default())
        .unwrap()
        .is_none());
}

#[test]
fn gltf_project_round_trip() {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/level.gltf");
    let project = Project::load(&source).unwrap();

    assert_eq!(project.materials.len(), 2);
    let camera = project.scene.get_object_by_name("Camera").unwrap();
    assert_eq!(
        project.scene.get_object(camera).unwrap().data,
        ObjectData::Camera
    );

    let dir = output_dir("gltf_project_round_trip");
    let config = ExportConfig {
        output_dir: Some(dir.clone()),
        ..Default::default()
    };
    let scene_path = export::run(&project, &config).unwrap().unwrap();
    assert_eq!(scene_path, dir.join("level.scene"));

    let text = fs::read_to_string(&scene_path).unwrap();
    let headers: Vec<&str> = text
        .lines()
        .filter(|l| !l.starts_with('\t'))
        .collect();
    assert_eq!(headers, ["mesh", "particles", "smoke", "material", "material"]);

    assert!(text.starts_with(
        "mesh\n\tpath\tTri.ply\n\tmaterialName Mat\n\ttransform\n\t\tpos 1.000000 -3.000000 2.000000 \n"
    ));
    assert_eq!(bounds_lines(&text)[0], ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0]));

    let fixtures_dir = source.parent().unwrap();
    let texture_line = format!(
        "\ttextureFile {}\n",
        fixtures_dir.join("textures").join("mat.png").display()
    );
    assert!(text.contains(&texture_line));
    assert!(text.contains("\tname Mat\n\tbaseColorTexture textures/mat.png\n"));
    assert!(text.contains("\tname Unused\n\tbaseColorTexture NONE\n"));
    assert!(text.contains("\tdensity 0.250000\n"));

    let ply = fs::read_to_string(dir.join("Tri.ply")).unwrap();
    assert!(ply.contains("element vertex 3\n"));
    assert!(ply.contains("element face 1\n"));
}

#[test]
fn relative_project_path_resolves_textures_absolutely() {
    let dir = output_dir("relative_project_path");
    let cwd = std::env::current_dir().unwrap();
    let mut fixture = Fixture::new();
    let sparks = fixture
        .materials
        .add_material(Material::new("Sparks").with_base_color_texture("//tex/spark.png"));
    let inside = cwd.join("textures").join("rock.png");
    fixture.materials.add_material(
        Material::new("Rock").with_base_color_texture(inside.to_string_lossy()),
    );
    let id = fixture.add_mesh_object("Emitter", cube("EmitterMesh"), Vec3::ZERO);
    let emitter = fixture.object_mut(id);
    emitter.material_slots.push(sparks);
    emitter.particle_systems.push(ParticleSystem {
        count: 8,
        lifetime: 1.0,
    });

    let project = Project::new(fixture.scene, fixture.materials, "level.gltf");
    let config = ExportConfig {
        output_dir: Some(dir.clone()),
        ..Default::default()
    };
    let scene_path = export::run(&project, &config).unwrap().unwrap();
    assert_eq!(scene_path, dir.join("level.scene"));

    let text = fs::read_to_string(scene_path).unwrap();
    let texture_file = text
        .lines()
        .find_map(|line| line.strip_prefix("\ttextureFile "))
        .unwrap();
    assert!(Path::new(texture_file).is_absolute(), "{texture_file}");
    assert_eq!(Path::new(texture_file), cwd.join("tex").join("spark.png"));

    let relative = Path::new("textures").join("rock.png");
    assert!(text.contains(&format!("\tbaseColorTexture {}\n", relative.display())));
}

#[test]
fn meshes_sharing_a_name_get_separate_geometry_files() {
    let source = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/twins.gltf");
    let project = Project::load(&source).unwrap();

    let dir = output_dir("meshes_sharing_a_name");
    let config = ExportConfig {
        output_dir: Some(dir.clone()),
        ..Default::default()
    };
    let scene_path = export::run(&project, &config).unwrap().unwrap();
    let text = fs::read_to_string(scene_path).unwrap();

    let paths: Vec<&str> = text
        .lines()
        .filter_map(|line| line.strip_prefix("\tpath\t"))
        .collect();
    assert_eq!(paths, ["Tri.ply", "Tri.001.ply"]);
    assert!(dir.join("Tri.ply").exists());
    assert!(dir.join("Tri.001.ply").exists());
}
