use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use scene_exporter::{export, ExportConfig, PlyFormat, Project};

/// Exports a project's scene as a `.scene` file with `.ply` geometry
#[derive(Parser)]
#[clap(name = "scene-exporter", about)]
struct Args {
    /// Project file to export (`.gltf` or `.glb`)
    project: PathBuf,

    #[clap(
        long,
        short = 'o',
        help = "Writes the scene and geometry files here instead of next to the project"
    )]
    output_dir: Option<PathBuf>,

    #[clap(long, help = "Writes geometry as binary little-endian PLY instead of ASCII")]
    binary: bool,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();

    let config = ExportConfig {
        ply_format: if args.binary {
            PlyFormat::BinaryLittleEndian
        } else {
            PlyFormat::Ascii
        },
        output_dir: args.output_dir,
    };

    let project = Project::load(&args.project)?;

    match export::run(&project, &config).context("Scene export failed")? {
        Some(scene_path) => log::info!("Wrote {}", scene_path.display()),
        None => log::warn!("Nothing exported"),
    }

    Ok(())
}
