use std::path::PathBuf;

/// Encoding of the geometry side files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlyFormat {
    #[default]
    Ascii,
    BinaryLittleEndian,
}

impl PlyFormat {
    pub fn header_name(self) -> &'static str {
        match self {
            PlyFormat::Ascii => "ascii",
            PlyFormat::BinaryLittleEndian => "binary_little_endian",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportConfig {
    pub ply_format: PlyFormat,
    /// Where to put the scene and geometry files. Defaults to the project's directory.
    pub output_dir: Option<PathBuf>,
}
