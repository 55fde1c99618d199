use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for converting a Suite export to COCO format.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Root of the Suite export (contains project.json, meta/ and labels/)
    #[arg(short = 'd', long = "export_dir")]
    pub export_dir: String,

    /// Output COCO JSON file [default: <export_dir>/coco.json]
    #[arg(short = 'o', long = "output")]
    pub output: Option<String>,

    /// Segmentation written for single polygons; multi-polygons always use RLE
    #[arg(long = "segmentation", value_enum, default_value = "polygon")]
    pub segmentation: SegmentationMode,

    /// Encoding of RLE counts
    #[arg(long = "rle_format", value_enum, default_value = "uncompressed")]
    pub rle_format: RleFormat,

    /// Pretty-print the output JSON
    #[arg(long = "pretty")]
    pub pretty: bool,
}

impl Args {
    /// Conversion options selected on the command line
    pub fn to_convert_config(&self) -> ConvertConfig {
        ConvertConfig {
            segmentation_mode: self.segmentation,
            rle_format: self.rle_format,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => PathBuf::from(output),
            None => PathBuf::from(&self.export_dir).join("coco.json"),
        }
    }
}

// Segmentation emitted for single (non-multiple) polygons
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum SegmentationMode {
    #[default]
    Polygon,
    Rle,
}

// How RLE counts are written
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum RleFormat {
    #[default]
    Uncompressed,
    Compressed,
}

/// Options consumed by the conversion pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertConfig {
    pub segmentation_mode: SegmentationMode,
    pub rle_format: RleFormat,
}
