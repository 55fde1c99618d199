//! Suite export to COCO format converter
//!
//! This library converts image annotation projects exported from the Suite
//! annotation tools (death-valley and siesta schema dialects) into COCO
//! object detection datasets, rasterizing polygons into RLE masks where
//! needed.

pub mod assemble;
pub mod categories;
pub mod coco;
pub mod config;
pub mod error;
pub mod io;
pub mod mask;
pub mod rasterize;
pub mod schema;
pub mod translate;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use assemble::{convert, ImageSource};
pub use coco::{Annotation, Category, CocoDataset, Image, Segmentation};
pub use config::{Args, ConvertConfig, RleFormat, SegmentationMode};
pub use error::{ConvertError, Result};
pub use io::{read_export, write_coco, SuiteExport};
pub use schema::detect_dialect;
pub use types::{Dialect, MetaEntry};
