//! Reading Suite export directories and writing COCO files

use glob::{glob, Pattern};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::assemble::ImageSource;
use crate::coco::CocoDataset;
use crate::error::{ConvertError, Result};
use crate::types::{ImageInfo, MetaEntry};
use crate::utils::{create_progress_bar, ensure_parent_directory, read_json_file};

pub const PROJECT_FILE: &str = "project.json";
pub const META_DIR: &str = "meta";
pub const LABELS_DIR: &str = "labels";

/// A loaded export: the project descriptor and its images with labels.
#[derive(Debug, Clone)]
pub struct SuiteExport {
    pub project: Value,
    pub source: ImageSource,
}

// Meta files usually carry dataset and data key; older exports only encode
// them in the file path.
#[derive(Debug, Deserialize)]
struct MetaFile {
    dataset: Option<String>,
    data_key: Option<String>,
    label_id: String,
    #[serde(default)]
    image_info: ImageInfo,
}

/// Load `project.json`, every `meta/**/*.json` file and the label payload
/// each meta file points at.
///
/// Meta files are visited in lexicographic path order, which fixes image ids.
pub fn read_export(export_dir: &Path) -> Result<SuiteExport> {
    let project: Value = read_json_file(&export_dir.join(PROJECT_FILE))?;

    let meta_dir = export_dir.join(META_DIR);
    let meta_paths = find_meta_files(&meta_dir)?;
    if meta_paths.is_empty() {
        warn!("No meta files found under {}", meta_dir.display());
    }

    let labels_dir = export_dir.join(LABELS_DIR);
    let pb = create_progress_bar(meta_paths.len() as u64, "Labels");
    let mut source = ImageSource::new();
    for meta_path in &meta_paths {
        let entry = read_meta_entry(&meta_dir, meta_path)?;
        let label: Value = read_json_file(&label_path(&labels_dir, &entry.label_id)?)?;
        source.push(entry, label);
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        "Loaded {} images from {}",
        source.entries.len(),
        export_dir.display()
    );
    Ok(SuiteExport { project, source })
}

fn find_meta_files(meta_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/**/*.json",
        Pattern::escape(&meta_dir.display().to_string())
    );
    let entries = glob(&pattern).map_err(|e| {
        ConvertError::configuration(format!("invalid meta file pattern '{}': {}", pattern, e))
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => paths.push(path),
            Ok(_) => {}
            Err(e) => return Err(ConvertError::Io(e.into_error())),
        }
    }
    paths.sort();
    Ok(paths)
}

/// Path of the label file for `label_id`; ids must name a file directly
/// inside `labels/`.
fn label_path(labels_dir: &Path, label_id: &str) -> Result<PathBuf> {
    let plain = !label_id.is_empty()
        && label_id != "."
        && label_id != ".."
        && !label_id.contains(|c: char| c == '/' || c == '\\');
    if !plain {
        return Err(ConvertError::schema(format!(
            "label id '{}' is not a plain file name",
            label_id
        )));
    }
    Ok(labels_dir.join(format!("{}.json", label_id)))
}

fn read_meta_entry(meta_dir: &Path, meta_path: &Path) -> Result<MetaEntry> {
    let meta: MetaFile = read_json_file(meta_path)?;

    // meta/<dataset>/<data_key>.json
    let relative = meta_path.strip_prefix(meta_dir).unwrap_or(meta_path);
    let mut components = relative.iter().map(|c| c.to_string_lossy().into_owned());
    let path_dataset = components.next().unwrap_or_default();
    let rest: Vec<String> = components.collect();
    let path_data_key = rest
        .join("/")
        .strip_suffix(".json")
        .map(str::to_string)
        .unwrap_or_default();

    Ok(MetaEntry {
        dataset: meta.dataset.unwrap_or(path_dataset),
        data_key: meta.data_key.unwrap_or(path_data_key),
        label_id: meta.label_id,
        image_info: meta.image_info,
    })
}

/// Serialize a COCO dataset to `path`.
pub fn write_coco(path: &Path, dataset: &CocoDataset, pretty: bool) -> Result<()> {
    ensure_parent_directory(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, dataset)?;
    } else {
        serde_json::to_writer(&mut writer, dataset)?;
    }
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}
