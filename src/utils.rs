use indicatif::{ProgressBar, ProgressStyle};
use log::error;
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use crate::error::Result;

/// Read and parse a single JSON file.
///
/// The file is parsed straight from a buffered stream instead of being read
/// into a string first, which keeps large label exports out of memory.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|e| {
        error!("Failed to open JSON file ({}): {}", path.display(), e);
        e
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        error!("Failed to parse JSON ({}): {}", path.display(), e);
        e.into()
    })
}

/// Create a progress bar with the given length and label
pub fn create_progress_bar(len: u64, label: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{}] [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} ({{eta}})",
            label
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

/// Make sure the directory that will hold `path` exists.
pub fn ensure_parent_directory(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            log::debug!("Creating output directory {:?}", parent);
            fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write;

    #[test]
    fn test_read_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        File::create(&path)
            .unwrap()
            .write_all(br#"{"type": "image-siesta"}"#)
            .unwrap();

        let value: Value = read_json_file(&path).unwrap();
        assert_eq!(value["type"], "image-siesta");
    }

    #[test]
    fn test_read_json_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_json_file::<Value>(&missing),
            Err(crate::error::ConvertError::Io(_))
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            read_json_file::<Value>(&broken),
            Err(crate::error::ConvertError::Json(_))
        ));
    }

    #[test]
    fn test_ensure_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/coco.json");
        ensure_parent_directory(&path).unwrap();
        assert!(dir.path().join("nested/out").is_dir());
        ensure_parent_directory(Path::new("coco.json")).unwrap();
    }
}
