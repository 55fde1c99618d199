use serde_json::{json, Value};
use std::fs;
use std::path::Path;

use suite2coco::{convert, read_export, write_coco, ConvertConfig, ConvertError};

fn write_json(path: &Path, value: &Value) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, serde_json::to_vec(value).unwrap()).unwrap();
}

fn write_export(root: &Path) {
    write_json(
        &root.join("project.json"),
        &json!({
            "type": "image-siesta",
            "version": "0.6.1",
            "object_detection": {
                "object_groups": [],
                "object_classes": [
                    { "id": "c1", "name": "car", "annotation_type": "box" }
                ]
            }
        }),
    );
    write_json(
        &root.join("meta/setB/b.jpg.json"),
        &json!({
            "data_key": "b.jpg",
            "dataset": "setB",
            "label_id": "label-b",
            "image_info": { "height": 40, "width": 60 }
        }),
    );
    // No dataset/data_key inside: taken from the path.
    write_json(
        &root.join("meta/setA/nested/a.jpg.json"),
        &json!({
            "label_id": "label-a",
            "image_info": { "height": 10, "width": 20 }
        }),
    );
    let car = json!({ "objects": [{
        "annotation_type": "box",
        "class_name": "car",
        "annotation": { "coord": { "x": 1, "y": 1, "width": 2, "height": 2 } }
    }] });
    write_json(&root.join("labels/label-a.json"), &car);
    write_json(&root.join("labels/label-b.json"), &car);
}

#[test]
fn test_read_export_orders_images_by_meta_path() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());

    let export = read_export(dir.path()).unwrap();
    let keys: Vec<(&str, &str)> = export
        .source
        .entries
        .iter()
        .map(|e| (e.dataset.as_str(), e.data_key.as_str()))
        .collect();
    assert_eq!(keys, vec![("setA", "nested/a.jpg"), ("setB", "b.jpg")]);
    assert_eq!(export.source.labels.len(), 2);
}

#[test]
fn test_convert_and_write_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());

    let export = read_export(dir.path()).unwrap();
    let dataset = convert(&export.project, &export.source, &ConvertConfig::default()).unwrap();
    let output = dir.path().join("out/coco.json");
    write_coco(&output, &dataset, true).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(written["images"][0]["file_name"], "nested/a.jpg");
    assert_eq!(written["images"][1]["id"], 1);
    assert_eq!(written["images"][1]["height"], 40);
    assert!(written["images"][0]["license"].is_null());
    assert_eq!(written["categories"][0]["id"], 1);
    assert!(written["categories"][0]["supercategory"].is_null());
    assert_eq!(written["annotations"][1]["id"], 2);
    assert_eq!(written["annotations"][1]["image_id"], 1);
    assert_eq!(written["annotations"][1]["iscrowd"], 0);
    assert_eq!(written["annotations"][1]["area"], 4.0);
    assert!(written["annotations"][1]["segmentation"].is_null());
}

#[test]
fn test_missing_label_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    fs::remove_file(dir.path().join("labels/label-b.json")).unwrap();

    assert!(matches!(read_export(dir.path()), Err(ConvertError::Io(_))));
}

#[test]
fn test_missing_dimensions_fail_conversion() {
    let dir = tempfile::tempdir().unwrap();
    write_export(dir.path());
    write_json(
        &dir.path().join("meta/setB/b.jpg.json"),
        &json!({ "data_key": "b.jpg", "dataset": "setB", "label_id": "label-b", "image_info": {} }),
    );

    let export = read_export(dir.path()).unwrap();
    let result = convert(&export.project, &export.source, &ConvertConfig::default());
    assert!(matches!(result, Err(ConvertError::Configuration(_))));
}
