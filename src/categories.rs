//! Category extraction from project descriptors

use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;

use crate::coco::Category;
use crate::error::{ConvertError, Result};
use crate::types::{parse_record, ClassKey, DeathValleyProject, Dialect, SiestaProject};

/// Annotation types that produce COCO categories
pub const SUPPORTED_SHAPES: &[&str] = &["box", "polygon"];

fn is_supported_shape(shape: &str) -> bool {
    SUPPORTED_SHAPES.contains(&shape)
}

/// Extract the box/polygon categories of `project`.
pub fn resolve_categories(project: &Value, dialect: Dialect) -> Result<Vec<Category>> {
    let categories = match dialect {
        Dialect::DeathValley => death_valley_categories(project)?,
        Dialect::SiestaV1 | Dialect::SiestaV2 => siesta_categories(project)?,
    };
    info!("Resolved {} categories ({})", categories.len(), dialect);
    Ok(categories)
}

/// Death-valley classes keep their own `class_id`. Only the first declared
/// shape kind of a class decides whether it is kept.
fn death_valley_categories(project: &Value) -> Result<Vec<Category>> {
    let project: DeathValleyProject = parse_record(project, "death-valley project")?;

    let class_to_group: HashMap<&str, &str> = project
        .groups
        .iter()
        .flat_map(|g| {
            g.info
                .classes
                .iter()
                .map(move |class| (class.as_str(), g.name.as_str()))
        })
        .collect();

    let mut categories = Vec::new();
    for object in &project.objects {
        let first_shape = object.info.shapes.keys().next().ok_or_else(|| {
            ConvertError::schema(format!(
                "object class '{}' declares no shapes",
                object.class_name
            ))
        })?;
        if !is_supported_shape(first_shape) {
            debug!(
                "Skipping class '{}' with shape '{}'",
                object.class_name, first_shape
            );
            continue;
        }
        categories.push(Category {
            id: object.class_id,
            name: object.class_name.clone(),
            supercategory: class_to_group
                .get(object.class_name.as_str())
                .map(|g| g.to_string()),
        });
    }
    Ok(categories)
}

/// Siesta categories are numbered densely from 1 in class order.
fn siesta_categories(project: &Value) -> Result<Vec<Category>> {
    let project: SiestaProject = parse_record(project, "siesta project")?;
    let detection = &project.object_detection;

    let class_to_group: HashMap<&ClassKey, &str> = detection
        .object_groups
        .iter()
        .flat_map(|g| {
            g.object_class_ids
                .iter()
                .map(move |id| (id, g.name.as_str()))
        })
        .collect();

    let mut categories: Vec<Category> = Vec::new();
    for class in &detection.object_classes {
        if !is_supported_shape(&class.annotation_type) {
            debug!(
                "Skipping class '{}' with annotation type '{}'",
                class.name, class.annotation_type
            );
            continue;
        }
        categories.push(Category {
            id: categories.len() as u32 + 1,
            name: class.name.clone(),
            supercategory: class_to_group.get(&class.id).map(|g| g.to_string()),
        });
    }
    Ok(categories)
}

/// Category name to id lookup used while translating labels.
pub fn category_index(categories: &[Category]) -> HashMap<String, u32> {
    categories.iter().map(|c| (c.name.clone(), c.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn death_valley_project() -> Value {
        json!({
            "groups": [
                { "name": "vehicles", "info": { "classes": ["car", "truck"] } }
            ],
            "objects": [
                { "class_id": 7, "class_name": "car", "info": { "shapes": { "box": {} } } },
                { "class_id": 3, "class_name": "person", "info": { "shapes": { "polygon": {} } } },
                { "class_id": 9, "class_name": "lane", "info": { "shapes": { "polyline": {} } } },
                { "class_id": 12, "class_name": "truck", "info": { "shapes": { "keypoint": {}, "box": {} } } }
            ]
        })
    }

    #[test]
    fn test_death_valley_keeps_class_ids() {
        let categories = resolve_categories(&death_valley_project(), Dialect::DeathValley).unwrap();
        let ids: Vec<u32> = categories.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![7, 3]);
        assert_eq!(categories[0].supercategory.as_deref(), Some("vehicles"));
        assert_eq!(categories[1].supercategory, None);
    }

    #[test]
    fn test_death_valley_first_shape_wins() {
        let categories = resolve_categories(&death_valley_project(), Dialect::DeathValley).unwrap();
        assert!(!categories.iter().any(|c| c.name == "truck"));
    }

    #[test]
    fn test_death_valley_missing_objects() {
        let result = resolve_categories(&json!({ "groups": [] }), Dialect::DeathValley);
        assert!(matches!(result, Err(ConvertError::Schema(_))));
    }

    #[test]
    fn test_siesta_dense_ids() {
        let project = json!({
            "type": "image-siesta",
            "version": "0.5.0",
            "object_detection": {
                "object_groups": [
                    { "name": "animals", "object_class_ids": ["c-2", "c-4"] }
                ],
                "object_classes": [
                    { "id": "c-1", "name": "car", "annotation_type": "box" },
                    { "id": "c-2", "name": "dog", "annotation_type": "keypoint" },
                    { "id": "c-3", "name": "road", "annotation_type": "polygon" },
                    { "id": "c-4", "name": "cat", "annotation_type": "box" }
                ]
            }
        });
        let categories = resolve_categories(&project, Dialect::SiestaV2).unwrap();
        let summary: Vec<(u32, &str, Option<&str>)> = categories
            .iter()
            .map(|c| (c.id, c.name.as_str(), c.supercategory.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![(1, "car", None), (2, "road", None), (3, "cat", Some("animals"))]
        );
    }

    #[test]
    fn test_siesta_integer_class_ids() {
        let project = json!({
            "object_detection": {
                "object_groups": [{ "name": "g", "object_class_ids": [5] }],
                "object_classes": [{ "id": 5, "name": "car", "annotation_type": "box" }]
            }
        });
        let categories = resolve_categories(&project, Dialect::SiestaV1).unwrap();
        assert_eq!(categories[0].supercategory.as_deref(), Some("g"));
    }

    #[test]
    fn test_siesta_missing_object_detection() {
        let result = resolve_categories(&json!({ "type": "image-siesta" }), Dialect::SiestaV1);
        assert!(matches!(result, Err(ConvertError::Schema(_))));
    }

    #[test]
    fn test_category_index() {
        let categories = vec![Category {
            id: 4,
            name: "car".into(),
            supercategory: None,
        }];
        assert_eq!(category_index(&categories).get("car"), Some(&4));
    }
}
