use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::{ConvertError, Result};

// Schema dialect of a Suite project export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    DeathValley,
    SiestaV1,
    SiestaV2,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::DeathValley => "death-valley",
            Dialect::SiestaV1 => "siesta-v1",
            Dialect::SiestaV2 => "siesta-v2",
        }
    }

    pub fn is_siesta(&self) -> bool {
        matches!(self, Dialect::SiestaV1 | Dialect::SiestaV2)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vertex as stored by the annotation tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

// Axis-aligned box coordinates shared by both tool families
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoxCoord {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Class identifiers appear as strings in current exports and as integers in
/// older ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ClassKey {
    Int(i64),
    Str(String),
}

// Death-valley project descriptor

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyProject {
    pub groups: Vec<DeathValleyGroup>,
    pub objects: Vec<DeathValleyClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyGroup {
    pub name: String,
    pub info: DeathValleyGroupInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyGroupInfo {
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyClass {
    pub class_id: u32,
    pub class_name: String,
    pub info: DeathValleyClassInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyClassInfo {
    /// Shape kinds in declaration order; only the first one is considered.
    pub shapes: Map<String, Value>,
}

// Death-valley label payload

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyLabel {
    pub result: DeathValleyResult,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyResult {
    pub objects: Vec<DeathValleyObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeathValleyObject {
    /// Only required for box and polygon shapes
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub shape: Map<String, Value>,
}

// Siesta project descriptor

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaProject {
    pub object_detection: SiestaObjectDetection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaObjectDetection {
    pub object_groups: Vec<SiestaObjectGroup>,
    pub object_classes: Vec<SiestaObjectClass>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaObjectGroup {
    pub name: String,
    pub object_class_ids: Vec<ClassKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaObjectClass {
    pub id: ClassKey,
    pub name: String,
    pub annotation_type: String,
}

// Siesta label payload. Objects are kept raw because their field names depend
// on the dialect.

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaLabel {
    pub objects: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiestaV1Object {
    pub annotation_type: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub annotation: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaV2Object {
    pub annotation_type: String,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub annotation: Value,
}

/// Dialect-independent view of a siesta label object.
#[derive(Debug, Clone)]
pub struct SiestaObject {
    pub annotation_type: String,
    pub class_name: Option<String>,
    pub annotation: Value,
}

impl From<SiestaV1Object> for SiestaObject {
    fn from(object: SiestaV1Object) -> Self {
        Self {
            annotation_type: object.annotation_type,
            class_name: object.class_name,
            annotation: object.annotation,
        }
    }
}

impl From<SiestaV2Object> for SiestaObject {
    fn from(object: SiestaV2Object) -> Self {
        Self {
            annotation_type: object.annotation_type,
            class_name: object.class_name,
            annotation: object.annotation,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiestaAnnotation {
    pub coord: Value,
    #[serde(default)]
    pub multiple: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolygonCoord {
    pub points: Vec<Point>,
}

/// Faces of a multi-polygon; ring 0 of each face is the outer boundary, the
/// remaining rings are holes.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiPolygonCoord {
    pub points: Vec<Vec<Vec<Point>>>,
}

// Image/label source

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

/// One entry of the image source: an image keyed by (dataset, data key) and
/// the label attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaEntry {
    pub dataset: String,
    pub data_key: String,
    pub label_id: String,
    pub image_info: ImageInfo,
}

impl MetaEntry {
    pub fn new(
        dataset: impl Into<String>,
        data_key: impl Into<String>,
        label_id: impl Into<String>,
        height: u32,
        width: u32,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            data_key: data_key.into(),
            label_id: label_id.into(),
            image_info: ImageInfo {
                height: Some(height),
                width: Some(width),
            },
        }
    }
}

/// Deserialize a nested record, reporting failures as schema errors.
pub fn parse_record<T: DeserializeOwned>(value: &Value, what: &str) -> Result<T> {
    T::deserialize(value).map_err(|e| ConvertError::schema(format!("{}: {}", what, e)))
}
