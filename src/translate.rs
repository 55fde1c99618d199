//! Label payload translation
//!
//! Each dialect has its own walk over the raw label payload; all of them emit
//! [`ShapeRecord`]s with unrounded geometry. Shapes of types other than box and
//! polygon are skipped, while a shape whose class is not a known category is
//! an error.

use log::debug;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::coco::{flatten_polygon, Image, Segmentation};
use crate::config::{ConvertConfig, RleFormat, SegmentationMode};
use crate::error::{ConvertError, Result};
use crate::mask::{encode_with_geometry, Rle};
use crate::rasterize::{rasterize_multi_polygon, rasterize_polygon};
use crate::types::{
    parse_record, BoxCoord, DeathValleyLabel, Dialect, MultiPolygonCoord, Point, PolygonCoord,
    SiestaAnnotation, SiestaLabel, SiestaObject, SiestaV1Object, SiestaV2Object,
};

/// One annotation instance before id assignment and rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeRecord {
    pub category_id: u32,
    pub bbox: [f64; 4],
    pub area: f64,
    pub segmentation: Option<Segmentation>,
}

/// Everything a translator needs besides the label itself.
#[derive(Debug, Clone, Copy)]
pub struct LabelContext<'a> {
    pub categories: &'a HashMap<String, u32>,
    pub image: &'a Image,
    pub config: &'a ConvertConfig,
}

impl LabelContext<'_> {
    fn category_id(&self, name: &str) -> Result<u32> {
        self.categories.get(name).copied().ok_or_else(|| {
            ConvertError::consistency(format!(
                "label of image '{}' uses class '{}' which the project does not define",
                self.image.file_name, name
            ))
        })
    }

    // Box and polygon objects must name their class; other shapes may not.
    fn shape_category(&self, class: Option<&str>, shape: &str) -> Result<u32> {
        let name = class.ok_or_else(|| {
            ConvertError::schema(format!(
                "{} object in label of image '{}' has no class",
                shape, self.image.file_name
            ))
        })?;
        self.category_id(name)
    }

    /// Segmentation of a single polygon: its vertices, or the RLE mask when
    /// RLE output is selected.
    fn single_polygon_segmentation(&self, geometry: PolygonGeometry) -> Segmentation {
        match (self.config.segmentation_mode, geometry.polygon) {
            (SegmentationMode::Polygon, Some(polygon)) => Segmentation::Polygon(vec![polygon]),
            _ => self.rle_segmentation(&geometry.rle),
        }
    }

    fn rle_segmentation(&self, rle: &Rle) -> Segmentation {
        match self.config.rle_format {
            RleFormat::Uncompressed => Segmentation::Rle {
                size: rle.size(),
                counts: rle.counts.clone(),
            },
            RleFormat::Compressed => Segmentation::CompressedRle {
                size: rle.size(),
                counts: rle.to_compressed_string(),
            },
        }
    }
}

/// Geometry of a rasterized polygon.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGeometry {
    pub bbox: [f64; 4],
    pub area: f64,
    /// Flat vertex list; absent for multi-polygons
    pub polygon: Option<Vec<f64>>,
    pub rle: Rle,
}

/// Rasterize a single polygon on the image and measure it.
pub fn convert_polygon(points: &[Point], image: &Image) -> PolygonGeometry {
    let mask = rasterize_polygon(points, image.width, image.height);
    let encoded = encode_with_geometry(&mask);
    PolygonGeometry {
        bbox: encoded.bbox,
        area: encoded.area as f64,
        polygon: Some(flatten_polygon(points)),
        rle: encoded.rle,
    }
}

/// Rasterize a multi-polygon (faces of outer ring plus holes) and measure it.
pub fn convert_multi_polygon(faces: &[Vec<Vec<Point>>], image: &Image) -> PolygonGeometry {
    let mask = rasterize_multi_polygon(faces, image.width, image.height);
    let encoded = encode_with_geometry(&mask);
    PolygonGeometry {
        bbox: encoded.bbox,
        area: encoded.area as f64,
        polygon: None,
        rle: encoded.rle,
    }
}

fn box_record(category_id: u32, coord: &BoxCoord) -> ShapeRecord {
    ShapeRecord {
        category_id,
        bbox: [coord.x, coord.y, coord.width, coord.height],
        area: coord.width * coord.height,
        segmentation: None,
    }
}

/// Translate one label payload according to the project dialect.
pub fn translate_label(
    dialect: Dialect,
    label: &Value,
    ctx: &LabelContext<'_>,
) -> Result<Vec<ShapeRecord>> {
    match dialect {
        Dialect::DeathValley => translate_death_valley(label, ctx),
        Dialect::SiestaV1 | Dialect::SiestaV2 => translate_siesta(label, dialect, ctx),
    }
}

/// Death-valley objects carry either a `bbox` or a `polygon` shape entry.
pub fn translate_death_valley(label: &Value, ctx: &LabelContext<'_>) -> Result<Vec<ShapeRecord>> {
    let label: DeathValleyLabel = parse_record(label, "death-valley label")?;
    let mut shapes = Vec::with_capacity(label.result.objects.len());

    for object in &label.result.objects {
        if let Some(bbox) = object.shape.get("bbox") {
            let category_id = ctx.shape_category(object.class.as_deref(), "bbox")?;
            let coord = death_valley_box(bbox, &object.shape)?;
            shapes.push(box_record(category_id, &coord));
        } else if let Some(polygon) = object.shape.get("polygon") {
            let category_id = ctx.shape_category(object.class.as_deref(), "polygon")?;
            let points: Vec<Point> = parse_record(polygon, "death-valley polygon")?;
            let geometry = convert_polygon(&points, ctx.image);
            shapes.push(ShapeRecord {
                category_id,
                bbox: geometry.bbox,
                area: geometry.area,
                segmentation: Some(ctx.single_polygon_segmentation(geometry)),
            });
        } else {
            debug!(
                "Skipping {:?} object without box or polygon in image '{}'",
                object.class, ctx.image.file_name
            );
        }
    }
    Ok(shapes)
}

// Box coordinates live in the `bbox` entry when it is a record, otherwise on
// the shape itself.
fn death_valley_box(bbox: &Value, shape: &Map<String, Value>) -> Result<BoxCoord> {
    if bbox.get("x").is_some() {
        parse_record(bbox, "death-valley bbox")
    } else {
        BoxCoord::from_shape_fields(shape)
    }
}

impl BoxCoord {
    fn from_shape_fields(map: &Map<String, Value>) -> Result<Self> {
        let field = |name: &str| {
            map.get(name).and_then(Value::as_f64).ok_or_else(|| {
                ConvertError::schema(format!("death-valley bbox: missing field `{}`", name))
            })
        };
        Ok(BoxCoord {
            x: field("x")?,
            y: field("y")?,
            width: field("width")?,
            height: field("height")?,
        })
    }
}

/// Siesta objects name their annotation type and class with camelCase keys in
/// v1 and snake_case keys in v2.
pub fn translate_siesta(
    label: &Value,
    dialect: Dialect,
    ctx: &LabelContext<'_>,
) -> Result<Vec<ShapeRecord>> {
    let label: SiestaLabel = parse_record(label, "siesta label")?;
    let mut shapes = Vec::with_capacity(label.objects.len());

    for raw in &label.objects {
        let object: SiestaObject = match dialect {
            Dialect::SiestaV1 => parse_record::<SiestaV1Object>(raw, "siesta-v1 object")?.into(),
            Dialect::SiestaV2 => parse_record::<SiestaV2Object>(raw, "siesta-v2 object")?.into(),
            Dialect::DeathValley => {
                return Err(ConvertError::unsupported_schema(
                    "death-valley label passed to the siesta translator",
                ))
            }
        };

        match object.annotation_type.as_str() {
            "box" => {
                let category_id = ctx.shape_category(object.class_name.as_deref(), "box")?;
                let annotation: SiestaAnnotation =
                    parse_record(&object.annotation, "siesta box annotation")?;
                let coord: BoxCoord = parse_record(&annotation.coord, "siesta box coord")?;
                shapes.push(box_record(category_id, &coord));
            }
            "polygon" => {
                let category_id = ctx.shape_category(object.class_name.as_deref(), "polygon")?;
                let annotation: SiestaAnnotation =
                    parse_record(&object.annotation, "siesta polygon annotation")?;
                shapes.push(siesta_polygon(&annotation, category_id, ctx)?);
            }
            other => {
                debug!(
                    "Skipping {:?} object with annotation type '{}' in image '{}'",
                    object.class_name, other, ctx.image.file_name
                );
            }
        }
    }
    Ok(shapes)
}

fn siesta_polygon(
    annotation: &SiestaAnnotation,
    category_id: u32,
    ctx: &LabelContext<'_>,
) -> Result<ShapeRecord> {
    if annotation.multiple {
        // Polygon point segmentation is not available for multi-polygons.
        let coord: MultiPolygonCoord =
            parse_record(&annotation.coord, "siesta multi-polygon coord")?;
        let geometry = convert_multi_polygon(&coord.points, ctx.image);
        return Ok(ShapeRecord {
            category_id,
            bbox: geometry.bbox,
            area: geometry.area,
            segmentation: Some(ctx.rle_segmentation(&geometry.rle)),
        });
    }

    let coord: PolygonCoord = parse_record(&annotation.coord, "siesta polygon coord")?;
    let geometry = convert_polygon(&coord.points, ctx.image);
    Ok(ShapeRecord {
        category_id,
        bbox: geometry.bbox,
        area: geometry.area,
        segmentation: Some(ctx.single_polygon_segmentation(geometry)),
    })
}
