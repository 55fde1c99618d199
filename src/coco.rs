//! COCO format data structures and utilities
//!
//! This module holds the normalized annotation model every Suite dialect is
//! converted into, and the fixed-precision rounding applied to it.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{ConvertError, Result};

/// Number of fraction digits kept in bbox, area and polygon coordinates
pub const FRACTION_DIGITS: u32 = 2;

/// COCO category information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    pub supercategory: Option<String>,
}

/// COCO image information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: u32,
    pub license: Option<u32>,
    pub dataset: String,
    pub file_name: String,
    pub height: u32,
    pub width: u32,
    pub date_captured: Option<String>,
}

impl Image {
    pub fn new(id: u32, dataset: String, file_name: String, height: u32, width: u32) -> Self {
        Self {
            id,
            license: None,
            dataset,
            file_name,
            height,
            width,
            date_captured: None,
        }
    }
}

/// Instance segmentation in either of the COCO encodings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segmentation {
    /// Flat `[x, y, x, y, ...]` lists, one per polygon
    Polygon(Vec<Vec<f64>>),
    /// Column-major run lengths, `size` is `[height, width]`
    Rle { size: [u32; 2], counts: Vec<u32> },
    /// Run lengths in the COCO string encoding
    CompressedRle { size: [u32; 2], counts: String },
}

impl Segmentation {
    pub fn is_rle(&self) -> bool {
        !matches!(self, Segmentation::Polygon(_))
    }
}

/// COCO annotation information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: u32,
    pub image_id: u32,
    pub iscrowd: u32,
    pub category_id: u32,
    pub bbox: [f64; 4], // [x, y, width, height]
    pub area: f64,
    pub segmentation: Option<Segmentation>,
}

impl Annotation {
    pub fn new(
        id: u32,
        image_id: u32,
        category_id: u32,
        bbox: [f64; 4],
        area: f64,
        segmentation: Option<Segmentation>,
    ) -> Self {
        Self {
            id,
            image_id,
            iscrowd: 0,
            category_id,
            bbox,
            area,
            segmentation,
        }
    }
}

/// Complete COCO dataset structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CocoDataset {
    pub images: Vec<Image>,
    pub categories: Vec<Category>,
    pub annotations: Vec<Annotation>,
}

impl CocoDataset {
    /// Check that every annotation points at a known image and category.
    pub fn validate(&self) -> Result<()> {
        let image_ids: HashSet<u32> = self.images.iter().map(|i| i.id).collect();
        let category_ids: HashSet<u32> = self.categories.iter().map(|c| c.id).collect();

        for annotation in &self.annotations {
            if !image_ids.contains(&annotation.image_id) {
                return Err(ConvertError::consistency(format!(
                    "annotation {} references unknown image {}",
                    annotation.id, annotation.image_id
                )));
            }
            if !category_ids.contains(&annotation.category_id) {
                return Err(ConvertError::consistency(format!(
                    "annotation {} references unknown category {}",
                    annotation.id, annotation.category_id
                )));
            }
        }
        Ok(())
    }
}

/// Truncate to [`FRACTION_DIGITS`] decimal places, rounding toward zero.
///
/// The float is first converted to its exact decimal expansion, so `12.345`
/// (stored as `12.3449999...`) becomes `12.34` and `-1.239` becomes `-1.23`.
pub fn quantize(value: f64) -> f64 {
    match Decimal::from_f64_retain(value) {
        Some(exact) => exact
            .round_dp_with_strategy(FRACTION_DIGITS, RoundingStrategy::ToZero)
            .to_f64()
            .unwrap_or(value),
        None => value,
    }
}

/// Quantize every coordinate of a bounding box.
pub fn quantize_bbox(bbox: [f64; 4]) -> [f64; 4] {
    bbox.map(quantize)
}

/// Flatten vertices into the COCO `[x, y, x, y, ...]` polygon layout.
pub fn flatten_polygon(points: &[crate::types::Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}
