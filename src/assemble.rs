//! Annotation assembly
//!
//! Ties the pipeline together: dialect detection and category resolution run
//! once per project, images are numbered in source order, and every label is
//! translated and rounded into the final annotation list.

use log::info;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashMap;

use crate::categories::{category_index, resolve_categories};
use crate::coco::{quantize, quantize_bbox, Annotation, Category, CocoDataset, Image, Segmentation};
use crate::config::ConvertConfig;
use crate::error::{ConvertError, Result};
use crate::schema::detect_dialect;
use crate::translate::{translate_label, LabelContext, ShapeRecord};
use crate::types::{Dialect, MetaEntry};

/// Images of a project together with their raw label payloads.
#[derive(Debug, Clone, Default)]
pub struct ImageSource {
    /// Image entries in iteration order
    pub entries: Vec<MetaEntry>,
    /// Raw label payloads keyed by label id
    pub labels: HashMap<String, Value>,
}

impl ImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an image and the label attached to it.
    pub fn push(&mut self, entry: MetaEntry, label: Value) {
        self.labels.insert(entry.label_id.clone(), label);
        self.entries.push(entry);
    }
}

/// Label ids in first-seen order, each mapped to the image that owns it.
#[derive(Debug, Clone, Default)]
pub struct LabelIndex {
    order: Vec<String>,
    image_of: HashMap<String, u32>,
}

impl LabelIndex {
    pub fn image_id(&self, label_id: &str) -> Option<u32> {
        self.image_of.get(label_id).copied()
    }

    /// (label id, image id) pairs in translation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.order
            .iter()
            .map(move |label_id| (label_id.as_str(), self.image_of[label_id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Number images from 0 in source order and index their labels.
///
/// A label id claimed by several entries belongs to the last of them.
pub fn build_images(entries: &[MetaEntry]) -> Result<(Vec<Image>, LabelIndex)> {
    let mut images = Vec::with_capacity(entries.len());
    let mut index = LabelIndex::default();

    for (idx, entry) in entries.iter().enumerate() {
        let (Some(height), Some(width)) = (entry.image_info.height, entry.image_info.width) else {
            return Err(ConvertError::configuration(format!(
                "image '{}/{}' has no height/width; only labels annotated through the annotation app are supported",
                entry.dataset, entry.data_key
            )));
        };
        let id = idx as u32;
        images.push(Image::new(
            id,
            entry.dataset.clone(),
            entry.data_key.clone(),
            height,
            width,
        ));
        if index.image_of.insert(entry.label_id.clone(), id).is_none() {
            index.order.push(entry.label_id.clone());
        }
    }
    Ok((images, index))
}

/// Round bbox, area and polygon coordinates; RLE counts are left as is.
pub fn quantize_shape(shape: ShapeRecord) -> ShapeRecord {
    let segmentation = shape.segmentation.map(|segmentation| match segmentation {
        Segmentation::Polygon(polygons) => Segmentation::Polygon(
            polygons
                .into_iter()
                .map(|polygon| polygon.into_iter().map(quantize).collect())
                .collect(),
        ),
        rle => rle,
    });
    ShapeRecord {
        category_id: shape.category_id,
        bbox: quantize_bbox(shape.bbox),
        area: quantize(shape.area),
        segmentation,
    }
}

/// Translate every indexed label and number the resulting annotations from 1.
pub fn assemble_annotations(
    dialect: Dialect,
    categories: &[Category],
    images: &[Image],
    index: &LabelIndex,
    labels: &HashMap<String, Value>,
    config: &ConvertConfig,
) -> Result<Vec<Annotation>> {
    let category_ids = category_index(categories);
    let image_map: HashMap<u32, &Image> = images.iter().map(|i| (i.id, i)).collect();
    let jobs: Vec<(&str, u32)> = index.iter().collect();

    // Labels are independent once categories are known; collecting keeps
    // source order so ids match a sequential run.
    let translated: Vec<(u32, Vec<ShapeRecord>)> = jobs
        .par_iter()
        .map(|&(label_id, image_id)| -> Result<(u32, Vec<ShapeRecord>)> {
            let image = image_map.get(&image_id).ok_or_else(|| {
                ConvertError::consistency(format!(
                    "label '{}' points at unknown image {}",
                    label_id, image_id
                ))
            })?;
            let label = labels.get(label_id).ok_or_else(|| {
                ConvertError::consistency(format!(
                    "no label payload for label '{}' of image '{}'",
                    label_id, image.file_name
                ))
            })?;
            let ctx = LabelContext {
                categories: &category_ids,
                image,
                config,
            };
            Ok((image_id, translate_label(dialect, label, &ctx)?))
        })
        .collect::<Result<_>>()?;

    let mut annotations = Vec::new();
    for (image_id, shapes) in translated {
        for shape in shapes {
            let shape = quantize_shape(shape);
            annotations.push(Annotation::new(
                annotations.len() as u32 + 1,
                image_id,
                shape.category_id,
                shape.bbox,
                shape.area,
                shape.segmentation,
            ));
        }
    }
    Ok(annotations)
}

/// Convert a project descriptor and its images into a COCO dataset.
pub fn convert(project: &Value, source: &ImageSource, config: &ConvertConfig) -> Result<CocoDataset> {
    let dialect = detect_dialect(project)?;
    info!("Detected project dialect: {}", dialect);
    let categories = resolve_categories(project, dialect)?;

    let (images, index) = build_images(&source.entries)?;
    info!("Indexed {} images with {} labels", images.len(), index.len());

    let annotations =
        assemble_annotations(dialect, &categories, &images, &index, &source.labels, config)?;
    info!("Assembled {} annotations", annotations.len());

    let dataset = CocoDataset {
        images,
        categories,
        annotations,
    };
    dataset.validate()?;
    Ok(dataset)
}
