//! Polygon rasterization onto binary pixel masks
//!
//! Rings are clipped to a one-pixel margin around the image, snapped to the
//! nearest pixel and drawn with `imageproc` onto a grayscale canvas: interior
//! first, outline second, the order the annotation tools render shapes in.
//! Results may differ by a pixel along shared edges from other rasterizers.

use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point as PixelPoint;

use crate::types::Point;

/// A `width` x `height` mask of 0/1 pixels stored in column-major order:
/// pixel `(x, y)` lives at index `y + height * x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl BinaryMask {
    /// Build a mask from a column-major pixel buffer.
    pub fn from_column_major(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        if pixels.len() != width as usize * height as usize {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Column-major view of a (row-major) canvas; any non-zero pixel is set.
    pub fn from_gray(canvas: &GrayImage) -> Self {
        let (width, height) = canvas.dimensions();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for x in 0..width {
            for y in 0..height {
                pixels.push(u8::from(canvas.get_pixel(x, y)[0] != 0));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels in column-major (Fortran) order.
    pub fn as_column_major(&self) -> &[u8] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.pixels[y as usize + self.height as usize * x as usize]
    }

    /// Number of set pixels.
    pub fn count_ones(&self) -> usize {
        self.pixels.iter().filter(|&&p| p != 0).count()
    }
}

// One side of the clipping rectangle.
#[derive(Debug, Clone, Copy)]
enum Boundary {
    Left(f64),
    Right(f64),
    Top(f64),
    Bottom(f64),
}

impl Boundary {
    fn contains(self, (x, y): (f64, f64)) -> bool {
        match self {
            Boundary::Left(v) => x >= v,
            Boundary::Right(v) => x <= v,
            Boundary::Top(v) => y >= v,
            Boundary::Bottom(v) => y <= v,
        }
    }

    // Only called for segments with one end on each side.
    fn intersect(self, a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
        match self {
            Boundary::Left(v) | Boundary::Right(v) => {
                let t = (v - a.0) / (b.0 - a.0);
                (v, a.1 + t * (b.1 - a.1))
            }
            Boundary::Top(v) | Boundary::Bottom(v) => {
                let t = (v - a.1) / (b.1 - a.1);
                (a.0 + t * (b.0 - a.0), v)
            }
        }
    }
}

/// Clip a ring to `[-1, width] x [-1, height]` (Sutherland-Hodgman).
///
/// Edges created along the margin fall outside the image, so fill and
/// outline inside the image are unchanged while every remaining vertex stays
/// within a pixel of the canvas.
fn clip_ring(ring: &[Point], width: u32, height: u32) -> Vec<(f64, f64)> {
    let mut output: Vec<(f64, f64)> = ring
        .iter()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .map(|p| (p.x, p.y))
        .collect();

    let boundaries = [
        Boundary::Left(-1.0),
        Boundary::Right(f64::from(width)),
        Boundary::Top(-1.0),
        Boundary::Bottom(f64::from(height)),
    ];
    for boundary in boundaries {
        let input = std::mem::take(&mut output);
        let Some(&last) = input.last() else {
            break;
        };
        let mut previous = last;
        for &current in &input {
            match (boundary.contains(previous), boundary.contains(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(boundary.intersect(previous, current)),
                (false, true) => {
                    output.push(boundary.intersect(previous, current));
                    output.push(current);
                }
                (false, false) => {}
            }
            previous = current;
        }
    }
    output
}

// Round to pixels and drop repeated vertices, including a closing one.
fn snap_ring(ring: &[(f64, f64)]) -> Vec<PixelPoint<i32>> {
    let mut vertices: Vec<PixelPoint<i32>> = Vec::with_capacity(ring.len());
    for &(x, y) in ring {
        let vertex = PixelPoint::new(x.round() as i32, y.round() as i32);
        if vertices.last() != Some(&vertex) {
            vertices.push(vertex);
        }
    }
    while vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    vertices
}

/// Paint the interior of `ring` with `fill`, then its outline with `outline`.
pub fn draw_ring(canvas: &mut GrayImage, ring: &[Point], fill: u8, outline: u8) {
    let (width, height) = canvas.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let vertices = snap_ring(&clip_ring(ring, width, height));

    match vertices.as_slice() {
        [] => {}
        [single] => {
            let inside = single.x >= 0
                && single.y >= 0
                && (single.x as u32) < width
                && (single.y as u32) < height;
            if inside {
                canvas.put_pixel(single.x as u32, single.y as u32, Luma([outline]));
            }
        }
        _ => {
            draw_polygon_mut(canvas, &vertices, Luma([fill]));
            for (i, start) in vertices.iter().enumerate() {
                let end = vertices[(i + 1) % vertices.len()];
                draw_line_segment_mut(
                    canvas,
                    (start.x as f32, start.y as f32),
                    (end.x as f32, end.y as f32),
                    Luma([outline]),
                );
            }
        }
    }
}

/// Rasterize a single polygon, interior and outline set to 1.
pub fn rasterize_polygon(points: &[Point], width: u32, height: u32) -> BinaryMask {
    let mut canvas = GrayImage::new(width, height);
    draw_ring(&mut canvas, points, 1, 1);
    BinaryMask::from_gray(&canvas)
}

/// Rasterize a multi-polygon onto one shared mask.
///
/// Each face's outer ring (ring 0) is filled with 1, then its holes are
/// cleared to 0 while their outlines stay set. Faces are painted in order, so
/// a later face overwrites earlier ones where they overlap.
pub fn rasterize_multi_polygon(faces: &[Vec<Vec<Point>>], width: u32, height: u32) -> BinaryMask {
    let mut canvas = GrayImage::new(width, height);
    for face in faces {
        let Some((outer, holes)) = face.split_first() else {
            continue;
        };
        draw_ring(&mut canvas, outer, 1, 1);
        for hole in holes {
            draw_ring(&mut canvas, hole, 0, 1);
        }
    }
    BinaryMask::from_gray(&canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point> {
        vec![
            Point { x: x0, y: y0 },
            Point { x: x1, y: y0 },
            Point { x: x1, y: y1 },
            Point { x: x0, y: y1 },
        ]
    }

    #[test]
    fn test_full_image_rectangle_covers_every_pixel() {
        let mask = rasterize_polygon(&rect(0.0, 0.0, 8.0, 6.0), 8, 6);
        assert_eq!(mask.count_ones(), 48);
    }

    #[test]
    fn test_rectangle_includes_outline() {
        // Corners are inclusive: 2..=5 x 1..=3
        let mask = rasterize_polygon(&rect(2.0, 1.0, 5.0, 3.0), 10, 10);
        assert_eq!(mask.count_ones(), 4 * 3);
        assert_eq!(mask.get(2, 1), 1);
        assert_eq!(mask.get(5, 3), 1);
        assert_eq!(mask.get(6, 3), 0);
        assert_eq!(mask.get(2, 4), 0);
    }

    #[test]
    fn test_triangle_fill() {
        let triangle = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 4.0, y: 0.0 },
            Point { x: 0.0, y: 4.0 },
        ];
        let mask = rasterize_polygon(&triangle, 10, 10);
        // Rows 0..=4 hold 5, 4, 3, 2, 1 pixels.
        assert_eq!(mask.count_ones(), 15);
        assert_eq!(mask.get(4, 0), 1);
        assert_eq!(mask.get(4, 1), 0);
    }

    #[test]
    fn test_polygon_is_clipped_to_image() {
        let mask = rasterize_polygon(&rect(-5.0, -5.0, 20.0, 20.0), 4, 3);
        assert_eq!(mask.count_ones(), 12);
    }

    #[test]
    fn test_vertices_snap_to_nearest_pixel() {
        let mask = rasterize_polygon(&rect(0.6, 0.4, 2.4, 1.6), 5, 5);
        // Snaps to (1, 0)-(2, 2)
        assert_eq!(mask.count_ones(), 2 * 3);
        assert_eq!(mask.get(0, 0), 0);
        assert_eq!(mask.get(1, 0), 1);
    }

    #[test]
    fn test_column_major_layout() {
        let mask = rasterize_polygon(&rect(1.0, 0.0, 1.0, 1.0), 3, 2);
        // Only column x=1 is set: indices 2 and 3.
        assert_eq!(mask.as_column_major(), &[0, 0, 1, 1, 0, 0]);
    }

    #[test]
    fn test_empty_polygon_leaves_mask_clear() {
        let mask = rasterize_polygon(&[], 4, 4);
        assert_eq!(mask.count_ones(), 0);
    }

    #[test]
    fn test_multi_polygon_hole_clears_interior() {
        let face = vec![rect(0.0, 0.0, 10.0, 10.0), rect(3.0, 3.0, 7.0, 7.0)];
        let mask = rasterize_multi_polygon(&[face], 10, 10);
        // The hole's 3x3 interior is cleared; its outline stays set.
        assert_eq!(mask.count_ones(), 100 - 9);
        assert_eq!(mask.get(5, 5), 0);
        assert_eq!(mask.get(3, 5), 1);
    }

    #[test]
    fn test_multi_polygon_later_face_overwrites() {
        let first = vec![rect(0.0, 0.0, 4.0, 4.0), rect(1.0, 1.0, 3.0, 3.0)];
        let second = vec![rect(2.0, 2.0, 2.0, 2.0)];
        let mask = rasterize_multi_polygon(&[first, second], 6, 6);
        assert_eq!(mask.get(2, 2), 1);
    }

    #[test]
    fn test_multi_polygon_separate_faces() {
        let faces = vec![
            vec![rect(0.0, 0.0, 1.0, 1.0)],
            vec![rect(5.0, 5.0, 6.0, 6.0)],
        ];
        let mask = rasterize_multi_polygon(&faces, 8, 8);
        assert_eq!(mask.count_ones(), 8);
    }

    #[test]
    fn test_far_away_vertex_is_clipped() {
        let points = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 1e19, y: 0.0 },
            Point { x: 0.0, y: 5.0 },
        ];
        let mask = rasterize_polygon(&points, 10, 10);
        // Rows 0..=4 run off the right edge of the image.
        assert!(mask.count_ones() >= 50);
        assert_eq!(mask.get(9, 0), 1);
        assert_eq!(mask.get(9, 4), 1);
        assert_eq!(mask.get(0, 5), 1);
        assert_eq!(mask.get(0, 6), 0);
    }

    #[test]
    fn test_long_thin_edge_finishes() {
        let points = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 1e11, y: 1.0 },
            Point { x: 0.0, y: 5.0 },
        ];
        let mask = rasterize_polygon(&points, 10, 10);
        assert_eq!(mask.get(0, 0), 1);
        assert_eq!(mask.get(9, 2), 1);
        assert_eq!(mask.get(0, 9), 0);
    }

    #[test]
    fn test_non_finite_vertices_are_ignored() {
        let mut points = rect(1.0, 1.0, 2.0, 2.0);
        points.push(Point {
            x: f64::NAN,
            y: f64::INFINITY,
        });
        let mask = rasterize_polygon(&points, 4, 4);
        assert_eq!(mask.count_ones(), 4);
    }

    #[test]
    fn test_empty_canvas() {
        let mask = rasterize_polygon(&rect(0.0, 0.0, 3.0, 3.0), 4, 0);
        assert_eq!(mask.count_ones(), 0);
        assert!(mask.as_column_major().is_empty());
    }

    #[test]
    fn test_from_gray_is_column_major() {
        let mut canvas = GrayImage::new(2, 3);
        canvas.put_pixel(1, 0, Luma([1]));
        canvas.put_pixel(0, 2, Luma([255]));
        let mask = BinaryMask::from_gray(&canvas);
        assert_eq!(mask.as_column_major(), &[0, 0, 1, 1, 0, 0]);
    }
}
