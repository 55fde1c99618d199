//! Run-length encoding of binary masks
//!
//! Masks are traversed in column-major (Fortran) order, matching the COCO
//! mask API: runs alternate between 0s and 1s, always starting with a (possibly
//! empty) run of 0s. Bounding box and area are derived from the runs, not from
//! the source geometry.

use crate::rasterize::BinaryMask;

/// Run-length encoding for masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rle {
    pub height: u32,
    pub width: u32,
    /// Run counts: alternating runs of 0s and 1s, starting with 0s.
    pub counts: Vec<u32>,
}

/// An encoded mask together with the geometry derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMask {
    pub rle: Rle,
    /// `[x, y, width, height]` in pixels
    pub bbox: [f64; 4],
    /// Number of set pixels
    pub area: u64,
}

/// Encode a mask into column-major RLE.
pub fn encode(mask: &BinaryMask) -> Rle {
    let mut counts = Vec::new();
    let mut previous: u8 = 0;
    let mut run: u32 = 0;

    for &pixel in mask.as_column_major() {
        let value = u8::from(pixel != 0);
        if value != previous {
            counts.push(run);
            run = 0;
            previous = value;
        }
        run += 1;
    }
    counts.push(run);

    Rle {
        height: mask.height(),
        width: mask.width(),
        counts,
    }
}

/// Encode a mask and derive its bounding box and area.
pub fn encode_with_geometry(mask: &BinaryMask) -> EncodedMask {
    let rle = encode(mask);
    let bbox = rle.to_bbox();
    let area = rle.area();
    EncodedMask { rle, bbox, area }
}

impl Rle {
    /// COCO `size` field: `[height, width]`.
    pub fn size(&self) -> [u32; 2] {
        [self.height, self.width]
    }

    /// Number of foreground pixels (sum of the odd-indexed runs).
    pub fn area(&self) -> u64 {
        self.counts
            .iter()
            .skip(1)
            .step_by(2)
            .map(|&c| u64::from(c))
            .sum()
    }

    /// Bounding box `[x, y, width, height]` of the foreground pixels.
    ///
    /// Walks the runs pairwise in column-major order; a foreground run that
    /// wraps into a later column spans every row.
    pub fn to_bbox(&self) -> [f64; 4] {
        let h = u64::from(self.height);
        let w = u64::from(self.width);
        // A trailing background run carries no foreground.
        let m = (self.counts.len() / 2) * 2;
        if m == 0 || h == 0 {
            return [0.0; 4];
        }

        let (mut xs, mut ys, mut xe, mut ye) = (w, h, 0u64, 0u64);
        let mut cc = 0u64;
        let mut xp = 0u64;

        for (j, &count) in self.counts[..m].iter().enumerate() {
            cc += u64::from(count);
            // Even j: first pixel of the next foreground run.
            // Odd j: last pixel of the current one.
            let t = cc - (j % 2) as u64;
            let y = t % h;
            let x = (t - y) / h;
            if j % 2 == 0 {
                xp = x;
            } else if xp < x {
                ys = 0;
                ye = h - 1;
            }
            xs = xs.min(x);
            xe = xe.max(x);
            ys = ys.min(y);
            ye = ye.max(y);
        }

        [
            xs as f64,
            ys as f64,
            (xe - xs + 1) as f64,
            (ye - ys + 1) as f64,
        ]
    }

    /// Decode back to a column-major pixel buffer of `height * width`.
    pub fn decode(&self) -> Vec<u8> {
        let n = self.height as usize * self.width as usize;
        let mut pixels = vec![0u8; n];
        let mut idx = 0usize;
        let mut value = 0u8;
        for &count in &self.counts {
            let end = (idx + count as usize).min(n);
            pixels[idx.min(n)..end].fill(value);
            idx += count as usize;
            value = 1 - value;
        }
        pixels
    }

    /// Compress the counts into the COCO string format.
    ///
    /// From the fourth run on, each count is stored as the difference to the
    /// count two places earlier; values are emitted as 5-bit groups with a
    /// continuation bit, offset by 48 into printable ASCII.
    pub fn to_compressed_string(&self) -> String {
        let mut s = String::with_capacity(self.counts.len() * 2);
        for (i, &count) in self.counts.iter().enumerate() {
            let mut x = i64::from(count);
            if i > 2 {
                x -= i64::from(self.counts[i - 2]);
            }
            loop {
                let mut c = (x & 0x1f) as u8;
                x >>= 5;
                let more = if c & 0x10 != 0 { x != -1 } else { x != 0 };
                if more {
                    c |= 0x20;
                }
                s.push(char::from(c + 48));
                if !more {
                    break;
                }
            }
        }
        s
    }
}
