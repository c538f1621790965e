// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The density/color histogram the chaos game paints into, and the
//! log-density resolve that turns it into an image.
//!
//! A histogram is a fixed `width × height` grid stored row-major.
//! Each cell counts how many times the chaos game landed on it and
//! carries the running blend of the colors it landed with.  Resolving
//! scales each cell's color by `log2(count) / log2(max count)`, which
//! keeps the sparse outer filaments of a flame visible next to its
//! dense core, and optionally averages `s × s` blocks down for
//! supersampling.

use crate::color::{Rgb16, Rgb8};
use crate::errors::FlameError;
use crate::fastmath::fast_log2;
use itertools::iproduct;
use std::ops::{Index, IndexMut};

/// One cell of the histogram.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct HistogramEntry {
    /// How many points have landed here.
    pub count: u32,
    /// The running blend of the colors those points carried.
    pub color: Rgb8,
}

impl HistogramEntry {
    /// An empty cell: no hits, black.
    pub fn blank() -> Self {
        HistogramEntry::default()
    }
}

/// A fixed-size grid of histogram entries.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram {
    width: usize,
    height: usize,
    entries: Vec<HistogramEntry>,
}

impl Histogram {
    /// A blank histogram.  Its dimensions never change afterwards.
    pub fn new(width: usize, height: usize) -> Self {
        Histogram {
            width,
            height,
            entries: vec![HistogramEntry::blank(); width * height],
        }
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the histogram has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Row-major view of every cell.
    pub fn entries(&self) -> &[HistogramEntry] {
        &self.entries
    }

    /// Bounds-checked access by coordinates.
    pub fn get(&self, x: usize, y: usize) -> Option<&HistogramEntry> {
        if x < self.width && y < self.height {
            self.entries.get(y * self.width + x)
        } else {
            None
        }
    }

    /// Sum of every cell's count.
    pub fn total_count(&self) -> u64 {
        self.entries.iter().map(|e| u64::from(e.count)).sum()
    }

    /// The largest count of any cell; 0 for an empty histogram.
    pub fn max_count(&self) -> u32 {
        self.entries.iter().map(|e| e.count).max().unwrap_or(0)
    }

    /// Resets every cell to blank.
    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = HistogramEntry::blank();
        }
    }

    fn check_same_size(&self, other: &Histogram) -> Result<(), FlameError> {
        if self.width != other.width || self.height != other.height {
            return Err(FlameError::SizeMismatch(
                self.width,
                self.height,
                other.width,
                other.height,
            ));
        }
        Ok(())
    }

    /// Overwrites `other` with the contents of this histogram.  Both
    /// must have the same dimensions.
    pub fn copy_to(&self, other: &mut Histogram) -> Result<(), FlameError> {
        self.check_same_size(other)?;
        other.entries.copy_from_slice(&self.entries);
        Ok(())
    }

    /// Folds `other` into this histogram: counts add, colors blend
    /// half-and-half.
    pub fn merge_from(&mut self, other: &Histogram) -> Result<(), FlameError> {
        self.check_same_size(other)?;
        for (dst, from) in self.entries.iter_mut().zip(other.entries.iter()) {
            dst.count = dst.count.saturating_add(from.count);
            dst.color = dst.color.blend_with(&from.color, 0.5);
        }
        Ok(())
    }

    /// The size of the buffer `resolve` fills for a supersampling
    /// factor.
    pub fn resolved_len(&self, super_sampling: usize) -> usize {
        if super_sampling == 0 {
            return 0;
        }
        (self.width / super_sampling) * (self.height / super_sampling)
    }

    /// Tone-maps the histogram into `out`, which must hold exactly
    /// `(width / s) * (height / s)` colors for supersampling factor
    /// `s`.  Rows and columns left over when the dimensions aren't a
    /// multiple of `s` are ignored.
    ///
    /// * `s == 1`: every cell's color scaled by its intensity.
    /// * `s == 2`: each 2x2 block is summed, each cell weighted by
    ///   `fast_log2(count) / (4 · log2(max))`.
    /// * `s > 2`: each block is summed into a 16-bit accumulator with
    ///   the exact intensity, then divided by `s` and narrowed.
    pub fn resolve(&self, out: &mut [Rgb8], super_sampling: usize) -> Result<(), FlameError> {
        if super_sampling == 0 {
            return Err(FlameError::InvalidSuperSampling);
        }
        let expected = self.resolved_len(super_sampling);
        if out.len() != expected {
            return Err(FlameError::OutputSizeMismatch {
                expected,
                actual: out.len(),
            });
        }

        let max_count = self.max_count();
        let log_max = (max_count as f32).log2();
        debug!("Resolving histogram, max count {}", max_count);

        if max_count == 0 {
            for color in out.iter_mut() {
                *color = Rgb8::default();
            }
            return Ok(());
        }

        match super_sampling {
            1 => self.resolve_single(out, log_max),
            2 => self.resolve_double(out, log_max),
            s => self.resolve_blocks(out, log_max, s),
        }
        Ok(())
    }

    fn resolve_single(&self, out: &mut [Rgb8], log_max: f32) {
        for (color, entry) in out.iter_mut().zip(self.entries.iter()) {
            *color = entry.color * intensity(entry.count, log_max);
        }
    }

    // Integer log: this is the path the renderer takes by default.
    fn resolve_double(&self, out: &mut [Rgb8], log_max: f32) {
        let scale = if log_max > 0.0 { 1.0 / (4.0 * log_max) } else { 0.0 };
        let factor = |count: u32| {
            if count == 0 {
                0.0
            } else if log_max > 0.0 {
                fast_log2(count) as f32 * scale
            } else {
                0.25
            }
        };
        let w = self.width;
        let blocks = iproduct!(0..self.height / 2, 0..w / 2);
        for (color, (by, bx)) in out.iter_mut().zip(blocks) {
            let (x, y) = (bx * 2, by * 2);
            let e1 = &self.entries[y * w + x];
            let e2 = &self.entries[y * w + x + 1];
            let e3 = &self.entries[(y + 1) * w + x];
            let e4 = &self.entries[(y + 1) * w + x + 1];
            *color = e1.color * factor(e1.count)
                + e2.color * factor(e2.count)
                + e3.color * factor(e3.count)
                + e4.color * factor(e4.count);
        }
    }

    // Normalizes by s, not s².  The 2x path divides by 4 instead, so
    // the two paths disagree in brightness.
    fn resolve_blocks(&self, out: &mut [Rgb8], log_max: f32, s: usize) {
        let inv_samples = 1.0 / s as f32;
        let w = self.width;
        let blocks = iproduct!(0..self.height / s, 0..w / s);
        for (color, (by, bx)) in out.iter_mut().zip(blocks) {
            let mut accumulator = Rgb16::default();
            for (y, x) in iproduct!(by * s..(by + 1) * s, bx * s..(bx + 1) * s) {
                let entry = &self.entries[y * w + x];
                accumulator += entry.color * intensity(entry.count, log_max);
            }
            *color = accumulator.scale_to(inv_samples);
        }
    }
}

/// `log2(count) / log_max`, with empty cells at zero.  When the
/// densest cell holds a single hit, every non-empty cell is as dense
/// as the densest and gets full intensity.
#[inline]
fn intensity(count: u32, log_max: f32) -> f32 {
    if count == 0 {
        0.0
    } else if log_max > 0.0 {
        (count as f32).log2() / log_max
    } else {
        1.0
    }
}

/// Indexing by `(x, y)`.  The coordinates are checked against width
/// and height in debug builds only; in release builds an `x` past the
/// right edge addresses the next row, and only an offset past the end
/// of the grid panics.
impl Index<(usize, usize)> for Histogram {
    type Output = HistogramEntry;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &HistogramEntry {
        debug_assert!(
            x < self.width && y < self.height,
            "Index ({}, {}) out of bounds for {}x{} histogram",
            x,
            y,
            self.width,
            self.height
        );
        &self.entries[y * self.width + x]
    }
}

impl IndexMut<(usize, usize)> for Histogram {
    #[inline]
    fn index_mut(&mut self, (x, y): (usize, usize)) -> &mut HistogramEntry {
        debug_assert!(
            x < self.width && y < self.height,
            "Index ({}, {}) out of bounds for {}x{} histogram",
            x,
            y,
            self.width,
            self.height
        );
        &mut self.entries[y * self.width + x]
    }
}

impl Index<usize> for Histogram {
    type Output = HistogramEntry;

    #[inline]
    fn index(&self, offset: usize) -> &HistogramEntry {
        &self.entries[offset]
    }
}

impl IndexMut<usize> for Histogram {
    #[inline]
    fn index_mut(&mut self, offset: usize) -> &mut HistogramEntry {
        &mut self.entries[offset]
    }
}

/// Merges a list of histograms into the first one, as a left fold:
/// `list[1]`, then `list[2]`, and so on are folded into `list[0]` in
/// order.  Because each fold blends colors half-and-half, later
/// histograms weigh more than earlier ones; the order matters.
pub fn merge_histograms(histograms: &mut [Histogram]) -> Result<(), FlameError> {
    if let Some((dst, rest)) = histograms.split_first_mut() {
        for from in rest.iter() {
            dst.merge_from(from)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(width: usize, height: usize, count: u32, color: Rgb8) -> Histogram {
        let mut h = Histogram::new(width, height);
        for y in 0..height {
            for x in 0..width {
                h[(x, y)] = HistogramEntry { count, color };
            }
        }
        h
    }

    fn patterned(width: usize, height: usize, seed: u32) -> Histogram {
        let mut h = Histogram::new(width, height);
        for i in 0..h.len() {
            let v = (i as u32).wrapping_mul(2_654_435_761).wrapping_add(seed);
            h[i] = HistogramEntry {
                count: v % 1000,
                color: Rgb8::new(v as u8, (v >> 8) as u8, (v >> 16) as u8),
            };
        }
        h
    }

    #[test]
    fn new_histogram_is_blank() {
        let h = Histogram::new(4, 3);
        assert_eq!(h.width(), 4);
        assert_eq!(h.height(), 3);
        assert_eq!(h.len(), 12);
        assert!(h.entries().iter().all(|e| *e == HistogramEntry::blank()));
    }

    #[test]
    fn coordinates_are_row_major() {
        let mut h = Histogram::new(4, 3);
        h[(1, 2)].count = 9;
        assert_eq!(h[2 * 4 + 1].count, 9);
        assert_eq!(h.get(1, 2).map(|e| e.count), Some(9));
        assert!(h.get(4, 0).is_none());
        assert!(h.get(0, 3).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn x_past_the_edge_panics_in_debug() {
        let h = Histogram::new(4, 3);
        let entry = h[(4, 0)];
        assert_eq!(entry.count, 0);
    }

    #[test]
    fn clear_blanks_everything() {
        let mut h = patterned(8, 8, 3);
        h.clear();
        assert_eq!(h, Histogram::new(8, 8));
    }

    #[test]
    fn copy_there_and_back_is_lossless() {
        let original = patterned(16, 9, 77);
        let mut other = Histogram::new(16, 9);
        original.copy_to(&mut other).unwrap();
        assert_eq!(other, original);
        let mut back = Histogram::new(16, 9);
        other.copy_to(&mut back).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn copy_rejects_other_sizes() {
        let h = Histogram::new(4, 4);
        let mut other = Histogram::new(4, 5);
        assert_eq!(
            h.copy_to(&mut other),
            Err(FlameError::SizeMismatch(4, 4, 4, 5))
        );
    }

    #[test]
    fn merge_is_a_left_fold() {
        let a = patterned(5, 5, 1);
        let b = patterned(5, 5, 2_000_000);
        let c = patterned(5, 5, 3_000_000_000);

        let mut abc = vec![a.clone(), b.clone(), c.clone()];
        merge_histograms(&mut abc).unwrap();
        let mut acb = vec![a.clone(), c.clone(), b.clone()];
        merge_histograms(&mut acb).unwrap();

        for i in 0..a.len() {
            let merged = abc[0][i];
            assert_eq!(merged.count, a[i].count + b[i].count + c[i].count);
            let expected = a[i]
                .color
                .blend_with(&b[i].color, 0.5)
                .blend_with(&c[i].color, 0.5);
            assert_eq!(merged.color, expected);
            assert_eq!(acb[0][i].count, merged.count);
        }
        let colors = |h: &Histogram| h.entries().iter().map(|e| e.color).collect::<Vec<_>>();
        // Half-and-half blending is symmetric, so only the last operand
        // of the fold can change the result.
        assert_ne!(colors(&abc[0]), colors(&acb[0]));
    }

    #[test]
    fn merge_order_changes_color() {
        let red = filled(1, 1, 1, Rgb8::new(200, 0, 0));
        let green = filled(1, 1, 1, Rgb8::new(0, 200, 0));
        let blue = filled(1, 1, 1, Rgb8::new(0, 0, 200));

        let mut rgb = vec![red.clone(), green.clone(), blue.clone()];
        merge_histograms(&mut rgb).unwrap();
        assert_eq!(rgb[0][0].color, Rgb8::new(50, 50, 100));
        assert_eq!(rgb[0][0].count, 3);

        let mut brg = vec![blue, red, green];
        merge_histograms(&mut brg).unwrap();
        assert_eq!(brg[0][0].color, Rgb8::new(50, 100, 50));
        assert_eq!(brg[0][0].count, 3);
    }

    #[test]
    fn merge_rejects_other_sizes() {
        let mut list = vec![Histogram::new(2, 2), Histogram::new(3, 2)];
        assert!(merge_histograms(&mut list).is_err());
        let mut empty: Vec<Histogram> = vec![];
        assert!(merge_histograms(&mut empty).is_ok());
    }

    #[test]
    fn uniform_counts_resolve_at_full_intensity() {
        for &count in &[1u32, 2, 8, 1000] {
            let mut h = Histogram::new(4, 4);
            for i in 0..h.len() {
                h[i] = HistogramEntry {
                    count,
                    color: Rgb8::new(i as u8 * 10, 255 - i as u8, 7),
                };
            }
            let mut out = vec![Rgb8::default(); 16];
            h.resolve(&mut out, 1).unwrap();
            for i in 0..16 {
                assert_eq!(out[i], h[i].color, "count {}", count);
            }
        }
    }

    #[test]
    fn resolve_is_logarithmic() {
        let mut h = Histogram::new(2, 1);
        h[0] = HistogramEntry {
            count: 256,
            color: Rgb8::new(200, 200, 200),
        };
        h[1] = HistogramEntry {
            count: 16,
            color: Rgb8::new(200, 100, 0),
        };
        let mut out = vec![Rgb8::default(); 2];
        h.resolve(&mut out, 1).unwrap();
        assert_eq!(out[0], Rgb8::new(200, 200, 200));
        assert_eq!(out[1], Rgb8::new(100, 50, 0));
    }

    #[test]
    fn empty_cells_resolve_to_black() {
        let mut h = Histogram::new(2, 2);
        h[(0, 0)] = HistogramEntry {
            count: 4,
            color: Rgb8::new(255, 255, 255),
        };
        h[(1, 1)].color = Rgb8::new(255, 0, 0);
        let mut out = vec![Rgb8::new(1, 1, 1); 4];
        h.resolve(&mut out, 1).unwrap();
        assert_eq!(out[0], Rgb8::new(255, 255, 255));
        assert_eq!(out[3], Rgb8::default());

        let blank = Histogram::new(3, 3);
        let mut out = vec![Rgb8::new(9, 9, 9); 9];
        blank.resolve(&mut out, 1).unwrap();
        assert!(out.iter().all(|c| *c == Rgb8::default()));
    }

    #[test]
    fn double_supersampling_uses_integer_log() {
        let mut h = Histogram::new(2, 2);
        // max 256 -> log_max 8; 200 -> fast log 7.
        h[(0, 0)] = HistogramEntry {
            count: 256,
            color: Rgb8::new(200, 0, 0),
        };
        h[(1, 0)] = HistogramEntry {
            count: 200,
            color: Rgb8::new(0, 160, 0),
        };
        h[(0, 1)] = HistogramEntry {
            count: 0,
            color: Rgb8::new(0, 0, 255),
        };
        h[(1, 1)] = HistogramEntry {
            count: 1,
            color: Rgb8::new(255, 255, 255),
        };
        let mut out = vec![Rgb8::default(); 1];
        h.resolve(&mut out, 2).unwrap();
        assert_eq!(out[0], Rgb8::new(50, 35, 0));
    }

    #[test]
    fn higher_supersampling_divides_by_the_factor() {
        let h = filled(3, 3, 64, Rgb8::new(30, 60, 90));
        let mut out = vec![Rgb8::default(); 1];
        h.resolve(&mut out, 3).unwrap();
        // nine cells at full intensity, summed, divided by 3
        assert_eq!(out[0], Rgb8::new(90, 180, 255));

        let h = filled(8, 8, 16, Rgb8::new(10, 20, 2));
        let mut out = vec![Rgb8::default(); 4];
        h.resolve(&mut out, 4).unwrap();
        assert!(out.iter().all(|c| *c == Rgb8::new(40, 80, 8)));
    }

    #[test]
    fn leftover_rows_and_columns_are_ignored() {
        let h = filled(5, 3, 2, Rgb8::new(100, 100, 100));
        assert_eq!(h.resolved_len(2), 2);
        let mut out = vec![Rgb8::default(); 2];
        h.resolve(&mut out, 2).unwrap();
        assert_eq!(h.resolved_len(3), 1);
    }

    #[test]
    fn resolve_checks_its_arguments() {
        let h = Histogram::new(4, 4);
        let mut out = vec![Rgb8::default(); 3];
        assert_eq!(
            h.resolve(&mut out, 2),
            Err(FlameError::OutputSizeMismatch {
                expected: 4,
                actual: 3
            })
        );
        assert_eq!(h.resolve(&mut out, 0), Err(FlameError::InvalidSuperSampling));
    }
}
