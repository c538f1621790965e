// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes the relationship
//! between the integral plane of a histogram, with an origin at 0,0,
//! and the normalized square `[-1, 1] × [-1, 1]` the chaos game plays
//! in.
use num::Complex;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a cell in the histogram.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Maps points in the normalized square onto cells of an integral
/// plane.
#[derive(Copy, Clone, Debug)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    // Half the width and height, halved as integers before the float
    // conversion, so odd sizes lose their last column and row.
    grid_factors: (f32, f32),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane.
    pub fn new(width: usize, height: usize) -> PlaneMapper {
        PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            grid_factors: ((width / 2) as f32, (height / 2) as f32),
        }
    }

    /// The total number of cells in the integral grid.
    pub fn len(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// Describes that the integral plane is of a size.
    pub fn is_empty(&self) -> bool {
        self.integral_plane.0 == 0 || self.integral_plane.1 == 0
    }

    /// Given a point, map it to the cell it falls in, or `None` if it
    /// lands outside the plane.  Coordinates truncate toward zero, so
    /// a sliver just left of (or below) -1 still lands in the first
    /// column (or row).  Non-finite points land nowhere.
    pub fn point_to_pixel(&self, point: &Complex<f32>) -> Option<Pixel> {
        if !point.re.is_finite() || !point.im.is_finite() {
            return None;
        }
        let left = ((point.re + 1.0) * self.grid_factors.0) as i64;
        let top = ((point.im + 1.0) * self.grid_factors.1) as i64;
        if left < 0
            || left >= self.integral_plane.0 as i64
            || top < 0
            || top >= self.integral_plane.1 as i64
        {
            return None;
        }
        Some(Pixel(left as usize, top as usize))
    }

    /// Like `point_to_pixel`, but returns the linear offset from the
    /// root of a row-major buffer.
    pub fn point_to_offset(&self, point: &Complex<f32>) -> Option<usize> {
        self.point_to_pixel(point)
            .map(|Pixel(left, top)| top * self.integral_plane.0 + left)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_to_pixel_on_small_planes() {
        let pm = PlaneMapper::new(4, 4);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(2, 2)));
        assert_eq!(pm.point_to_pixel(&Complex::new(-1.0, -1.0)), Some(Pixel(0, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(0.99, 0.99)), Some(Pixel(3, 3)));
        assert_eq!(pm.point_to_pixel(&Complex::new(1.0, 1.0)), None);
    }

    #[test]
    fn point_to_pixel_maps_on_large_planes() {
        let pm = PlaneMapper::new(640, 480);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, 0.0)), Some(Pixel(320, 240)));
        assert_eq!(pm.point_to_pixel(&Complex::new(0.5, -0.5)), Some(Pixel(480, 120)));
        assert_eq!(pm.point_to_pixel(&Complex::new(0.5, 1.5)), None);
    }

    #[test]
    fn truncation_pulls_near_misses_into_the_first_cell() {
        let pm = PlaneMapper::new(4, 4);
        assert_eq!(pm.point_to_pixel(&Complex::new(-1.2, -1.2)), Some(Pixel(0, 0)));
        assert_eq!(pm.point_to_pixel(&Complex::new(-1.6, 0.0)), None);
    }

    #[test]
    fn odd_sizes_use_the_integer_half() {
        let pm = PlaneMapper::new(5, 5);
        // half of 5 is 2: the last column is never reached
        assert_eq!(pm.point_to_pixel(&Complex::new(0.99, 0.0)), Some(Pixel(3, 2)));
    }

    #[test]
    fn non_finite_points_land_nowhere() {
        let pm = PlaneMapper::new(4, 4);
        assert_eq!(pm.point_to_pixel(&Complex::new(std::f32::NAN, 0.0)), None);
        assert_eq!(pm.point_to_pixel(&Complex::new(0.0, std::f32::INFINITY)), None);
    }

    #[test]
    fn offsets_are_row_major() {
        let pm = PlaneMapper::new(4, 4);
        assert_eq!(pm.point_to_offset(&Complex::new(0.0, -0.5)), Some(4 + 2));
        assert_eq!(pm.point_to_offset(&Complex::new(3.0, 0.0)), None);
        assert_eq!(pm.len(), 16);
        assert!(!pm.is_empty());
        assert!(PlaneMapper::new(0, 4).is_empty());
    }
}
