// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A flame function is a weighted sum of (affine transform, variation)
//! pairs.  Points on the plane are plain `Complex<f32>` values, with
//! the real part as x and the imaginary part as y.

use crate::color::Rgb8;
use crate::errors::FlameError;
use num::Complex;

/// The nonlinear functions a transform can bend its point through.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Variation {
    /// Identity.
    Linear,
    /// Inversion through the unit circle.
    Spherical,
    /// `(sin x, sin y)`.
    Sinusoidal,
    /// Rotation by the squared distance from the origin.
    Swirl,
    /// The cardioid-shaped heart variation.
    Heart,
}

impl Variation {
    /// Applies the variation to a point.
    #[inline]
    pub fn apply(self, p: Complex<f32>) -> Complex<f32> {
        let (x, y) = (p.re, p.im);
        match self {
            Variation::Linear => p,
            Variation::Spherical => {
                let r_sqr_inv = 1.0 / (x * x + y * y);
                Complex::new(x * r_sqr_inv, y * r_sqr_inv)
            }
            Variation::Sinusoidal => Complex::new(x.sin(), y.sin()),
            Variation::Swirl => {
                let r_sqr = x * x + y * y;
                let (sin_r, cos_r) = r_sqr.sin_cos();
                Complex::new(x * sin_r - y * cos_r, x * cos_r + y * sin_r)
            }
            Variation::Heart => {
                let r = (x * x + y * y).sqrt();
                let theta = (x / y).atan();
                Complex::new(r * (theta * r).sin(), -r * (theta * r).cos())
            }
        }
    }
}

/// The six coefficients of an affine map:
/// `x' = a·x + b·y + c`, `y' = d·x + e·y + f`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Coefficients {
    /// x contribution to x'.
    pub a: f32,
    /// y contribution to x'.
    pub b: f32,
    /// x' translation.
    pub c: f32,
    /// x contribution to y'.
    pub d: f32,
    /// y contribution to y'.
    pub e: f32,
    /// y' translation.
    pub f: f32,
}

impl Coefficients {
    /// Constructor, in `a, b, c, d, e, f` order.
    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Coefficients { a, b, c, d, e, f }
    }

    /// The map that leaves every point where it is.
    pub fn identity() -> Self {
        Coefficients::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// A counter-clockwise rotation about the origin by `angle` radians.
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = (angle.sin() as f32, angle.cos() as f32);
        Coefficients::new(cos, -sin, 0.0, sin, cos, 0.0)
    }

    /// Applies the affine map.
    #[inline]
    pub fn apply(&self, p: Complex<f32>) -> Complex<f32> {
        Complex::new(
            p.re * self.a + p.im * self.b + self.c,
            p.re * self.d + p.im * self.e + self.f,
        )
    }
}

impl From<[f32; 6]> for Coefficients {
    fn from(c: [f32; 6]) -> Self {
        Coefficients::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }
}

/// One term of a flame function.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    /// The variation applied after the affine map.
    pub variation: Variation,
    /// The affine map applied first.
    pub coefficients: Coefficients,
    /// How much this term contributes to the sum.
    pub weight: f32,
}

impl Transform {
    /// Maps the point through the coefficients, then the variation,
    /// then scales it by the weight.
    #[inline]
    pub fn apply(&self, p: Complex<f32>) -> Complex<f32> {
        self.variation.apply(self.coefficients.apply(p)) * self.weight
    }
}

/// A single fractal flame function: the sum of its transforms, plus
/// an optional color.  Functions without a color are
/// color-preserving: the chaos game keeps whatever color it carried
/// into the step.
#[derive(Clone, Debug, PartialEq)]
pub struct FlameFunction {
    transforms: Vec<Transform>,
    color: Option<Rgb8>,
}

impl FlameFunction {
    /// Zips three parallel lists into transforms.  The lists must be
    /// the same length.
    pub fn new(
        variations: Vec<Variation>,
        coefficients: Vec<Coefficients>,
        weights: Vec<f32>,
    ) -> Result<Self, FlameError> {
        if variations.len() != coefficients.len() || variations.len() != weights.len() {
            return Err(FlameError::MismatchedTransforms {
                variations: variations.len(),
                coefficients: coefficients.len(),
                weights: weights.len(),
            });
        }
        let transforms = variations
            .into_iter()
            .zip(coefficients.into_iter())
            .zip(weights.into_iter())
            .map(|((variation, coefficients), weight)| Transform {
                variation,
                coefficients,
                weight,
            })
            .collect();
        Ok(FlameFunction::from_transforms(transforms))
    }

    /// A color-preserving function from already assembled transforms.
    pub fn from_transforms(transforms: Vec<Transform>) -> Self {
        FlameFunction {
            transforms,
            color: None,
        }
    }

    /// A single linear transform with weight 1.
    pub fn linear(coefficients: Coefficients) -> Self {
        FlameFunction::from_transforms(vec![Transform {
            variation: Variation::Linear,
            coefficients,
            weight: 1.0,
        }])
    }

    /// Fixes the color this function paints with.
    pub fn with_color(mut self, color: Rgb8) -> Self {
        self.color = Some(color);
        self
    }

    /// Sums every transform's output for the given point.
    pub fn apply(&self, point: Complex<f32>) -> Complex<f32> {
        self.transforms
            .iter()
            .fold(Complex::new(0.0, 0.0), |acc, t| acc + t.apply(point))
    }

    /// The fixed color, if any.
    pub fn color(&self) -> Option<Rgb8> {
        self.color
    }

    /// True if the function inherits the previous step's color.
    pub fn is_color_preserving(&self) -> bool {
        self.color.is_none()
    }

    /// The terms of the sum.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Complex<f32>, b: Complex<f32>) -> bool {
        (a - b).norm() < 1e-5
    }

    #[test]
    fn variations_on_a_known_point() {
        let p = Complex::new(0.5, 0.5);
        assert_eq!(Variation::Linear.apply(p), p);
        assert!(close(Variation::Spherical.apply(p), Complex::new(1.0, 1.0)));
        assert!(close(
            Variation::Sinusoidal.apply(p),
            Complex::new(0.5f32.sin(), 0.5f32.sin())
        ));
        let (s, c) = 0.5f32.sin_cos();
        assert!(close(
            Variation::Swirl.apply(p),
            Complex::new(0.5 * s - 0.5 * c, 0.5 * c + 0.5 * s)
        ));
        let r = 0.5f32.sqrt();
        let theta = 1.0f32.atan();
        assert!(close(
            Variation::Heart.apply(p),
            Complex::new(r * (theta * r).sin(), -r * (theta * r).cos())
        ));
    }

    #[test]
    fn affine_map() {
        let c = Coefficients::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
        assert_eq!(c.apply(Complex::new(1.0, 1.0)), Complex::new(6.0, 15.0));
        assert_eq!(Coefficients::from([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), c);
        let p = Complex::new(0.25, -0.75);
        assert_eq!(Coefficients::identity().apply(p), p);
    }

    #[test]
    fn quarter_rotation() {
        let q = Coefficients::rotation(std::f64::consts::FRAC_PI_2);
        assert!(close(q.apply(Complex::new(1.0, 0.0)), Complex::new(0.0, 1.0)));
    }

    #[test]
    fn apply_sums_weighted_terms() {
        let f = FlameFunction::new(
            vec![Variation::Linear, Variation::Linear],
            vec![
                Coefficients::identity(),
                Coefficients::new(0.0, 0.0, 1.0, 0.0, 0.0, -1.0),
            ],
            vec![0.5, 2.0],
        )
        .unwrap();
        let p = Complex::new(0.4, 0.2);
        assert!(close(f.apply(p), Complex::new(0.2 + 2.0, 0.1 - 2.0)));
    }

    #[test]
    fn mismatched_lists_are_rejected() {
        let err = FlameFunction::new(
            vec![Variation::Linear, Variation::Swirl],
            vec![Coefficients::identity()],
            vec![1.0, 1.0],
        )
        .unwrap_err();
        assert_eq!(
            err,
            FlameError::MismatchedTransforms {
                variations: 2,
                coefficients: 1,
                weights: 2
            }
        );
    }

    #[test]
    fn color_preservation() {
        let f = FlameFunction::linear(Coefficients::identity());
        assert!(f.is_color_preserving());
        assert_eq!(f.color(), None);
        let f = f.with_color(Rgb8::new(255, 105, 180));
        assert!(!f.is_color_preserving());
        assert_eq!(f.color(), Some(Rgb8::new(255, 105, 180)));
    }
}
