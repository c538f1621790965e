// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The chaos game itself.
//!
//! A single point wanders the plane: each step picks a flame function
//! at random (weighted by its probability), moves the point through
//! it, and records where it landed in a histogram, blending the
//! landing cell's color toward the color the point carries.  Run long
//! enough, the histogram converges on the attractor of the function
//! set.  Points that leave the plane aren't recorded, but the game
//! keeps following them; they usually come back.

use crate::color::Rgb8;
use crate::fastmath::XorShiftRng;
use crate::functions::FlameFunctionSet;
use crate::histogram::Histogram;
use crate::planes::PlaneMapper;
use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::SeedableRng;

/// The state of one chaos game: its own random source, the running
/// point and color, and a tally of where its points went.
pub struct ChaosGame<'a> {
    functions: &'a FlameFunctionSet,
    plane: PlaneMapper,
    rng: XorShiftRng,
    unit: Uniform<f32>,
    span: Uniform<f32>,
    point: Complex<f32>,
    last_color: Rgb8,
    plotted: u64,
    discarded: u64,
}

impl<'a> ChaosGame<'a> {
    /// A game over `functions` that paints into histograms of
    /// `width × height` cells.  The starting point is drawn uniformly
    /// from the normalized square using a generator seeded with `seed`,
    /// so equal seeds replay equal games.
    pub fn new(functions: &'a FlameFunctionSet, width: usize, height: usize, seed: u64) -> Self {
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let span = Uniform::new(-1.0f32, 1.0);
        let point = Complex::new(span.sample(&mut rng), span.sample(&mut rng));
        ChaosGame {
            functions,
            plane: PlaneMapper::new(width, height),
            rng,
            unit: Uniform::new(0.0f32, 1.0),
            span,
            point,
            last_color: Rgb8::default(),
            plotted: 0,
            discarded: 0,
        }
    }

    /// The current position of the wandering point.
    pub fn point(&self) -> Complex<f32> {
        self.point
    }

    /// The color the next color-preserving step will paint with.
    pub fn last_color(&self) -> Rgb8 {
        self.last_color
    }

    /// Steps that landed in the histogram.
    pub fn plotted(&self) -> u64 {
        self.plotted
    }

    /// Steps that fell outside the histogram.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Plays one step.  Returns true if the step landed in the
    /// histogram.  A step that sends the point to infinity or NaN
    /// restarts it at a random spot in the square instead of keeping
    /// it as the running point.
    #[inline]
    pub fn step(&mut self, histogram: &mut Histogram) -> bool {
        let functions = self.functions;
        let function = match functions.select_function(self.unit.sample(&mut self.rng)) {
            Some(function) => function,
            None => return false,
        };
        self.point = function.apply(self.point);

        let offset = match self.plane.point_to_offset(&self.point) {
            Some(offset) => offset,
            None => {
                if !self.point.re.is_finite() || !self.point.im.is_finite() {
                    // Nothing comes back from infinity; start over.
                    self.point = Complex::new(
                        self.span.sample(&mut self.rng),
                        self.span.sample(&mut self.rng),
                    );
                }
                self.discarded += 1;
                return false;
            }
        };

        let color = function.color().unwrap_or(self.last_color);
        let entry = &mut histogram[offset];
        entry.count = entry.count.saturating_add(1);
        entry.color = entry.color.blend_with(&color, 0.5);
        self.last_color = color;
        self.plotted += 1;
        true
    }

    /// Plays `iterations` steps and returns how many of them landed.
    pub fn run(&mut self, histogram: &mut Histogram, iterations: usize) -> usize {
        debug_assert_eq!(
            (histogram.width(), histogram.height()),
            (self.plane.integral_plane.0, self.plane.integral_plane.1)
        );
        let mut landed = 0;
        for _ in 0..iterations {
            if self.step(histogram) {
                landed += 1;
            }
        }
        landed
    }
}
