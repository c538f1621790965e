#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Fractal flame renderer
//!
//! A fractal flame is the attractor of an iterated function system: a
//! handful of functions, each a weighted sum of an affine map bent
//! through some nonlinear "variation," picked at random with fixed
//! probabilities.  Start a point anywhere, keep moving it through
//! randomly chosen functions, and the places it visits trace out the
//! flame.  This is the "chaos game."
//!
//! Every visit is recorded in a histogram that counts hits per cell
//! and blends in the color of the function that produced the hit.
//! Because the counts span many orders of magnitude, the histogram is
//! resolved into an image on a log scale, optionally rendered larger
//! than the output and averaged down for antialiasing.
//!
//! The chaos game is embarrassingly parallel: each
//! [`Calculator`](calculator::Calculator) plays its own game on its
//! own thread into its own histogram, sharing one read-only
//! [`FlameFunctionSet`](functions::FlameFunctionSet).  A consumer takes
//! snapshots of every calculator's histogram, merges them with
//! [`merge_histograms`](histogram::merge_histograms), and resolves the
//! result.  [`FlameRenderer`](render::FlameRenderer) packages that loop.

extern crate crossbeam;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;
extern crate rand;

pub mod calculator;
pub mod chaos;
pub mod color;
pub mod errors;
pub mod fastmath;
pub mod functions;
pub mod histogram;
pub mod planes;
pub mod render;
pub mod transform;

pub use calculator::Calculator;
pub use chaos::ChaosGame;
pub use color::{Color, Rgb16, Rgb8};
pub use errors::FlameError;
pub use functions::{FlameFunctionSet, Symmetry};
pub use histogram::{merge_histograms, Histogram, HistogramEntry};
pub use render::{accumulate, FlameRenderer, RenderConfig};
pub use transform::{Coefficients, FlameFunction, Transform, Variation};
