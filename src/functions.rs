// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The weighted collection of flame functions the chaos game picks
//! from, and the symmetry generators that extend it.

use crate::errors::FlameError;
use crate::transform::{Coefficients, FlameFunction};
use std::f64::consts::PI;
use std::str::FromStr;

/// Procedurally generated symmetries.  Each one adds linear,
/// color-preserving functions to a set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Symmetry {
    /// Reflection across the x axis.
    MirrorX,
    /// Reflection across the y axis.
    MirrorY,
    /// Two-fold rotation.
    Rotate180,
    /// Three-fold rotation.
    Rotate120,
    /// Four-fold rotation.
    Rotate90,
    /// Five-fold rotation.
    Rotate72,
    /// Six-fold rotation.
    Rotate60,
}

impl Symmetry {
    /// How many functions this symmetry adds to a set.
    pub fn extra_functions(self) -> usize {
        match self {
            Symmetry::MirrorX | Symmetry::MirrorY | Symmetry::Rotate180 => 1,
            Symmetry::Rotate120 => 2,
            Symmetry::Rotate90 => 3,
            Symmetry::Rotate72 => 4,
            Symmetry::Rotate60 => 5,
        }
    }

    /// The generated functions.  An N-fold rotation yields the N-1
    /// rotations by `2π·i/N`, never the identity.
    pub fn functions(self) -> Vec<FlameFunction> {
        match self {
            Symmetry::MirrorX => vec![FlameFunction::linear(Coefficients::new(
                1.0, 0.0, 0.0, 0.0, -1.0, 0.0,
            ))],
            Symmetry::MirrorY => vec![FlameFunction::linear(Coefficients::new(
                -1.0, 0.0, 0.0, 0.0, 1.0, 0.0,
            ))],
            _ => {
                let folds = self.extra_functions() + 1;
                (1..folds)
                    .map(|i| 2.0 * PI * (i as f64) / (folds as f64))
                    .map(|angle| FlameFunction::linear(Coefficients::rotation(angle)))
                    .collect()
            }
        }
    }
}

impl FromStr for Symmetry {
    type Err = FlameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mirror-x" | "mirrorx" => Ok(Symmetry::MirrorX),
            "mirror-y" | "mirrory" => Ok(Symmetry::MirrorY),
            "rotate180" => Ok(Symmetry::Rotate180),
            "rotate120" => Ok(Symmetry::Rotate120),
            "rotate90" => Ok(Symmetry::Rotate90),
            "rotate72" => Ok(Symmetry::Rotate72),
            "rotate60" => Ok(Symmetry::Rotate60),
            _ => Err(FlameError::UnknownSymmetry(s.to_string())),
        }
    }
}

/// Flame functions paired with the probability of the chaos game
/// picking them, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct FlameFunctionSet {
    functions: Vec<(f32, FlameFunction)>,
}

impl FlameFunctionSet {
    /// An empty set.
    pub fn new() -> Self {
        FlameFunctionSet::default()
    }

    /// The `(probability, function)` pairs, in insertion order.
    pub fn functions(&self) -> &[(f32, FlameFunction)] {
        &self.functions
    }

    /// Number of functions in the set.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// True when there is nothing to pick from.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Appends a function.  Probabilities need not sum to anything in
    /// particular until `normalize_probabilities` runs.
    pub fn add_function(&mut self, function: FlameFunction, probability: f32) {
        self.functions.push((probability, function));
    }

    /// Scales every probability so that they sum to 1.  A set whose
    /// probabilities sum to zero is left untouched.
    pub fn normalize_probabilities(&mut self) {
        let sum: f32 = self.functions.iter().map(|(p, _)| *p).sum();
        if sum <= 0.0 || !sum.is_finite() {
            warn!("Can't normalize probabilities summing to {}", sum);
            return;
        }
        let inverse = 1.0 / sum;
        for (p, _) in self.functions.iter_mut() {
            *p *= inverse;
        }
    }

    /// Normalizes the set, then appends the functions each symmetry
    /// generates.  With `total = 1 + Σ extra_functions`, existing
    /// probabilities are divided by `total` and every generated
    /// function gets `1 / total`, so the set still sums to 1.
    pub fn add_symmetries(&mut self, symmetries: &[Symmetry]) {
        self.normalize_probabilities();
        let total = 1 + symmetries
            .iter()
            .map(|s| s.extra_functions())
            .sum::<usize>();
        let total = total as f32;
        for (p, _) in self.functions.iter_mut() {
            *p /= total;
        }
        let probability = 1.0 / total;
        for symmetry in symmetries {
            for function in symmetry.functions() {
                self.functions.push((probability, function));
            }
        }
        debug!(
            "Added {} symmetries, set now holds {} functions",
            symmetries.len(),
            self.functions.len()
        );
    }

    /// Weighted pick: walks the set accumulating probability and
    /// returns the first function whose running total exceeds `u`.
    /// Rounding can leave the total short of `u`, in which case the
    /// last function wins.  `None` only for an empty set.
    pub fn select_function(&self, u: f32) -> Option<&FlameFunction> {
        let mut accum = 0.0;
        for (probability, function) in &self.functions {
            accum += probability;
            if u < accum {
                return Some(function);
            }
        }
        self.functions.last().map(|(_, function)| function)
    }
}
