// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error type shared by every fallible operation in the crate.
//!
//! Nothing in here is transient: every variant is a misuse of the
//! API, and callers are expected to treat them as fatal.

use failure::Fail;

/// Contract violations reported by the flame engine.
#[derive(Debug, Fail, PartialEq)]
pub enum FlameError {
    /// `start()` was called on a calculator whose worker is running.
    #[fail(display = "Can't start a calculator twice")]
    AlreadyRunning,

    /// `start()` was called on a calculator that has already been
    /// stopped; stopped is a terminal state.
    #[fail(display = "Calculator has been stopped and can't be restarted")]
    AlreadyStopped,

    /// Two histograms that must share dimensions do not.
    #[fail(display = "Histogram size mismatch: {}x{} vs {}x{}", _0, _1, _2, _3)]
    SizeMismatch(usize, usize, usize, usize),

    /// A flame function was built from lists of different lengths.
    #[fail(
        display = "Mismatched transform lists: {} variations, {} coefficients, {} weights",
        variations, coefficients, weights
    )]
    MismatchedTransforms {
        /// Number of variations supplied.
        variations: usize,
        /// Number of coefficient sets supplied.
        coefficients: usize,
        /// Number of weights supplied.
        weights: usize,
    },

    /// The output buffer handed to `resolve` has the wrong length.
    #[fail(display = "Output buffer holds {} colors, expected {}", actual, expected)]
    OutputSizeMismatch {
        /// The length `resolve` needs.
        expected: usize,
        /// The length it was given.
        actual: usize,
    },

    /// Supersampling factors start at 1.
    #[fail(display = "Supersampling factor must be at least 1")]
    InvalidSuperSampling,

    /// Histograms and images can't be empty.
    #[fail(display = "Invalid dimensions {}x{}", _0, _1)]
    InvalidDimensions(usize, usize),

    /// A chaos game needs at least one function to pick from.
    #[fail(display = "The flame function set is empty")]
    EmptyFunctionSet,

    /// A worker thread panicked, or poisoned the histogram lock.
    #[fail(display = "A calculator worker thread panicked")]
    WorkerPanicked,

    /// The name given does not match any known symmetry.
    #[fail(display = "Unknown symmetry: {}", _0)]
    UnknownSymmetry(String),
}
