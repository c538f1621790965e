// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The consumer end of the engine.  A FlameRenderer keeps a set of
//! calculators running and turns their histograms into frames on
//! demand: snapshot each one, merge the snapshots, resolve.
//!
//! For a fixed amount of work there is also `accumulate`, which plays
//! a known number of iterations on every thread and merges the
//! results once they are all done.

use crate::calculator::{Calculator, DEFAULT_BATCH_SIZE};
use crate::chaos::ChaosGame;
use crate::color::Rgb8;
use crate::errors::FlameError;
use crate::functions::FlameFunctionSet;
use crate::histogram::{merge_histograms, Histogram};
use std::sync::Arc;

/// Everything about a render that isn't the function set.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Output width in pixels.
    pub width: usize,
    /// Output height in pixels.
    pub height: usize,
    /// Histogram cells per pixel, along each axis.
    pub super_sampling: usize,
    /// How many chaos games run side by side.
    pub threads: usize,
    /// Iterations per histogram lock.
    pub batch_size: usize,
    /// Base seed; thread `i` uses `seed + i`.  Random when `None`.
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1024,
            height: 1024,
            super_sampling: 2,
            threads: num_cpus::get(),
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
        }
    }
}

impl RenderConfig {
    /// Sets the output size.
    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the supersampling factor.
    pub fn with_super_sampling(mut self, super_sampling: usize) -> Self {
        self.super_sampling = super_sampling;
        self
    }

    /// Sets the thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of pixels in a resolved frame.
    pub fn frame_len(&self) -> usize {
        self.width * self.height
    }

    fn validate(&self) -> Result<(), FlameError> {
        if self.super_sampling == 0 {
            return Err(FlameError::InvalidSuperSampling);
        }
        if self.width == 0 || self.height == 0 || self.threads == 0 {
            return Err(FlameError::InvalidDimensions(self.width, self.height));
        }
        Ok(())
    }

    fn seed_for(&self, thread: usize) -> u64 {
        match self.seed {
            Some(seed) => seed.wrapping_add(thread as u64),
            None => rand::random(),
        }
    }
}

/// Runs a calculator per thread and resolves their combined work into
/// frames.
pub struct FlameRenderer {
    config: RenderConfig,
    calculators: Vec<Calculator>,
    snapshots: Vec<Histogram>,
}

impl FlameRenderer {
    /// Builds, but does not start, one calculator per configured
    /// thread, all sharing `functions`.
    pub fn new(
        functions: Arc<FlameFunctionSet>,
        config: RenderConfig,
    ) -> Result<Self, FlameError> {
        config.validate()?;
        if functions.is_empty() {
            return Err(FlameError::EmptyFunctionSet);
        }
        let mut calculators = Vec::with_capacity(config.threads);
        let mut snapshots = Vec::with_capacity(config.threads);
        for i in 0..config.threads {
            let calculator = Calculator::new(
                Arc::clone(&functions),
                config.width,
                config.height,
                config.super_sampling,
            )?
            .with_seed(config.seed_for(i))
            .with_batch_size(config.batch_size);
            snapshots.push(calculator.snapshot_histogram()?);
            calculators.push(calculator);
        }
        Ok(FlameRenderer {
            config,
            calculators,
            snapshots,
        })
    }

    /// The configuration this renderer was built with.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Starts every calculator.
    pub fn start(&mut self) -> Result<(), FlameError> {
        for calculator in self.calculators.iter_mut() {
            calculator.start()?;
        }
        info!(
            "Started {} calculators at {}x{} (supersampling {})",
            self.calculators.len(),
            self.config.width,
            self.config.height,
            self.config.super_sampling
        );
        Ok(())
    }

    /// Stops every calculator, waiting for each to finish its batch.
    pub fn stop(&mut self) -> Result<(), FlameError> {
        for calculator in self.calculators.iter_mut() {
            calculator.stop()?;
        }
        Ok(())
    }

    /// A black frame of the right size for `frame`.
    pub fn frame_buffer(&self) -> Vec<Rgb8> {
        vec![Rgb8::default(); self.config.frame_len()]
    }

    /// Snapshots every calculator, merges the snapshots in calculator
    /// order, and resolves the result into `out`.  Returns the total
    /// number of hits the frame was built from.
    pub fn frame(&mut self, out: &mut [Rgb8]) -> Result<u64, FlameError> {
        for (calculator, snapshot) in self.calculators.iter().zip(self.snapshots.iter_mut()) {
            calculator.take_snapshot(snapshot)?;
        }
        merge_histograms(&mut self.snapshots)?;
        let merged = &self.snapshots[0];
        merged.resolve(out, self.config.super_sampling)?;
        let hits = merged.total_count();
        debug!("Resolved frame from {} hits", hits);
        Ok(hits)
    }
}

impl Drop for FlameRenderer {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Renderer did not shut down cleanly: {}", e);
        }
    }
}

/// Plays `iterations` steps of the chaos game on each configured
/// thread, each into its own histogram, then merges them in thread
/// order.  The returned histogram is supersampled; resolve it with
/// `config.super_sampling`.  With a fixed seed the result is
/// reproducible.
pub fn accumulate(
    functions: &FlameFunctionSet,
    config: &RenderConfig,
    iterations: usize,
) -> Result<Histogram, FlameError> {
    config.validate()?;
    if functions.is_empty() {
        return Err(FlameError::EmptyFunctionSet);
    }
    let (width, height) = (
        config.width * config.super_sampling,
        config.height * config.super_sampling,
    );
    let seeds: Vec<u64> = (0..config.threads).map(|i| config.seed_for(i)).collect();

    let mut histograms = crossbeam::scope(|spawner| {
        let handles: Vec<_> = seeds
            .iter()
            .map(|&seed| {
                spawner.spawn(move |_| {
                    let mut histogram = Histogram::new(width, height);
                    let mut game = ChaosGame::new(functions, width, height, seed);
                    game.run(&mut histogram, iterations);
                    debug!(
                        "Seed {:x}: {} plotted, {} discarded",
                        seed,
                        game.plotted(),
                        game.discarded()
                    );
                    histogram
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| FlameError::WorkerPanicked))
            .collect::<Result<Vec<Histogram>, FlameError>>()
    })
    .map_err(|_| FlameError::WorkerPanicked)??;

    merge_histograms(&mut histograms)?;
    Ok(histograms.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Coefficients, FlameFunction};
    use std::thread;
    use std::time::Duration;
    use test_log::test;

    fn identity() -> FlameFunctionSet {
        let mut set = FlameFunctionSet::new();
        set.add_function(
            FlameFunction::linear(Coefficients::identity()).with_color(Rgb8::new(255, 255, 255)),
            1.0,
        );
        set
    }

    fn small() -> RenderConfig {
        RenderConfig::default()
            .with_size(8, 8)
            .with_super_sampling(2)
            .with_threads(3)
            .with_seed(100)
            .with_batch_size(256)
    }

    #[test]
    fn accumulate_counts_every_iteration() {
        let histogram = accumulate(&identity(), &small(), 1000).unwrap();
        assert_eq!((histogram.width(), histogram.height()), (16, 16));
        assert_eq!(histogram.total_count(), 3000);
    }

    #[test]
    fn accumulate_is_reproducible() {
        let mut set = FlameFunctionSet::new();
        set.add_function(FlameFunction::linear(Coefficients::new(0.5, 0.0, 0.5, 0.0, 0.5, 0.0)), 1.0);
        set.add_function(FlameFunction::linear(Coefficients::new(0.5, 0.0, -0.5, 0.0, 0.5, 0.5)), 1.0);
        set.add_function(FlameFunction::linear(Coefficients::rotation(2.0)), 0.5);
        set.normalize_probabilities();
        let a = accumulate(&set, &small(), 5000).unwrap();
        let b = accumulate(&set, &small(), 5000).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn accumulate_validates_its_inputs() {
        assert_eq!(
            accumulate(&FlameFunctionSet::new(), &small(), 10).err(),
            Some(FlameError::EmptyFunctionSet)
        );
        assert_eq!(
            accumulate(&identity(), &small().with_super_sampling(0), 10).err(),
            Some(FlameError::InvalidSuperSampling)
        );
    }

    #[test]
    fn live_frames_fill_up() {
        let mut renderer = FlameRenderer::new(Arc::new(identity()), small()).unwrap();
        let mut frame = renderer.frame_buffer();
        assert_eq!(frame.len(), 64);
        assert_eq!(renderer.frame(&mut frame).unwrap(), 0);
        assert!(frame.iter().all(|c| *c == Rgb8::default()));

        renderer.start().unwrap();
        let mut hits = 0;
        for _ in 0..200 {
            hits = renderer.frame(&mut frame).unwrap();
            if hits > 0 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        renderer.stop().unwrap();
        assert!(hits > 0);
        assert!(frame.iter().any(|c| *c != Rgb8::default()));
    }

    #[test]
    fn renderer_refuses_bad_configs() {
        assert!(FlameRenderer::new(Arc::new(identity()), small().with_threads(0)).is_err());
        assert!(FlameRenderer::new(Arc::new(FlameFunctionSet::new()), small()).is_err());
    }
}
