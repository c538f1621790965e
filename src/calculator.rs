// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A Calculator runs one chaos game on its own thread, forever, into
//! its own histogram.  The only way to see the histogram is to take a
//! snapshot of it.
//!
//! The worker holds the histogram lock for a whole batch of
//! iterations at a time, so a snapshot always lands on a batch
//! boundary and never sees a half-updated cell.  Bigger batches mean
//! less locking overhead and longer waits for a snapshot.

use crate::chaos::ChaosGame;
use crate::errors::FlameError;
use crate::functions::FlameFunctionSet;
use crate::histogram::Histogram;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Iterations played per lock acquisition.
pub const DEFAULT_BATCH_SIZE: usize = 2 << 14;

enum State {
    Idle,
    Running(JoinHandle<()>),
    Stopped,
}

/// Owns a worker thread and the histogram it paints into.
pub struct Calculator {
    functions: Arc<FlameFunctionSet>,
    histogram: Arc<Mutex<Histogram>>,
    running: Arc<AtomicBool>,
    state: State,
    super_sampling: usize,
    seed: u64,
    batch_size: usize,
}

impl Calculator {
    /// A calculator for an output image of `width × height` pixels.
    /// The histogram is `super_sampling` times larger in each
    /// direction.  The seed is random unless set with `with_seed`.
    pub fn new(
        functions: Arc<FlameFunctionSet>,
        width: usize,
        height: usize,
        super_sampling: usize,
    ) -> Result<Self, FlameError> {
        if super_sampling == 0 {
            return Err(FlameError::InvalidSuperSampling);
        }
        if width == 0 || height == 0 {
            return Err(FlameError::InvalidDimensions(width, height));
        }
        Ok(Calculator {
            functions,
            histogram: Arc::new(Mutex::new(Histogram::new(
                width * super_sampling,
                height * super_sampling,
            ))),
            running: Arc::new(AtomicBool::new(false)),
            state: State::Idle,
            super_sampling,
            seed: rand::random(),
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Fixes the seed of the worker's random generator.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets how many iterations run per lock acquisition.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// The supersampling factor the histogram was sized with.
    pub fn super_sampling(&self) -> usize {
        self.super_sampling
    }

    /// The seed the worker's generator starts from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// True between `start` and `stop`.
    pub fn is_running(&self) -> bool {
        match self.state {
            State::Running(_) => true,
            _ => false,
        }
    }

    /// A blank histogram of the right size to receive snapshots.
    pub fn snapshot_histogram(&self) -> Result<Histogram, FlameError> {
        let histogram = self.histogram.lock().map_err(|_| FlameError::WorkerPanicked)?;
        Ok(Histogram::new(histogram.width(), histogram.height()))
    }

    /// Spawns the worker.  Starting a running calculator is an error,
    /// as is restarting a stopped one.
    pub fn start(&mut self) -> Result<(), FlameError> {
        match self.state {
            State::Running(_) => return Err(FlameError::AlreadyRunning),
            State::Stopped => return Err(FlameError::AlreadyStopped),
            State::Idle => {}
        }
        if self.functions.is_empty() {
            return Err(FlameError::EmptyFunctionSet);
        }

        self.running.store(true, Ordering::SeqCst);
        let functions = Arc::clone(&self.functions);
        let histogram = Arc::clone(&self.histogram);
        let running = Arc::clone(&self.running);
        let (seed, batch_size) = (self.seed, self.batch_size);

        let handle = thread::Builder::new()
            .name(format!("flame-{:x}", seed))
            .spawn(move || iterate(&functions, &histogram, &running, seed, batch_size))
            .map_err(|e| {
                error!("Could not spawn calculator thread: {}", e);
                FlameError::WorkerPanicked
            })?;
        info!("Calculator started, seed {:x}, batch {}", seed, batch_size);
        self.state = State::Running(handle);
        Ok(())
    }

    /// Signals the worker and waits for it to finish its current
    /// batch.  A no-op unless the calculator is running.
    pub fn stop(&mut self) -> Result<(), FlameError> {
        match std::mem::replace(&mut self.state, State::Stopped) {
            State::Running(handle) => {
                self.running.store(false, Ordering::SeqCst);
                handle.join().map_err(|_| FlameError::WorkerPanicked)?;
                info!("Calculator stopped, seed {:x}", self.seed);
                Ok(())
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Copies the live histogram into `out` under the worker's lock.
    /// `out` must have the histogram's dimensions.
    pub fn take_snapshot(&self, out: &mut Histogram) -> Result<(), FlameError> {
        let histogram = self.histogram.lock().map_err(|_| FlameError::WorkerPanicked)?;
        histogram.copy_to(out)
    }
}

impl Drop for Calculator {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Calculator did not shut down cleanly: {}", e);
        }
    }
}

fn iterate(
    functions: &FlameFunctionSet,
    histogram: &Mutex<Histogram>,
    running: &AtomicBool,
    seed: u64,
    batch_size: usize,
) {
    let (width, height) = match histogram.lock() {
        Ok(h) => (h.width(), h.height()),
        Err(_) => {
            error!("Histogram lock poisoned before the first batch");
            return;
        }
    };
    let mut game = ChaosGame::new(functions, width, height, seed);
    let mut batches: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let mut histogram = match histogram.lock() {
            Ok(h) => h,
            Err(_) => {
                error!("Histogram lock poisoned, worker {:x} exiting", seed);
                return;
            }
        };
        game.run(&mut histogram, batch_size);
        drop(histogram);
        batches += 1;
        trace!(
            "Worker {:x}: batch {}, {} plotted, {} discarded",
            seed,
            batches,
            game.plotted(),
            game.discarded()
        );
    }
    debug!(
        "Worker {:x} exiting after {} batches ({} plotted, {} discarded)",
        seed,
        batches,
        game.plotted(),
        game.discarded()
    );
}
