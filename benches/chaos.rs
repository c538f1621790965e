// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#[macro_use]
extern crate criterion;
extern crate fractal_flame;

use criterion::Criterion;
use fractal_flame::fastmath::fast_log2;
use fractal_flame::{
    ChaosGame, Coefficients, FlameFunction, FlameFunctionSet, Histogram, Rgb8, Symmetry, Variation,
};

fn scene() -> FlameFunctionSet {
    let mut set = FlameFunctionSet::new();
    set.add_function(
        FlameFunction::linear(Coefficients::new(0.3, 0.0, 0.0, 0.0, 0.3, 0.0))
            .with_color(Rgb8::new(138, 43, 226)),
        1.0,
    );
    set.add_function(
        FlameFunction::new(
            vec![Variation::Swirl, Variation::Sinusoidal],
            vec![
                Coefficients::new(0.3, 0.0, 0.0, 0.0, 0.3, 0.5),
                Coefficients::new(0.3, 0.3, 0.2, 0.3, 0.7, 0.4),
            ],
            vec![0.8, 0.2],
        )
        .unwrap()
        .with_color(Rgb8::new(153, 50, 204)),
        1.0,
    );
    set.add_symmetries(&[Symmetry::Rotate72]);
    set
}

fn chaos_batch(c: &mut Criterion) {
    c.bench_function("chaos batch 2^15", |b| {
        let set = scene();
        let mut histogram = Histogram::new(512, 512);
        let mut game = ChaosGame::new(&set, 512, 512, 1);
        b.iter(|| game.run(&mut histogram, 2 << 14))
    });
}

fn log2(c: &mut Criterion) {
    c.bench_function("fast_log2", |b| {
        let mut v = 1u32;
        b.iter(|| {
            v = v.wrapping_mul(2_654_435_761).wrapping_add(1);
            fast_log2(v)
        })
    });
}

fn resolve(c: &mut Criterion) {
    c.bench_function("resolve 512x512 supersampled 2x", |b| {
        let set = scene();
        let mut histogram = Histogram::new(512, 512);
        ChaosGame::new(&set, 512, 512, 2).run(&mut histogram, 1_000_000);
        let mut out = vec![Rgb8::default(); histogram.resolved_len(2)];
        b.iter(|| histogram.resolve(&mut out, 2).unwrap())
    });
}

criterion_group!(benches, chaos_batch, log2, resolve);
criterion_main!(benches);
