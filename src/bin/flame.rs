// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate failure;
extern crate fractal_flame;
extern crate image;
#[macro_use]
extern crate log;
extern crate num_cpus;

use clap::{App, Arg, ArgMatches};
use fractal_flame::{
    accumulate, Coefficients, FlameFunction, FlameFunctionSet, FlameRenderer, RenderConfig, Rgb8,
    Symmetry, Variation,
};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const SUPERSAMPLING: &str = "supersampling";
const THREADS: &str = "threads";
const SYMMETRY: &str = "symmetry";
const SEED: &str = "seed";
const ITERATIONS: &str = "iterations";
const MILLIS: &str = "millis";
const INTERVAL: &str = "interval";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("flame")
        .version("0.1.0")
        .about("Fractal flame renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension (png, ppm, bmp, ...)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1024x1024")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(SUPERSAMPLING)
                .long(SUPERSAMPLING)
                .short("S")
                .takes_value(true)
                .default_value("2")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        8,
                        "Could not parse supersampling factor",
                        "Supersampling must be between 1 and 8",
                    )
                })
                .help("Histogram cells per output pixel, along each axis"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of calculators to run (default: one per CPU)"),
        )
        .arg(
            Arg::with_name(SYMMETRY)
                .long(SYMMETRY)
                .short("y")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .validator(|s| {
                    Symmetry::from_str(&s)
                        .map(|_| ())
                        .map_err(|e| e.to_string())
                })
                .help("Symmetry to add: mirror-x, mirror-y, rotate180, rotate120, rotate90, rotate72, rotate60"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Base seed for the calculators' random generators"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .conflicts_with(MILLIS)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        usize::max_value(),
                        "Could not parse iteration count",
                        "Iteration count must be positive",
                    )
                })
                .help("Render a fixed number of iterations per thread instead of running for a time"),
        )
        .arg(
            Arg::with_name(MILLIS)
                .long(MILLIS)
                .short("m")
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        u64::max_value(),
                        "Could not parse run time",
                        "Run time must be positive",
                    )
                })
                .help("How long the calculators run, in milliseconds (default: 5000)"),
        )
        .arg(
            Arg::with_name(INTERVAL)
                .long(INTERVAL)
                .takes_value(true)
                .conflicts_with(ITERATIONS)
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        u64::max_value(),
                        "Could not parse poll interval",
                        "Poll interval must be positive",
                    )
                })
                .help("Milliseconds between frames while the calculators run (default: 100)"),
        )
        .get_matches()
}

/// Three colored functions: a shrink toward the origin, a
/// heart/sinusoidal blend, and a shifted spherical inversion.
fn default_functions(symmetries: &[Symmetry]) -> Result<FlameFunctionSet, failure::Error> {
    let mut set = FlameFunctionSet::new();
    set.add_function(
        FlameFunction::linear(Coefficients::new(0.3, 0.0, 0.0, 0.0, 0.3, 0.0))
            .with_color(Rgb8::new(138, 43, 226)),
        0.33,
    );
    set.add_function(
        FlameFunction::new(
            vec![Variation::Heart, Variation::Sinusoidal],
            vec![
                Coefficients::new(0.3, 0.0, 0.0, 0.0, 0.3, 0.5),
                Coefficients::new(0.3, 0.3, 0.2, 0.3, 0.7, 0.4),
            ],
            vec![0.8, 0.2],
        )?
        .with_color(Rgb8::new(153, 50, 204)),
        0.33,
    );
    set.add_function(
        FlameFunction::new(
            vec![Variation::Spherical],
            vec![Coefficients::new(0.3, 0.0, 0.5, 0.0, 0.3, 0.0)],
            vec![1.0],
        )?
        .with_color(Rgb8::new(255, 105, 180)),
        0.33,
    );
    set.normalize_probabilities();
    set.add_symmetries(symmetries);
    Ok(set)
}

fn write_image(outfile: &str, pixels: &[Rgb8], bounds: (usize, usize)) -> Result<(), failure::Error> {
    let mut raw = vec![0u8; pixels.len() * Rgb8::byte_len()];
    for (pixel, chunk) in pixels.iter().zip(raw.chunks_mut(Rgb8::byte_len())) {
        pixel.copy_to(chunk);
    }
    image::save_buffer(
        Path::new(outfile),
        &raw,
        bounds.0 as u32,
        bounds.1 as u32,
        image::ColorType::RGB(8),
    )?;
    Ok(())
}

fn run() -> Result<(), failure::Error> {
    let matches = args();
    let image_size: (usize, usize) =
        parse_pair(matches.value_of(SIZE).unwrap_or("1024x1024"), 'x')
            .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;
    let super_sampling = usize::from_str(matches.value_of(SUPERSAMPLING).unwrap_or("2"))?;
    let threads = match matches.value_of(THREADS) {
        Some(t) => usize::from_str(t)?,
        None => num_cpus::get(),
    };
    let symmetries = match matches.values_of(SYMMETRY) {
        Some(values) => values
            .map(Symmetry::from_str)
            .collect::<Result<Vec<_>, _>>()?,
        None => vec![],
    };

    let mut config = RenderConfig::default()
        .with_size(image_size.0, image_size.1)
        .with_super_sampling(super_sampling)
        .with_threads(threads);
    if let Some(seed) = matches.value_of(SEED) {
        config = config.with_seed(u64::from_str(seed)?);
    }

    let functions = default_functions(&symmetries)?;
    info!(
        "Rendering {}x{} with {} functions on {} threads",
        config.width,
        config.height,
        functions.len(),
        config.threads
    );

    let frame = match matches.value_of(ITERATIONS) {
        Some(iterations) => {
            let iterations = usize::from_str(iterations)?;
            let histogram = accumulate(&functions, &config, iterations)?;
            let mut frame = vec![Rgb8::default(); config.frame_len()];
            histogram.resolve(&mut frame, config.super_sampling)?;
            info!("Accumulated {} hits", histogram.total_count());
            frame
        }
        None => {
            let millis = u64::from_str(matches.value_of(MILLIS).unwrap_or("5000"))?;
            let interval = u64::from_str(matches.value_of(INTERVAL).unwrap_or("100"))?;
            let mut renderer = FlameRenderer::new(Arc::new(functions), config.clone())?;
            let mut frame = renderer.frame_buffer();
            let deadline = Instant::now() + Duration::from_millis(millis);
            renderer.start()?;
            while Instant::now() < deadline {
                thread::sleep(Duration::from_millis(interval));
                let hits = renderer.frame(&mut frame)?;
                debug!("Frame from {} hits", hits);
            }
            renderer.stop()?;
            let hits = renderer.frame(&mut frame)?;
            info!("Final frame from {} hits", hits);
            frame
        }
    };

    let output = matches.value_of(OUTPUT).unwrap_or("flame.png");
    write_image(output, &frame, image_size)?;
    info!("Wrote {}", output);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = run() {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
