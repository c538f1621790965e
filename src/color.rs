// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! An RGB triple parameterized over the width of its channels.
//!
//! The histogram stores 8-bit colors, but the supersampling resolve
//! needs to sum many of them without overflowing, so colors of
//! different widths have to mix.  Adding two colors yields a color of
//! the wider of the two channel types (see [`Widest`]); adding *into*
//! a color with `+=` is only allowed when the right-hand side is no
//! wider than the left, which we get for free from the standard
//! library's lossless `From` conversions between unsigned integers.
//! Sums saturate at the channel maximum rather than wrapping.

use num::traits::{PrimInt, Saturating, Unsigned};
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// An unsigned integer type usable as a color channel.
pub trait Channel: PrimInt + Unsigned + Default + fmt::Debug + Send + Sync + 'static {
    /// Size of one channel in bytes.
    const BYTES: usize;

    /// The channel value as a float.
    fn as_f32(self) -> f32;

    /// Explicit narrowing from a float.  Truncates toward zero and
    /// saturates at the bounds of the channel type.
    fn truncate_from(value: f32) -> Self;

    /// Reduces a raw random number into `[0, max)` for this channel.
    fn from_random(value: u32) -> Self;

    /// Writes the channel little-endian into `out`, which must be
    /// exactly `BYTES` long.
    fn write_le(self, out: &mut [u8]);
}

macro_rules! channel {
    ($($t:ty),*) => {
        $(
            impl Channel for $t {
                const BYTES: usize = std::mem::size_of::<$t>();

                #[inline]
                fn as_f32(self) -> f32 {
                    self as f32
                }

                #[inline]
                fn truncate_from(value: f32) -> Self {
                    value as $t
                }

                #[inline]
                fn from_random(value: u32) -> Self {
                    (u64::from(value) % (<$t>::max_value() as u64)) as $t
                }

                #[inline]
                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

channel!(u8, u16, u32);

/// Picks the wider of two channel types.
pub trait Widest<Rhs: Channel>: Channel {
    /// The wider type; ties resolve to the shared type.
    type Output: Channel;
}

macro_rules! widest {
    ($($l:ty, $r:ty => $o:ty;)*) => {
        $( impl Widest<$r> for $l { type Output = $o; } )*
    };
}

widest! {
    u8, u8 => u8;
    u8, u16 => u16;
    u8, u32 => u32;
    u16, u8 => u16;
    u16, u16 => u16;
    u16, u32 => u32;
    u32, u8 => u32;
    u32, u16 => u32;
    u32, u32 => u32;
}

/// An RGB color, channels stored in r, g, b order.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color<T: Channel> {
    rgb: [T; 3],
}

/// The color the histogram stores.
pub type Rgb8 = Color<u8>;
/// A 16-bit accumulator color.
pub type Rgb16 = Color<u16>;

impl<T: Channel> Color<T> {
    /// Builds a color from its three channels.
    pub fn new(r: T, g: T, b: T) -> Self {
        Color { rgb: [r, g, b] }
    }

    /// Red channel.
    pub fn r(&self) -> T {
        self.rgb[0]
    }

    /// Green channel.
    pub fn g(&self) -> T {
        self.rgb[1]
    }

    /// Blue channel.
    pub fn b(&self) -> T {
        self.rgb[2]
    }

    /// All three channels, in r, g, b order.
    pub fn channels(&self) -> [T; 3] {
        self.rgb
    }

    /// A color whose channels are each `rnd() % max`, where `max` is
    /// the largest value of the channel type.
    pub fn random<F: FnMut() -> u32>(mut rnd: F) -> Self {
        let r = T::from_random(rnd());
        let g = T::from_random(rnd());
        let b = T::from_random(rnd());
        Color::new(r, g, b)
    }

    /// Multiplies every channel by `ratio` and narrows (or widens) the
    /// result into a color of another width.
    pub fn scale_to<U: Channel>(&self, ratio: f32) -> Color<U> {
        Color::new(
            U::truncate_from(self.rgb[0].as_f32() * ratio),
            U::truncate_from(self.rgb[1].as_f32() * ratio),
            U::truncate_from(self.rgb[2].as_f32() * ratio),
        )
    }

    /// Multiplies every channel by `ratio`.
    pub fn scale(&self, ratio: f32) -> Self {
        self.scale_to(ratio)
    }

    /// Blends this color with another.  A ratio of 1 yields `other`
    /// entirely, a ratio of 0 yields `self`.
    pub fn blend_with(&self, other: &Color<T>, ratio: f32) -> Self {
        let mix = |l: T, r: T| T::truncate_from(l.as_f32() * (1.0 - ratio) + r.as_f32() * ratio);
        Color::new(
            mix(self.rgb[0], other.rgb[0]),
            mix(self.rgb[1], other.rgb[1]),
            mix(self.rgb[2], other.rgb[2]),
        )
    }

    /// Number of bytes `copy_to` writes.
    pub fn byte_len() -> usize {
        3 * T::BYTES
    }

    /// Writes r, g, b little-endian into the front of `out`.
    ///
    /// # Panics
    /// Panics if `out` is shorter than [`Color::byte_len`].
    pub fn copy_to(&self, out: &mut [u8]) {
        for (channel, chunk) in self.rgb.iter().zip(out[..Self::byte_len()].chunks_mut(T::BYTES)) {
            channel.write_le(chunk);
        }
    }

    /// Writes b, g, r little-endian into the front of `out`, for pixel
    /// buffers with inverted channel order.
    ///
    /// # Panics
    /// Panics if `out` is shorter than [`Color::byte_len`].
    pub fn copy_to_reversed(&self, out: &mut [u8]) {
        for (channel, chunk) in self.rgb.iter().rev().zip(out[..Self::byte_len()].chunks_mut(T::BYTES)) {
            channel.write_le(chunk);
        }
    }

    /// The color as r, g, b little-endian bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![0; Self::byte_len()];
        self.copy_to(&mut out);
        out
    }

    /// The color as b, g, r little-endian bytes.
    pub fn to_bytes_reversed(&self) -> Vec<u8> {
        let mut out = vec![0; Self::byte_len()];
        self.copy_to_reversed(&mut out);
        out
    }
}

impl<T, U> Add<Color<U>> for Color<T>
where
    U: Channel + Into<<T as Widest<U>>::Output>,
    T: Widest<U> + Into<<T as Widest<U>>::Output>,
{
    type Output = Color<<T as Widest<U>>::Output>;

    fn add(self, rhs: Color<U>) -> Self::Output {
        let sum = |l: T, r: U| {
            let l: <T as Widest<U>>::Output = l.into();
            l.saturating_add(r.into())
        };
        Color::new(
            sum(self.rgb[0], rhs.rgb[0]),
            sum(self.rgb[1], rhs.rgb[1]),
            sum(self.rgb[2], rhs.rgb[2]),
        )
    }
}

impl<T: Channel, U: Channel + Into<T>> AddAssign<Color<U>> for Color<T> {
    fn add_assign(&mut self, rhs: Color<U>) {
        for (l, r) in self.rgb.iter_mut().zip(rhs.rgb.iter()) {
            *l = (*l).saturating_add((*r).into());
        }
    }
}

impl<T: Channel> Mul<f32> for Color<T> {
    type Output = Color<T>;

    fn mul(self, ratio: f32) -> Self::Output {
        self.scale(ratio)
    }
}
