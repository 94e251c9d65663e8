//! Byte quantization of values already mapped into `[0, 1]`.

use super::{Encoding, Vec2};
use std::marker::PhantomData;

fn quantize(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * f32::from(u8::MAX)) as u8
}

fn dequantize(b: u8) -> f32 {
    f32::from(b) / f32::from(u8::MAX)
}

/// Quantizes the `f32` produced by `B` to one byte.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedByte<B>(PhantomData<B>);

impl<B, T> Encoding<T, u8> for NormalizedByte<B>
where
    B: Encoding<T, f32>,
{
    fn encode(value: T) -> u8 {
        quantize(B::encode(value))
    }

    fn decode(value: u8) -> T {
        B::decode(dequantize(value))
    }
}

/// Quantizes each component of the [`Vec2`] produced by `B` to one byte.
#[derive(Debug, Clone, Copy)]
pub struct NormalizedVec2Bytes<B>(PhantomData<B>);

impl<B, T> Encoding<T, (u8, u8)> for NormalizedVec2Bytes<B>
where
    B: Encoding<T, Vec2>,
{
    fn encode(value: T) -> (u8, u8) {
        let to = B::encode(value);
        (quantize(to.x), quantize(to.y))
    }

    fn decode((x, y): (u8, u8)) -> T {
        B::decode(Vec2::new(dequantize(x), dequantize(y)))
    }
}
