//! Domain types for siglab

pub mod candle;

pub use candle::{validate_candles, Candle, PriceField};
