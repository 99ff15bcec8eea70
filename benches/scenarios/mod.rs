//! Whole-voice benchmarks.
//!
//! These run the complete voice graph the way a host would: globals once,
//! then every voice, block by block.

mod voices;

pub use voices::bench_voices;
