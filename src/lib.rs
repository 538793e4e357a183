//! streamconv - Streaming Causal Convolution for Real-Time Audio
//!
//! Sample-accurate neural-network inference inside an audio callback. Layers
//! process one frame at a time with fixed memory and fixed cost per frame:
//! nothing on the `forward` path allocates, locks or blocks.
//!
//! # Architecture
//!
//! - `layers`: the dilated causal `Conv1D` (runtime-sized) and `Conv1DT`
//!   (compile-time-sized) built on a ring-buffer frame history, plus the
//!   `Dense` and `Activation` layers they are usually chained with
//! - `model`: sequential layer chains and the JSON model-description loader
//! - `signal`: WAV and text signal I/O for offline tooling
//! - `cli`: the `streamconv-cli` command implementations

pub mod cli;
pub mod error;
pub mod layers;
pub mod model;
pub mod signal;

pub use error::{ConvError, Result};
pub use layers::{Conv1D, Conv1DT, Layer};
pub use model::Model;
