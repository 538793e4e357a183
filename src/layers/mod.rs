//! Inference layers
//!
//! All layers implement the `Layer` trait for uniform frame-by-frame
//! processing. The dilated causal convolution comes in two shapes:
//! `Conv1D` (sizes chosen at runtime) and `Conv1DT` (sizes fixed at compile
//! time). Both share the same ring-buffer history semantics.

mod activation;
mod config;
mod conv1d;
mod conv1d_fixed;
mod dense;
mod history;
mod layer;
pub mod offline;

pub use activation::{Activation, ActivationKind};
pub use config::{checked_state_size, state_size, Conv1DConfig, DenseConfig};
pub use conv1d::Conv1D;
pub use conv1d_fixed::Conv1DT;
pub use dense::Dense;
pub use layer::{Layer, Scalar};
