//! Layer configuration
//!
//! Plain, serializable descriptions of layer topology. They are validated once
//! before any storage is allocated.

use crate::error::{ConvError, Result};
use serde::{Deserialize, Serialize};

/// Number of history frames needed to cover a dilated kernel
///
/// `(kernel_size - 1) * dilation_rate + 1`. Usable in const generic arguments,
/// e.g. `Conv1DT<f32, 1, 1, 3, 2, { state_size(3, 2) }>`.
pub const fn state_size(kernel_size: usize, dilation_rate: usize) -> usize {
    (kernel_size - 1) * dilation_rate + 1
}

/// [`state_size`] that returns `None` on a zero kernel or on overflow
pub const fn checked_state_size(kernel_size: usize, dilation_rate: usize) -> Option<usize> {
    if kernel_size == 0 {
        return None;
    }
    match (kernel_size - 1).checked_mul(dilation_rate) {
        Some(span) => span.checked_add(1),
        None => None,
    }
}

fn checked_product(factors: &[usize], what: &str) -> Result<usize> {
    factors
        .iter()
        .try_fold(1usize, |acc, &f| acc.checked_mul(f))
        .ok_or_else(|| ConvError::SizeOverflow {
            reason: format!("{} {:?} does not fit in usize", what, factors),
        })
}

fn check_size(param: &'static str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(ConvError::InvalidSize { param, value });
    }
    Ok(())
}

/// Topology of a dilated causal convolution layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conv1DConfig {
    /// Input channel count
    pub in_size: usize,
    /// Output channel count
    pub out_size: usize,
    /// Taps per input channel
    pub kernel_size: usize,
    /// Spacing in frames between consecutive taps
    #[serde(default = "default_dilation")]
    pub dilation_rate: usize,
}

fn default_dilation() -> usize {
    1
}

impl Conv1DConfig {
    pub fn new(in_size: usize, out_size: usize, kernel_size: usize, dilation_rate: usize) -> Self {
        Self {
            in_size,
            out_size,
            kernel_size,
            dilation_rate,
        }
    }

    /// Check every size is at least 1 and every buffer the layer allocates
    /// has a representable length
    pub fn validate(&self) -> Result<()> {
        check_size("in_size", self.in_size)?;
        check_size("out_size", self.out_size)?;
        check_size("kernel_size", self.kernel_size)?;
        check_size("dilation_rate", self.dilation_rate)?;

        let state = checked_state_size(self.kernel_size, self.dilation_rate).ok_or_else(|| {
            ConvError::SizeOverflow {
                reason: format!(
                    "state size for kernel_size {} and dilation_rate {}",
                    self.kernel_size, self.dilation_rate
                ),
            }
        })?;
        checked_product(&[self.in_size, state], "history length")?;
        checked_product(&[self.in_size, self.kernel_size], "window length")?;
        checked_product(
            &[self.out_size, self.kernel_size, self.in_size],
            "weight count",
        )?;
        Ok(())
    }

    /// Receptive field of the layer in frames
    ///
    /// Only meaningful for a validated config.
    pub fn state_size(&self) -> usize {
        state_size(self.kernel_size, self.dilation_rate)
    }
}

/// Topology of a fully-connected layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenseConfig {
    pub in_size: usize,
    pub out_size: usize,
}

impl DenseConfig {
    pub fn new(in_size: usize, out_size: usize) -> Self {
        Self { in_size, out_size }
    }

    pub fn validate(&self) -> Result<()> {
        check_size("in_size", self.in_size)?;
        check_size("out_size", self.out_size)?;
        checked_product(&[self.out_size, self.in_size], "weight count")?;
        Ok(())
    }
}
