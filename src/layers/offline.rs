//! Offline (batch) dilated causal convolution
//!
//! Evaluates the whole signal at once by direct indexing into the input,
//! with samples before time 0 treated as zero. Allocates its output, so it is
//! for rendering and verification, not for the real-time thread.

use super::config::checked_state_size;
use super::conv1d::check_kernel_shape;
use super::layer::Scalar;
use crate::error::{ConvError, Result};

/// Convolve a sequence of frames (`[time][channel]`) with `[out][in][kernel]`
/// weights
///
/// `output[t][o] = bias[o] + sum_{c,k} weights[o][c][k] * input[t - (K-1-k) * dilation][c]`
///
/// # Errors
/// `InvalidSize` for a zero dilation or empty kernel, `SizeOverflow` if the
/// receptive field does not fit in `usize`, `WeightShape` /
/// `BiasShape` for inconsistent parameters, `ModelFormat` if an input frame
/// has the wrong number of channels.
pub fn causal_conv1d<T: Scalar>(
    input: &[Vec<T>],
    weights: &[Vec<Vec<T>>],
    bias: &[T],
    dilation_rate: usize,
) -> Result<Vec<Vec<T>>> {
    if dilation_rate == 0 {
        return Err(ConvError::InvalidSize {
            param: "dilation_rate",
            value: 0,
        });
    }
    let out_size = weights.len();
    let in_size = weights.first().map_or(0, |w| w.len());
    let kernel_size = weights
        .first()
        .and_then(|w| w.first())
        .map_or(0, |taps| taps.len());
    if kernel_size == 0 {
        return Err(ConvError::InvalidSize {
            param: "kernel_size",
            value: 0,
        });
    }
    if checked_state_size(kernel_size, dilation_rate).is_none() {
        return Err(ConvError::SizeOverflow {
            reason: format!(
                "state size for kernel_size {} and dilation_rate {}",
                kernel_size, dilation_rate
            ),
        });
    }
    check_kernel_shape(weights, out_size, in_size, kernel_size)?;
    if bias.len() != out_size {
        return Err(ConvError::BiasShape {
            expected: out_size,
            found: bias.len(),
        });
    }
    if let Some(t) = input.iter().position(|frame| frame.len() != in_size) {
        return Err(ConvError::ModelFormat {
            reason: format!(
                "input frame {} has {} channels, expected {}",
                t,
                input[t].len(),
                in_size
            ),
        });
    }

    let output = (0..input.len())
        .map(|t| {
            (0..out_size)
                .map(|o| {
                    let mut acc = bias[o];
                    for k in 0..kernel_size {
                        let lookback = (kernel_size - 1 - k) * dilation_rate;
                        if lookback > t {
                            continue;
                        }
                        let frame = &input[t - lookback];
                        for c in 0..in_size {
                            acc = acc + weights[o][c][k] * frame[c];
                        }
                    }
                    acc
                })
                .collect()
        })
        .collect();
    Ok(output)
}

/// Mono convenience wrapper: one input and one output channel
pub fn causal_conv1d_mono<T: Scalar>(
    input: &[T],
    kernel: &[T],
    bias: T,
    dilation_rate: usize,
) -> Result<Vec<T>> {
    let frames: Vec<Vec<T>> = input.iter().map(|&x| vec![x]).collect();
    let output = causal_conv1d(&frames, &[vec![kernel.to_vec()]], &[bias], dilation_rate)?;
    Ok(output.into_iter().map(|frame| frame[0]).collect())
}
