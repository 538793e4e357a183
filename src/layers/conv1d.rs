//! Dilated causal 1-D convolution, runtime-sized
//!
//! Streams one frame at a time: each input frame is written into a ring of
//! past frames, the dilated taps are gathered oldest first, and every output
//! channel is the dot product of its kernel with the gathered window plus a
//! bias. Equivalent to a batch causal convolution with zero padding before the
//! first frame.

use super::config::Conv1DConfig;
use super::history::HistoryBuffer;
use super::layer::{Layer, Scalar};
use crate::error::{ConvError, Result};
use crate::impl_layer_common;
use log::debug;

/// Streaming dilated causal convolution with sizes chosen at runtime
///
/// All storage is allocated in [`Conv1D::new`]; `forward` only reads and
/// writes existing buffers.
///
/// # Example
/// ```
/// use streamconv::layers::{Conv1D, Layer};
///
/// // y[t] = x[t] + x[t - 2]
/// let mut conv = Conv1D::<f32>::new(1, 1, 2, 2).unwrap();
/// conv.set_weights(&[vec![vec![1.0, 1.0]]]).unwrap();
/// conv.set_bias(&[0.0]).unwrap();
///
/// let mut out = [0.0];
/// let outputs: Vec<f32> = [1.0, 2.0, 3.0, 4.0, 5.0]
///     .iter()
///     .map(|&x| {
///         conv.forward(&[x], &mut out);
///         out[0]
///     })
///     .collect();
/// assert_eq!(outputs, vec![1.0, 2.0, 4.0, 6.0, 8.0]);
/// ```
#[derive(Debug)]
pub struct Conv1D<T> {
    in_size: usize,
    out_size: usize,
    kernel_size: usize,
    dilation_rate: usize,
    /// One kernel per output channel, laid out like the gathered window
    /// (`o * kernel_size * in_size + k * in_size + c`)
    weights: Vec<T>,
    bias: Vec<T>,
    history: HistoryBuffer<T>,
}

impl<T: Scalar> Conv1D<T> {
    /// Create a convolution layer with zero weights and bias
    ///
    /// # Errors
    /// `InvalidSize` if any size is zero.
    pub fn new(
        in_size: usize,
        out_size: usize,
        kernel_size: usize,
        dilation_rate: usize,
    ) -> Result<Self> {
        Self::from_config(&Conv1DConfig::new(
            in_size,
            out_size,
            kernel_size,
            dilation_rate,
        ))
    }

    /// Create a convolution layer from a validated topology
    pub fn from_config(config: &Conv1DConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "conv1d: in={} out={} kernel={} dilation={} state={}",
            config.in_size,
            config.out_size,
            config.kernel_size,
            config.dilation_rate,
            config.state_size()
        );
        Ok(Self {
            in_size: config.in_size,
            out_size: config.out_size,
            kernel_size: config.kernel_size,
            dilation_rate: config.dilation_rate,
            weights: vec![T::zero(); config.out_size * config.kernel_size * config.in_size],
            bias: vec![T::zero(); config.out_size],
            history: HistoryBuffer::new(config.in_size, config.kernel_size, config.dilation_rate),
        })
    }

    /// Topology of this layer
    pub fn config(&self) -> Conv1DConfig {
        Conv1DConfig::new(
            self.in_size,
            self.out_size,
            self.kernel_size,
            self.dilation_rate,
        )
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn dilation_rate(&self) -> usize {
        self.dilation_rate
    }

    /// Receptive field in frames
    pub fn state_size(&self) -> usize {
        self.history.state_size()
    }

    /// Load kernel weights indexed `[out][in][kernel]`
    ///
    /// Tap `0` multiplies the oldest sample in the receptive field and tap
    /// `kernel_size - 1` the current frame.
    ///
    /// # Errors
    /// `WeightShape` if the nesting does not match the layer's sizes. The
    /// current weights are left untouched in that case.
    pub fn set_weights(&mut self, weights: &[Vec<Vec<T>>]) -> Result<()> {
        check_kernel_shape(weights, self.out_size, self.in_size, self.kernel_size)?;

        let span = self.kernel_size * self.in_size;
        for (o, per_out) in weights.iter().enumerate() {
            let kernel = &mut self.weights[o * span..(o + 1) * span];
            for (c, taps) in per_out.iter().enumerate() {
                for (k, &w) in taps.iter().enumerate() {
                    kernel[k * self.in_size + c] = w;
                }
            }
        }
        debug!("conv1d: loaded {} kernel weights", self.weights.len());
        Ok(())
    }

    /// Load one bias value per output channel
    ///
    /// # Errors
    /// `BiasShape` if `bias.len() != out_size`.
    pub fn set_bias(&mut self, bias: &[T]) -> Result<()> {
        if bias.len() != self.out_size {
            return Err(ConvError::BiasShape {
                expected: self.out_size,
                found: bias.len(),
            });
        }
        self.bias.copy_from_slice(bias);
        Ok(())
    }

    /// Get the kernel weight for output `o`, input channel `c`, tap `k`
    pub fn weight(&self, o: usize, c: usize, k: usize) -> T {
        self.weights[o * self.kernel_size * self.in_size + k * self.in_size + c]
    }

    pub fn bias(&self) -> &[T] {
        &self.bias
    }
}

impl<T: Scalar> Clone for Conv1D<T> {
    /// Re-derives an independent layer: same sizes, weights and bias, and a
    /// fresh zeroed history.
    fn clone(&self) -> Self {
        Self {
            in_size: self.in_size,
            out_size: self.out_size,
            kernel_size: self.kernel_size,
            dilation_rate: self.dilation_rate,
            weights: self.weights.clone(),
            bias: self.bias.clone(),
            history: self.history.clone(),
        }
    }

    /// Assignment reuses the existing allocations when the shapes agree.
    fn clone_from(&mut self, source: &Self) {
        if self.config() == source.config() {
            self.weights.copy_from_slice(&source.weights);
            self.bias.copy_from_slice(&source.bias);
            self.history.reset();
        } else {
            *self = source.clone();
        }
    }
}

impl<T: Scalar> Layer<T> for Conv1D<T> {
    impl_layer_common!("conv1d");

    #[inline]
    fn forward(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(output.len(), self.out_size, "output frame has wrong length");

        self.history.write(input);
        let window = self.history.gather();

        let span = window.len();
        for ((out, kernel), &b) in output
            .iter_mut()
            .zip(self.weights.chunks_exact(span))
            .zip(&self.bias)
        {
            *out = kernel
                .iter()
                .zip(window)
                .fold(T::zero(), |acc, (&w, &x)| acc + w * x)
                + b;
        }
    }

    fn reset(&mut self) {
        self.history.reset();
    }

    fn receptive_field(&self) -> usize {
        self.history.state_size()
    }
}

/// Check a nested `[out][in][kernel]` array before any of it is copied
pub(crate) fn check_kernel_shape<T>(
    weights: &[Vec<Vec<T>>],
    out_size: usize,
    in_size: usize,
    kernel_size: usize,
) -> Result<()> {
    let expected = format!("[{}][{}][{}]", out_size, in_size, kernel_size);
    if weights.len() != out_size {
        return Err(ConvError::WeightShape {
            expected,
            found: format!("{} output channels", weights.len()),
        });
    }
    for (o, per_out) in weights.iter().enumerate() {
        if per_out.len() != in_size {
            return Err(ConvError::WeightShape {
                expected,
                found: format!("{} input channels at output {}", per_out.len(), o),
            });
        }
        for (c, taps) in per_out.iter().enumerate() {
            if taps.len() != kernel_size {
                return Err(ConvError::WeightShape {
                    expected,
                    found: format!("{} taps at [{}][{}]", taps.len(), o, c),
                });
            }
        }
    }
    Ok(())
}
