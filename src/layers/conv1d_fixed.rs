//! Dilated causal 1-D convolution, compile-time-sized
//!
//! Same semantics as [`Conv1D`](super::Conv1D) with every size a const
//! generic. Weights, bias and history are embedded arrays, so constructing
//! the layer performs no allocation and the inner loops have constant trip
//! counts.

use super::conv1d::check_kernel_shape;
use super::history::FixedHistory;
use super::layer::{Layer, Scalar};
use crate::error::{ConvError, Result};

/// Streaming dilated causal convolution with sizes fixed at compile time
///
/// `STATE` must be [`state_size`](super::state_size)`(KERNEL, DILATION)`;
/// any other value fails to compile when the layer is constructed.
///
/// # Example
/// ```
/// use streamconv::layers::{state_size, Conv1DT};
///
/// let mut conv = Conv1DT::<f32, 1, 1, 2, 2, { state_size(2, 2) }>::new();
/// conv.set_weights_array([[[1.0, 1.0]]]);
///
/// let outputs: Vec<f32> = [1.0, 2.0, 3.0, 4.0, 5.0]
///     .iter()
///     .map(|&x| conv.process(&[x])[0])
///     .collect();
/// assert_eq!(outputs, vec![1.0, 2.0, 4.0, 6.0, 8.0]);
/// ```
#[derive(Debug)]
pub struct Conv1DT<
    T,
    const IN: usize,
    const OUT: usize,
    const KERNEL: usize,
    const DILATION: usize,
    const STATE: usize,
> {
    /// `[out][tap][channel]`, matching the gathered window
    weights: [[[T; IN]; KERNEL]; OUT],
    bias: [T; OUT],
    history: FixedHistory<T, IN, KERNEL, DILATION, STATE>,
}

impl<
        T: Scalar,
        const IN: usize,
        const OUT: usize,
        const KERNEL: usize,
        const DILATION: usize,
        const STATE: usize,
    > Conv1DT<T, IN, OUT, KERNEL, DILATION, STATE>
{
    const OUT_OK: () = assert!(OUT >= 1, "OUT must be at least 1");

    /// Create a layer with zero weights and bias
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::OUT_OK;
        Self {
            weights: [[[T::zero(); IN]; KERNEL]; OUT],
            bias: [T::zero(); OUT],
            history: FixedHistory::new(),
        }
    }

    pub const fn kernel_size(&self) -> usize {
        KERNEL
    }

    pub const fn dilation_rate(&self) -> usize {
        DILATION
    }

    pub const fn state_size(&self) -> usize {
        STATE
    }

    /// Load kernel weights indexed `[out][in][kernel]`
    ///
    /// # Errors
    /// `WeightShape` if the nesting does not match the layer's sizes.
    pub fn set_weights(&mut self, weights: &[Vec<Vec<T>>]) -> Result<()> {
        check_kernel_shape(weights, OUT, IN, KERNEL)?;
        for (kernel, per_out) in self.weights.iter_mut().zip(weights) {
            for (c, taps) in per_out.iter().enumerate() {
                for (tap, &w) in kernel.iter_mut().zip(taps) {
                    tap[c] = w;
                }
            }
        }
        Ok(())
    }

    /// Load kernel weights from a fixed-size `[out][in][kernel]` array
    pub fn set_weights_array(&mut self, weights: [[[T; KERNEL]; IN]; OUT]) {
        for (kernel, per_out) in self.weights.iter_mut().zip(&weights) {
            for (c, taps) in per_out.iter().enumerate() {
                for (tap, &w) in kernel.iter_mut().zip(taps) {
                    tap[c] = w;
                }
            }
        }
    }

    /// Load one bias value per output channel
    ///
    /// # Errors
    /// `BiasShape` if `bias.len() != OUT`.
    pub fn set_bias(&mut self, bias: &[T]) -> Result<()> {
        if bias.len() != OUT {
            return Err(ConvError::BiasShape {
                expected: OUT,
                found: bias.len(),
            });
        }
        self.bias.copy_from_slice(bias);
        Ok(())
    }

    /// Get the kernel weight for output `o`, input channel `c`, tap `k`
    pub fn weight(&self, o: usize, c: usize, k: usize) -> T {
        self.weights[o][k][c]
    }

    pub fn bias(&self) -> &[T; OUT] {
        &self.bias
    }

    /// Process one frame
    #[inline]
    pub fn process(&mut self, input: &[T; IN]) -> [T; OUT] {
        self.history.write(input);
        let window = self.history.gather();

        let mut output = self.bias;
        for (out, kernel) in output.iter_mut().zip(&self.weights) {
            let mut acc = T::zero();
            for (w_tap, x_tap) in kernel.iter().zip(window) {
                for (&w, &x) in w_tap.iter().zip(x_tap) {
                    acc = acc + w * x;
                }
            }
            *out = acc + *out;
        }
        output
    }
}

impl<
        T: Scalar,
        const IN: usize,
        const OUT: usize,
        const KERNEL: usize,
        const DILATION: usize,
        const STATE: usize,
    > Default for Conv1DT<T, IN, OUT, KERNEL, DILATION, STATE>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<
        T: Scalar,
        const IN: usize,
        const OUT: usize,
        const KERNEL: usize,
        const DILATION: usize,
        const STATE: usize,
    > Clone for Conv1DT<T, IN, OUT, KERNEL, DILATION, STATE>
{
    /// Same weights and bias, fresh zeroed history.
    fn clone(&self) -> Self {
        Self {
            weights: self.weights,
            bias: self.bias,
            history: FixedHistory::new(),
        }
    }
}

impl<
        T: Scalar,
        const IN: usize,
        const OUT: usize,
        const KERNEL: usize,
        const DILATION: usize,
        const STATE: usize,
    > Layer<T> for Conv1DT<T, IN, OUT, KERNEL, DILATION, STATE>
{
    fn in_size(&self) -> usize {
        IN
    }

    fn out_size(&self) -> usize {
        OUT
    }

    fn forward(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), IN, "input frame has wrong length");
        assert_eq!(output.len(), OUT, "output frame has wrong length");
        let mut frame = [T::zero(); IN];
        frame.copy_from_slice(input);
        output.copy_from_slice(&self.process(&frame));
    }

    fn reset(&mut self) {
        self.history.reset();
    }

    fn layer_type(&self) -> &'static str {
        "conv1d"
    }

    fn receptive_field(&self) -> usize {
        STATE
    }

    fn box_clone(&self) -> Box<dyn Layer<T>> {
        Box::new(self.clone())
    }
}
