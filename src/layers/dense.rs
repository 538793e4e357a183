//! Fully-connected layer
//!
//! `output[o] = sum_i W[o][i] * input[i] + b[o]`. Stateless between frames.

use super::config::DenseConfig;
use super::layer::{Layer, Scalar};
use crate::error::{ConvError, Result};
use crate::impl_layer_common;
use log::debug;

/// Dense (fully-connected) layer with runtime sizes
#[derive(Debug, Clone)]
pub struct Dense<T> {
    in_size: usize,
    out_size: usize,
    /// Row-major `[out][in]`
    weights: Vec<T>,
    bias: Vec<T>,
}

impl<T: Scalar> Dense<T> {
    /// Create a dense layer with zero weights and bias
    pub fn new(in_size: usize, out_size: usize) -> Result<Self> {
        Self::from_config(&DenseConfig::new(in_size, out_size))
    }

    pub fn from_config(config: &DenseConfig) -> Result<Self> {
        config.validate()?;
        debug!("dense: in={} out={}", config.in_size, config.out_size);
        Ok(Self {
            in_size: config.in_size,
            out_size: config.out_size,
            weights: vec![T::zero(); config.in_size * config.out_size],
            bias: vec![T::zero(); config.out_size],
        })
    }

    /// Load weights indexed `[out][in]`
    ///
    /// # Errors
    /// `WeightShape` on any size mismatch; nothing is copied in that case.
    pub fn set_weights(&mut self, weights: &[Vec<T>]) -> Result<()> {
        let shape_error = |found: String| ConvError::WeightShape {
            expected: format!("[{}][{}]", self.out_size, self.in_size),
            found,
        };
        if weights.len() != self.out_size {
            return Err(shape_error(format!("{} output channels", weights.len())));
        }
        if let Some((o, row)) = weights
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != self.in_size)
        {
            return Err(shape_error(format!("{} inputs at output {}", row.len(), o)));
        }

        for (dst, row) in self.weights.chunks_exact_mut(self.in_size).zip(weights) {
            dst.copy_from_slice(row);
        }
        Ok(())
    }

    /// Load one bias value per output
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

    pub fn weight(&self, o: usize, i: usize) -> T {
        self.weights[o * self.in_size + i]
    }
}

impl<T: Scalar> Layer<T> for Dense<T> {
    impl_layer_common!("dense");

    #[inline]
    fn forward(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), self.in_size, "input frame has wrong length");
        assert_eq!(output.len(), self.out_size, "output frame has wrong length");

        for ((out, row), &b) in output
            .iter_mut()
            .zip(self.weights.chunks_exact(self.in_size))
            .zip(&self.bias)
        {
            *out = row
                .iter()
                .zip(input)
                .fold(T::zero(), |acc, (&w, &x)| acc + w * x)
                + b;
        }
    }

    fn reset(&mut self) {}
}
