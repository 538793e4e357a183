//! Sequential model (layer chain)
//!
//! Layers are processed in chain order (index 0 first). Each layer writes into
//! its own pre-allocated output buffer, which the next layer reads, so running
//! a frame through the chain never allocates.

mod loader;

pub use loader::{
    build_model, load_model_file, load_model_reader, load_model_str, LayerDescription,
    ModelDescription,
};

use crate::error::{ConvError, Result};
use crate::layers::{Layer, Scalar};

/// Chain of layers for frame-by-frame inference
pub struct Model<T: Scalar> {
    in_size: usize,
    layers: Vec<Box<dyn Layer<T>>>,
    /// Output frame of each layer
    buffers: Vec<Vec<T>>,
}

impl<T: Scalar> Model<T> {
    /// Create an empty model taking `in_size` values per frame
    pub fn new(in_size: usize) -> Result<Self> {
        if in_size == 0 {
            return Err(ConvError::InvalidSize {
                param: "in_size",
                value: in_size,
            });
        }
        Ok(Self {
            in_size,
            layers: Vec::new(),
            buffers: Vec::new(),
        })
    }

    /// Append a layer to the end of the chain
    ///
    /// # Errors
    /// `LayerMismatch` if the layer's input size differs from the current
    /// output size of the chain.
    pub fn push_layer(&mut self, layer: Box<dyn Layer<T>>) -> Result<()> {
        if layer.in_size() != self.out_size() {
            return Err(ConvError::LayerMismatch {
                index: self.layers.len(),
                expected: layer.in_size(),
                found: self.out_size(),
            });
        }
        self.buffers.push(vec![T::zero(); layer.out_size()]);
        self.layers.push(layer);
        Ok(())
    }

    pub fn in_size(&self) -> usize {
        self.in_size
    }

    /// Output size of the last layer, or the input size for an empty chain
    pub fn out_size(&self) -> usize {
        self.layers.last().map_or(self.in_size, |l| l.out_size())
    }

    /// Get the number of layers in the chain
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Get a reference to a layer by index
    pub fn layer(&self, index: usize) -> Option<&dyn Layer<T>> {
        self.layers.get(index).map(|l| l.as_ref())
    }

    /// Iterate over layers
    pub fn iter(&self) -> impl Iterator<Item = &dyn Layer<T>> {
        self.layers.iter().map(|l| l.as_ref())
    }

    /// Number of input frames that can influence one output frame
    pub fn receptive_field(&self) -> usize {
        1 + self
            .layers
            .iter()
            .map(|l| l.receptive_field() - 1)
            .sum::<usize>()
    }

    /// Run one frame through every layer
    ///
    /// # Panics
    /// If `input.len() != in_size()` or `output.len() != out_size()`.
    pub fn forward(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), self.in_size, "input frame has wrong length");
        assert_eq!(output.len(), self.out_size(), "output frame has wrong length");

        let Some((first, rest)) = self.layers.split_first_mut() else {
            output.copy_from_slice(input);
            return;
        };
        first.forward(input, &mut self.buffers[0]);
        for (i, layer) in rest.iter_mut().enumerate() {
            let (done, pending) = self.buffers.split_at_mut(i + 1);
            layer.forward(&done[i], &mut pending[0]);
        }
        if let Some(last) = self.buffers.last() {
            output.copy_from_slice(last);
        }
    }

    /// Run one sample through a single-input, single-output model
    ///
    /// # Panics
    /// If the model is not 1-in/1-out.
    #[inline]
    pub fn forward_sample(&mut self, x: T) -> T {
        let mut out = [T::zero()];
        self.forward(&[x], &mut out);
        out[0]
    }

    /// Reset the streaming state of every layer
    pub fn reset(&mut self) {
        for layer in &mut self.layers {
            layer.reset();
        }
        for buffer in &mut self.buffers {
            buffer.fill(T::zero());
        }
    }

    /// Run a whole mono signal through the model, sample by sample
    ///
    /// Allocates the returned buffer; not for the real-time thread.
    pub fn process_offline(&mut self, input: &[T]) -> Vec<T> {
        input.iter().map(|&x| self.forward_sample(x)).collect()
    }
}

impl<T: Scalar> Clone for Model<T> {
    fn clone(&self) -> Self {
        Self {
            in_size: self.in_size,
            layers: self.layers.clone(),
            buffers: self.buffers.iter().map(|b| vec![T::zero(); b.len()]).collect(),
        }
    }
}

impl<T: Scalar> std::fmt::Debug for Model<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("in_size", &self.in_size)
            .field(
                "layers",
                &self.iter().map(|l| l.layer_type()).collect::<Vec<_>>(),
            )
            .field("out_size", &self.out_size())
            .finish()
    }
}
