//! Layer trait definition
//!
//! Uniform contract shared by every layer kind so a [`Model`](crate::model::Model)
//! can chain them without knowing their internals.

use num_traits::Float;
use std::fmt::Debug;

/// Sample type a layer computes in (`f32` or `f64`)
///
/// Weights, history and output all use the same type, fixed when the layer is
/// constructed.
pub trait Scalar: Float + Debug + Send + Sync + 'static {}

impl<T> Scalar for T where T: Float + Debug + Send + Sync + 'static {}

/// Base trait for all inference layers
///
/// `forward` is called once per frame from the real-time thread. It must not
/// allocate, lock or block. Passing slices of the wrong length is a
/// programming error and panics.
pub trait Layer<T: Scalar>: Send + Sync {
    /// Number of values in each input frame
    fn in_size(&self) -> usize;

    /// Number of values in each output frame
    fn out_size(&self) -> usize;

    /// Process one frame
    ///
    /// # Panics
    /// If `input.len() != self.in_size()` or `output.len() != self.out_size()`.
    fn forward(&mut self, input: &[T], output: &mut [T]);

    /// Reset all streaming state
    ///
    /// Clears history buffers so the next frame behaves like the first one
    /// after construction. Loaded parameters are kept.
    fn reset(&mut self);

    /// Get the layer type identifier
    fn layer_type(&self) -> &'static str;

    /// Number of input frames that influence one output frame
    fn receptive_field(&self) -> usize {
        1
    }

    /// Clone the layer into a boxed trait object
    fn box_clone(&self) -> Box<dyn Layer<T>>;
}

impl<T: Scalar> Clone for Box<dyn Layer<T>> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Helper macro to implement the size and clone methods of `Layer`
#[macro_export]
macro_rules! impl_layer_common {
    ($layer_type:expr) => {
        fn in_size(&self) -> usize {
            self.in_size
        }

        fn out_size(&self) -> usize {
            self.out_size
        }

        fn layer_type(&self) -> &'static str {
            $layer_type
        }

        fn box_clone(&self) -> Box<dyn $crate::layers::Layer<T>> {
            Box::new(self.clone())
        }
    };
}
