//! Elementwise activation layers

use super::layer::{Layer, Scalar};
use crate::error::{ConvError, Result};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::str::FromStr;

/// Supported activation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    Linear,
    Tanh,
    Sigmoid,
    Relu,
}

impl ActivationKind {
    /// Name used in model descriptions
    pub fn name(&self) -> &'static str {
        match self {
            ActivationKind::Linear => "linear",
            ActivationKind::Tanh => "tanh",
            ActivationKind::Sigmoid => "sigmoid",
            ActivationKind::Relu => "relu",
        }
    }

    #[inline]
    pub fn apply<T: Scalar>(&self, x: T) -> T {
        match self {
            ActivationKind::Linear => x,
            ActivationKind::Tanh => x.tanh(),
            ActivationKind::Sigmoid => T::one() / (T::one() + (-x).exp()),
            ActivationKind::Relu => x.max(T::zero()),
        }
    }
}

impl FromStr for ActivationKind {
    type Err = ConvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" | "linear" => Ok(ActivationKind::Linear),
            "tanh" => Ok(ActivationKind::Tanh),
            "sigmoid" => Ok(ActivationKind::Sigmoid),
            "relu" => Ok(ActivationKind::Relu),
            other => Err(ConvError::UnsupportedActivation {
                activation: other.to_string(),
            }),
        }
    }
}

/// Layer applying one activation function to every element
#[derive(Debug, Clone)]
pub struct Activation<T> {
    size: usize,
    kind: ActivationKind,
    _sample: PhantomData<T>,
}

impl<T: Scalar> Activation<T> {
    pub fn new(size: usize, kind: ActivationKind) -> Result<Self> {
        if size == 0 {
            return Err(ConvError::InvalidSize {
                param: "size",
                value: size,
            });
        }
        Ok(Self {
            size,
            kind,
            _sample: PhantomData,
        })
    }

    pub fn kind(&self) -> ActivationKind {
        self.kind
    }
}

impl<T: Scalar> Layer<T> for Activation<T> {
    fn in_size(&self) -> usize {
        self.size
    }

    fn out_size(&self) -> usize {
        self.size
    }

    #[inline]
    fn forward(&mut self, input: &[T], output: &mut [T]) {
        assert_eq!(input.len(), self.size, "input frame has wrong length");
        assert_eq!(output.len(), self.size, "output frame has wrong length");
        for (out, &x) in output.iter_mut().zip(input) {
            *out = self.kind.apply(x);
        }
    }

    fn reset(&mut self) {}

    fn layer_type(&self) -> &'static str {
        self.kind.name()
    }

    fn box_clone(&self) -> Box<dyn Layer<T>> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use test_case::test_case;

    #[test_case("tanh", ActivationKind::Tanh)]
    #[test_case("sigmoid", ActivationKind::Sigmoid)]
    #[test_case("relu", ActivationKind::Relu)]
    #[test_case("linear", ActivationKind::Linear)]
    #[test_case("", ActivationKind::Linear ; "empty means linear")]
    fn test_parse_activation(name: &str, expected: ActivationKind) {
        assert_eq!(name.parse::<ActivationKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_activation() {
        let err = "softmax".parse::<ActivationKind>().unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_ACTIVATION");
    }

    #[test]
    fn test_activation_values() {
        assert_relative_eq!(ActivationKind::Sigmoid.apply(0.0f32), 0.5);
        assert_relative_eq!(ActivationKind::Tanh.apply(1.0f64), 1.0f64.tanh());
        assert_eq!(ActivationKind::Relu.apply(-2.0f32), 0.0);
        assert_eq!(ActivationKind::Relu.apply(2.0f32), 2.0);
        assert_eq!(ActivationKind::Linear.apply(-3.5f32), -3.5);
    }

    #[test]
    fn test_activation_layer() {
        let mut layer = Activation::<f32>::new(3, ActivationKind::Relu).unwrap();
        let mut out = [0.0; 3];
        layer.forward(&[-1.0, 0.0, 4.0], &mut out);
        assert_eq!(out, [0.0, 0.0, 4.0]);
        assert_eq!(layer.layer_type(), "relu");
        assert_eq!(layer.kind(), ActivationKind::Relu);
        assert_eq!(layer.in_size(), layer.out_size());
        assert!(Activation::<f32>::new(0, ActivationKind::Tanh).is_err());
    }
}
