//! Model description loading
//!
//! Reads the JSON model description written by the Keras exporter and
//! assembles a [`Model`]. Layer shapes carry a `null` batch and time
//! dimension; only the last (feature) dimension is used.
//!
//! Keras stores dense kernels as `[in][out]` and convolution kernels as
//! `[kernel][in][out]`; both are transposed here into the `[out][in]` and
//! `[out][in][kernel]` order the layers load. Keras' causal convolution
//! multiplies kernel index 0 with the oldest sample, which is the tap order
//! `Conv1D` uses, so the kernel axis is copied as is.

use super::Model;
use crate::error::{ConvError, Result};
use crate::layers::{Activation, ActivationKind, Conv1D, Conv1DConfig, Dense, Scalar};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Top-level model description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Input shape, e.g. `[null, null, 1]`
    pub in_shape: Vec<Option<usize>>,
    pub layers: Vec<LayerDescription>,
}

/// One layer entry of a model description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerDescription {
    #[serde(rename = "type")]
    pub layer_type: String,
    /// Activation applied after the layer; empty or `"linear"` for none
    #[serde(default)]
    pub activation: String,
    /// Output shape, e.g. `[null, null, 8]`
    pub shape: Vec<Option<usize>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kernel_size: Vec<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dilation: Vec<usize>,
    /// `[kernel, bias]` as exported
    #[serde(default)]
    pub weights: Vec<Value>,
    /// Fields this loader does not understand
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Parse a model description from a JSON string
pub fn load_model_str<T: Scalar>(json: &str) -> Result<Model<T>> {
    let description: ModelDescription = serde_json::from_str(json)?;
    build_model(&description)
}

/// Parse a model description from any reader
pub fn load_model_reader<T: Scalar, R: Read>(reader: R) -> Result<Model<T>> {
    let description: ModelDescription = serde_json::from_reader(reader)?;
    build_model(&description)
}

/// Load a model description from a JSON file
pub fn load_model_file<T: Scalar>(path: impl AsRef<Path>) -> Result<Model<T>> {
    let path = path.as_ref();
    info!("Loading model: {}", path.display());
    let file = File::open(path)?;
    load_model_reader(BufReader::new(file))
}

/// Assemble a model from a parsed description
pub fn build_model<T: Scalar>(description: &ModelDescription) -> Result<Model<T>> {
    let in_size = feature_size(&description.in_shape, "in_shape")?;
    let mut model = Model::new(in_size)?;

    for (index, layer) in description.layers.iter().enumerate() {
        if !layer.extra.is_empty() {
            warn!(
                "layer {} ({}): ignoring fields {:?}",
                index,
                layer.layer_type,
                layer.extra.keys().collect::<Vec<_>>()
            );
        }

        let in_size = model.out_size();
        let out_size = feature_size(&layer.shape, "shape")?;
        match layer.layer_type.as_str() {
            "dense" | "time-distributed-dense" => {
                model.push_layer(Box::new(build_dense::<T>(layer, in_size, out_size)?))?
            }
            "conv1d" => model.push_layer(Box::new(build_conv1d::<T>(layer, in_size, out_size)?))?,
            other => {
                return Err(ConvError::UnsupportedLayer {
                    layer_type: other.to_string(),
                })
            }
        }

        let activation: ActivationKind = layer.activation.parse()?;
        if activation != ActivationKind::Linear {
            model.push_layer(Box::new(Activation::new(out_size, activation)?))?;
        }
        debug!(
            "layer {}: {} {} -> {} ({})",
            index,
            layer.layer_type,
            in_size,
            out_size,
            activation.name()
        );
    }

    info!(
        "Model loaded: {} layers, {} -> {}, receptive field {} frames",
        model.len(),
        model.in_size(),
        model.out_size(),
        model.receptive_field()
    );
    Ok(model)
}

fn feature_size(shape: &[Option<usize>], field: &str) -> Result<usize> {
    match shape.last() {
        Some(Some(size)) if *size > 0 => Ok(*size),
        _ => Err(ConvError::ModelFormat {
            reason: format!("{} {:?} has no feature dimension", field, shape),
        }),
    }
}

fn to_scalar<T: Scalar>(value: f64) -> Result<T> {
    num_traits::cast(value).ok_or(ConvError::NumericConversion { value })
}

/// Split `[kernel, bias]`; a missing bias means zeros
fn kernel_and_bias<K>(layer: &LayerDescription, out_size: usize) -> Result<(K, Vec<f64>)>
where
    K: for<'de> Deserialize<'de>,
{
    let kernel = layer.weights.first().ok_or_else(|| ConvError::ModelFormat {
        reason: format!("{} layer has no weights", layer.layer_type),
    })?;
    let kernel: K = serde_json::from_value(kernel.clone())?;
    let bias = match layer.weights.get(1) {
        Some(bias) => serde_json::from_value(bias.clone())?,
        None => vec![0.0; out_size],
    };
    Ok((kernel, bias))
}

fn convert_bias<T: Scalar>(bias: &[f64]) -> Result<Vec<T>> {
    bias.iter().map(|&b| to_scalar(b)).collect()
}

fn build_dense<T: Scalar>(
    layer: &LayerDescription,
    in_size: usize,
    out_size: usize,
) -> Result<Dense<T>> {
    let (kernel, bias): (Vec<Vec<f64>>, _) = kernel_and_bias(layer, out_size)?;
    if kernel.len() != in_size || kernel.iter().any(|row| row.len() != out_size) {
        return Err(ConvError::WeightShape {
            expected: format!("[{}][{}] (in, out)", in_size, out_size),
            found: format!("{} rows", kernel.len()),
        });
    }

    let weights = (0..out_size)
        .map(|o| kernel.iter().map(|row| to_scalar(row[o])).collect())
        .collect::<Result<Vec<Vec<T>>>>()?;

    let mut dense = Dense::new(in_size, out_size)?;
    dense.set_weights(&weights)?;
    dense.set_bias(&convert_bias(&bias)?)?;
    Ok(dense)
}

fn build_conv1d<T: Scalar>(
    layer: &LayerDescription,
    in_size: usize,
    out_size: usize,
) -> Result<Conv1D<T>> {
    let kernel_size = layer.kernel_size.first().copied().ok_or_else(|| {
        ConvError::ModelFormat {
            reason: "conv1d layer has no kernel_size".to_string(),
        }
    })?;
    let dilation_rate = layer.dilation.first().copied().unwrap_or(1);
    let config = Conv1DConfig::new(in_size, out_size, kernel_size, dilation_rate);
    config.validate()?;

    let (kernel, bias): (Vec<Vec<Vec<f64>>>, _) = kernel_and_bias(layer, out_size)?;
    let well_formed = kernel.len() == kernel_size
        && kernel.iter().all(|per_tap| {
            per_tap.len() == in_size && per_tap.iter().all(|row| row.len() == out_size)
        });
    if !well_formed {
        return Err(ConvError::WeightShape {
            expected: format!(
                "[{}][{}][{}] (kernel, in, out)",
                kernel_size, in_size, out_size
            ),
            found: format!("{} taps", kernel.len()),
        });
    }

    let weights = (0..out_size)
        .map(|o| {
            (0..in_size)
                .map(|c| (0..kernel_size).map(|k| to_scalar(kernel[k][c][o])).collect())
                .collect()
        })
        .collect::<Result<Vec<Vec<Vec<T>>>>>()?;

    let mut conv = Conv1D::from_config(&config)?;
    conv.set_weights(&weights)?;
    conv.set_bias(&convert_bias(&bias)?)?;
    Ok(conv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DILATED_SUM: &str = r#"{
        "in_shape": [null, null, 1],
        "layers": [
            {
                "type": "conv1d",
                "activation": "",
                "shape": [null, null, 1],
                "kernel_size": [2],
                "dilation": [2],
                "weights": [[[[1.0]], [[1.0]]], [0.0]]
            }
        ]
    }"#;

    #[test]
    fn test_load_conv1d() {
        let mut model = load_model_str::<f32>(DILATED_SUM).unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(model.receptive_field(), 3);
        let out = model.process_offline(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out, vec![1.0, 2.0, 4.0, 6.0, 8.0]);
    }

    #[test]
    fn test_conv_kernel_axis_order() {
        // kernel[0] (oldest tap) = 3, kernel[1] (current) = 1
        let json = r#"{
            "in_shape": [null, null, 1],
            "layers": [{
                "type": "conv1d", "shape": [null, null, 1],
                "kernel_size": [2], "dilation": [1],
                "weights": [[[[3.0]], [[1.0]]], [0.5]]
            }]
        }"#;
        let mut model = load_model_str::<f64>(json).unwrap();
        let out = model.process_offline(&[1.0, 0.0]);
        assert_relative_eq!(out[0], 1.5);
        assert_relative_eq!(out[1], 3.5);
    }

    #[test]
    fn test_dense_transpose_and_activation() {
        let json = r#"{
            "in_shape": [null, null, 2],
            "layers": [{
                "type": "dense", "activation": "relu", "shape": [null, null, 3],
                "weights": [[[1.0, 0.0, -1.0], [0.0, 1.0, -1.0]], [0.0, 0.0, 0.0]]
            }]
        }"#;
        let mut model = load_model_str::<f32>(json).unwrap();
        assert_eq!(model.len(), 2);
        assert_eq!(model.layer(1).unwrap().layer_type(), "relu");

        let mut out = [0.0; 3];
        model.forward(&[2.0, 3.0], &mut out);
        assert_eq!(out, [2.0, 3.0, 0.0]);
    }

    #[test]
    fn test_missing_bias_defaults_to_zero() {
        let json = r#"{
            "in_shape": [null, 1],
            "layers": [{ "type": "dense", "shape": [null, 1], "weights": [[[2.0]]] }]
        }"#;
        let mut model = load_model_str::<f32>(json).unwrap();
        assert_eq!(model.forward_sample(1.5), 3.0);
    }

    #[test]
    fn test_unsupported_layer() {
        let json = r#"{
            "in_shape": [null, null, 1],
            "layers": [{ "type": "lstm", "shape": [null, null, 4], "weights": [] }]
        }"#;
        let err = load_model_str::<f32>(json).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_LAYER");
    }

    #[test]
    fn test_unsupported_activation() {
        let json = DILATED_SUM.replace(r#""activation": """#, r#""activation": "softmax""#);
        let err = load_model_str::<f32>(&json).unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_ACTIVATION");
    }

    #[test]
    fn test_bad_kernel_shape() {
        let json = DILATED_SUM.replace(r#""kernel_size": [2]"#, r#""kernel_size": [3]"#);
        let err = load_model_str::<f32>(&json).unwrap_err();
        assert_eq!(err.error_code(), "WEIGHT_SHAPE");
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_missing_feature_dimension() {
        let json = r#"{ "in_shape": [null, null, null], "layers": [] }"#;
        let err = load_model_str::<f32>(json).unwrap_err();
        assert_eq!(err.error_code(), "MODEL_FORMAT");
    }

    #[test]
    fn test_malformed_json() {
        let err = load_model_str::<f32>("{ not json").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_extra_fields_are_kept() {
        let json = DILATED_SUM.replace(r#""dilation": [2],"#, r#""dilation": [2], "groups": 1,"#);
        let description: ModelDescription = serde_json::from_str(&json).unwrap();
        assert!(description.layers[0].extra.contains_key("groups"));
        assert!(build_model::<f32>(&description).is_ok());
    }

    #[test]
    fn test_overflowing_dilation_fails_at_load() {
        let json = DILATED_SUM
            .replace(r#""kernel_size": [2]"#, r#""kernel_size": [3]"#)
            .replace(r#""dilation": [2]"#, r#""dilation": [9223372036854775808]"#)
            .replace(r#"[[[[1.0]], [[1.0]]], [0.0]]"#, r#"[[[[1.0]], [[1.0]], [[1.0]]], [0.0]]"#);
        let err = load_model_str::<f32>(&json).unwrap_err();
        assert!(matches!(err, ConvError::SizeOverflow { .. }));
        assert_eq!(err.error_code(), "SIZE_OVERFLOW");
    }
}
