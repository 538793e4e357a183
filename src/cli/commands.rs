//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::info;

use super::Precision;
use crate::layers::Scalar;
use crate::model::{load_model_file, Model};
use crate::signal::{self, MonoSignal};

fn load_mono_model<T: Scalar>(path: &Path) -> Result<Model<T>> {
    let model = load_model_file::<T>(path)
        .with_context(|| format!("failed to load model {}", path.display()))?;
    if model.in_size() != 1 || model.out_size() != 1 {
        bail!(
            "model {} is {} -> {}, expected a mono (1 -> 1) model",
            path.display(),
            model.in_size(),
            model.out_size()
        );
    }
    Ok(model)
}

fn run_signal<T: Scalar>(model_path: &Path, input: &[f64]) -> Result<Vec<f64>> {
    let mut model = load_mono_model::<T>(model_path)?;
    let samples = input
        .iter()
        .map(|&x| num_traits::cast::<f64, T>(x).context("sample out of range"))
        .collect::<Result<Vec<T>>>()?;

    let start = Instant::now();
    let output = model.process_offline(&samples);
    info!(
        "Processed {} samples in {:.2} ms",
        samples.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    output
        .into_iter()
        .map(|y| y.to_f64().context("output sample out of range"))
        .collect()
}

fn run_with_precision(precision: Precision, model: &Path, input: &[f64]) -> Result<Vec<f64>> {
    match precision {
        Precision::F32 => run_signal::<f32>(model, input),
        Precision::F64 => run_signal::<f64>(model, input),
    }
}

/// Print the layers of a model.
pub fn info(path: &Path) -> Result<()> {
    info!("Inspecting model: {}", path.display());

    let model = load_model_file::<f32>(path)
        .with_context(|| format!("failed to load model {}", path.display()))?;

    println!("Model: {}", path.display());
    println!("  in_size:         {}", model.in_size());
    println!("  out_size:        {}", model.out_size());
    println!("  receptive field: {} frames", model.receptive_field());
    for (i, layer) in model.iter().enumerate() {
        println!(
            "  [{}] {:<8} {} -> {} (receptive field {})",
            i,
            layer.layer_type(),
            layer.in_size(),
            layer.out_size(),
            layer.receptive_field()
        );
    }

    Ok(())
}

/// Run a mono model over a WAV file.
pub fn process_wav(model: &Path, input: &Path, output: &Path, precision: Precision) -> Result<()> {
    info!(
        "Processing {} -> {} with {}",
        input.display(),
        output.display(),
        model.display()
    );

    let source = signal::read_wav_mono(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let samples: Vec<f64> = source.samples.iter().map(|&x| x as f64).collect();

    let processed = run_with_precision(precision, model, &samples)?;

    let result = MonoSignal {
        samples: processed.into_iter().map(|y| y as f32).collect(),
        sample_rate: source.sample_rate,
    };
    signal::write_wav_mono(output, &result)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!("Processed {} samples: {}", result.samples.len(), output.display());
    Ok(())
}

/// Run a mono model over a one-sample-per-line text file.
pub fn process_csv(
    model: &Path,
    input: &Path,
    output: Option<&Path>,
    precision: Precision,
) -> Result<()> {
    info!("Processing {} with {}", input.display(), model.display());

    let samples = signal::read_text_signal(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let processed = run_with_precision(precision, model, &samples)?;

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            signal::write_text_signal(BufWriter::new(file), &processed)?;
        }
        None => signal::write_text_signal(io::stdout().lock(), &processed)?,
    }

    Ok(())
}
