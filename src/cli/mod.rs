//! CLI Module
//!
//! Command-line interface for running streaming models over signal files.

pub mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// streamconv - streaming causal convolution inference
#[derive(Parser, Debug)]
#[command(name = "streamconv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Sample type used for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Precision {
    F32,
    F64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the layers of a model description
    #[command(name = "info")]
    Info {
        /// Path to the model JSON
        model: PathBuf,
    },

    /// Run a mono model over a WAV file
    #[command(name = "process")]
    Process {
        /// Path to the model JSON
        model: PathBuf,

        /// Input WAV file (first channel is used)
        input: PathBuf,

        /// Output WAV file (32-bit float, mono)
        output: PathBuf,

        /// Sample type used for inference
        #[arg(short, long, value_enum, default_value_t = Precision::F32)]
        precision: Precision,
    },

    /// Run a mono model over a text file with one sample per line
    #[command(name = "csv")]
    Csv {
        /// Path to the model JSON
        model: PathBuf,

        /// Input file
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sample type used for inference
        #[arg(short, long, value_enum, default_value_t = Precision::F64)]
        precision: Precision,
    },
}
