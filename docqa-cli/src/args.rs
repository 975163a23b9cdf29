//! Command-line argument parsing for `docqa`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use docqa_rag::{DistanceMetric, RagConfig, RagConfigBuilder};
use tracing_subscriber::EnvFilter;

use crate::providers::EmbedderKind;

/// Ask questions about local documents.
#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Ask questions about local documents", long_about = None)]
pub struct Args {
    /// Configuration file (TOML); flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Segment size in characters
    #[arg(long, global = true)]
    pub chunk_size: Option<usize>,

    /// Characters shared by consecutive segments
    #[arg(long, global = true)]
    pub chunk_overlap: Option<usize>,

    /// Number of segments retrieved per question
    #[arg(short, long, global = true)]
    pub k: Option<usize>,

    /// Per-segment character limit in the prompt context
    #[arg(long, global = true)]
    pub max_chars: Option<usize>,

    /// Distance metric: cosine or euclidean
    #[arg(long, global = true)]
    pub metric: Option<DistanceMetric>,

    /// Embedding backend
    #[arg(long, value_enum, default_value_t = EmbedderKind::Hash, global = true)]
    pub embedder: EmbedderKind,

    /// Where the ONNX embedder keeps model.onnx and tokenizer.json
    #[arg(long, default_value = "models/all-MiniLM-L6-v2", global = true)]
    pub model_dir: PathBuf,

    /// Extra dotenv file to load after `.env`
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Deadline in seconds for each embedding or generation call
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Restore the index from a snapshot before loading any files
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Verbosity: -v for info, -vv for debug (RUST_LOG takes precedence)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Answer one question and exit
    Ask {
        /// The question to answer
        #[arg(short, long)]
        question: String,
        /// Text, Markdown or PDF files, or directories containing them
        files: Vec<PathBuf>,
    },

    /// Start an interactive question-and-answer session
    Chat {
        /// Text, Markdown or PDF files, or directories containing them
        files: Vec<PathBuf>,
    },

    /// Show the segments nearest to a query without generating an answer
    Search {
        /// Query text
        #[arg(short, long)]
        query: String,
        /// Text, Markdown or PDF files, or directories containing them
        files: Vec<PathBuf>,
    },

    /// Embed files and save the index as a snapshot
    Index {
        /// Where to write the snapshot
        #[arg(short, long)]
        output: PathBuf,
        /// Text, Markdown or PDF files, or directories containing them
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

impl Args {
    /// Resolve the pipeline configuration: defaults, then the config file, then flags.
    pub fn rag_config(&self) -> anyhow::Result<RagConfig> {
        let base = match &self.config {
            Some(path) => RagConfig::load_from_file(path)?,
            None => RagConfig::default(),
        };

        let mut builder = RagConfigBuilder::from_config(base);
        if let Some(size) = self.chunk_size {
            builder = builder.chunk_size(size);
        }
        if let Some(overlap) = self.chunk_overlap {
            builder = builder.chunk_overlap(overlap);
        }
        if let Some(k) = self.k {
            builder = builder.retrieval_k(k);
        }
        if let Some(max_chars) = self.max_chars {
            builder = builder.max_chars_per_segment(max_chars);
        }
        if let Some(metric) = self.metric {
            builder = builder.distance_metric(metric);
        }
        Ok(builder.build()?)
    }

    /// Deadline applied to each provider call.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default log directive for the verbosity count.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }

    /// Filter from `RUST_LOG` if set, otherwise from `--verbose`.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.log_directive()))
    }
}
