use std::path::PathBuf;

use clap::Parser;

use crate::chunker::{Chunker, DEFAULT_OVERLAP, DEFAULT_SEGMENT_LENGTH};
use crate::error::{Error, Result};
use crate::llm::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::retriever::{Retriever, DEFAULT_TOP_K};

pub const API_KEY_VAR: &str = "GROQ_API_KEY";

/// Ask questions about a PDF, answered by a hosted language model
#[derive(Parser, Debug, Clone)]
#[command(name = "pdf-rag-chat", version, about)]
pub struct Cli {
    /// API key for the inference service
    #[arg(long, env = API_KEY_VAR, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat completions endpoint
    #[arg(long, env = "RAG_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Model identifier sent with every request
    #[arg(long, env = "RAG_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Directory holding the vector store (created if missing)
    #[arg(long, env = "RAG_STORE_DIR", default_value = "./rag_store")]
    pub store_dir: PathBuf,

    /// Number of segments retrieved per question
    #[arg(long, default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Maximum segment length in characters
    #[arg(long, default_value_t = DEFAULT_SEGMENT_LENGTH)]
    pub chunk_size: usize,

    /// Characters shared by neighbouring segments
    #[arg(long, default_value_t = DEFAULT_OVERLAP)]
    pub chunk_overlap: usize,

    /// PDF to upload before the prompt opens
    #[arg(long)]
    pub pdf: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Validated startup settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub store_dir: PathBuf,
    pub chunker: Chunker,
    pub retriever: Retriever,
    pub pdf: Option<PathBuf>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let api_key = cli
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("Please set the {API_KEY_VAR} environment variable")))?;

        let chunker = Chunker::new(cli.chunk_size, cli.chunk_overlap)
            .map_err(|e| Error::Config(e.to_string()))?;
        let retriever = Retriever::new(cli.top_k).map_err(|e| Error::Config(e.to_string()))?;

        Ok(Config {
            api_key,
            api_url: cli.api_url,
            model: cli.model,
            store_dir: cli.store_dir,
            chunker,
            retriever,
            pdf: cli.pdf,
        })
    }
}
