//! Text embedding using a local sentence-transformers model
//!
//! Uses sentence-transformers/all-MiniLM-L6-v2 via fastembed (ONNX runtime).
//! The model is downloaded on first use.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{Error, Result};

/// One vector per text; every vector from a given model has the same length.
pub type Embedding = Vec<f32>;

/// Maps text to vectors whose cosine similarity tracks meaning.
pub trait Embedder: Send + Sync {
    /// Vectors for `texts`, in the same order, from a single model call.
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Vector for a question, comparable with the segment vectors
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    fn dimension(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// all-MiniLM-L6-v2 running locally; fetched into the fastembed cache on
/// first construction.
pub struct MiniLmEmbedder {
    model: TextEmbedding,
}

impl MiniLmEmbedder {
    pub fn new() -> Result<Self> {
        let opts = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(true);

        TextEmbedding::try_new(opts)
            .map(|model| Self { model })
            .map_err(|e| Error::Init {
                component: "embedding model",
                message: e.to_string(),
            })
    }
}

impl Embedder for MiniLmEmbedder {
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
        self.model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }

    fn embed_query(&mut self, text: &str) -> Result<Embedding> {
        // MiniLM encodes queries and passages the same way
        self.model
            .embed(vec![text], None)
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))
    }

    fn dimension(&self) -> usize {
        384
    }

    fn model_name(&self) -> &str {
        "sentence-transformers/all-MiniLM-L6-v2"
    }
}
