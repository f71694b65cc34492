use tracing::debug;

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::vector_db::VectorStore;

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    top_k: usize,
}

impl Retriever {
    pub fn new(top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(Error::InvalidInput("top-k must be at least 1".to_string()));
        }
        Ok(Retriever { top_k })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Texts of the stored segments most similar to `query`, closest first.
    ///
    /// Returns fewer than `top_k` texts (possibly none) when the store holds
    /// fewer records.
    pub fn retrieve<E, S>(&self, embedder: &mut E, store: &S, query: &str) -> Result<Vec<String>>
    where
        E: Embedder + ?Sized,
        S: VectorStore + ?Sized,
    {
        if store.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed_query(query)?;
        let hits = store.query(&query_embedding, self.top_k)?;
        debug!(
            requested = self.top_k,
            returned = hits.len(),
            best = hits.first().map(|h| h.score),
            ids = ?hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(),
            "retrieved segments"
        );
        Ok(hits.into_iter().map(|hit| hit.text).collect())
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Retriever { top_k: DEFAULT_TOP_K }
    }
}
