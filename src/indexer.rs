use tracing::debug;

use crate::chunker::Segment;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::vector_db::VectorStore;

/// Embeds `segments` in one batch and stores each one, returning the ids in
/// segment order.
///
/// Stops at the first failure. Records inserted before the failure stay in
/// the store.
pub fn index_segments<E, S>(embedder: &mut E, store: &mut S, segments: &[Segment]) -> Result<Vec<String>>
where
    E: Embedder + ?Sized,
    S: VectorStore + ?Sized,
{
    if segments.is_empty() {
        return Ok(Vec::new());
    }

    let texts: Vec<&str> = segments.iter().map(|s| s.text.as_str()).collect();
    let embeddings = embedder.embed_documents(&texts)?;
    if embeddings.len() != texts.len() {
        return Err(Error::Embedding(format!(
            "expected {} embeddings, model returned {}",
            texts.len(),
            embeddings.len()
        )));
    }

    let mut ids = Vec::with_capacity(segments.len());
    for (segment, embedding) in segments.iter().zip(embeddings) {
        ids.push(store.insert(&segment.text, embedding)?);
    }
    debug!(segments = ids.len(), "indexed segments");
    Ok(ids)
}
