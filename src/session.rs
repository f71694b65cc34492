//! Interactive session: upload -> chunk -> index, then question -> retrieve -> answer
//!
//! The session processes one interaction at a time and is the only place that
//! tracks whether a document has been indexed. It is not safe to share between
//! users: nothing orders an in-flight upload against a concurrent question.

use std::fmt;

use tracing::{info, warn};

use crate::chunker::Chunker;
use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::indexer::index_segments;
use crate::llm::{Answerer, CompletionClient};
use crate::pdf::PdfExtractor;
use crate::retriever::Retriever;
use crate::utils::with_temp_file;
use crate::vector_db::VectorStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing indexed yet
    Empty,
    Indexing,
    /// A document is indexed and questions are accepted
    Ready,
    Answering,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Empty => "empty",
            SessionState::Indexing => "indexing",
            SessionState::Ready => "ready",
            SessionState::Answering => "answering",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadReport {
    pub pages: usize,
    pub segments: usize,
    pub ids: Vec<String>,
}

/// One user's document question-answering session.
pub struct Session<X, E, S, C> {
    extractor: X,
    embedder: E,
    store: S,
    answerer: Answerer<C>,
    chunker: Chunker,
    retriever: Retriever,
    state: SessionState,
}

impl<X, E, S, C> Session<X, E, S, C>
where
    X: PdfExtractor,
    E: Embedder,
    S: VectorStore,
    C: CompletionClient,
{
    pub fn new(
        extractor: X,
        embedder: E,
        store: S,
        answerer: Answerer<C>,
        chunker: Chunker,
        retriever: Retriever,
    ) -> Self {
        Session {
            extractor,
            embedder,
            store,
            answerer,
            chunker,
            retriever,
            state: SessionState::Empty,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Returns `true` once any upload has been fully indexed.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        matches!(self.state, SessionState::Ready | SessionState::Answering)
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Extract, chunk and index an uploaded PDF.
    ///
    /// On failure the session returns to the state it was in before the
    /// upload; segments already written stay in the store.
    pub fn upload(&mut self, bytes: &[u8]) -> Result<UploadReport> {
        let resting = self.state;
        self.state = SessionState::Indexing;

        match self.index_upload(bytes) {
            Ok(report) => {
                self.state = SessionState::Ready;
                info!(pages = report.pages, segments = report.segments, "document indexed");
                Ok(report)
            }
            Err(e) => {
                self.state = resting;
                warn!(error = %e, state = %self.state, "upload failed");
                Err(e)
            }
        }
    }

    /// Answer a question from the indexed content.
    ///
    /// Refused with [`Error::NotReady`] until an upload has succeeded. The
    /// session is back in [`SessionState::Ready`] afterwards either way.
    pub fn ask(&mut self, query: &str) -> Result<String> {
        if self.state != SessionState::Ready {
            return Err(Error::NotReady);
        }
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("question is empty".to_string()));
        }

        self.state = SessionState::Answering;
        let result = self.answer(query);
        self.state = SessionState::Ready;

        match &result {
            Ok(_) => info!("question answered"),
            Err(e) => warn!(error = %e, "question failed"),
        }
        result
    }

    fn index_upload(&mut self, bytes: &[u8]) -> Result<UploadReport> {
        let extractor = &self.extractor;
        let pages = with_temp_file(bytes, |path| extractor.extract_pages(path))?;

        let segments = self.chunker.split(&pages);
        if segments.is_empty() {
            return Err(Error::Extraction("document contains no extractable text".to_string()));
        }
        let ids = index_segments(&mut self.embedder, &mut self.store, &segments)?;

        Ok(UploadReport {
            pages: pages.len(),
            segments: segments.len(),
            ids,
        })
    }

    fn answer(&mut self, query: &str) -> Result<String> {
        let context = self
            .retriever
            .retrieve(&mut self.embedder, &self.store, query)?;
        self.answerer.answer(&context, query)
    }
}
