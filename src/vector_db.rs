//! Persistent vector store
//!
//! Records live in memory for search and are appended to
//! `<store dir>/records.jsonl` as they are inserted, one JSON object per line.
//! Opening a store replays that file.
//!
//! The store takes no file lock: two processes sharing a directory will
//! interleave appends and neither will see the other's records until reopened.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::embed::Embedding;
use crate::error::{Error, Result};
use crate::utils::ensure_dir;

pub const RECORDS_FILE: &str = "records.jsonl";

/// A stored segment and its vector. Never mutated after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub text: String,
    pub embedding: Embedding,
}

/// A query match with its cosine similarity (higher is closer).
#[derive(Debug, Clone)]
pub struct Hit {
    pub id: String,
    pub text: String,
    pub score: f32,
}

/// Trait for vector storage backends
pub trait VectorStore: Send + Sync {
    /// Store a segment with its embedding and return the assigned id
    fn insert(&mut self, text: &str, embedding: Embedding) -> Result<String>;

    /// Up to `k` records closest to `embedding`, closest first.
    ///
    /// Returns whatever is available when fewer than `k` records exist. Order
    /// among equal scores is backend-specific.
    fn query(&self, embedding: &Embedding, k: usize) -> Result<Vec<Hit>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct VectorDB {
    file: PathBuf,
    records: Vec<EmbeddingRecord>,
}

impl VectorDB {
    /// Open the store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let init_error = |e: Error| Error::Init {
            component: "vector store",
            message: format!("{}: {e}", dir.display()),
        };

        ensure_dir(dir).map_err(init_error)?;
        let file = dir.join(RECORDS_FILE);
        let records = load_records(&file).map_err(init_error)?;
        info!(path = %dir.display(), records = records.len(), "opened vector store");

        Ok(VectorDB { file, records })
    }

    /// Embedding width of the stored records, if any exist.
    pub fn dimension(&self) -> Option<usize> {
        self.records.first().map(|r| r.embedding.len())
    }

    #[cfg(test)]
    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    fn check_dimension(&self, len: usize) -> Result<()> {
        match self.dimension() {
            Some(dim) if dim != len => Err(Error::Store(format!(
                "embedding has {len} dimensions, store holds {dim}"
            ))),
            _ => Ok(()),
        }
    }
}

impl VectorStore for VectorDB {
    fn insert(&mut self, text: &str, embedding: Embedding) -> Result<String> {
        if embedding.is_empty() {
            return Err(Error::Store("refusing to store an empty embedding".to_string()));
        }
        self.check_dimension(embedding.len())?;

        let record = EmbeddingRecord {
            id: uuid::Uuid::new_v4().to_string(),
            text: text.to_string(),
            embedding,
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file)?;
        file.write_all(line.as_bytes())?;

        let id = record.id.clone();
        self.records.push(record);
        debug!(%id, "inserted record");
        Ok(id)
    }

    fn query(&self, embedding: &Embedding, k: usize) -> Result<Vec<Hit>> {
        self.check_dimension(embedding.len())?;

        let query = ArrayView1::from(embedding.as_slice());
        let mut similarities: Vec<(f32, &EmbeddingRecord)> = self
            .records
            .iter()
            .map(|record| {
                let stored = ArrayView1::from(record.embedding.as_slice());
                (cosine_similarity(&query, &stored), record)
            })
            .collect();

        // stable sort: equal scores keep insertion order
        similarities.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(similarities
            .into_iter()
            .take(k)
            .map(|(score, record)| Hit {
                id: record.id.clone(),
                text: record.text.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

fn load_records(file: &Path) -> Result<Vec<EmbeddingRecord>> {
    if !file.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(file)?;
    let lines: Vec<(usize, &str)> = content
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();

    let mut records = Vec::with_capacity(lines.len());
    for (i, &(offset, line)) in lines.iter().enumerate() {
        match serde_json::from_str::<EmbeddingRecord>(line) {
            Ok(record) => records.push(record),
            // an interrupted append leaves a partial final line; drop it so
            // the next append starts on a clean line
            Err(e) if i + 1 == lines.len() => {
                warn!(path = %file.display(), error = %e, "discarding incomplete final record");
                OpenOptions::new().write(true).open(file)?.set_len(offset as u64)?;
            }
            Err(e) => {
                return Err(Error::Store(format!("{} record {}: {e}", file.display(), i + 1)));
            }
        }
    }
    Ok(records)
}

fn cosine_similarity(a: &ArrayView1<f32>, b: &ArrayView1<f32>) -> f32 {
    let dot_product = a.dot(b);
    let norm_a = (a.dot(a)).sqrt();
    let norm_b = (b.dot(b)).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn similarity(a: &[f32], b: &[f32]) -> f32 {
        cosine_similarity(&ArrayView1::from(a), &ArrayView1::from(b))
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_open_creates_directory() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("store");

        let db = VectorDB::open(&root)?;
        assert!(root.is_dir());
        assert!(db.is_empty());
        assert_eq!(db.dimension(), None);
        Ok(())
    }

    #[test]
    fn test_query_orders_by_similarity() -> Result<()> {
        let dir = tempdir()?;
        let mut db = VectorDB::open(dir.path())?;

        let far = db.insert("far away", vec![0.0, 1.0, 0.0])?;
        let close = db.insert("very close", vec![1.0, 0.0, 0.0])?;
        let medium = db.insert("medium", vec![0.5, 0.5, 0.0])?;

        let hits = db.query(&vec![1.0, 0.0, 0.0], 3)?;
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec![close.as_str(), medium.as_str(), far.as_str()]);
        assert_eq!(hits[0].text, "very close");
        Ok(())
    }

    #[test]
    fn test_query_returns_available_when_k_exceeds_len() -> Result<()> {
        let dir = tempdir()?;
        let mut db = VectorDB::open(dir.path())?;
        db.insert("one", vec![1.0, 0.0])?;
        db.insert("two", vec![0.0, 1.0])?;

        assert_eq!(db.query(&vec![1.0, 0.0], 3)?.len(), 2);
        assert_eq!(db.query(&vec![1.0, 0.0], 1)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_empty_store_query() -> Result<()> {
        let dir = tempdir()?;
        let db = VectorDB::open(dir.path())?;
        assert!(db.query(&vec![1.0, 0.0], 3)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_ties_keep_insertion_order() -> Result<()> {
        let dir = tempdir()?;
        let mut db = VectorDB::open(dir.path())?;
        let first = db.insert("first", vec![1.0, 1.0])?;
        let second = db.insert("second", vec![1.0, 1.0])?;

        let hits = db.query(&vec![1.0, 1.0], 2)?;
        assert_eq!(hits[0].id, first);
        assert_eq!(hits[1].id, second);
        Ok(())
    }

    #[test]
    fn test_records_survive_reopen() -> Result<()> {
        let dir = tempdir()?;
        let id = {
            let mut db = VectorDB::open(dir.path())?;
            db.insert("persisted", vec![0.25, 0.75])?
        };

        let db = VectorDB::open(dir.path())?;
        assert_eq!(db.len(), 1);
        assert_eq!(db.records()[0].id, id);
        assert_eq!(db.records()[0].text, "persisted");
        assert_eq!(db.records()[0].embedding, vec![0.25, 0.75]);
        Ok(())
    }

    #[test]
    fn test_rejects_dimension_mismatch() -> Result<()> {
        let dir = tempdir()?;
        let mut db = VectorDB::open(dir.path())?;
        db.insert("two dims", vec![1.0, 0.0])?;

        assert!(matches!(db.insert("three", vec![1.0, 0.0, 0.0]), Err(Error::Store(_))));
        assert!(matches!(db.query(&vec![1.0], 1), Err(Error::Store(_))));
        assert!(matches!(db.insert("none", Vec::new()), Err(Error::Store(_))));
        assert_eq!(db.len(), 1);
        Ok(())
    }

    #[test]
    fn test_corrupt_middle_record_fails_open() -> Result<()> {
        let dir = tempdir()?;
        let good = r#"{"id":"a","text":"fine","embedding":[1.0,0.0]}"#;
        fs::write(dir.path().join(RECORDS_FILE), format!("{{not json}}\n{good}\n"))?;

        let result = VectorDB::open(dir.path());
        assert!(matches!(
            result,
            Err(Error::Init { component: "vector store", .. })
        ));
        Ok(())
    }

    #[test]
    fn test_torn_final_record_is_discarded() -> Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join(RECORDS_FILE);
        let good = r#"{"id":"a","text":"fine","embedding":[1.0,0.0]}"#;
        fs::write(&file, format!("{good}\n{{\"id\":\"x\",\"text\":\"half"))?;

        let mut db = VectorDB::open(dir.path())?;
        assert_eq!(db.len(), 1);
        assert_eq!(db.records()[0].id, "a");
        assert_eq!(fs::read_to_string(&file)?, format!("{good}\n"));

        db.insert("after", vec![0.0, 1.0])?;
        let db = VectorDB::open(dir.path())?;
        assert_eq!(db.len(), 2);
        assert_eq!(db.records()[1].text, "after");
        Ok(())
    }
}
