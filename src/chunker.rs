use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SEGMENT_LENGTH: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

/// A bounded slice of document text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub text: String,
    /// Zero-based order of the segment within its document
    pub position: usize,
}

/// Splits page text into fixed-size character windows that overlap their
/// neighbours.
///
/// Non-blank pages are joined with a single newline before splitting, so a
/// segment may span a page break. Lengths are counted in `char`s, never bytes.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    max_len: usize,
    overlap: usize,
}

impl Chunker {
    pub fn new(max_len: usize, overlap: usize) -> Result<Self> {
        if max_len == 0 {
            return Err(Error::InvalidInput(
                "segment length must be at least one character".to_string(),
            ));
        }
        if overlap >= max_len {
            return Err(Error::InvalidInput(format!(
                "overlap ({overlap}) must be smaller than segment length ({max_len})"
            )));
        }
        Ok(Self { max_len, overlap })
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split<S: AsRef<str>>(&self, pages: &[S]) -> Vec<Segment> {
        let joined = pages
            .iter()
            .map(AsRef::as_ref)
            .filter(|page| !page.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        if joined.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = joined.chars().collect();
        let stride = self.max_len - self.overlap;

        let mut segments = Vec::with_capacity(chars.len().div_ceil(stride));
        let mut start = 0;
        loop {
            let end = (start + self.max_len).min(chars.len());
            segments.push(Segment {
                text: chars[start..end].iter().collect(),
                position: segments.len(),
            });
            // the window that reaches the end is the last one; a further
            // window would lie entirely inside it
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        segments
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_SEGMENT_LENGTH,
            overlap: DEFAULT_OVERLAP,
        }
    }
}
