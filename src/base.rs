pub type DocIndex = u64;
pub type TermFreq = u32;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const POSTINGS_BIN: &str = "postings.bin";
pub const DICTIONARY_BIN: &str = "dictionary.bin";
pub const DOC_IDS_BIN: &str = "doc_ids.bin";
pub const STATS_JSON: &str = "stats.json";

/// Posting = document index + within-document term frequency
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct Posting {
    pub doc_index: DocIndex,
    pub term_freq: TermFreq,
}

impl std::fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({},{})", self.doc_index, self.term_freq)
    }
}

/// Error taxonomy surfaced by every fallible operation in the crate
#[derive(Error, Debug)]
pub enum IndexError {
    /// The document stream presented the same identifier twice
    #[error("duplicate document identifier: {0}")]
    DuplicateDocId(String),

    /// On-disk artifacts are missing or mutually inconsistent
    #[error("corrupt index: {0}")]
    CorruptIndex(String),

    /// An input record could not be interpreted
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Corpus statistics persisted as `stats.json` next to the binary artifacts
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub struct IndexStats {
    /// Number of indexed documents
    #[serde(rename = "N")]
    pub num_documents: u64,

    /// Number of distinct terms
    pub num_terms: u64,

    /// Total number of (term, document) pairs
    pub num_postings: u64,

    /// Wall-clock build duration
    pub build_ms: u64,
}
