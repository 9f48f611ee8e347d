//! Line-delimited document store.
//!
//! The parser writes one JSON record per document; the indexer streams the
//! records back in file order. Only `doc_id` and `body` are required — the
//! rest is carried for retrieval and debugging, and anything unknown is
//! ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::base::{IndexError, Result};

pub const DOCUMENT_STORE: &str = "document_store.jsonl";

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StoredDocument {
    pub doc_id: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub headline: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub date: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
}

/// Writes the whole store, one record per line.
pub fn write_store(path: &Path, documents: &[StoredDocument]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for document in documents {
        let line = serde_json::to_string(document)
            .map_err(|e| IndexError::Io(std::io::Error::other(e)))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Streams store records in file order, tracking line numbers so a bad
/// record can be pinpointed. Blank lines are skipped; anything else that
/// fails to parse is `MalformedInput` and fatal to the caller's build.
pub struct StoreReader {
    lines: Lines<BufReader<File>>,
    line_number: usize,
}

impl StoreReader {
    pub fn open(path: &Path) -> Result<StoreReader> {
        let file = File::open(path)?;
        Ok(StoreReader {
            lines: BufReader::new(file).lines(),
            line_number: 0,
        })
    }
}

impl Iterator for StoreReader {
    type Item = Result<StoredDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&line).map_err(|e| {
                IndexError::MalformedInput(format!(
                    "document store line {}: {}",
                    self.line_number, e
                ))
            }));
        }
    }
}

/// Resolves identifiers back to full records by scanning the store, caching
/// what it finds. Debugging aid, not on the query path.
pub struct DocStore {
    path: PathBuf,
    cache: HashMap<String, StoredDocument>,
}

impl DocStore {
    pub fn open(path: &Path) -> DocStore {
        if !path.exists() {
            warn!("document store not found: {}", path.display());
        }
        DocStore {
            path: path.to_path_buf(),
            cache: HashMap::new(),
        }
    }

    pub fn get(&mut self, doc_id: &str) -> Result<Option<StoredDocument>> {
        if let Some(document) = self.cache.get(doc_id) {
            return Ok(Some(document.clone()));
        }

        for record in StoreReader::open(&self.path)? {
            let document = record?;
            let found = document.doc_id == doc_id;
            self.cache.insert(document.doc_id.clone(), document);
            if found {
                return Ok(self.cache.get(doc_id).cloned());
            }
        }
        Ok(None)
    }
}
