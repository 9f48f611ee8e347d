//! Single-pass construction of the on-disk index.
//!
//! The indexer consumes `(doc_id, body)` records in stream order, assigns
//! each document the next positional index, and accumulates per-term postings
//! in memory. [`Indexer::finish`] emits the postings blob in ascending term
//! order and persists the dictionary, the document table and the statistics
//! record, so two runs over the same stream produce identical artifacts.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use crate::base::{DocIndex, IndexError, IndexStats, Posting, Result, TermFreq, POSTINGS_BIN};
use crate::compress::encode_postings;
use crate::index::{write_dictionary, write_doc_ids, write_stats, DictEntry};
use crate::normalizer::normalize;

pub struct Indexer {
    output_dir: PathBuf,

    /// term → postings, ordered by term bytes; lists stay sorted because
    /// document indices are assigned serially
    postings_buf: BTreeMap<String, Vec<Posting>>,

    /// positional table: `doc_ids[doc_index]` is the external identifier
    doc_ids: Vec<String>,

    seen: HashSet<String>,
    num_postings: u64,
    started: Instant,
}

impl Indexer {
    pub fn new(output_dir: &Path) -> Indexer {
        Indexer {
            output_dir: output_dir.to_path_buf(),
            postings_buf: BTreeMap::new(),
            doc_ids: Vec::new(),
            seen: HashSet::new(),
            num_postings: 0,
            started: Instant::now(),
        }
    }

    /// Ingests one document. A repeated identifier fails the build; a body
    /// that normalizes to nothing still counts as a document.
    pub fn add(&mut self, doc_id: &str, body: &str) -> Result<()> {
        if !self.seen.insert(doc_id.to_owned()) {
            return Err(IndexError::DuplicateDocId(doc_id.to_owned()));
        }

        let doc_index = self.doc_ids.len() as DocIndex;
        self.doc_ids.push(doc_id.to_owned());

        let mut counts: HashMap<String, TermFreq> = HashMap::new();
        for term in normalize(body) {
            *counts.entry(term).or_insert(0) += 1;
        }
        debug!(
            "document {} ({}): {} distinct terms",
            doc_index,
            doc_id,
            counts.len()
        );

        for (term, term_freq) in counts {
            self.postings_buf.entry(term).or_default().push(Posting {
                doc_index,
                term_freq,
            });
            self.num_postings += 1;
        }

        Ok(())
    }

    /// Encodes and writes the four artifacts. The statistics record goes
    /// last, so an interrupted build never presents a loadable directory.
    pub fn finish(self) -> Result<IndexStats> {
        std::fs::create_dir_all(&self.output_dir)?;

        let postings_path = self.output_dir.join(POSTINGS_BIN);
        let mut writer = BufWriter::new(File::create(&postings_path)?);

        let mut entries: Vec<(&str, DictEntry)> = Vec::with_capacity(self.postings_buf.len());
        let mut offset = 0u64;
        for (term, postings) in &self.postings_buf {
            let encoded = encode_postings(postings);
            writer.write_all(&encoded)?;
            entries.push((
                term.as_str(),
                DictEntry {
                    offset,
                    length: encoded.len() as u64,
                    df: postings.len() as u32,
                },
            ));
            offset += encoded.len() as u64;
        }
        writer.flush()?;
        debug!("wrote {} bytes of postings", offset);

        write_dictionary(&self.output_dir, &entries)?;
        write_doc_ids(&self.output_dir, &self.doc_ids)?;

        let stats = IndexStats {
            num_documents: self.doc_ids.len() as u64,
            num_terms: entries.len() as u64,
            num_postings: self.num_postings,
            build_ms: self.started.elapsed().as_millis() as u64,
        };
        write_stats(&self.output_dir, &stats)?;

        info!(
            "built index in {}: {} documents, {} terms, {} postings, {} ms",
            self.output_dir.display(),
            stats.num_documents,
            stats.num_terms,
            stats.num_postings,
            stats.build_ms
        );
        Ok(stats)
    }
}
