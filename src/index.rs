//! On-disk index artifacts and their validated load path.
//!
//! An index directory holds four files: the postings blob, the dictionary
//! (term → byte range + document frequency), the positional document-id
//! table, and the statistics record. The builder writes them once; [`Index`]
//! opens them read-only and refuses anything internally inconsistent.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, info};

use crate::base::{
    DocIndex, IndexError, IndexStats, Posting, Result, DICTIONARY_BIN, DOC_IDS_BIN, POSTINGS_BIN,
    STATS_JSON,
};
use crate::compress::{decode_postings, decode_vbyte, encode_vbyte};
use crate::utils::buffer::{Buffer, MemoryBuffer, MmapBuffer};

/// Dictionary entry: where a term's postings live and in how many documents
/// the term occurs.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DictEntry {
    /// Byte offset of the encoded postings list in the blob
    pub offset: u64,
    /// Byte length of the encoded postings list
    pub length: u64,
    /// Document frequency
    pub df: u32,
}

/// Serializes the dictionary. Entries must arrive in ascending term order;
/// each is framed as `[len][term][offset][length][df]`, all integers VByte,
/// preceded by an entry count.
pub(crate) fn write_dictionary(dir: &Path, entries: &[(&str, DictEntry)]) -> Result<()> {
    let mut encoded = Vec::new();
    encode_vbyte(&mut encoded, entries.len() as u64);
    for (term, entry) in entries {
        encode_vbyte(&mut encoded, term.len() as u64);
        encoded.extend_from_slice(term.as_bytes());
        encode_vbyte(&mut encoded, entry.offset);
        encode_vbyte(&mut encoded, entry.length);
        encode_vbyte(&mut encoded, u64::from(entry.df));
    }

    let mut writer = BufWriter::new(File::create(dir.join(DICTIONARY_BIN))?);
    writer.write_all(&encoded)?;
    writer.flush()?;
    Ok(())
}

fn read_dictionary(dir: &Path) -> Result<HashMap<String, DictEntry>> {
    let mut data = Vec::new();
    File::open(dir.join(DICTIONARY_BIN))?.read_to_end(&mut data)?;

    let mut pos = 0usize;
    let count = decode_vbyte(&data, &mut pos)?;
    if count > data.len() as u64 {
        return Err(IndexError::CorruptIndex(format!(
            "dictionary claims {} entries in {} bytes",
            count,
            data.len()
        )));
    }
    let mut dictionary = HashMap::with_capacity(count as usize);

    for _ in 0..count {
        let term_len = decode_vbyte(&data, &mut pos)? as usize;
        let term_bytes = pos
            .checked_add(term_len)
            .and_then(|end| data.get(pos..end))
            .ok_or_else(|| IndexError::CorruptIndex("truncated term in dictionary".into()))?;
        pos += term_len;
        let term = std::str::from_utf8(term_bytes)
            .map_err(|_| IndexError::CorruptIndex("dictionary term is not UTF-8".into()))?
            .to_owned();

        let offset = decode_vbyte(&data, &mut pos)?;
        let length = decode_vbyte(&data, &mut pos)?;
        let df = u32::try_from(decode_vbyte(&data, &mut pos)?).map_err(|_| {
            IndexError::CorruptIndex("document frequency exceeds 32 bits".into())
        })?;

        if dictionary
            .insert(term, DictEntry { offset, length, df })
            .is_some()
        {
            return Err(IndexError::CorruptIndex(
                "dictionary contains a repeated term".into(),
            ));
        }
    }

    if pos != data.len() {
        return Err(IndexError::CorruptIndex(
            "trailing bytes after dictionary entries".into(),
        ));
    }

    Ok(dictionary)
}

/// Writes the positional document-id table: a count, then each identifier
/// length-prefixed. The position of an identifier is its `doc_index`.
pub(crate) fn write_doc_ids(dir: &Path, doc_ids: &[String]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(dir.join(DOC_IDS_BIN))?);
    writer.write_u64::<BigEndian>(doc_ids.len() as u64)?;
    for doc_id in doc_ids {
        let len = u16::try_from(doc_id.len()).map_err(|_| {
            IndexError::MalformedInput(format!("document identifier too long: {}", doc_id))
        })?;
        writer.write_u16::<BigEndian>(len)?;
        writer.write_all(doc_id.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn read_doc_ids(dir: &Path) -> Result<Vec<String>> {
    let mut reader = BufReader::new(File::open(dir.join(DOC_IDS_BIN))?);
    let count = reader.read_u64::<BigEndian>().map_err(|_| {
        IndexError::CorruptIndex("document table is missing its count".into())
    })?;

    let mut doc_ids = Vec::new();
    for _ in 0..count {
        let len = reader.read_u16::<BigEndian>().map_err(|_| {
            IndexError::CorruptIndex("truncated document table".into())
        })?;
        let mut bytes = vec![0u8; usize::from(len)];
        reader.read_exact(&mut bytes).map_err(|_| {
            IndexError::CorruptIndex("truncated document identifier".into())
        })?;
        let doc_id = String::from_utf8(bytes).map_err(|_| {
            IndexError::CorruptIndex("document identifier is not UTF-8".into())
        })?;
        doc_ids.push(doc_id);
    }

    let mut rest = Vec::new();
    reader.read_to_end(&mut rest)?;
    if !rest.is_empty() {
        return Err(IndexError::CorruptIndex(
            "trailing bytes after document table".into(),
        ));
    }

    Ok(doc_ids)
}

pub(crate) fn write_stats(dir: &Path, stats: &IndexStats) -> Result<()> {
    let mut writer = BufWriter::new(File::create(dir.join(STATS_JSON))?);
    serde_json::to_writer(&mut writer, stats)
        .map_err(|e| IndexError::Io(std::io::Error::other(e)))?;
    writer.flush()?;
    Ok(())
}

fn read_stats(dir: &Path) -> Result<IndexStats> {
    let reader = BufReader::new(File::open(dir.join(STATS_JSON))?);
    serde_json::from_reader(reader)
        .map_err(|e| IndexError::CorruptIndex(format!("unreadable statistics record: {}", e)))
}

/// A loaded index: dictionary, document table and statistics in memory, the
/// postings blob behind a [`Buffer`]. Read-only after load; a query keeps its
/// own accumulator, so one instance can serve callers concurrently.
pub struct Index {
    dictionary: HashMap<String, DictEntry>,
    doc_ids: Vec<String>,
    stats: IndexStats,
    postings: Box<dyn Buffer>,
}

impl std::fmt::Debug for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Index")
            .field("dictionary", &self.dictionary)
            .field("doc_ids", &self.doc_ids)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Index {
    /// Opens an index directory, validating the four artifacts against each
    /// other. `in_memory` loads the postings blob eagerly instead of
    /// memory-mapping it.
    pub fn load(dir: &Path, in_memory: bool) -> Result<Index> {
        for name in [POSTINGS_BIN, DICTIONARY_BIN, DOC_IDS_BIN, STATS_JSON] {
            if !dir.join(name).exists() {
                return Err(IndexError::CorruptIndex(format!(
                    "missing artifact {} in {}",
                    name,
                    dir.display()
                )));
            }
        }

        let stats = read_stats(dir)?;
        let dictionary = read_dictionary(dir)?;
        let doc_ids = read_doc_ids(dir)?;

        let postings_path = dir.join(POSTINGS_BIN);
        let postings: Box<dyn Buffer> = if in_memory {
            Box::new(MemoryBuffer::open(&postings_path)?)
        } else {
            Box::new(MmapBuffer::open(&postings_path)?)
        };

        let index = Index {
            dictionary,
            doc_ids,
            stats,
            postings,
        };
        index.validate()?;

        info!(
            "loaded index from {}: {} documents, {} terms, {} postings",
            dir.display(),
            index.stats.num_documents,
            index.stats.num_terms,
            index.stats.num_postings
        );
        Ok(index)
    }

    /// Cross-checks counts and byte ranges: the dictionary and document
    /// table must match the statistics record, and the dictionary ranges
    /// must tile the postings blob exactly.
    fn validate(&self) -> Result<()> {
        if self.dictionary.len() as u64 != self.stats.num_terms {
            return Err(IndexError::CorruptIndex(format!(
                "dictionary holds {} terms, statistics claim {}",
                self.dictionary.len(),
                self.stats.num_terms
            )));
        }
        if self.doc_ids.len() as u64 != self.stats.num_documents {
            return Err(IndexError::CorruptIndex(format!(
                "document table holds {} entries, statistics claim {}",
                self.doc_ids.len(),
                self.stats.num_documents
            )));
        }

        let total_df: u64 = self.dictionary.values().map(|e| u64::from(e.df)).sum();
        if total_df != self.stats.num_postings {
            return Err(IndexError::CorruptIndex(format!(
                "dictionary implies {} postings, statistics claim {}",
                total_df, self.stats.num_postings
            )));
        }

        // The blob has no gaps or padding: sorted by offset, the ranges must
        // be contiguous and end at the file size.
        let mut entries: Vec<&DictEntry> = self.dictionary.values().collect();
        entries.sort_by_key(|e| e.offset);
        let mut expected_offset = 0u64;
        for entry in entries {
            if entry.offset != expected_offset {
                return Err(IndexError::CorruptIndex(format!(
                    "postings range starts at byte {}, expected {}",
                    entry.offset, expected_offset
                )));
            }
            expected_offset += entry.length;
        }
        if expected_offset != self.postings.len() as u64 {
            return Err(IndexError::CorruptIndex(format!(
                "postings blob is {} bytes, dictionary covers {}",
                self.postings.len(),
                expected_offset
            )));
        }

        Ok(())
    }

    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }

    pub fn num_documents(&self) -> u64 {
        self.stats.num_documents
    }

    /// Dictionary lookup. Unknown terms are simply absent.
    pub fn entry(&self, term: &str) -> Option<&DictEntry> {
        self.dictionary.get(term)
    }

    /// Reads and decodes one term's postings list.
    pub fn postings(&self, entry: &DictEntry) -> Result<Vec<Posting>> {
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        let data = self.postings.data().get(start..end).ok_or_else(|| {
            IndexError::CorruptIndex(format!(
                "postings range {}..{} is outside the blob",
                start, end
            ))
        })?;
        debug!("decoding {} postings from bytes {}..{}", entry.df, start, end);
        decode_postings(data, entry.df as usize)
    }

    /// Resolves a positional document index back to its identifier.
    pub fn doc_id(&self, doc_index: DocIndex) -> Option<&str> {
        self.doc_ids.get(doc_index as usize).map(String::as_str)
    }
}
