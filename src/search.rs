//! Query processing: term lookup, postings decoding, TF-IDF scoring and
//! deterministic ranking.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use log::debug;

use crate::base::{DocIndex, IndexError, Result};
use crate::index::Index;
use crate::normalizer::normalize;

pub struct ScoredDocument {
    pub doc_id: String,
    pub score: f64,
}

impl Clone for ScoredDocument {
    fn clone(&self) -> Self {
        Self {
            doc_id: self.doc_id.clone(),
            score: self.score,
        }
    }
}

impl std::fmt::Display for ScoredDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.doc_id, self.score)
    }
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score && self.doc_id == other.doc_id
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ranking order: higher score first, ties broken by ascending identifier.
/// `Less` means "ranks earlier", so sorting ascending yields the result list.
impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Bounded accumulator for the best `top_k` documents.
pub struct TopScoredDocuments {
    heap: BinaryHeap<ScoredDocument>,
    top_k: usize,
}

impl TopScoredDocuments {
    pub fn new(top_k: usize) -> Self {
        Self {
            heap: BinaryHeap::new(),
            top_k,
        }
    }

    pub fn add(&mut self, doc_id: String, score: f64) {
        let candidate = ScoredDocument { doc_id, score };
        if self.heap.len() < self.top_k {
            self.heap.push(candidate);
        } else if let Some(worst) = self.heap.peek() {
            // the heap's maximum is the currently worst-ranked kept document
            if candidate.cmp(worst) == Ordering::Less {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    pub fn into_sorted_vec(self) -> Vec<ScoredDocument> {
        self.heap.into_sorted_vec()
    }
}

/// Runs one query against a loaded index.
///
/// The query is normalized with the index-time rules and deduplicated
/// (multiplicity does not weight a term). Unknown terms and terms occurring
/// in every document contribute nothing; an empty normalized query yields an
/// empty result. Results are ranked by descending score, ties broken by
/// ascending identifier, and truncated to `max_results` when given.
pub fn search(
    index: &Index,
    query: &str,
    max_results: Option<usize>,
) -> Result<Vec<ScoredDocument>> {
    // deduplicated and iterated in a fixed order, so score accumulation is
    // reproducible down to the floating-point rounding
    let terms: BTreeSet<String> = normalize(query).into_iter().collect();
    if terms.is_empty() {
        debug!("query normalized to nothing");
        return Ok(Vec::new());
    }

    let num_documents = index.num_documents();
    let mut scores: HashMap<DocIndex, f64> = HashMap::new();

    for term in &terms {
        let Some(entry) = index.entry(term) else {
            debug!("term '{}' is not in the dictionary", term);
            continue;
        };
        if u64::from(entry.df) >= num_documents {
            // zero inverse document frequency, nothing to contribute
            debug!("term '{}' occurs in every document", term);
            continue;
        }

        let idf = (num_documents as f64 / f64::from(entry.df)).log10();
        for posting in index.postings(entry)? {
            let weight = (1.0 + f64::from(posting.term_freq).log10()) * idf;
            *scores.entry(posting.doc_index).or_insert(0.0) += weight;
        }
    }

    let resolve = |doc_index: DocIndex| -> Result<String> {
        index
            .doc_id(doc_index)
            .map(str::to_owned)
            .ok_or_else(|| {
                IndexError::CorruptIndex(format!(
                    "posting references unknown document index {}",
                    doc_index
                ))
            })
    };

    match max_results {
        Some(top_k) => {
            let mut top = TopScoredDocuments::new(top_k);
            for (doc_index, score) in scores {
                top.add(resolve(doc_index)?, score);
            }
            Ok(top.into_sorted_vec())
        }
        None => {
            let mut results = Vec::with_capacity(scores.len());
            for (doc_index, score) in scores {
                results.push(ScoredDocument {
                    doc_id: resolve(doc_index)?,
                    score,
                });
            }
            results.sort();
            Ok(results)
        }
    }
}
