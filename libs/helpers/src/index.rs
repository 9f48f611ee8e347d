use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use temp_dir::TempDir;

use tfidf_index::base::{DocIndex, IndexStats, Posting, TermFreq};
use tfidf_index::builder::Indexer;
use tfidf_index::index::Index;
use tfidf_index::normalizer::normalize;

use crate::corpus::{create_corpus, TestDocument};

/// A temporary index built over a generated corpus, together with the
/// ground-truth postings computed independently of the builder.
pub struct TestIndex {
    pub dir: TempDir,
    pub documents: Vec<TestDocument>,
    /// term → postings, exactly what the index should contain
    pub expected: HashMap<String, Vec<Posting>>,
    pub stats: IndexStats,
}

impl TestIndex {
    /// Generates a corpus, indexes it into a temporary directory, and
    /// records the expected postings by counting normalized terms directly.
    pub fn new(
        vocabulary_size: usize,
        document_count: usize,
        lambda_words: f32,
        max_words: usize,
        seed: Option<u64>,
    ) -> Self {
        let dir = TempDir::new().expect("Could not create temporary directory");
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let documents = create_corpus(
            document_count,
            lambda_words,
            max_words,
            vocabulary_size,
            &mut rng,
        );

        let mut expected = HashMap::<String, Vec<Posting>>::new();
        let mut indexer = Indexer::new(dir.path());
        for (ix, document) in documents.iter().enumerate() {
            indexer
                .add(&document.doc_id, &document.body)
                .expect("Error while adding a document to the index");

            let mut counts = HashMap::<String, TermFreq>::new();
            for term in normalize(&document.body) {
                *counts.entry(term).or_insert(0) += 1;
            }
            for (term, term_freq) in counts {
                expected.entry(term).or_default().push(Posting {
                    doc_index: ix as DocIndex,
                    term_freq,
                });
            }
        }

        let stats = indexer.finish().expect("Error while building the index");

        Self {
            dir,
            documents,
            expected,
            stats,
        }
    }

    pub fn load(&self, in_memory: bool) -> Index {
        Index::load(self.dir.path(), in_memory).expect("Error while loading the index")
    }
}
