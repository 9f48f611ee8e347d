use rand::{Rng, RngCore};
use rand_distr::{Distribution, Poisson};

pub struct TestDocument {
    pub doc_id: String,
    pub body: String,
}

/// Draws a document body from a synthetic vocabulary (`term000`,
/// `term001`, …). The word count follows a Poisson distribution, capped at
/// `max_words`, with at least one word.
pub fn create_document(
    lambda_words: f32,
    max_words: usize,
    vocabulary_size: usize,
    rng: &mut dyn RngCore,
) -> String {
    let poi = Poisson::new(lambda_words).unwrap();
    let num_words = (1 + poi.sample(rng) as usize).min(max_words);

    let mut words = Vec::with_capacity(num_words);
    for _ in 0..num_words {
        let term_ix = rng.gen_range(0..vocabulary_size);
        words.push(format!("term{:03}", term_ix));
    }
    words.join(" ")
}

/// Builds a corpus of `document_count` documents with newswire-style
/// identifiers whose lexicographic order matches insertion order.
pub fn create_corpus(
    document_count: usize,
    lambda_words: f32,
    max_words: usize,
    vocabulary_size: usize,
    rng: &mut dyn RngCore,
) -> Vec<TestDocument> {
    (0..document_count)
        .map(|ix| TestDocument {
            doc_id: format!("WSJ870108-{:04}", ix),
            body: create_document(lambda_words, max_words, vocabulary_size, rng),
        })
        .collect()
}
