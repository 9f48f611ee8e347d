use ntest::assert_about_eq;
use temp_dir::TempDir;

use tfidf_index::builder::Indexer;
use tfidf_index::index::Index;
use tfidf_index::search::{search, ScoredDocument, TopScoredDocuments};

/// Initialize the logger
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const CORPUS: [(&str, &str); 4] = [
    ("WSJ001", "Daminozide is a plant growth regulator."),
    ("WSJ002", "Economic policy affects growth."),
    ("WSJ003", "Policy, policy, policy!"),
    ("WSJ004", "The growth of Daminozide use declined."),
];

fn build_corpus() -> (TempDir, Index) {
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut indexer = Indexer::new(dir.path());
    for (doc_id, body) in CORPUS {
        indexer.add(doc_id, body).expect("add failed");
    }
    indexer.finish().expect("build failed");
    let index = Index::load(dir.path(), true).expect("load failed");
    (dir, index)
}

fn doc_ids(results: &[ScoredDocument]) -> Vec<&str> {
    results.iter().map(|r| r.doc_id.as_str()).collect()
}

#[test]
fn test_equal_scores_tie_break_on_doc_id() {
    init_logger();
    let (_dir, index) = build_corpus();

    // df = 2, tf = 1 in both documents, so the scores tie
    let results = search(&index, "Daminozide", None).unwrap();
    assert_eq!(doc_ids(&results), vec!["WSJ001", "WSJ004"]);
    let expected = (4.0f64 / 2.0).log10();
    assert_about_eq!(results[0].score, expected, 1e-9);
    assert_about_eq!(results[1].score, expected, 1e-9);
}

#[test]
fn test_term_frequency_raises_the_score() {
    init_logger();
    let (_dir, index) = build_corpus();

    let results = search(&index, "policy", None).unwrap();
    assert_eq!(doc_ids(&results), vec!["WSJ003", "WSJ002"]);
    // tf = 3 in WSJ003, tf = 1 in WSJ002, df = 2 for both
    assert_about_eq!(
        results[0].score,
        (1.0 + 3.0f64.log10()) * 2.0f64.log10(),
        1e-9
    );
    assert_about_eq!(results[1].score, 2.0f64.log10(), 1e-9);
}

#[test]
fn test_matching_both_terms_ranks_first() {
    init_logger();
    let (_dir, index) = build_corpus();

    let results = search(&index, "economic policy", None).unwrap();
    assert_eq!(doc_ids(&results), vec!["WSJ002", "WSJ003"]);
    // WSJ002 matches both terms: idf(economic) = log10(4), idf(policy) = log10(2)
    assert_about_eq!(
        results[0].score,
        4.0f64.log10() + 2.0f64.log10(),
        1e-9
    );
}

#[test]
fn test_rare_term_dominates_common_one() {
    init_logger();
    let (_dir, index) = build_corpus();

    // "the" occurs only in WSJ004 (no stopword removal), "growth" in three
    // documents; WSJ004 must outrank the growth-only matches
    let results = search(&index, "the growth", None).unwrap();
    assert_eq!(doc_ids(&results), vec!["WSJ004", "WSJ001", "WSJ002"]);

    let idf_growth = (4.0f64 / 3.0).log10();
    assert_about_eq!(results[0].score, 4.0f64.log10() + idf_growth, 1e-9);
    assert_about_eq!(results[1].score, idf_growth, 1e-9);
    assert_about_eq!(results[2].score, idf_growth, 1e-9);
}

#[test]
fn test_unknown_term_yields_empty_result() {
    init_logger();
    let (_dir, index) = build_corpus();
    assert!(search(&index, "quantum", None).unwrap().is_empty());
}

#[test]
fn test_empty_query_yields_empty_result() {
    init_logger();
    let (_dir, index) = build_corpus();
    assert!(search(&index, "", None).unwrap().is_empty());
    assert!(search(&index, "   ,!?  ", None).unwrap().is_empty());
}

#[test]
fn test_max_results_truncates_after_ordering() {
    init_logger();
    let (_dir, index) = build_corpus();

    // three equal-score matches, tie-broken by identifier, then cut to two
    let results = search(&index, "growth", Some(2)).unwrap();
    assert_eq!(doc_ids(&results), vec!["WSJ001", "WSJ002"]);
}

#[test]
fn test_query_multiplicity_does_not_weight() {
    init_logger();
    let (_dir, index) = build_corpus();

    let once = search(&index, "policy", None).unwrap();
    let thrice = search(&index, "policy policy policy", None).unwrap();
    assert_eq!(doc_ids(&once), doc_ids(&thrice));
    assert_about_eq!(once[0].score, thrice[0].score, 1e-9);
}

#[test]
fn test_term_in_every_document_scores_nothing() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut indexer = Indexer::new(dir.path());
    indexer.add("WSJ001", "growth everywhere").unwrap();
    indexer.add("WSJ002", "growth here too").unwrap();
    indexer.finish().unwrap();
    let index = Index::load(dir.path(), true).unwrap();

    // df = N, so the inverse document frequency is zero
    assert!(search(&index, "growth", None).unwrap().is_empty());

    // it contributes nothing to a mixed query either
    let results = search(&index, "growth everywhere", None).unwrap();
    assert_eq!(doc_ids(&results), vec!["WSJ001"]);
}

#[test]
fn test_document_finds_itself() {
    init_logger();
    let (_dir, index) = build_corpus();

    // the normalized body of a document is a query that returns it with a
    // positive score, normalization being identical on both paths
    for (doc_id, body) in CORPUS {
        let results = search(&index, body, None).unwrap();
        let hit = results
            .iter()
            .find(|r| r.doc_id == doc_id)
            .unwrap_or_else(|| panic!("document {} does not find itself", doc_id));
        assert!(hit.score > 0.);
    }
}

#[test]
fn test_normalization_symmetry_with_markup() {
    init_logger();
    let dir = TempDir::new().expect("Could not create temporary directory");
    let mut indexer = Indexer::new(dir.path());
    indexer
        .add("WSJ001", "AT&amp;T ships a state-of-the-art switchboard")
        .unwrap();
    indexer.add("WSJ002", "Plain filler text").unwrap();
    indexer.finish().unwrap();
    let index = Index::load(dir.path(), true).unwrap();

    for query in ["att", "AT&amp;T", "stateoftheart", "state-of-the-art"] {
        let results = search(&index, query, None).unwrap();
        assert_eq!(doc_ids(&results), vec!["WSJ001"], "query '{}'", query);
    }
}

#[test]
fn test_top_k_ordering() {
    init_logger();
    let mut top = TopScoredDocuments::new(3);
    top.add("WSJ005".into(), 0.1);
    top.add("WSJ001".into(), 0.5);
    top.add("WSJ004".into(), 0.3);
    top.add("WSJ002".into(), 0.3);
    top.add("WSJ003".into(), 0.05);

    let results = top.into_sorted_vec();
    let observed: Vec<&str> = results.iter().map(|r| r.doc_id.as_str()).collect();
    // ties on 0.3 break by ascending identifier; 0.1 and 0.05 fall out
    assert_eq!(observed, vec!["WSJ001", "WSJ002", "WSJ004"]);
}
