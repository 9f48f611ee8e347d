use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};

use tfidf_index::base::{IndexError, Result};
use tfidf_index::builder::Indexer;
use tfidf_index::index::Index;
use tfidf_index::parser;
use tfidf_index::search::search;
use tfidf_index::store::{self, DocStore, StoreReader};

#[derive(Parser)]
#[command(name = "tfidf-index", version, about = "TF-IDF search engine over a newswire corpus")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a newswire feed file into the document store.
    Parse {
        /// Path to the feed file.
        input: PathBuf,

        /// Directory for the document store.
        #[arg(long, default_value = "data")]
        output_dir: PathBuf,
    },

    /// Build the index from a parsed document store.
    Index {
        /// Path to the document store (e.g. data/document_store.jsonl).
        document_store: PathBuf,

        /// Directory for the index artifacts.
        #[arg(long, default_value = "index")]
        output_dir: PathBuf,
    },

    /// Search the index, reading one query per line from stdin.
    Search {
        /// Directory containing the index artifacts.
        #[arg(long, default_value = "index")]
        index_dir: PathBuf,

        /// Path to the document store.
        #[arg(long, default_value = "data/document_store.jsonl")]
        document_store: PathBuf,

        /// Maximum number of results per query; all matches when absent.
        #[arg(long)]
        max_results: Option<usize>,

        /// Read the postings blob into memory instead of memory-mapping it.
        #[arg(long)]
        in_memory: bool,

        /// Log the stored document for each hit (debugging).
        #[arg(long)]
        retrieve_documents: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn exit_code(err: &IndexError) -> u8 {
    match err {
        IndexError::MalformedInput(_) | IndexError::DuplicateDocId(_) => 1,
        IndexError::CorruptIndex(_) => 2,
        IndexError::Io(_) => 3,
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Parse { input, output_dir } => parse_command(&input, &output_dir),
        Command::Index {
            document_store,
            output_dir,
        } => index_command(&document_store, &output_dir),
        Command::Search {
            index_dir,
            document_store,
            max_results,
            in_memory,
            retrieve_documents,
        } => search_command(
            &index_dir,
            &document_store,
            max_results,
            in_memory,
            retrieve_documents,
        ),
    }
}

fn parse_command(input: &PathBuf, output_dir: &PathBuf) -> Result<()> {
    info!("parsing feed file {}", input.display());
    let documents = parser::parse_file(input)?;
    info!("parsed {} documents", documents.len());

    std::fs::create_dir_all(output_dir)?;
    let store_path = output_dir.join(store::DOCUMENT_STORE);
    store::write_store(&store_path, &documents)?;
    info!(
        "wrote {} documents to {}",
        documents.len(),
        store_path.display()
    );
    Ok(())
}

fn index_command(document_store: &PathBuf, output_dir: &PathBuf) -> Result<()> {
    info!("building index from {}", document_store.display());

    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} documents")
            .expect("valid progress template"),
    );

    let mut indexer = Indexer::new(output_dir);
    for record in StoreReader::open(document_store)? {
        let document = record?;
        indexer.add(&document.doc_id, &document.body)?;
        progress.inc(1);
    }
    progress.finish_and_clear();

    let stats = indexer.finish()?;
    info!(
        "indexed {} documents, {} terms, {} postings in {} ms",
        stats.num_documents, stats.num_terms, stats.num_postings, stats.build_ms
    );
    Ok(())
}

fn search_command(
    index_dir: &PathBuf,
    document_store: &PathBuf,
    max_results: Option<usize>,
    in_memory: bool,
    retrieve_documents: bool,
) -> Result<()> {
    let index = Index::load(index_dir, in_memory)?;
    let mut doc_store = retrieve_documents.then(|| DocStore::open(document_store));

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for line in stdin.lock().lines() {
        let query = line?;
        let results = search(&index, &query, max_results)?;
        info!("query '{}': {} results", query, results.len());

        for hit in &results {
            writeln!(out, "{} {:.4}", hit.doc_id, hit.score)?;
        }
        out.flush()?;

        if let Some(doc_store) = doc_store.as_mut() {
            for hit in &results {
                if let Some(document) = doc_store.get(&hit.doc_id)? {
                    debug!("{}: {}", document.doc_id, document.headline);
                }
            }
        }
    }

    Ok(())
}
