use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ragkit_core::config::{resolve_with_base, Config, DataSettings, RetrievalSettings, VectorSettings};
use ragkit_core::corpus::read_corpus;
use ragkit_core::store::InMemoryChunkStore;
use ragkit_core::types::Modality;
use ragkit_embed::get_default_embedder;
use ragkit_hybrid::{FusionWeights, HybridRetriever};
use ragkit_text::{Bm25Index, Bm25Params};
use ragkit_validate::{refusal_message, RetrievalValidator, ValidationPolicy};
use ragkit_vector::{ModalityIndexes, VectorIndex};

const LEXICAL_FILE: &str = "lexical.json";
const CHUNKS_FILE: &str = "chunks.json";

/// Hybrid retrieval over a local chunk corpus.
#[derive(Parser, Debug)]
#[command(name = "ragkit", version, about = "Index a chunk corpus and run validated hybrid queries")]
struct Cli {
    /// Index directory (overrides `data.index_dir`).
    #[arg(long, global = true, env = "RAGKIT_INDEX_DIR")]
    index_dir: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build every index from a JSON-lines corpus.
    Ingest {
        /// One `{"chunk_id", "text", "image_embedding"?}` object per line.
        corpus: PathBuf,
    },
    /// Retrieve, fuse and validate evidence for a question.
    Query {
        text: String,
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },
    /// Show what is currently indexed.
    Status,
}

struct Settings {
    index_dir: PathBuf,
    lexical: Bm25Params,
    fusion: FusionWeights,
    validation: ValidationPolicy,
    retrieval: RetrievalSettings,
    vector: VectorSettings,
}

impl Settings {
    fn load(index_dir_override: Option<String>) -> Result<Self> {
        let config = Config::load().context("loading configuration")?;
        let data: DataSettings = config.get_or_default("data")?;
        // relative to the working directory, like config.toml
        let base = std::env::current_dir().context("resolving working directory")?;
        Ok(Self {
            index_dir: resolve_with_base(&base, index_dir_override.unwrap_or(data.index_dir)),
            lexical: config.get_or_default("lexical")?,
            fusion: config.get_or_default("fusion")?,
            validation: config.get_or_default("validation")?,
            retrieval: config.get_or_default("retrieval")?,
            vector: config.get_or_default("vector")?,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let settings = Settings::load(cli.index_dir)?;
    match cli.command {
        Commands::Ingest { corpus } => ingest(&settings, &corpus),
        Commands::Query { text, top_k } => query(&settings, &text, top_k.unwrap_or(settings.retrieval.top_k)),
        Commands::Status => status(&settings),
    }
}

fn ingest(settings: &Settings, corpus: &Path) -> Result<()> {
    let records = read_corpus(corpus).with_context(|| format!("reading corpus {}", corpus.display()))?;
    let dir = &settings.index_dir;

    let embedder = get_default_embedder(settings.vector.text_dim)?;
    let mut retriever = HybridRetriever::new(Bm25Index::new(settings.lexical), VectorIndex::new(settings.vector.text_dim)?, embedder)?;
    let report = retriever.index(
        records.iter().filter(|r| !r.text.is_empty()).map(|r| (r.chunk_id.as_str(), r.text.as_str())),
    )?;
    let (lexical, text_vectors) = retriever.into_parts();

    let modalities = ModalityIndexes::from_parts(text_vectors, VectorIndex::new(settings.vector.image_dim)?);
    for record in &records {
        if let Some(embedding) = &record.image_embedding {
            modalities
                .add(Modality::Image, &record.chunk_id, embedding)
                .with_context(|| format!("image embedding of chunk {}", record.chunk_id))?;
        }
    }

    let store: InMemoryChunkStore = records.iter().map(|r| (r.chunk_id.as_str(), r.text.as_str())).collect();

    lexical.save(&dir.join(LEXICAL_FILE))?;
    modalities.save(dir)?;
    store.save(&dir.join(CHUNKS_FILE))?;

    println!("Ingested {} records into {}", records.len(), dir.display());
    println!("  lexical: {} indexed, {} without tokens", report.lexical_indexed, report.lexical_skipped);
    println!("  text vectors: {} indexed, {} skipped", report.dense_indexed, report.dense_skipped);
    println!("  image vectors: {}", modalities.len(Modality::Image));
    Ok(())
}

fn load_lexical(dir: &Path) -> Result<Bm25Index> {
    let path = dir.join(LEXICAL_FILE);
    Bm25Index::load(&path).with_context(|| format!("loading {} (run `ragkit ingest` first)", path.display()))
}

fn query(settings: &Settings, text: &str, top_k: usize) -> Result<()> {
    let dir = &settings.index_dir;
    let lexical = load_lexical(dir)?;
    let (text_vectors, _) = ModalityIndexes::open(dir, settings.vector)?.into_inner();
    let embedder = get_default_embedder(settings.vector.text_dim)?;
    let retriever = HybridRetriever::new(lexical, text_vectors, embedder)?.with_weights(settings.fusion);

    let retrieval = retriever.retrieve(text, top_k)?;
    println!("Query: {}", retrieval.query);
    println!("{} candidates (top_k={})", retrieval.candidates.len(), retrieval.top_k);
    for (i, hit) in retrieval.candidates.iter().enumerate() {
        println!(
            "  {}. {}  fused={:.4}  dense={:.4}  sparse={:.4}",
            i + 1,
            hit.chunk_id,
            hit.fused_score,
            hit.dense_score,
            hit.sparse_score
        );
    }

    let store = InMemoryChunkStore::load(&dir.join(CHUNKS_FILE))?;
    let verdict = RetrievalValidator::new(settings.validation).validate(&retrieval.candidates, retrieval.top_k, &store)?;
    match verdict.reason {
        None => println!("\nadmitted"),
        Some(reason) => println!("\n{}", refusal_message(reason)),
    }
    Ok(())
}

fn status(settings: &Settings) -> Result<()> {
    let dir = &settings.index_dir;
    println!("Index directory: {}", dir.display());
    let lexical = load_lexical(dir)?;
    println!("  lexical: {} chunks, avgdl {:.2}", lexical.corpus_size(), lexical.average_doc_length());
    let modalities = ModalityIndexes::open(dir, settings.vector)?;
    for modality in Modality::ALL {
        println!("  {} vectors: {} (dim {})", modality, modalities.len(modality), modalities.dim(modality));
    }
    Ok(())
}
