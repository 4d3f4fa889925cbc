//! codent CLI: build and query code naturalness models.
//!
//! Thin wrapper over the `codent-corpus` library: `index` walks a source
//! tree and saves a corpus snapshot; `analyze`, `zscore` and `stats` load
//! the snapshot and query it.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use codent_corpus::{BloomParams, CancelFlag, CorpusConfig, CorpusManager, SmootherConfig};
use codent_tokenizer::{default_registry, TokenizerRegistry};
use tracing::warn;

/// Directories that never contain first-party source worth modeling.
const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    ".vscode",
    ".idea",
    "vendor",
    "target",
    "build",
    "dist",
    "__pycache__",
    ".pytest_cache",
    "coverage",
    "site-packages",
    ".next",
    ".nuxt",
    "venv",
    "env",
];

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SmootherArg {
    AddK,
    WittenBell,
}

/// Statistical n-gram code naturalness analysis.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Directory snapshots are stored in.
    #[arg(long, default_value = "./ngram_models", global = true)]
    storage_dir: PathBuf,

    /// Corpus name (snapshot file is `<name>_ngram.bin`).
    #[arg(long, default_value = "corpus", global = true)]
    name: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk a source tree, build the corpus and save a snapshot.
    Index {
        /// Root directory to ingest.
        dir: PathBuf,

        /// N-gram order.
        #[arg(long, default_value_t = 3)]
        n: usize,

        /// Smoothing algorithm.
        #[arg(long, value_enum, default_value_t = SmootherArg::AddK)]
        smoother: SmootherArg,

        /// k for add-k smoothing.
        #[arg(long, default_value_t = 1.0)]
        k: f64,

        /// Disable the bloom-filter singleton gate.
        #[arg(long)]
        no_bloom: bool,

        /// Expected distinct n-grams for the bloom gate.
        #[arg(long, default_value_t = 100_000)]
        bloom_items: u32,

        /// Target false-positive rate for the bloom gate.
        #[arg(long, default_value_t = 0.01)]
        bloom_fpr: f64,
    },
    /// Score a file's entropy and perplexity against a saved corpus.
    Analyze {
        file: PathBuf,

        /// Language override; detected from the extension by default.
        #[arg(long)]
        language: Option<String>,
    },
    /// Full z-score report for a file against a saved corpus.
    Zscore {
        file: PathBuf,

        /// Language override; detected from the extension by default.
        #[arg(long)]
        language: Option<String>,

        /// How many of the most surprising n-grams to print.
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Print statistics for a saved corpus.
    Stats,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let registry = Arc::new(default_registry());

    match args.command {
        Command::Index {
            dir,
            n,
            smoother,
            k,
            no_bloom,
            bloom_items,
            bloom_fpr,
        } => {
            let smoother = match smoother {
                SmootherArg::AddK => SmootherConfig::AddK { k },
                SmootherArg::WittenBell => SmootherConfig::WittenBell,
            };
            let bloom = if no_bloom {
                None
            } else {
                Some(BloomParams {
                    expected_items: bloom_items,
                    false_positive_rate: bloom_fpr,
                })
            };
            let config = CorpusConfig {
                n,
                smoother,
                bloom,
                storage_dir: Some(args.storage_dir.clone()),
                corpus_name: args.name,
            };
            index(&dir, config, &args.storage_dir, &registry)
        }
        Command::Analyze { file, language } => {
            let corpus = load_corpus(&args.storage_dir, &args.name, &registry)?;
            let language = resolve_language(&corpus, &file, language)?;
            let source = fs::read(&file)?;
            let analysis = corpus.analyze_code(&language, &source, &CancelFlag::new())?;

            println!("file:       {}", file.display());
            println!("language:   {}", analysis.language);
            println!("tokens:     {}", analysis.token_count);
            println!("entropy:    {:.4}", analysis.entropy);
            println!("perplexity: {:.4}", analysis.perplexity);
            Ok(())
        }
        Command::Zscore {
            file,
            language,
            top,
        } => {
            let corpus = load_corpus(&args.storage_dir, &args.name, &registry)?;
            let language = resolve_language(&corpus, &file, language)?;
            let source = fs::read(&file)?;
            let report = corpus.calculate_z_score(&language, &source, &CancelFlag::new())?;

            println!("file:       {}", file.display());
            println!("tokens:     {}", report.token_count);
            println!("entropy:    {:.4}", report.entropy);
            println!("z-score:    {:+.4}", report.z_score);
            println!(
                "level:      {} (~{}th percentile)",
                report.interpretation.level, report.interpretation.percentile
            );
            println!("            {}", report.interpretation.description);
            println!(
                "corpus:     mean {:.4}, stddev {:.4} over {} files",
                report.entropy_stats.mean, report.entropy_stats.std_dev, report.entropy_stats.count
            );

            let mut scores = report.ngram_scores;
            scores.sort_by(|a, b| b.log_prob.total_cmp(&a.log_prob));
            if !scores.is_empty() && top > 0 {
                println!("most surprising n-grams:");
                for score in scores.iter().take(top) {
                    println!(
                        "  {:>8.4}  {}",
                        score.log_prob,
                        score.ngram.join(" ")
                    );
                }
            }
            Ok(())
        }
        Command::Stats => {
            let corpus = load_corpus(&args.storage_dir, &args.name, &registry)?;
            let stats = corpus.stats();

            println!("files:        {}", stats.total_files);
            println!("tokens:       {}", stats.total_tokens);
            for (language, count) in &stats.language_counts {
                println!("  {language}: {count}");
            }
            let g = &stats.global_model;
            println!(
                "global model: n={}, vocab={}, ngrams={}, tokens={}, smoother={}",
                g.n, g.vocabulary_size, g.ngram_count, g.total_tokens, g.smoother_name
            );
            let e = &stats.entropy;
            println!(
                "entropy:      mean {:.4}, stddev {:.4}, min {:.4}, max {:.4}",
                e.mean, e.std_dev, e.min, e.max
            );
            Ok(())
        }
    }
}

fn load_corpus(
    storage_dir: &Path,
    name: &str,
    registry: &Arc<TokenizerRegistry>,
) -> Result<CorpusManager, Box<dyn Error>> {
    let config = CorpusConfig {
        storage_dir: Some(storage_dir.to_path_buf()),
        corpus_name: name.to_string(),
        ..CorpusConfig::default()
    };
    Ok(CorpusManager::load_from_dir(
        storage_dir,
        config,
        Arc::clone(registry),
    )?)
}

fn resolve_language(
    corpus: &CorpusManager,
    file: &Path,
    override_language: Option<String>,
) -> Result<String, Box<dyn Error>> {
    if let Some(language) = override_language {
        return Ok(language);
    }
    let extension = file
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    corpus
        .registry()
        .language_for_extension(&extension)
        .map(str::to_string)
        .ok_or_else(|| format!("cannot detect language for {}", file.display()).into())
}

fn index(
    dir: &Path,
    config: CorpusConfig,
    storage_dir: &Path,
    registry: &Arc<TokenizerRegistry>,
) -> Result<(), Box<dyn Error>> {
    let corpus = CorpusManager::new(config, Arc::clone(registry));
    let cancel = CancelFlag::new();

    let mut candidates = Vec::new();
    collect_files(dir, &mut candidates)?;
    candidates.sort();

    let mut ingested = 0usize;
    let mut skipped = 0usize;
    for path in &candidates {
        cancel.check()?;

        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let Some(language) = registry.language_for_extension(&extension) else {
            skipped += 1;
            continue;
        };
        let language = language.to_string();

        let source = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to read file");
                continue;
            }
        };

        match corpus.add_file(&path.display().to_string(), &source, &language, &cancel) {
            Ok(()) => ingested += 1,
            Err(err) => warn!(path = %path.display(), error = %err, "failed to ingest file"),
        }
    }

    let snapshot_path = corpus.save_to_dir(storage_dir)?;
    let stats = corpus.stats();
    println!(
        "Indexed {ingested} files ({skipped} without a registered language), {} tokens.",
        stats.total_tokens
    );
    println!(
        "Mean file entropy {:.4} (stddev {:.4}).",
        stats.entropy.mean, stats.entropy.std_dev
    );
    println!("Snapshot written to {}.", snapshot_path.display());
    Ok(())
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if SKIP_DIRS.contains(&name.as_ref()) {
                continue;
            }
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}
