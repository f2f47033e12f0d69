//! riskalpha CLI binary.
//!
//! Batch entry point: run the pipeline over a corpus, ingest a directory
//! corpus into SQLite, and inspect or reuse persisted artifacts.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::corpus_source::CorpusSource;
use integration::store_manager;
use riskalpha::data::FileCorpus;
use riskalpha::model::{ForestParams, ModelSpec, RidgeParams};
use riskalpha::output::{ExportFormat, Exporter};
use riskalpha::{ArtifactStore, Pipeline, PipelineConfig, predict_text};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "riskalpha")]
#[command(about = "riskalpha: risk-disclosure text vs. market-adjusted returns", long_about = None)]
#[command(version)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write artifacts
    Run {
        /// Corpus directory or SQLite database
        #[arg(long)]
        corpus: PathBuf,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Artifact output directory
        #[arg(long, default_value = "riskalpha-output")]
        output: PathBuf,

        /// Horizons in trading days, comma separated
        #[arg(long, value_delimiter = ',')]
        horizons: Option<Vec<usize>>,

        /// Vocabulary size
        #[arg(long)]
        vocab: Option<usize>,

        /// Terms per attribution direction
        #[arg(long)]
        top_n: Option<usize>,

        /// Minimum labeled documents per horizon
        #[arg(long)]
        min_samples: Option<usize>,

        /// Model family (ridge or forest)
        #[arg(long)]
        model: Option<String>,

        /// Benchmark symbol for directory corpora
        #[arg(long)]
        benchmark: Option<String>,
    },

    /// Copy a directory corpus into the SQLite store
    Ingest {
        /// Corpus directory
        #[arg(long)]
        corpus: PathBuf,

        /// Database path (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Benchmark symbol
        #[arg(long, default_value = "SPY")]
        benchmark: String,
    },

    /// Print a persisted attribution report
    Terms {
        /// Artifact directory of a previous run
        #[arg(long)]
        output: PathBuf,

        /// Horizon in trading days
        #[arg(long)]
        horizon: usize,

        /// Output format (text, markdown or json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Score a new document with a persisted vocabulary and model
    Predict {
        /// Artifact directory of a previous run
        #[arg(long)]
        output: PathBuf,

        /// Horizon in trading days
        #[arg(long)]
        horizon: usize,

        /// Text file holding the risk disclosure
        file: PathBuf,
    },

    /// Show corpus store statistics
    Stats {
        /// Database path (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Run {
            corpus,
            config,
            output,
            horizons,
            vocab,
            top_n,
            min_samples,
            model,
            benchmark,
        } => {
            let mut config = match config {
                Some(path) => {
                    info!(path = %path.display(), "loading configuration");
                    PipelineConfig::from_file(&path)?
                }
                None => PipelineConfig::default(),
            };
            if let Some(horizons) = horizons {
                config.horizons = horizons;
            }
            if let Some(vocab) = vocab {
                config.vocabulary_size = vocab;
            }
            if let Some(top_n) = top_n {
                config.top_n = top_n;
            }
            if let Some(min_samples) = min_samples {
                config.min_samples = min_samples;
            }
            if let Some(model) = model {
                config.model = parse_model(&model)?;
            }
            if let Some(benchmark) = benchmark {
                config.benchmark = benchmark;
            }
            run_pipeline(&corpus, config, &output)?;
        }
        Commands::Ingest {
            corpus,
            db,
            benchmark,
        } => ingest(&corpus, db.as_deref(), &benchmark)?,
        Commands::Terms {
            output,
            horizon,
            format,
        } => print_terms(&output, horizon, &format)?,
        Commands::Predict {
            output,
            horizon,
            file,
        } => predict(&output, horizon, &file)?,
        Commands::Stats { db } => show_stats(db.as_deref())?,
    }

    Ok(())
}

fn parse_model(name: &str) -> Result<ModelSpec, Box<dyn std::error::Error>> {
    match name.to_lowercase().as_str() {
        "ridge" => Ok(ModelSpec::Ridge(RidgeParams::default())),
        "forest" | "random_forest" => Ok(ModelSpec::RandomForest(ForestParams::default())),
        other => Err(format!("Unknown model family '{}'. Use ridge or forest.", other).into()),
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {elapsed} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn run_pipeline(
    corpus: &Path,
    config: PipelineConfig,
    output_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", "RISK DISCLOSURE ALPHA ANALYSIS");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let source = CorpusSource::detect(corpus)?;
    let store = source.open(&config.benchmark)?;
    let pipeline = Pipeline::new(config)?;

    let cfg = pipeline.config();
    println!("Corpus: {}", corpus.display());
    println!("Horizons: {:?}", cfg.horizons);
    println!("Vocabulary size: {}", cfg.vocabulary_size);
    println!("Model: {}\n", cfg.model.family());

    let pb = spinner("Running pipeline...")?;
    let output = match pipeline.run(store.as_ref()) {
        Ok(output) => {
            pb.finish_with_message(format!(
                "Trained {} of {} horizons ({} documents, {} terms)",
                output.summary.trained().len(),
                cfg.horizons.len(),
                output.report.corpus.valid,
                output.vocabulary.len()
            ));
            output
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    if output.report.corpus.vocabulary_truncated() {
        println!(
            "Vocabulary: {} of {} requested terms (corpus too small)",
            output.report.corpus.vocabulary_size, output.report.corpus.vocabulary_requested
        );
    }
    println!("{}", output.summary.to_ascii_table());
    for report in output.reports.values() {
        println!("{}", report.to_ascii_table());
    }
    if !output.report.corpus.excluded.is_empty() {
        println!("Excluded documents:");
        for (reason, count) in &output.report.corpus.excluded {
            println!("  {:<20} {:>6}", reason, count);
        }
    }

    output.persist(&ArtifactStore::new(output_dir))?;
    println!("\nArtifacts written to {}", output_dir.display());
    Ok(())
}

fn ingest(corpus: &Path, db: Option<&Path>, benchmark: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = store_manager::resolve_db_path(db);
    let store = store_manager::open_store(&db_path)?;

    let pb = spinner("Ingesting corpus...")?;
    match store.import_from(&FileCorpus::with_benchmark(corpus, benchmark)) {
        Ok(stats) => pb.finish_with_message(format!(
            "Stored {} documents, {} price series ({} rows)",
            stats.documents, stats.entities, stats.price_rows
        )),
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    }
    println!("Database: {}", db_path.display());
    Ok(())
}

fn print_terms(output_dir: &Path, horizon: usize, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let report = ArtifactStore::new(output_dir).load_attribution(horizon)?;
    match format.to_lowercase().as_str() {
        "text" => println!("{}", report.to_ascii_table()),
        "markdown" | "md" => println!("{}", report.to_markdown()),
        "json" => println!("{}", report.export_to_string(ExportFormat::PrettyJson)?),
        other => {
            return Err(format!("Unknown format '{}'. Use text, markdown or json.", other).into());
        }
    }
    Ok(())
}

fn predict(output_dir: &Path, horizon: usize, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let artifacts = ArtifactStore::new(output_dir);
    let vocabulary = artifacts.load_vocabulary()?;
    let model = artifacts.load_model(horizon)?;
    let text = std::fs::read_to_string(file)?;

    let predicted = predict_text(&vocabulary, &model, &text)?;
    let result = serde_json::json!({
        "file": file.display().to_string(),
        "horizon": horizon,
        "predicted_alpha": predicted,
    });
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn show_stats(db: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = store_manager::resolve_db_path(db);
    if !db_path.exists() {
        return Err(format!("No corpus store at {}. Run `riskalpha ingest` first.", db_path.display()).into());
    }
    let store = store_manager::open_store(&db_path)?;
    let stats = store.stats()?;

    println!("Corpus store: {}", db_path.display());
    println!("  Documents:     {}", stats.documents);
    println!("  Price series:  {}", stats.entities);
    println!("  Price rows:    {}", stats.price_rows);
    println!(
        "  Benchmark:     {}",
        store.benchmark_symbol()?.unwrap_or_else(|| "-".to_string())
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model() {
        assert_eq!(parse_model("ridge").unwrap(), ModelSpec::Ridge(RidgeParams::default()));
        assert_eq!(
            parse_model("Forest").unwrap(),
            ModelSpec::RandomForest(ForestParams::default())
        );
        assert!(parse_model("svm").is_err());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "riskalpha", "run", "--corpus", "data", "--horizons", "1,5", "--vocab", "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                horizons, vocab, ..
            } => {
                assert_eq!(horizons, Some(vec![1, 5]));
                assert_eq!(vocab, Some(10));
            }
            _ => panic!("expected run"),
        }
    }
}
