//! lexlink CLI: statute linking, training-data extraction and corpus tools.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use lexlink::annotate::Annotator;
use lexlink::config::LexConfig;
use lexlink::corpus::{self, TrainingArchive};
use lexlink::extract::{Extractor, TrainingModel};
use lexlink::paths::LexPaths;

#[derive(Parser)]
#[command(name = "lexlink", version, about = "Legal document annotation and training-data tools")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/lexlink/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link statutes and extract citations and organizations.
    Annotate {
        /// Input file (text or HTML). Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Only link statutes; print `{"html data", "Acts"}`.
        #[arg(long)]
        acts_only: bool,
    },

    /// Inspect the act table.
    Acts {
        #[command(subcommand)]
        action: ActsAction,
    },

    /// Run the extraction tool on a PDF and print its training outputs.
    Extract {
        #[arg(long)]
        pdf: PathBuf,

        /// Models to collect (comma-separated).
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "segmentation,fulltext,header,table"
        )]
        models: Vec<TrainingModel>,
    },

    /// Training corpus bookkeeping.
    Corpus {
        #[command(subcommand)]
        action: CorpusAction,
    },
}

#[derive(Subcommand)]
enum ActsAction {
    /// List every known act and its slug.
    List,
}

#[derive(Subcommand)]
enum CorpusAction {
    /// Copy tool outputs into `{output}/{model}/{tei,raw}`.
    Sort {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(
            long,
            value_delimiter = ',',
            default_value = "segmentation,fulltext,header,table"
        )]
        models: Vec<TrainingModel>,
    },

    /// Check feature column consistency of a file or every file in a directory.
    Check {
        #[arg(long)]
        path: PathBuf,
    },

    /// List documents present in only one of a raw/TEI directory pair.
    Unpaired {
        #[arg(long)]
        raw: PathBuf,
        #[arg(long)]
        tei: PathBuf,
        #[arg(long)]
        model: TrainingModel,
    },

    /// Replace the trainer's corpora with a training archive.
    Install(InstallArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct InstallArgs {
    /// Download the archive from this URL.
    #[arg(long)]
    url: Option<String>,

    /// Use a local archive.
    #[arg(long)]
    zip: Option<PathBuf>,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Annotate { file, acts_only } => {
            let input = match file {
                Some(path) => std::fs::read_to_string(&path).into_diagnostic()?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf).into_diagnostic()?;
                    buf
                }
            };
            let annotator = Annotator::from_config(&config)?;
            if acts_only {
                print_json(&annotator.annotate_statutes(&input)?)?;
            } else {
                print_json(&annotator.annotate(&input)?)?;
            }
        }

        Commands::Acts {
            action: ActsAction::List,
        } => {
            let annotator = Annotator::from_config(&config)?;
            let dictionary = annotator.dictionary();
            for (name, slug) in dictionary.iter() {
                println!("{slug:<60} {name}");
            }
            println!("\n{} acts", dictionary.len());
        }

        Commands::Extract { pdf, models } => {
            let paths = LexPaths::resolve()?;
            paths.ensure_dirs()?;
            let bytes = std::fs::read(&pdf).into_diagnostic()?;
            let file_name = pdf
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let outputs = Extractor::new(config.extractor.clone()).process_pdf(
                &paths.scratch_dir(),
                &file_name,
                &bytes,
                &models,
            )?;
            print_json(&outputs)?;
        }

        Commands::Corpus { action } => run_corpus(action, &config)?,
    }

    Ok(())
}

fn run_corpus(action: CorpusAction, config: &LexConfig) -> Result<()> {
    match action {
        CorpusAction::Sort {
            input,
            output,
            models,
        } => {
            let counts = corpus::sort_outputs(&input, &output, &models)?;
            for (model, c) in &counts {
                println!("{model:<14} tei {:>5}  raw {:>5}", c.tei, c.raw);
            }
        }

        CorpusAction::Check { path } => {
            let reports = if path.is_dir() {
                corpus::check_feature_dir(&path)?
            } else {
                vec![corpus::check_features(&path)?]
            };
            for report in &reports {
                println!(
                    "{}: expected {} features per line, {} deviating line(s)",
                    report.file,
                    report.expected,
                    report.deviations.len()
                );
                for (fields, lines) in &report.histogram {
                    println!("  {fields:>4} features: {lines} line(s)");
                }
                for d in &report.deviations {
                    println!("  line {} - {} features: {}", d.line, d.fields, d.text);
                }
            }
        }

        CorpusAction::Unpaired { raw, tei, model } => {
            let unpaired = corpus::unpaired_files(&raw, &tei, model)?;
            for stem in &unpaired.tei_only {
                println!("tei only: {stem}");
            }
            for stem in &unpaired.raw_only {
                println!("raw only: {stem}");
            }
            if unpaired.is_empty() {
                println!("All files are paired.");
            }
        }

        CorpusAction::Install(InstallArgs { url, zip }) => {
            let report = match (url, zip) {
                (Some(url), _) => TrainingArchive::new(config.corpus.download_timeout_secs)
                    .install_from_url(&url, &config.corpus, &TrainingModel::ALL)?,
                (None, Some(zip)) => {
                    TrainingArchive::install_from_zip(&zip, &config.corpus, &TrainingModel::ALL)?
                }
                (None, None) => miette::bail!("either --url or --zip is required"),
            };
            print_json(&report)?;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<LexConfig> {
    if let Some(path) = path {
        let mut config = LexConfig::load(path)?;
        config.apply_env()?;
        return Ok(config);
    }
    match LexPaths::resolve() {
        Ok(paths) => Ok(LexConfig::load_or_default(&paths)?),
        Err(e) => {
            tracing::warn!("{e}; using default config");
            let mut config = LexConfig::default();
            config.apply_env()?;
            Ok(config)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}
