use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use anomalia_core::{Config, RankReport, Ranker, SentenceReader, Trainer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Side {
    Top,
    Bottom,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Train token and tag trigram models on one tagged corpus, score the
/// sentences of another and print the most and least expected ones.
#[derive(Parser)]
struct Args {
    /// Training corpus (token<TAB>tag lines, blank line between sentences)
    training: PathBuf,

    /// Corpus to rank, same format
    corpus: PathBuf,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Phrases to keep at each end (overrides the config)
    #[arg(long)]
    top: Option<usize>,

    /// Lowercase tokens on read (overrides the config)
    #[arg(long)]
    lowercase: bool,

    /// Which end of the ranking to print
    #[arg(long, value_enum, default_value = "both")]
    side: Side,

    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn open(path: &Path, lowercase: bool) -> Result<SentenceReader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(SentenceReader::new(BufReader::new(file)).lowercase(lowercase))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = match &args.config {
        Some(path) => Config::load_toml(path)?,
        None => Config::default(),
    };
    if let Some(n) = args.top {
        config.top_n = n;
    }
    if args.lowercase {
        config.lowercase = true;
    }

    let mut trainer = Trainer::new();
    trainer.train(open(&args.training, config.lowercase)?)?;
    let model = trainer.freeze(&config)?;
    info!(
        token_lambdas = ?model.tokens().lambdas().0,
        tag_lambdas = ?model.tags().lambdas().0,
        "model ready"
    );

    let mut ranker = Ranker::new(config.top_n);
    let stats = model.rank(open(&args.corpus, config.lowercase)?, &mut ranker)?;
    let (highest, lowest) = ranker.finish();

    let mut report = RankReport::new(stats, highest, lowest)
        .with_weights(model.tokens().lambdas(), model.tags().lambdas());
    match args.side {
        Side::Top => report.lowest.clear(),
        Side::Bottom => report.highest.clear(),
        Side::Both => {}
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    match args.format {
        Format::Text => report.write_text(&mut out)?,
        Format::Json => {
            report.write_json(&mut out)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
