use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, Level};

use anomalia_core::{MorphDictionary, SentenceReader, UnknownForms};

/// List the most frequent corpus forms missing from a morphological
/// dictionary.
#[derive(Parser)]
struct Args {
    /// Dictionary file (form<TAB>lemma<TAB>tag lines)
    dict: PathBuf,

    /// Tagged corpus (token<TAB>tag lines)
    corpus: PathBuf,

    /// Forms to print
    #[arg(long, default_value_t = 500)]
    top: usize,

    /// Print JSON instead of `count<TAB>form` lines
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose > 0 { Level::DEBUG } else { Level::INFO })
        .with_writer(io::stderr)
        .init();

    let dict = MorphDictionary::load(&args.dict)?;
    let file = File::open(&args.corpus)
        .with_context(|| format!("opening {}", args.corpus.display()))?;
    let reader = SentenceReader::new(BufReader::new(file));

    let mut unknown = UnknownForms::new(&dict);
    for sentence in reader {
        let sentence = sentence.context("reading corpus")?;
        for token in &sentence.tokens {
            unknown.observe(token);
        }
    }
    info!(
        observed = unknown.observed(),
        unknown = unknown.len(),
        "lexicon diff done"
    );

    let top = unknown.top(args.top);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if args.json {
        serde_json::to_writer_pretty(&mut out, &top)?;
        writeln!(out)?;
    } else {
        for fc in &top {
            writeln!(out, "{}\t{}", fc.count, fc.form)?;
        }
    }
    out.flush()?;
    Ok(())
}
