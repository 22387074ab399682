use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, Level};

use anomalia_core::{ChainGraph, SentenceReader, Trainer};

/// Print the chains recorded from a tagged corpus and its phrase-length
/// histogram.
#[derive(Parser)]
struct Args {
    /// Tagged corpus (token<TAB>tag lines)
    training: PathBuf,

    /// Only chains rooted at this token
    #[arg(long)]
    token: Option<String>,

    /// Dump the tag graph instead of the token graph
    #[arg(long)]
    tags: bool,

    /// Skip the length histogram
    #[arg(long)]
    no_lengths: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Write one `freq<TAB>tokens` line per chain. Returns the chains written.
fn dump<W: Write>(out: &mut W, graph: &ChainGraph, root: Option<&str>) -> io::Result<usize> {
    let chains = match root {
        Some(token) => graph.chains_from(token),
        None => graph.chains(),
    };
    let mut written = 0;
    for chain in chains {
        let words: Vec<&str> = chain
            .ordinals
            .iter()
            .filter_map(|&o| graph.token(o))
            .collect();
        writeln!(out, "{}\t{}", chain.freq, words.join(" "))?;
        written += 1;
    }
    Ok(written)
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    let file = File::open(&args.training)
        .with_context(|| format!("opening {}", args.training.display()))?;
    let mut trainer = Trainer::new();
    trainer.train(SentenceReader::new(BufReader::new(file)))?;
    let graph = if args.tags { trainer.tags() } else { trainer.tokens() };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let written = dump(&mut out, graph, args.token.as_deref())?;
    info!(
        chains = written,
        distinct = graph.distinct_tokens(),
        graph = if args.tags { "tags" } else { "tokens" },
        "dumped chains"
    );

    if !args.no_lengths {
        writeln!(out)?;
        writeln!(out, "# phrase lengths ({} sequences)", graph.sequences())?;
        for (len, count) in graph.phrase_lengths() {
            writeln!(
                out,
                "{}\t{}\t{:.4}",
                len,
                count,
                graph.phrase_length_probability(len)
            )?;
        }
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomalia_core::frame;

    fn graph() -> ChainGraph {
        let mut g = ChainGraph::new();
        g.add_sequence(&frame(&["il", "gatto"])).unwrap();
        g
    }

    #[test]
    fn every_chain_is_one_line() {
        let g = graph();
        let mut out = Vec::new();
        let written = dump(&mut out, &g, None).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(written, g.chains().len());
        assert_eq!(text.lines().count(), written);
        assert!(text.lines().any(|l| l == "1\tSTART il gatto"));
    }

    #[test]
    fn root_filter_keeps_matching_chains() {
        let g = graph();
        let mut out = Vec::new();
        dump(&mut out, &g, Some("gatto")).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().all(|l| l.split('\t').nth(1).is_some_and(|c| c.starts_with("gatto"))));
    }
}
