use clap::{ArgAction, Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use seqalign_core::{write_sequences, AlignOptions, Aligner, BreakAfter, DictionaryFactory, TextFormat};

#[derive(Parser, Debug)]
#[command(author, version, about = "Align two texts as chains of dictionary translations")]
struct Args {
    #[arg(short = 'e', long = "source")]
    source: PathBuf,
    #[arg(short = 'f', long = "target")]
    target: PathBuf,
    #[arg(short = 'c', long, default_value_t = 2)]
    closeness: usize,
    #[arg(short = 's', long = "skip", default_value_t = 1)]
    max_skip: usize,
    #[arg(short = 'd', long = "dict-base", default_value = ".")]
    dict_base: PathBuf,
    #[arg(long, default_value_t = false)]
    no_monotony: bool,
    /// Also align target to source and merge the result.
    #[arg(short = 'b', long, default_value_t = false)]
    bidirectional: bool,
    /// Stop after the given phase and print the unscored sequences.
    #[arg(long, value_enum)]
    break_after: Option<Phase>,
    /// Whitespace-separated tokens instead of one token per line.
    #[arg(long, default_value_t = false)]
    words: bool,
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: String,
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Phase {
    Initial,
    Expand,
    Merge,
}

fn break_after(phase: Option<Phase>) -> BreakAfter {
    match phase {
        Some(Phase::Initial) => BreakAfter::Initial,
        Some(Phase::Expand) => BreakAfter::Expand,
        Some(Phase::Merge) => BreakAfter::Merge,
        None => BreakAfter::Never,
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn write_all(path: &str, data: &str) -> std::io::Result<()> {
    if path == "-" {
        print!("{data}");
        Ok(())
    } else {
        fs::write(path, data)
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let format = if args.words { TextFormat::Words } else { TextFormat::Lines };
    let mut factory = DictionaryFactory::new(&args.dict_base).with_format(format);
    let forward = factory.get_dictionary(&args.source, &args.target)?;
    tracing::info!(
        source = %forward.source().name(),
        target = %forward.target().name(),
        entries = forward.len(),
        "dictionary ready"
    );

    let opts = AlignOptions {
        closeness: args.closeness,
        max_skip: args.max_skip,
        monotony: !args.no_monotony,
    };
    let stop = break_after(args.break_after);
    let mut aligner = Aligner::new(opts);
    let hyp = if args.bidirectional {
        let reverse = factory.get_reverse(&forward)?;
        aligner.make_bidirectional(forward, reverse, stop)?
    } else {
        aligner.make(forward, stop)?
    };

    write_all(&args.output, &write_sequences(&hyp))?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
