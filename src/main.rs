//! hanji - Han-Ji scroll page extractor

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use hanji::{BackendChain, BackendKind, LoadOptions, Page, Pipeline, PipelineOptions, WorkCollection};

#[derive(Parser)]
#[command(name = "hanji")]
#[command(version, about = "Extract metadata and paragraphs from Han-Ji scroll pages", long_about = None)]
#[command(after_help = "EXAMPLES:
    hanji data --work SongShu                 Print the work as JSON
    hanji data --work SongShu -o songshu.json --pretty
    hanji data --work SongShu --summary       Show page and paragraph counts

Set RUST_LOG=debug for per-page details.")]
struct Cli {
    /// Directory holding {work}_{serial}.html pages
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Work name, the file name prefix before `_{serial}`
    #[arg(short, long)]
    work: String,

    /// Load at most this many pages
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Keep paragraphs split by page dividers
    #[arg(long)]
    no_reconnect: bool,

    /// Skip the re-serialization pass before sanitizing
    #[arg(long)]
    no_reserialize: bool,

    /// Parsing backends, tried in order
    #[arg(long = "parser", value_enum, num_args = 1.., default_values = ["html5ever", "xml"])]
    parsers: Vec<BackendKind>,

    /// Write JSON here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// Print a summary instead of JSON
    #[arg(short, long)]
    summary: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let backends = BackendChain::from_kinds(&cli.parsers);
    let pages = load(cli, &backends)?;

    let options = PipelineOptions::default()
        .with_reconnect_lines(!cli.no_reconnect)
        .with_reserialize(!cli.no_reserialize)
        .with_backends(backends);
    let work = Pipeline::new(options).run(pages).map_err(|e| e.to_string())?;

    if cli.summary {
        println!("{work}");
        for warning in &work.warnings {
            println!("  {warning}");
        }
        return Ok(());
    }

    write_json(&work, cli.output.as_ref(), cli.pretty)
}

fn load(cli: &Cli, backends: &BackendChain) -> Result<Vec<Page>, String> {
    let mut options = LoadOptions::new(&cli.work);
    options.limit = cli.limit;
    let paths = hanji::scan(&cli.dir, &options).map_err(|e| e.to_string())?;

    let pb = if cli.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(paths.len() as u64)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .map_err(|e| e.to_string())?
            .progress_chars("=> "),
    );

    let pages = hanji::read_pages(&paths, backends, |path| {
        pb.set_message(path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default());
        pb.inc(1);
    })
    .map_err(|e| e.to_string())?;
    pb.finish_and_clear();

    Ok(pages)
}

fn write_json(work: &WorkCollection, output: Option<&PathBuf>, pretty: bool) -> Result<(), String> {
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).map_err(|e| format!("{}: {e}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let result = if pretty {
        serde_json::to_writer_pretty(&mut writer, work)
    } else {
        serde_json::to_writer(&mut writer, work)
    };
    result.map_err(|e| e.to_string())?;

    writeln!(writer).and_then(|()| writer.flush()).map_err(|e| e.to_string())
}
