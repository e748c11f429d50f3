//! Kompress CLI
//!
//! Decompresses raw DEFLATE (RFC 1951) streams from files or stdin.

mod commands;
mod utils;

use clap::{Parser, Subcommand};
use commands::{cmd_inflate, cmd_test};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kompress")]
#[command(author, version, about = "Streaming raw DEFLATE decompressor")]
#[command(long_about = "
Kompress decodes raw DEFLATE streams (no zlib or gzip framing).
Use '-' as the input path to read from stdin.
If decoding fails, an output file given with -o is removed; output already
written to stdout stays partial.

Examples:
  kompress inflate data.deflate -o data.bin
  cat data.deflate | kompress inflate - > data.bin
  kompress test data.deflate
")]
struct Cli {
    /// Log block-level decoding details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decompress a raw DEFLATE stream
    #[command(alias = "d")]
    Inflate {
        /// Compressed input file, or '-' for stdin
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode a stream and report its sizes without writing output
    #[command(alias = "t")]
    Test {
        /// Compressed input file, or '-' for stdin
        input: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Inflate { input, output } => cmd_inflate(&input, output.as_deref()),
        Commands::Test { input } => cmd_test(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
