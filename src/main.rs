use std::path::PathBuf;
use std::process::ExitCode;

use almanac::build::{build_post, index_post, merge_indices, scan_posts};
use almanac::config::Config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Compile a blog post into an HTML page, keeping the post index and the
/// archive and tag sidebars up to date.
#[derive(Parser)]
#[command(name = "almanac", version, subcommand_negates_reqs = true)]
struct Cli {
    /// Project file to use instead of searching for `almanac.yaml`.
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// The post to compile.
    #[arg(required = true)]
    file: Option<PathBuf>,

    /// Where to write the compiled page.
    #[arg(required = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Record a post in the index without compiling it.
    Index { file: PathBuf },

    /// Index every post under the posts root.
    Scan,

    /// Merge index files into the project index.
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Merge into this index instead of the project index.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("almanac=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_project_file(path)?,
        None => Config::from_directory(&std::env::current_dir()?)?,
    };

    match cli.command {
        Some(Command::Index { file }) => {
            let change = index_post(&config, &file)?;
            println!("{}: {:?}", file.display(), change);
        }
        Some(Command::Scan) => {
            let summary = scan_posts(&config)?;
            println!(
                "{} new, {} updated, {} unchanged, {} skipped",
                summary.inserted, summary.updated, summary.unchanged, summary.skipped
            );
        }
        Some(Command::Merge { inputs, output }) => {
            let added = merge_indices(&config, &inputs, output.as_deref())?;
            println!("merged {} entries", added);
        }
        None => {
            // clap enforces both positionals when there's no subcommand.
            if let (Some(file), Some(output)) = (cli.file, cli.output) {
                let converter = config.converter.build();
                build_post(&config, converter.as_ref(), &file, &output)?;
            }
        }
    }
    Ok(())
}
