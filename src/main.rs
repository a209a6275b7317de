use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use xcpatch::config::Config;
use xcpatch::frameworks::FrameworksPatch;
use xcpatch::outcome::Outcome;
use xcpatch::pipeline::{self, Mode};
use xcpatch::sources::SourcesPatch;

#[derive(Parser)]
#[command(name = "xcpatch")]
#[command(about = "Register sources and xcframeworks in an Xcode project descriptor")]
struct Cli {
    /// Config file (defaults to ./xcpatch.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to project.pbxproj
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Native target to patch
    #[arg(short, long, global = true)]
    target: Option<String>,

    /// Resolve and report the changes without writing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the outcome as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add explicit file references for every source file under a directory
    Sources {
        /// Directory to scan
        #[arg(long)]
        root: Option<PathBuf>,

        /// Directory paths are written relative to (defaults to SOURCE_ROOT)
        #[arg(long)]
        base: Option<PathBuf>,

        /// File extension to register, without the dot
        #[arg(long)]
        extension: Option<String>,

        /// Directory name to skip (repeatable, replaces the configured list)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },
    /// Link and embed prebuilt xcframeworks
    Frameworks {
        /// Bundle file name (repeatable, replaces the configured list)
        #[arg(long = "bundle")]
        bundles: Vec<String>,

        /// Entry for FRAMEWORK_SEARCH_PATHS; empty to skip
        #[arg(long)]
        search_path: Option<String>,
    },
}

/// Initialize tracing on stderr; stdout carries the status report.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "xcpatch=info,xcpatch_core=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn print_outcome(outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print!("{}", outcome.render_text());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(project) = cli.project {
        config.project = project;
    }
    if let Some(target) = cli.target {
        config.target = target;
    }

    let mode = if cli.dry_run { Mode::DryRun } else { Mode::Write };

    let outcome = match cli.command {
        Commands::Sources {
            root,
            base,
            extension,
            exclude,
        } => {
            if let Some(root) = root {
                config.sources.root = root;
            }
            if base.is_some() {
                config.sources.base = base;
            }
            if let Some(extension) = extension {
                config.sources.extension = extension.trim_start_matches('.').to_string();
            }
            if !exclude.is_empty() {
                config.sources.exclude = exclude;
            }

            let patch = SourcesPatch::from_config(&config)?;
            pipeline::run(&config.project, &patch, mode)?
        }
        Commands::Frameworks {
            bundles,
            search_path,
        } => {
            if !bundles.is_empty() {
                config.frameworks.bundles = bundles;
            }
            if let Some(search_path) = search_path {
                config.frameworks.search_path = search_path;
            }

            let patch = FrameworksPatch::from_config(&config)?;
            pipeline::run(&config.project, &patch, mode)?
        }
    };

    print_outcome(&outcome, cli.json)
}
