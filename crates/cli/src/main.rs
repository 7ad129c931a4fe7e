mod commands;

use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "multilocale")]
#[command(version, about = "Static site generator for multi-locale websites", long_about = None)]
struct Cli {
    /// Log progress of every build step
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Create a starter site
    Init {
        /// Directory to create the site in
        path: PathBuf,
    },

    /// Check configuration, routes, pages and locale data
    Validate {
        /// Path to site directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Build the site
    Build {
        /// Path to site directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output directory (overrides site.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Development build: no minification, no asset hashing
        #[arg(long)]
        dev: bool,

        /// Exit with an error if any page failed to render or write
        #[arg(long)]
        strict: bool,
    },

    /// Preview site locally with rebuild on change and live reload
    Preview {
        /// Path to site directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Port to serve on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Command::Init { path } => commands::init::run(path).await,
        Command::Validate { path } => commands::validate::run(path).await,
        Command::Build {
            path,
            output,
            dev,
            strict,
        } => commands::build::run(path, output, dev, strict).await,
        Command::Preview { path, port } => commands::preview::run(path, port).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "multilocale", &mut io::stdout());
            Ok(())
        }
    }
}
