mod commands;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::{handle_catalog, handle_resolve};

#[derive(Parser, Debug)]
#[command(
    name = "app-impact",
    version = env!("APP_VERSION"),
    about = "Finds the Applications of a GitOps repository affected by a change"
)]
struct Cli {
    /// Log at info level unless LOG_LEVEL says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Map the changes between two commits to the Applications they affect
    Resolve(ResolveArgs),
    /// List the Applications found in the working tree
    Catalog(CatalogArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Repository root, the working tree is expected to be at the head commit
    #[arg(long, default_value = ".")]
    pub repo: PathBuf,

    /// API group the Application apiVersion must start with
    #[arg(long, default_value = "argoproj.io")]
    pub api_group: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Base revision of the diff, e.g. the target branch
    #[arg(long, required_unless_present = "patches", conflicts_with = "patches")]
    pub base: Option<String>,

    /// Head revision of the diff
    #[arg(long, default_value = "HEAD")]
    pub head: String,

    /// JSON file with a precomputed patch list: [{"from": ..., "to": ...}]
    #[arg(long)]
    pub patches: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = impact_utils::setup_logging(cli.verbose) {
        eprintln!("Failed to set up logging: {}", e);
    }

    let result = match &cli.command {
        Commands::Resolve(args) => handle_resolve(args).await,
        Commands::Catalog(args) => handle_catalog(args).await,
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            log::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
