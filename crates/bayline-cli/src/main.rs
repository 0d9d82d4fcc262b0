mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use cmd::serve::ServeArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "bayline",
    about = "Simulator bay session tracker: start, schedule, and time bay sessions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "BAYLINE_CONFIG", default_value = "bayline.yaml")]
    config: PathBuf,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the session tracker and its HTTP API
    Serve(ServeArgs),

    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve(_) => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Serve(args) => cmd::serve::run(&cli.config, args),
        Commands::Config { subcommand } => cmd::config::run(&cli.config, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
