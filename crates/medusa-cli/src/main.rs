mod commands;
mod rig;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "medusa", about = "Multispectral LED camera rig controller")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a time-lapse of band image sets
    Run(commands::run::RunArgs),
    /// List the bands available on the rig
    Bands(commands::bands::BandsArgs),
    /// Switch a single LED on or off
    Light(commands::light::LightArgs),
    /// Recompute the principal components of a captured set
    Pca(commands::pca::PcaArgs),
    /// Print or save a default configuration file
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Run(args) => commands::run::run(args),
        Commands::Bands(args) => commands::bands::run(args),
        Commands::Light(args) => commands::light::run(args),
        Commands::Pca(args) => commands::pca::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
