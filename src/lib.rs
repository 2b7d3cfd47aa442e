pub mod cache;
pub mod cli;
pub mod data;
pub mod error;
pub mod filter;
pub mod io_utils;
pub mod loader;
pub mod notes;
pub mod render;
pub mod report;
pub mod schema;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands, SchemaCommand};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("fragrance_analytics", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Overview(args) => report::overview(&args),
        Commands::Domains(args) => report::domains(&args),
        Commands::Stats(args) => report::summary_stats(&args),
        Commands::Top(args) => report::top(&args),
        Commands::Rank(args) => report::rank(&args),
        Commands::Counts(args) => report::counts(&args),
        Commands::Notes(args) => report::notes(&args),
        Commands::Histogram(args) => report::histogram(&args),
        Commands::Dashboard(args) => report::dashboard(&args),
        Commands::Schema(SchemaCommand::Init(args)) => report::schema_init(&args),
    }
}
