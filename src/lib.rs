pub mod classify;
pub mod cli;
pub mod convert;
pub mod dialect;
pub mod error;
pub mod flatten;
pub mod io_utils;
pub mod offset;
pub mod probe;
pub mod render;
pub mod schema;
pub mod table;
pub mod unify;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, debug};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("csv_sqlgen", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    debug!("Parsed command line: {:?}", cli.command);
    match cli.command {
        Commands::Convert(args) => convert::execute(&args),
        Commands::Probe(args) => probe::execute(&args),
        Commands::Flatten(args) => flatten::execute(&args),
    }
}
