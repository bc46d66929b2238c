use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use docdb::engine::Engine;
use docdb::printer::{OutputFormat, print_output};
use docdb::repl::run_repl;
use query::Config;
use query::config::{DEFAULT_BTREE_DEGREE, DEFAULT_DATA_DIR};

#[derive(Parser, Debug)]
#[command(name = "docdb", version, about = "Embedded JSON document store")]
struct Args {
    /// Data directory, one subdirectory per collection [env: DOCDB_DATA_DIR] [default: ./data]
    #[arg(long, value_name = "DIR")]
    data: Option<PathBuf>,

    /// Minimum degree of every index B-tree [env: DOCDB_BTREE_DEGREE] [default: 16]
    #[arg(long, value_name = "T")]
    degree: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Run one statement and exit
    #[arg(short = 'e', long = "execute", value_name = "STATEMENT")]
    execute: Option<String>,
}

fn config_from(args: &Args) -> Result<Config> {
    let data_dir = match &args.data {
        Some(dir) => dir.clone(),
        None => env::var("DOCDB_DATA_DIR")
            .unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string())
            .into(),
    };
    let degree = match args.degree {
        Some(degree) => degree,
        None => match env::var("DOCDB_BTREE_DEGREE") {
            Ok(value) => value.parse().context("Invalid DOCDB_BTREE_DEGREE value")?,
            Err(_) => DEFAULT_BTREE_DEGREE,
        },
    };
    Ok(Config::default()
        .with_data_dir(data_dir)
        .with_degree(degree))
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = config_from(&args)?;
    let engine = Engine::open(config)?;

    if let Some(statement) = &args.execute {
        return match engine.execute(statement) {
            Ok(output) => {
                print_output(&output, args.format);
                Ok(())
            }
            Err(err) => Err(err.context(format!("statement failed: {}", statement))),
        };
    }

    println!("docdb v{}", env!("CARGO_PKG_VERSION"));
    println!("Using data directory: {}", engine.config().data_dir.display());
    println!("Type 'help' to view available commands or 'exit' to leave.");

    run_repl(&engine, args.format)
}
