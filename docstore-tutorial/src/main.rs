//! docstore tutorial
//!
//! Walks a document store through its CRUD surface: connect, build a
//! document, insert one and many documents, query with and without filters,
//! update, delete and create an index. Every result is printed as JSON.
//!
//! ## Usage
//!
//! ```bash
//! docstore-tutorial
//! docstore-tutorial --uri mongodb://localhost:27017 -vv
//! docstore-tutorial --database shop --collection items --unacknowledged
//! ```
//!
//! Exits with 1 when the store rejects a write and with 2 when no session
//! could be established.

mod tutorial;

use std::process;

use anyhow::Context;
use clap::Parser;
use docstore::common::DEFAULT_URI;
use docstore::session::{Session, WriteConcern};
use docstore::{DocStoreError, ErrorKind, Instance};
use log::LevelFilter;

const APP_NAME: &str = "docstore-tutorial";

#[derive(Parser)]
#[command(name = "docstore-tutorial")]
#[command(about = "A walk through the docstore CRUD surface", long_about = None)]
#[command(version)]
struct Cli {
    /// Connection string of the store
    #[arg(long, default_value = DEFAULT_URI)]
    uri: String,

    /// Database to work in
    #[arg(long, default_value = "hokori")]
    database: String,

    /// Collection to work in
    #[arg(long, default_value = "test")]
    collection: String,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Send writes with w=0 and do not wait for acknowledgement
    #[arg(long)]
    unacknowledged: bool,
}

fn main() {
    let cli = Cli::parse();
    colog::default_builder().filter_level(level(cli.verbose)).init();

    if let Err(e) = run(&cli) {
        eprintln!("error: {:#}", e);
        process::exit(exit_code(&e));
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let instance = Instance::new()?;

    let mut builder = Session::builder().uri(&cli.uri).app_name(APP_NAME);
    if cli.unacknowledged {
        builder = builder.write_concern(WriteConcern::Unacknowledged);
    }
    let session = builder.connect(&instance)?;
    log::info!("Connected to {}", session.config().connection_string());

    let collection = session
        .database(&cli.database)
        .and_then(|db| db.collection(&cli.collection))
        .with_context(|| format!("opening {}.{}", cli.database, cli.collection))?;

    let summary = tutorial::run(&collection)?;
    log::debug!("Tutorial finished");
    println!("\n== Summary ==\n{}", summary);

    session.close()?;
    Ok(())
}

fn level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<DocStoreError>() {
        Some(e) if e.is_connection_error() || e.kind() == &ErrorKind::InstanceAlreadyExists => 2,
        _ => 1,
    }
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}
