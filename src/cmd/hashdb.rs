use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use argh::FromArgs;
use tellib::{
    format::{hashdb::HashDatabase, SplitHash},
    util::file::map_file,
};

#[derive(FromArgs, PartialEq, Debug)]
/// inspect hash name databases
#[argh(subcommand, name = "hashdb")]
pub struct Args {
    #[argh(subcommand)]
    command: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Lookup(LookupArgs),
    List(ListArgs),
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// resolve one hash pair to a name
#[argh(subcommand, name = "lookup")]
pub struct LookupArgs {
    #[argh(positional)]
    /// database file
    db: PathBuf,
    #[argh(positional)]
    /// first hash half (hex)
    hash1: String,
    #[argh(positional)]
    /// second hash half (hex)
    hash2: String,
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// list all database entries
#[argh(subcommand, name = "list")]
pub struct ListArgs {
    #[argh(positional)]
    /// database file
    db: PathBuf,
}

pub fn run(args: Args) -> Result<()> {
    match args.command {
        SubCommand::Lookup(c_args) => lookup(c_args),
        SubCommand::List(c_args) => list(c_args),
    }
}

fn load(path: &Path) -> Result<HashDatabase> {
    let data = map_file(path)
        .with_context(|| format!("Failed to open database '{}'", path.display()))?;
    Ok(HashDatabase::load(&data))
}

fn parse_hex(value: &str) -> Result<u32> {
    let trimmed = value.trim_start_matches("0x");
    u32::from_str_radix(trimmed, 16).with_context(|| format!("Invalid hash half '{value}'"))
}

fn lookup(args: LookupArgs) -> Result<()> {
    let db = load(&args.db)?;
    let hash = SplitHash::new(parse_hex(&args.hash1)?, parse_hex(&args.hash2)?);
    match db.lookup(hash) {
        Some(name) => println!("{hash} = {name}"),
        None => println!("{hash} not found (placeholder {})", hash.placeholder_name()),
    }
    Ok(())
}

fn list(args: ListArgs) -> Result<()> {
    let db = load(&args.db)?;
    log::info!("{} entries in {}", db.len(), args.db.display());
    let mut entries: Vec<_> = db.iter().collect();
    entries.sort_by(|a, b| a.1.cmp(b.1));
    for (hash, name) in entries {
        println!("{hash} {name}");
    }
    Ok(())
}
