use std::{
    fs::{DirBuilder, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use argh::FromArgs;
use tellib::{
    format::{
        d3dmesh::{decode_file, EarlyGameFix, ImportOptions, UvMode},
        geom::MeshRecord,
        hashdb::HashDatabase,
    },
    util::file::map_file,
};

#[derive(FromArgs, PartialEq, Debug)]
/// process D3DMesh files
#[argh(subcommand, name = "mesh")]
pub struct Args {
    #[argh(subcommand)]
    command: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Convert(ConvertArgs),
    Info(InfoArgs),
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// convert mesh files to Wavefront OBJ
#[argh(subcommand, name = "convert")]
pub struct ConvertArgs {
    #[argh(positional)]
    /// input files
    inputs: Vec<PathBuf>,
    #[argh(option, short = 'o')]
    /// output directory
    output: PathBuf,
    #[argh(switch)]
    /// retain LODs beyond the first
    lods: bool,
    #[argh(switch)]
    /// emit one object per polygon group
    split: bool,
    #[argh(option)]
    /// UV layer handling: merge (default), split, no
    uv: Option<String>,
    #[argh(option)]
    /// pre-version-55 game variant (old, sm2-34, sm2-5, sbcg4ap-1..5, wg)
    early_game_fix: Option<String>,
    #[argh(option)]
    /// texture name database file
    textures: Option<PathBuf>,
    #[argh(option)]
    /// bone name database file
    bones: Option<PathBuf>,
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// print a summary of mesh files
#[argh(subcommand, name = "info")]
pub struct InfoArgs {
    #[argh(positional)]
    /// input files
    inputs: Vec<PathBuf>,
    #[argh(switch)]
    /// retain LODs beyond the first
    lods: bool,
    #[argh(option)]
    /// texture name database file
    textures: Option<PathBuf>,
}

pub fn run(args: Args) -> Result<()> {
    match args.command {
        SubCommand::Convert(c_args) => convert(c_args),
        SubCommand::Info(c_args) => info(c_args),
    }
}

fn parse_uv_mode(value: Option<&str>) -> Result<UvMode> {
    Ok(match value {
        None | Some("merge") => UvMode::Merge,
        Some("split") => UvMode::Split,
        Some("no") => UvMode::Ignore,
        Some(other) => bail!("Unknown UV mode '{other}' (expected merge, split or no)"),
    })
}

fn parse_early_game_fix(value: Option<&str>) -> Result<Option<EarlyGameFix>> {
    Ok(match value {
        None => None,
        Some("old") => Some(EarlyGameFix::Oldest),
        Some("sm2-34") => Some(EarlyGameFix::SamMaxS2Ep34),
        Some("sm2-5") => Some(EarlyGameFix::SamMaxS2Ep5),
        Some("sbcg4ap-1") => Some(EarlyGameFix::StrongBadEp1),
        Some("sbcg4ap-2") => Some(EarlyGameFix::StrongBadEp2),
        Some("sbcg4ap-3") => Some(EarlyGameFix::StrongBadEp3),
        Some("sbcg4ap-4") => Some(EarlyGameFix::StrongBadEp4),
        Some("sbcg4ap-5") => Some(EarlyGameFix::StrongBadEp5),
        Some("wg") => Some(EarlyGameFix::WallaceGromit),
        Some(other) => bail!("Unknown early game fix '{other}'"),
    })
}

fn load_database(path: Option<&Path>) -> Result<Option<HashDatabase>> {
    let Some(path) = path else { return Ok(None) };
    let data = map_file(path)
        .with_context(|| format!("Failed to open database '{}'", path.display()))?;
    let db = HashDatabase::load(&data);
    log::info!("Loaded {} names from {}", db.len(), path.display());
    Ok(Some(db))
}

/// Decode each input independently so one bad file does not abort a batch.
fn convert(args: ConvertArgs) -> Result<()> {
    let texture_db = load_database(args.textures.as_deref())?;
    let bone_db = load_database(args.bones.as_deref())?;
    let options = ImportOptions {
        parse_lods: args.lods,
        split_groups: args.split,
        uv_mode: parse_uv_mode(args.uv.as_deref())?,
        early_game_fix: parse_early_game_fix(args.early_game_fix.as_deref())?,
        texture_db: texture_db.as_ref(),
        bone_db: bone_db.as_ref(),
    };
    DirBuilder::new().recursive(true).create(&args.output)?;

    let mut failed = 0usize;
    for input in &args.inputs {
        if input.extension().is_some_and(|e| e.eq_ignore_ascii_case("skl")) {
            log::warn!("Skipping '{}': .skl files are not supported yet", input.display());
            continue;
        }
        if let Err(e) = convert_one(input, &args.output, &options) {
            log::error!("Failed to convert '{}': {e:?}", input.display());
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", args.inputs.len());
    }
    Ok(())
}

fn convert_one(input: &Path, output: &Path, options: &ImportOptions<'_>) -> Result<()> {
    log::info!("Processing {}...", input.display());
    let records = decode_file(input, options)?;
    if records.is_empty() {
        log::info!("No geometry in '{}'", input.display());
        return Ok(());
    }

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string());
    let path = output.join(format!("{stem}.obj"));
    let mut file = BufWriter::new(
        File::create(&path)
            .with_context(|| format!("Failed to create file '{}'", path.display()))?,
    );
    write_obj(&mut file, &records)?;
    log::info!("Wrote {} ({} records)", path.display(), records.len());
    Ok(())
}

/// All records from one decode share the vertex buffer, so positions are
/// written once and each record becomes an object with its own face list.
/// Record face indices are one-based, matching OBJ.
fn write_obj<W: Write>(w: &mut W, records: &[MeshRecord]) -> Result<()> {
    for v in records[0].vertices.iter() {
        writeln!(w, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for record in records {
        writeln!(w, "o {}", record.name)?;
        let mut dropped = 0usize;
        for f in &record.faces {
            // Degenerate faces would produce invalid OBJ geometry.
            if f[0] == f[1] || f[1] == f[2] || f[0] == f[2] {
                dropped += 1;
                continue;
            }
            writeln!(w, "f {} {} {}", f[0], f[1], f[2])?;
        }
        if dropped > 0 {
            log::debug!("Dropped {dropped} degenerate faces from {}", record.name);
        }
    }
    Ok(())
}

fn info(args: InfoArgs) -> Result<()> {
    let texture_db = load_database(args.textures.as_deref())?;
    let options = ImportOptions {
        parse_lods: args.lods,
        texture_db: texture_db.as_ref(),
        ..Default::default()
    };
    let mut failed = 0usize;
    for input in &args.inputs {
        match decode_file(input, &options) {
            Ok(records) => {
                println!("{}: {} records", input.display(), records.len());
                for record in &records {
                    println!(
                        "  {} ({} vertices, {} faces)",
                        record.name,
                        record.vertices.len(),
                        record.faces.len()
                    );
                }
            }
            Err(e) => {
                log::error!("Failed to read '{}': {e:?}", input.display());
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", args.inputs.len());
    }
    Ok(())
}
