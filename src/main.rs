// Clippy allows
#![allow(clippy::too_many_arguments)]

//! grit-sets: named interval sets over a variant list
//!
//! Usage: grit-sets <COMMAND> [OPTIONS]

use clap::{ArgGroup, Parser, Subcommand};
use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use grit_sets::chrom::ChromResolver;
use grit_sets::output::SetWriter;
use grit_sets::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "grit-sets")]
#[command(version)]
#[command(about = "Named genomic interval sets and range filters over a variant list", long_about = None)]
struct Cli {
    /// Working memory in MB for set names and ranges
    #[arg(long, global = true, default_value_t = 256)]
    memory: usize,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load named interval sets and list their members
    Sets {
        /// Interval file (chrom start end [set_id])
        #[arg(short, long)]
        ranges: PathBuf,

        /// Variant listing (.bim); without it sets keep bp coordinates
        #[arg(short, long)]
        bim: Option<PathBuf>,

        /// File of set names to keep
        #[arg(long)]
        subset: Option<PathBuf>,

        /// Extend each interval by N bp on both sides
        #[arg(long, default_value_t = 0)]
        border: u32,

        /// Intervals are 0-based half-open instead of 1-based closed
        #[arg(long)]
        ibed0: bool,

        /// Ignore set ids and put every interval in one set
        #[arg(long)]
        no_sets: bool,

        /// Only process these chromosomes
        #[arg(long, num_args = 1..)]
        chr: Vec<String>,
    },

    /// Keep or drop variants covered by interval files
    #[command(group(ArgGroup::new("mode").required(true).args(["extract", "exclude"])))]
    Filter {
        /// Variant listing (.bim)
        #[arg(short, long)]
        bim: PathBuf,

        /// Keep only variants inside these intervals
        #[arg(long, num_args = 1..)]
        extract: Vec<PathBuf>,

        /// Drop variants inside these intervals
        #[arg(long, num_args = 1..)]
        exclude: Vec<PathBuf>,

        /// Extend each interval by N bp on both sides
        #[arg(long, default_value_t = 0)]
        border: u32,

        /// Intervals are 0-based half-open instead of 1-based closed
        #[arg(long)]
        ibed0: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = cli.log_level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!(
            "Warning: Invalid log level '{}' provided. Defaulting to Info.",
            cli.log_level
        );
        log::LevelFilter::Info
    });
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_micros()
        .init();
    debug!("Starting grit-sets with args: {:?}", cli);

    let mut arena = Arena::with_capacity(cli.memory.saturating_mul(1024 * 1024));
    info!("Working memory: {} MB", cli.memory);

    let result = match cli.command {
        Commands::Sets {
            ranges,
            bim,
            subset,
            border,
            ibed0,
            no_sets,
            chr,
        } => run_sets(
            &mut arena,
            &ranges,
            bim.as_deref(),
            subset.as_deref(),
            border,
            ibed0,
            no_sets,
            &chr,
        ),
        Commands::Filter {
            bim,
            extract,
            exclude,
            border,
            ibed0,
        } => run_filter(&mut arena, &bim, &extract, &exclude, border, ibed0),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn base_options(border: u32, ibed0: bool) -> LoadOptions {
    let convention = if ibed0 {
        CoordinateConvention::Ibed0
    } else {
        CoordinateConvention::Ibed1
    };
    LoadOptions::new()
        .with_convention(convention)
        .with_border(border)
}

fn read_variants(path: &Path) -> Result<VariantTable> {
    let mut reader = LineReader::from_path(path, "variant file")?;
    let variants = VariantTable::from_bim(&mut reader, ChromResolver::default())?;
    info!("{}: {} variants", path.display(), variants.len());
    Ok(variants)
}

fn run_sets(
    arena: &mut Arena,
    ranges: &Path,
    bim: Option<&Path>,
    subset: Option<&Path>,
    border: u32,
    ibed0: bool,
    no_sets: bool,
    chr: &[String],
) -> Result<()> {
    let variants = bim.map(read_variants).transpose()?;
    if no_sets && variants.is_none() {
        return Err(RangeError::Inconsistent(
            "--no-sets requires --bim.".to_string(),
        ));
    }

    let mut ctx = match &variants {
        Some(v) => v.context.clone(),
        None => ChromosomeContext::pure_interval(ChromResolver::default()),
    };
    if !chr.is_empty() {
        let codes = chr
            .iter()
            .map(|name| {
                ctx.resolver().resolve(name.as_bytes()).ok_or_else(|| {
                    RangeError::Inconsistent(format!("Invalid chromosome code '{}'", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        ctx = ctx.with_active_only(&codes);
    }

    let subset = match subset {
        Some(path) => Some(SubsetFilter::from_reader(&mut LineReader::from_path(
            path,
            "subset file",
        )?)?),
        None => None,
    };

    let opts = base_options(border, ibed0)
        .with_track_sets(!no_sets)
        .with_role("set file");
    let mut load = load_ranges_from_path(arena, ranges, &ctx, subset.as_ref(), &opts)?;

    let stdout = io::stdout();
    let mut writer = SetWriter::new(stdout.lock());
    match &variants {
        Some(v) => {
            for set in 0..load.set_count() {
                let name = if no_sets {
                    "ALL".to_string()
                } else {
                    load.names().display_name(set)
                };
                writer.begin_set(name.as_bytes(), load.ranges().ranges(set).len())?;
                if let Some(members) = load.set_members(set, v.len()) {
                    for uidx in members.iter_ones() {
                        writer.write_member(v.ids[uidx].as_bytes())?;
                    }
                }
                writer.end_set()?;
            }
        }
        None => {
            let merged = load.merged_ranges()?;
            for (set, ranges) in merged.iter().enumerate() {
                let name = load.names().display_name(set);
                let chrom = load
                    .names()
                    .chrom_code(set)
                    .map(|code| ctx.resolver().name(code))
                    .unwrap_or_default();
                writer.begin_set(name.as_bytes(), load.ranges().ranges(set).len())?;
                for range in ranges {
                    writer.write_bp_range(chrom.as_bytes(), range.start, range.end)?;
                }
                writer.end_set()?;
            }
        }
    }
    writer.flush()
}

fn run_filter(
    arena: &mut Arena,
    bim: &Path,
    extract: &[PathBuf],
    exclude: &[PathBuf],
    border: u32,
    ibed0: bool,
) -> Result<()> {
    let variants = read_variants(bim)?;
    let (mode, paths) = if extract.is_empty() {
        (FilterMode::Exclude, exclude)
    } else {
        (FilterMode::Include, extract)
    };

    let mut include = Bitset::full(variants.len());
    apply_filter_paths(
        arena,
        paths,
        &variants.context,
        mode,
        &mut include,
        variants.len(),
        &base_options(border, ibed0),
    )?;

    let stdout = io::stdout();
    let mut writer = SetWriter::new(stdout.lock());
    for uidx in include.iter_ones() {
        writer.write_line(variants.ids[uidx].as_bytes())?;
    }
    writer.flush()
}
