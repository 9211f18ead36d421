//! nexar CLI - Command-line tool for Counter-Strike Online archives.
//!
//! Takes one archive path and dispatches on its extension: `.nar` files go
//! through the NAR reader, `.pak` files through the PAK reader.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use nexar::prelude::*;

/// nexar - list, extract and verify Nexon game archives
#[derive(Parser)]
#[command(name = "nexar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a .nar or .pak archive
    archive: PathBuf,

    /// Extract entries instead of listing them
    #[arg(short = 'x', long)]
    extract: bool,

    /// Output directory for extraction
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Only process entries whose path matches this pattern
    #[arg(short, long)]
    filter: Option<String>,

    /// Show detailed information when listing
    #[arg(short, long)]
    detailed: bool,

    /// Verify entry checksums (NAR only)
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let extension = cli
        .archive
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("nar") => run_nar(&cli),
        Some("pak") => run_pak(&cli),
        _ => bail!(
            "unsupported archive type: {} (expected .nar or .pak)",
            cli.archive.display()
        ),
    }
}

fn run_nar(cli: &Cli) -> Result<()> {
    let start = Instant::now();
    let archive = NarArchive::open(&cli.archive).context("Failed to open NAR archive")?;
    println!(
        "Loaded {} entries in {:?}",
        archive.entry_count(),
        start.elapsed()
    );

    let selected: Vec<&NarEntry> = archive
        .entries()
        .iter()
        .filter(|e| matches_filter(cli.filter.as_deref(), e.path()))
        .collect();

    if cli.verify {
        let mut failed = 0;
        for entry in &selected {
            if let Err(e) = archive.verify(entry) {
                eprintln!("FAIL {}: {}", entry.path(), e);
                failed += 1;
            }
        }
        println!("Verified {} entries, {} failed", selected.len(), failed);
        if failed > 0 {
            bail!("{failed} entries failed verification");
        }
        return Ok(());
    }

    if cli.extract {
        extract_entries(
            &selected,
            &cli.output,
            |entry| entry.output_path(),
            |entry, out| {
                archive
                    .extract_to(entry, out)
                    .with_context(|| format!("Failed to extract {}", entry.path()))?;
                Ok(())
            },
        )?;
        return Ok(());
    }

    for entry in &selected {
        if cli.detailed {
            println!(
                "{:>10} {:>10} {:?} {}",
                entry.stored_size(),
                entry.extracted_size(),
                entry.stored_type(),
                entry.path()
            );
        } else {
            println!("{}", entry.path());
        }
    }
    println!("\nTotal: {} entries", selected.len());

    Ok(())
}

fn run_pak(cli: &Cli) -> Result<()> {
    if cli.verify {
        bail!("--verify is only supported for NAR archives");
    }

    let start = Instant::now();
    let archive = PakArchive::open(&cli.archive).context("Failed to open PAK container")?;
    println!(
        "Loaded {} entries in {:?}",
        archive.entry_count(),
        start.elapsed()
    );

    let selected: Vec<&PakEntry> = archive
        .entries()
        .iter()
        .filter(|e| matches_filter(cli.filter.as_deref(), &e.path))
        .collect();

    if cli.extract {
        extract_entries(
            &selected,
            &cli.output,
            |entry| PathBuf::from(entry.path.replace('\\', "/")),
            |entry, out| {
                archive
                    .unpack_to(entry, out)
                    .with_context(|| format!("Failed to unpack {}", entry.path))?;
                Ok(())
            },
        )?;
        return Ok(());
    }

    for entry in &selected {
        if cli.detailed {
            println!(
                "{:>10} {:>10} {:?} {}",
                entry.packed_size, entry.original_size, entry.kind, entry.path
            );
        } else {
            println!("{}", entry.path);
        }
    }
    println!("\nTotal: {} entries", selected.len());

    Ok(())
}

/// Extract entries under `output` with a progress bar.
fn extract_entries<E>(
    entries: &[&E],
    output: &Path,
    rel_path: impl Fn(&E) -> PathBuf,
    mut write_one: impl FnMut(&E, &mut fs::File) -> Result<()>,
) -> Result<()> {
    println!("Extracting {} entries...", entries.len());

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;
    let start = Instant::now();

    for entry in entries {
        let dest = output.join(rel_path(entry));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(&dest)
            .with_context(|| format!("Failed to create {}", dest.display()))?;
        write_one(entry, &mut file)?;

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!("Extraction completed in {:?}", start.elapsed());

    Ok(())
}

/// Simple substring/wildcard matching for `--filter`.
fn matches_filter(pattern: Option<&str>, name: &str) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };

    let pattern = pattern.to_lowercase();
    let name = name.to_lowercase();

    if !pattern.contains('*') {
        return name.contains(&pattern);
    }

    let mut pos = 0;
    for (i, part) in pattern.split('*').enumerate() {
        if part.is_empty() {
            continue;
        }
        match name[pos..].find(part) {
            Some(found) => {
                if i == 0 && found != 0 {
                    return false;
                }
                pos += found + part.len();
            }
            None => return false,
        }
    }

    pattern.ends_with('*') || pos == name.len()
}
