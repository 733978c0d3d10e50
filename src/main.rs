use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flatfs::util::format::{block_list, pretty_size_from_bytes};
use flatfs::{EntryKind, EntrySummary, FlatFS, FsConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flatfs", version, about = "A filesystem in a file")]
struct Cli {
    /// JSON file overriding the default disk geometry
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the disk image (created if missing)
    disk: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory
    Ls {
        #[arg(default_value = "/")]
        path: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a directory
    Mkdir { path: String },
    /// Copy a host file into the image
    Import { src: PathBuf, dest: String },
    /// Print a file
    Cat { path: String },
    /// Copy a file out of the image onto the host
    Export { path: String, dest: PathBuf },
    /// Remove a file or an empty directory
    Rm { path: String },
    /// Show block usage
    Df {
        #[arg(long)]
        json: bool,
    },
    /// Mount the image with FUSE (blocks until unmounted)
    Mount {
        mountpoint: PathBuf,
        #[arg(long)]
        read_only: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => FsConfig::from_json_file(path)?,
        None => FsConfig::default(),
    };
    let mut fs = FlatFS::open(&cli.disk, config)
        .with_context(|| format!("cannot open disk image {}", cli.disk.display()))?;

    match cli.command {
        Command::Ls { path, json } => {
            let entries = fs.ls(&path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_listing(&entries);
            }
        }
        Command::Mkdir { path } => {
            fs.mkdir(&path)?;
            println!("Created directory '{}'", path);
        }
        Command::Import { src, dest } => {
            let content = fs::read(&src).with_context(|| format!("cannot read host file {}", src.display()))?;
            fs.import_file(&content, &dest)?;
            let summary = fs.stat(&dest)?;
            println!("Imported '{}' using blocks {}", dest, block_list(&summary.blocks));
        }
        Command::Cat { path } => {
            let content = fs.cat(&path)?;
            match String::from_utf8(content) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("Content is binary and cannot be displayed."),
            }
        }
        Command::Export { path, dest } => {
            let content = fs.cat(&path)?;
            fs::write(&dest, &content).with_context(|| format!("cannot write host file {}", dest.display()))?;
            println!("Exported '{}' ({})", path, pretty_size_from_bytes(content.len() as u64));
        }
        Command::Rm { path } => {
            fs.rm(&path)?;
            println!("Deleted '{}'", path);
        }
        Command::Df { json } => {
            let report = fs.usage()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let block_size = fs.get_block_size() as u64;
                println!(
                    "{} of {} blocks used ({:.1}%), {} free",
                    report.used,
                    report.total,
                    report.ratio * 100.0,
                    pretty_size_from_bytes(report.free * block_size)
                );
                if report.over_threshold {
                    println!("Usage is above the defragmentation threshold.");
                }
            }
        }
        Command::Mount { mountpoint, read_only } => {
            flatfs::fuse::mount(fs, &mountpoint, read_only)
                .with_context(|| format!("cannot mount at {}", mountpoint.display()))?;
            return Ok(());
        }
    }

    fs.sync()?;
    Ok(())
}

fn print_listing(entries: &[EntrySummary]) {
    println!("{:<20} | {:<4} | {:<10} | BLOCKS", "NAME", "TYPE", "SIZE");
    println!("{}", "-".repeat(55));
    if entries.is_empty() {
        println!("(empty)");
    }
    for entry in entries {
        let kind = match entry.kind {
            EntryKind::Directory => "dir",
            EntryKind::File => "file",
        };
        println!(
            "{:<20} | {:<4} | {:<10} | {}",
            entry.name,
            kind,
            pretty_size_from_bytes(entry.size),
            block_list(&entry.blocks)
        );
    }
}
