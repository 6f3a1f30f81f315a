//! Man page generator for spi-config and spi-pipe
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use spi_tools::cli::{ConfigCli, PipeCli};
use std::fs;
use std::path::{Path, PathBuf};

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Default to ./man directory
    let output_dir = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("man")
    };

    fs::create_dir_all(&output_dir)?;

    let pages = [
        render(&output_dir, ConfigCli::command(), "spi-config.1")?,
        render(&output_dir, PipeCli::command(), "spi-pipe.1")?,
    ];

    for page in &pages {
        println!("Man page generated at: {}", page.display());
    }
    println!("\nTo view a man page:");
    println!("  man -l {}", pages[0].display());
    println!("\nTo install system-wide (requires sudo):");
    println!("  sudo cp {}/*.1 /usr/local/share/man/man1/", output_dir.display());
    println!("  sudo mandb");

    Ok(())
}

fn render(dir: &Path, cmd: clap::Command, file_name: &str) -> std::io::Result<PathBuf> {
    let man = clap_mangen::Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;

    let output_path = dir.join(file_name);
    fs::write(&output_path, buffer)?;
    Ok(output_path)
}
