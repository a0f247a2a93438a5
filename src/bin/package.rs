/// Build per-browser distribution trees for the extension

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use quick_qr_scan::packager::{self, Target};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "package",
    about = "Copy the shared extension tree into a per-browser dist directory"
)]
struct Args {
    /// Browser to package for
    #[arg(value_enum)]
    target: Target,

    /// Shared extension source tree
    #[arg(long, default_value = "extension")]
    source: PathBuf,

    /// Root of the per-browser output directories
    #[arg(long, default_value = "dist")]
    out: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let out_dir = packager::package(&args.source, &args.out, args.target)?;
    println!("{} {}", "Packaged".green().bold(), out_dir.display());

    Ok(())
}
