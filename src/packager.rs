/// Per-browser packaging: copy the shared extension tree into a dist
/// directory and swap in the target browser's manifest

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Canonical manifest name both browsers load.
pub const MANIFEST_NAME: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Target {
    Chrome,
    Firefox,
}

impl Target {
    pub fn dir_name(self) -> &'static str {
        match self {
            Target::Chrome => "chrome",
            Target::Firefox => "firefox",
        }
    }

    pub fn manifest_variant(self) -> &'static str {
        match self {
            Target::Chrome => "manifest.chrome.json",
            Target::Firefox => "manifest.firefox.json",
        }
    }

    fn other(self) -> Target {
        match self {
            Target::Chrome => Target::Firefox,
            Target::Firefox => Target::Chrome,
        }
    }
}

/// Build one browser's distribution tree under `dist_root` and return the
/// output directory. Assets are copied untouched; the only transformation
/// is the manifest rename plus removal of the other browser's variant.
pub fn package(source: &Path, dist_root: &Path, target: Target) -> Result<PathBuf> {
    let out_dir = dist_root.join(target.dir_name());

    if out_dir.exists() {
        fs::remove_dir_all(&out_dir)
            .with_context(|| format!("failed to clean {}", out_dir.display()))?;
    }
    copy_tree(source, &out_dir)?;

    let variant = out_dir.join(target.manifest_variant());
    if !variant.exists() {
        bail!(
            "{} is missing from {}",
            target.manifest_variant(),
            source.display()
        );
    }
    fs::rename(&variant, out_dir.join(MANIFEST_NAME))
        .context("failed to install target manifest")?;

    let unused = out_dir.join(target.other().manifest_variant());
    if unused.exists() {
        fs::remove_file(&unused).context("failed to remove unused manifest variant")?;
    }

    Ok(out_dir)
}

fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("failed to walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("failed to get relative path")?;
        let dest_path = dest.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest_path)
                .with_context(|| format!("failed to create {}", dest_path.display()))?;
        } else {
            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::copy(entry.path(), &dest_path)
                .with_context(|| format!("failed to copy {}", entry.path().display()))?;
        }
    }

    Ok(())
}
