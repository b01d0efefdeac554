use std::{
    fs::File,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use memmap2::{Mmap, MmapOptions};

/// Which fork of a file to read resources from.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Fork {
    /// The file's contents, for flattened resource files.
    #[default]
    Data,
    /// The named resource fork, through the `..namedfork/rsrc` path.
    Resource,
}

impl FromStr for Fork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data" => Ok(Self::Data),
            "rsrc" | "resource" => Ok(Self::Resource),
            _ => Err(format!("Invalid fork '{s}', expected 'data' or 'rsrc'")),
        }
    }
}

impl Fork {
    /// Returns the path that reads this fork of `path`.
    pub fn path_for<P: AsRef<Path>>(self, path: P) -> PathBuf {
        match self {
            Fork::Data => path.as_ref().to_path_buf(),
            Fork::Resource => path.as_ref().join("..namedfork").join("rsrc"),
        }
    }
}

/// Opens a memory mapped file.
pub fn map_file<P: AsRef<Path>>(path: P) -> Result<Mmap> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open file '{}'", path.as_ref().display()))?;
    let map = unsafe { MmapOptions::new().map(&file) }
        .with_context(|| format!("Failed to mmap file: '{}'", path.as_ref().display()))?;
    Ok(map)
}

/// Opens the requested fork of `path` as a memory mapped file.
pub fn map_fork<P: AsRef<Path>>(path: P, fork: Fork) -> Result<Mmap> {
    let fork_path = fork.path_for(&path);
    let len = std::fs::metadata(&fork_path)
        .with_context(|| format!("Failed to stat '{}'", fork_path.display()))?
        .len();
    if len == 0 {
        bail!("{:?} fork of '{}' is empty", fork, path.as_ref().display());
    }
    map_file(fork_path)
}
