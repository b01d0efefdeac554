use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use argh::FromArgs;
use rsrcfork::{
    format::{rsrc::attribute_names, FourCC},
    util::file::{map_fork, Fork},
    ResourceMap,
};

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// lists the resources in a file
#[argh(subcommand, name = "list")]
pub struct ListArgs {
    #[argh(positional)]
    /// input file
    input: PathBuf,
    #[argh(option, default = "Fork::Data")]
    /// fork to read: data (default) or rsrc
    fork: Fork,
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// extracts every resource into a directory
#[argh(subcommand, name = "extract")]
pub struct ExtractArgs {
    #[argh(positional)]
    /// input file
    input: PathBuf,
    #[argh(positional)]
    /// output directory
    output: PathBuf,
    #[argh(option, default = "Fork::Data")]
    /// fork to read: data (default) or rsrc
    fork: Fork,
}

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// re-encodes the resources of a file into a flat resource file
#[argh(subcommand, name = "rewrite")]
pub struct RewriteArgs {
    #[argh(positional)]
    /// input file
    input: PathBuf,
    #[argh(positional)]
    /// output file
    output: PathBuf,
    #[argh(option, default = "Fork::Data")]
    /// fork to read: data (default) or rsrc
    fork: Fork,
}

fn read_map(input: &Path, fork: Fork) -> Result<ResourceMap> {
    let data = map_fork(input, fork)?;
    ResourceMap::read(&data)
        .with_context(|| format!("Failed to read resources from '{}'", input.display()))
}

pub fn list(args: ListArgs) -> Result<()> {
    let map = read_map(&args.input, args.fork)?;
    log::info!("{} type(s), {} resource(s)", map.types.len(), map.resource_count());
    for (kind, resources) in &map.types {
        log::info!("{:?}: {} resource(s)", kind, resources.len());
        for resource in resources {
            log::info!(
                "- {} {:?} [{}] size {:#X}",
                resource.id,
                resource.name.as_deref().unwrap_or(""),
                attribute_names(resource.attributes).join(", "),
                resource.data.len()
            );
        }
    }
    Ok(())
}

/// Directory name for a resource type. Type codes may contain path separators.
fn type_dir_name(kind: FourCC) -> String {
    kind.to_string()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') || c.is_control() { '_' } else { c })
        .collect()
}

pub fn extract(args: ExtractArgs) -> Result<()> {
    let map = read_map(&args.input, args.fork)?;
    for (kind, resources) in &map.types {
        let dir = args.output.join(type_dir_name(*kind));
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory '{}'", dir.display()))?;
        for resource in resources {
            let path = dir.join(format!("{}.bin", resource.id));
            fs::write(&path, &resource.data)
                .with_context(|| format!("Failed to write output file '{}'", path.display()))?;
        }
    }
    log::info!("Extracted {} resource(s) to '{}'", map.resource_count(), args.output.display());
    Ok(())
}

pub fn rewrite(args: RewriteArgs) -> Result<()> {
    let map = read_map(&args.input, args.fork)?;
    let data = map.write().context("Failed to encode resources")?;
    fs::write(&args.output, &data)
        .with_context(|| format!("Failed to write output file '{}'", args.output.display()))?;
    log::info!("Wrote {} resource(s), {:#X} bytes", map.resource_count(), data.len());
    Ok(())
}
