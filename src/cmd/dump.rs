use std::{
    fs,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use argh::FromArgs;
use sc3dlib::import::LIBRARY_EXTENSION;

use crate::cmd::load_scene;

#[derive(FromArgs, PartialEq, Eq, Debug)]
/// write a decoded SC3D file as JSON
#[argh(subcommand, name = "dump")]
pub struct Args {
    #[argh(positional)]
    /// input file, or folder with -a
    input: PathBuf,
    #[argh(option, short = 'o')]
    /// output file (default: input with .json extension)
    output: Option<PathBuf>,
    #[argh(option, short = 'f')]
    /// library search folder (default: input directory)
    folder: Option<PathBuf>,
    #[argh(switch, short = 'a')]
    /// dump every .scw file in the input folder
    all: bool,
}

pub fn run(args: Args) -> Result<()> {
    if !args.all {
        let output = args.output.clone().unwrap_or_else(|| args.input.with_extension("json"));
        return dump(&args.input, &output, args.folder.as_deref());
    }

    ensure!(args.input.is_dir(), "'{}' is not a folder", args.input.display());
    let out_dir = args.output.as_deref().unwrap_or(&args.input);
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create folder '{}'", out_dir.display()))?;
    let folder = args.folder.as_deref().unwrap_or(&args.input);
    let mut inputs = fs::read_dir(&args.input)
        .with_context(|| format!("Failed to read folder '{}'", args.input.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    inputs.retain(|p| {
        p.extension().map_or(false, |ext| ext.eq_ignore_ascii_case(LIBRARY_EXTENSION))
    });
    inputs.sort();
    for input in &inputs {
        let Some(stem) = input.file_stem() else { continue };
        let output = out_dir.join(format!("{}.json", stem.to_string_lossy()));
        dump(input, &output, Some(folder))?;
    }
    log::info!("Dumped {} files", inputs.len());
    Ok(())
}

fn dump(input: &Path, output: &Path, folder: Option<&Path>) -> Result<()> {
    let (container, _) = load_scene(input, folder, &[])?;
    let mut file = BufWriter::new(
        File::create(output)
            .with_context(|| format!("Failed to create file '{}'", output.display()))?,
    );
    serde_json::to_writer_pretty(&mut file, &*container)?;
    file.flush()?;
    log::info!("Wrote {}", output.display());
    Ok(())
}
