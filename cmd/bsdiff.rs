//! Command-line `bsdiff`: diffs two files into a bzip2-compressed
//! `ENDSLEY/BSDIFF43` patch, mirroring the reference `bsdiff` executable.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use bzip2::write::BzEncoder;
use bzip2::Compression;
use clap::Parser;

/// Generate a binary patch from OLDFILE to NEWFILE.
#[derive(Parser)]
#[command(name = "bsdiff", version)]
struct Args {
    oldfile: PathBuf,
    newfile: PathBuf,
    patchfile: PathBuf,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> io::Result<()> {
    let old = std::fs::read(&args.oldfile)?;
    let new = std::fs::read(&args.newfile)?;

    let mut patch_file = BufWriter::new(File::create(&args.patchfile)?);
    bsdelta::write_header(&mut patch_file, new.len() as i64).map_err(to_io_error)?;

    let mut body = BzEncoder::new(patch_file, Compression::best());
    bsdelta::diff(&old, &new, &mut body).map_err(to_io_error)?;
    body.finish()?.flush()?;

    log::info!(
        "wrote patch: {} -> {} ({} bytes)",
        args.oldfile.display(),
        args.newfile.display(),
        std::fs::metadata(&args.patchfile).map(|m| m.len()).unwrap_or(0)
    );
    Ok(())
}

fn to_io_error(e: bsdelta::BsdiffError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
