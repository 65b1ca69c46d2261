//! Command-line `bspatch`: applies a bzip2-compressed `ENDSLEY/BSDIFF43`
//! patch, mirroring the reference `bspatch` executable. On Unix, the
//! output file is created with OLDFILE's permission bits, matching the
//! reference's `fstat`/`open(..., sb.st_mode)` behavior.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bzip2::read::BzDecoder;
use clap::Parser;

/// Apply a binary patch to OLDFILE, producing NEWFILE.
#[derive(Parser)]
#[command(name = "bspatch", version)]
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
    let old_file = File::open(&args.oldfile)?;
    let old_mode = file_mode(&old_file)?;
    let old = std::fs::read(&args.oldfile)?;
    drop(old_file);

    let mut patch_file = BufReader::new(File::open(&args.patchfile)?);
    let new_size = bsdelta::read_header(&mut patch_file).map_err(to_io_error)?;

    let mut body = BzDecoder::new(patch_file);
    let mut new = vec![0u8; new_size as usize];
    bsdelta::patch(&old, &mut new, &mut body).map_err(to_io_error)?;

    write_output(&args.newfile, &new, old_mode)?;
    log::info!(
        "applied patch: {} + {} -> {}",
        args.oldfile.display(),
        args.patchfile.display(),
        args.newfile.display()
    );
    Ok(())
}

#[cfg(unix)]
fn file_mode(f: &File) -> io::Result<u32> {
    use std::os::unix::fs::MetadataExt;
    Ok(f.metadata()?.mode())
}

#[cfg(not(unix))]
fn file_mode(_f: &File) -> io::Result<u32> {
    Ok(0)
}

#[cfg(unix)]
fn write_output(path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut f = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)?;
    f.write_all(data)
}

#[cfg(not(unix))]
fn write_output(path: &Path, data: &[u8], _mode: u32) -> io::Result<()> {
    std::fs::write(path, data)
}

fn to_io_error(e: bsdelta::BsdiffError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}
